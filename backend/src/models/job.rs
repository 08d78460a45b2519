//! Job model
//!
//! A unit of work requested by a customer. Each job has:
//! - A kind (inference or training) and a size template
//! - A required accelerator count and per-accelerator VRAM requirement
//! - A base duration normalized to a performance-1.0 accelerator
//! - A base payout and an SLA deadline by which it must *start*
//! - A lifecycle state (Pending, Active, Settled)
//!
//! Duration is fixed when the job starts and depends on where it was placed.

use crate::models::accelerator::{Accelerator, AcceleratorId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Job identifier (monotonic per simulation, starting at 1)
pub type JobId = u64;

/// Progress points at which a multi-accelerator job synchronizes
pub const SYNC_CHECKPOINTS: [f64; 4] = [0.25, 0.5, 0.75, 1.0];

/// Payout factor for a job that started after its deadline
pub const LATE_START_PAYOUT_FACTOR: f64 = 0.7;

/// Slack for float accumulation when testing progress against a boundary
const PROGRESS_EPSILON: f64 = 1e-9;

/// Workload category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Inference,
    Training,
}

/// Size template the job was generated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSize {
    /// 1 accelerator
    Small,
    /// 2 accelerators
    Medium,
    /// 4 accelerators
    Large,
}

impl JobSize {
    pub fn gpu_count(self) -> usize {
        match self {
            JobSize::Small => 1,
            JobSize::Medium => 2,
            JobSize::Large => 4,
        }
    }
}

/// Job lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobState {
    /// Waiting in the queue
    Pending,

    /// Placed and making progress
    Active {
        /// Simulated time the job was placed
        started_at: f64,
    },

    /// Finished and paid out
    Settled {
        started_at: f64,
        completed_at: f64,
        payout: f64,
    },
}

/// Errors that can occur during job operations
#[derive(Debug, Error, PartialEq)]
pub enum JobError {
    #[error("Job #{0} has already started")]
    AlreadyStarted(JobId),

    #[error("Job #{0} is not running")]
    NotActive(JobId),

    #[error("Job #{0} cannot start without accelerators")]
    NoAccelerators(JobId),

    #[error("Job #{job} got an unusable performance multiplier {multiplier}")]
    InvalidPerformance { job: JobId, multiplier: f64 },
}

/// Parameters of a job before it gets an id and a creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRequest {
    pub kind: JobKind,
    pub size: JobSize,
    pub customer: String,
    pub task: String,
    pub gpu_count: usize,
    pub vram_per_gpu: u32,
    pub base_duration: f64,
    pub base_payout: f64,
    /// Seconds from creation to the SLA deadline
    pub sla_window: f64,
}

impl JobRequest {
    /// A bare request, mostly useful in tests and manual injection
    ///
    /// Size is derived from `gpu_count`; customer and task are generic.
    pub fn new(
        gpu_count: usize,
        vram_per_gpu: u32,
        base_duration: f64,
        base_payout: f64,
        sla_window: f64,
    ) -> Self {
        let size = match gpu_count {
            0 | 1 => JobSize::Small,
            2 | 3 => JobSize::Medium,
            _ => JobSize::Large,
        };
        Self {
            kind: JobKind::Inference,
            size,
            customer: "Walk-in".to_string(),
            task: "Batch Job".to_string(),
            gpu_count,
            vram_per_gpu,
            base_duration,
            base_payout,
            sla_window,
        }
    }

    pub fn with_kind(mut self, kind: JobKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_customer(mut self, customer: impl Into<String>, task: impl Into<String>) -> Self {
        self.customer = customer.into();
        self.task = task.into();
        self
    }
}

/// Outcome of advancing a job by one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    /// Progress reached 1.0 on this update
    pub completed: bool,
    /// Sync checkpoints crossed on this update, in order
    pub synced: Vec<f64>,
}

/// A unit of work
///
/// # Example
/// ```
/// use gpu_tycoon_core::catalog::{Catalog, GpuModel};
/// use gpu_tycoon_core::{Accelerator, Job, JobRequest};
///
/// let catalog = Catalog::standard();
/// let gpu = Accelerator::new(1, catalog.accelerator(GpuModel::L4).unwrap());
///
/// let mut job = Job::new(1, JobRequest::new(1, 16, 5.0, 45.0, 20.0), 0.0);
/// job.start(&[&gpu], 0.0, 0.0).unwrap();
/// assert_eq!(job.duration(), 5.0);
///
/// assert!(!job.update(2.5).unwrap().completed);
/// assert!(job.update(2.5).unwrap().completed);
/// assert_eq!(job.settle(5.0).unwrap(), 45.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    id: JobId,
    kind: JobKind,
    size: JobSize,
    customer: String,
    task: String,
    gpu_count: usize,
    vram_per_gpu: u32,
    base_duration: f64,
    base_payout: f64,
    created_at: f64,
    sla_deadline: f64,

    state: JobState,

    /// Fraction complete, [0, 1]
    progress: f64,

    /// Placement-dependent duration, fixed at start
    duration: f64,

    assigned: Vec<AcceleratorId>,
    network_penalty: f64,
    performance_multiplier: f64,

    /// Checkpoints not yet crossed
    pending_syncs: Vec<f64>,

    /// Checkpoints already crossed
    completed_syncs: Vec<f64>,
}

impl Job {
    /// Create a pending job
    pub fn new(id: JobId, request: JobRequest, created_at: f64) -> Self {
        Self {
            id,
            kind: request.kind,
            size: request.size,
            customer: request.customer,
            task: request.task,
            gpu_count: request.gpu_count,
            vram_per_gpu: request.vram_per_gpu,
            base_duration: request.base_duration,
            base_payout: request.base_payout,
            created_at,
            sla_deadline: created_at + request.sla_window,
            state: JobState::Pending,
            progress: 0.0,
            duration: request.base_duration,
            assigned: Vec::new(),
            network_penalty: 0.0,
            performance_multiplier: 1.0,
            pending_syncs: Vec::new(),
            completed_syncs: Vec::new(),
        }
    }

    /// Finalize placement on `accelerators`
    ///
    /// A single accelerator runs the job at its own performance rating.
    /// Several accelerators of one model scale near-linearly (0.95 per unit,
    /// with a 5% NVLink bonus). A mixed set is bottlenecked by its slowest
    /// member and pays a further 15% heterogeneity tax.
    ///
    /// The resulting duration is stretched by `network_penalty`. Sync
    /// checkpoints are armed only for jobs asking for more than one
    /// accelerator; a single-unit job pooled over a cluster never syncs.
    ///
    /// # Errors
    /// - `AlreadyStarted` if the job is not pending
    /// - `NoAccelerators` if `accelerators` is empty
    pub fn start(
        &mut self,
        accelerators: &[&Accelerator],
        network_penalty: f64,
        now: f64,
    ) -> Result<(), JobError> {
        if !matches!(self.state, JobState::Pending) {
            return Err(JobError::AlreadyStarted(self.id));
        }
        if accelerators.is_empty() {
            return Err(JobError::NoAccelerators(self.id));
        }

        let multiplier = performance_multiplier(accelerators);
        if !(multiplier > 0.0) || !multiplier.is_finite() {
            return Err(JobError::InvalidPerformance {
                job: self.id,
                multiplier,
            });
        }

        self.performance_multiplier = multiplier;
        self.network_penalty = network_penalty.max(0.0);
        self.duration = self.base_duration / multiplier * (1.0 + self.network_penalty);
        self.assigned = accelerators.iter().map(|a| a.id()).collect();
        self.pending_syncs = if self.gpu_count > 1 {
            SYNC_CHECKPOINTS.to_vec()
        } else {
            Vec::new()
        };
        self.state = JobState::Active { started_at: now };
        Ok(())
    }

    /// Advance progress by `dt` seconds
    ///
    /// Progress never decreases and is clamped at 1.0.
    pub fn update(&mut self, dt: f64) -> Result<JobUpdate, JobError> {
        if !matches!(self.state, JobState::Active { .. }) {
            return Err(JobError::NotActive(self.id));
        }

        let mut result = JobUpdate::default();
        if self.duration <= 0.0 {
            self.progress = 1.0;
        } else if dt > 0.0 {
            self.progress = (self.progress + dt / self.duration).min(1.0);
        }
        if self.progress >= 1.0 - PROGRESS_EPSILON {
            self.progress = 1.0;
        }

        while let Some(&checkpoint) = self.pending_syncs.first() {
            if self.progress + PROGRESS_EPSILON < checkpoint {
                break;
            }
            self.pending_syncs.remove(0);
            self.completed_syncs.push(checkpoint);
            result.synced.push(checkpoint);
        }

        result.completed = self.progress >= 1.0;
        Ok(result)
    }

    /// Payout this job earns at settlement
    ///
    /// Depends only on start time: a late start costs 30%, running long
    /// afterwards costs nothing.
    pub fn calculate_payout(&self) -> f64 {
        match self.started_at() {
            Some(started_at) if started_at > self.sla_deadline => {
                self.base_payout * LATE_START_PAYOUT_FACTOR
            }
            _ => self.base_payout,
        }
    }

    /// Whether the SLA is (or will be) missed as of `now`
    pub fn is_sla_missed(&self, now: f64) -> bool {
        match self.started_at() {
            Some(started_at) => started_at > self.sla_deadline,
            None => now > self.sla_deadline,
        }
    }

    /// Mark a completed job as settled and return its payout
    pub fn settle(&mut self, now: f64) -> Result<f64, JobError> {
        let started_at = match self.state {
            JobState::Active { started_at } if self.progress >= 1.0 => started_at,
            _ => return Err(JobError::NotActive(self.id)),
        };
        let payout = self.calculate_payout();
        self.state = JobState::Settled {
            started_at,
            completed_at: now,
            payout,
        };
        Ok(payout)
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn size(&self) -> JobSize {
        self.size
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn gpu_count(&self) -> usize {
        self.gpu_count
    }

    pub fn vram_per_gpu(&self) -> u32 {
        self.vram_per_gpu
    }

    /// VRAM the job needs across its whole placement
    pub fn total_vram(&self) -> u32 {
        self.vram_per_gpu.saturating_mul(self.gpu_count as u32)
    }

    pub fn base_duration(&self) -> f64 {
        self.base_duration
    }

    pub fn base_payout(&self) -> f64 {
        self.base_payout
    }

    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    pub fn sla_deadline(&self) -> f64 {
        self.sla_deadline
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, JobState::Pending)
    }

    pub fn started_at(&self) -> Option<f64> {
        match self.state {
            JobState::Pending => None,
            JobState::Active { started_at } | JobState::Settled { started_at, .. } => {
                Some(started_at)
            }
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Seconds left at the current rate (0 when pending or done)
    pub fn time_remaining(&self) -> f64 {
        match self.state {
            JobState::Active { .. } => (1.0 - self.progress) * self.duration,
            _ => 0.0,
        }
    }

    pub fn assigned(&self) -> &[AcceleratorId] {
        &self.assigned
    }

    pub fn network_penalty(&self) -> f64 {
        self.network_penalty
    }

    pub fn performance_multiplier(&self) -> f64 {
        self.performance_multiplier
    }

    pub fn completed_syncs(&self) -> &[f64] {
        &self.completed_syncs
    }
}

/// Effective throughput of a placement relative to a performance-1.0 unit
fn performance_multiplier(accelerators: &[&Accelerator]) -> f64 {
    let count = accelerators.len() as f64;
    let mean = accelerators.iter().map(|a| a.performance()).sum::<f64>() / count;
    if accelerators.len() == 1 {
        return mean;
    }

    let first = accelerators[0].model();
    if accelerators.iter().all(|a| a.model() == first) {
        let mut multiplier = 0.95 * count;
        if first.has_nvlink() {
            multiplier *= 1.05;
        }
        return multiplier;
    }

    let min = accelerators
        .iter()
        .map(|a| a.performance())
        .fold(f64::INFINITY, f64::min);
    let max = accelerators
        .iter()
        .map(|a| a.performance())
        .fold(f64::NEG_INFINITY, f64::max);
    let variance = (max - min) / max;
    let sync_penalty = 1.0 - 0.2 * variance;
    (0.6 * min + 0.4 * mean) * count * sync_penalty * 0.85
}

//! Job arrival generation.
//!
//! Jobs are drawn from three size templates whose mix depends on lifetime
//! revenue and on how many accelerators the scheduler can use. The spawn
//! cadence adapts to fleet size and backlog so the queue stays visible but
//! bounded.
//!
//! # Key Principles
//!
//! 1. **Determinism**: Same seed + same calls → same jobs
//! 2. **Serviceable work only**: medium jobs need 2 usable accelerators,
//!    large jobs need 4
//! 3. **Backpressure**: a crowded queue slows arrivals, widens deadlines
//!    and finally suppresses generation
//!
//! # Example
//!
//! ```
//! use gpu_tycoon_core::arrivals::{plan_spawn, JobGenerator};
//! use gpu_tycoon_core::rng::RngManager;
//!
//! let mut rng = RngManager::new(42);
//! let request = JobGenerator::generate_job(0.0, 1.0, 0.0, 1, &mut rng);
//! assert_eq!(request.gpu_count, 1);
//! assert_eq!(request.base_payout, 45.0);
//!
//! let plan = plan_spawn(0, 1, 2.0, 1.0);
//! assert!(plan.generate);
//! ```

use crate::models::job::{JobKind, JobRequest, JobSize};
use crate::rng::RngManager;
use serde::{Deserialize, Serialize};

/// Inference customers and the task each one runs
pub const INFERENCE_CUSTOMERS: [(&str, &str); 6] = [
    ("QueryMind AI", "Search Query Processing"),
    ("ChatBuddy Corp", "Conversational Inference"),
    ("PixelFlow Studio", "Video Generation"),
    ("ModelHub Systems", "Model API Inference"),
    ("VoiceGen Labs", "Voice Synthesis"),
    ("DreamRender AI", "Image Generation"),
];

/// Training customers and the task each one runs
pub const TRAINING_CUSTOMERS: [(&str, &str); 8] = [
    ("SafetyFirst AI", "LLM Model Training"),
    ("EnterpriseNLP Corp", "LLM Fine-tuning"),
    ("AutoDrive Systems", "Perception Model Training"),
    ("ArtGen Studio", "Diffusion Model Training"),
    ("AgentFlow AI", "Action Transformer Training"),
    ("PersonalAI Labs", "Large-scale Pretraining"),
    ("NeuralCore Research", "Foundation Model Training"),
    ("CogniTech Labs", "Multi-modal Training"),
];

/// Deadline slack added per job of excess backlog
const BACKLOG_SLA_STEP: f64 = 2.0;
/// Cap on backlog-driven deadline slack
const BACKLOG_SLA_CAP: f64 = 20.0;
/// Interval stretch per job of excess backlog
const BACKPRESSURE_STEP: f64 = 0.2;

/// Fixed shape of each size template
struct Template {
    gpu_count: usize,
    vram_per_gpu: u32,
    base_duration: f64,
    base_payout: f64,
    sla_window: f64,
}

impl JobSize {
    fn template(self) -> Template {
        match self {
            JobSize::Small => Template {
                gpu_count: 1,
                vram_per_gpu: 16,
                base_duration: 5.0,
                base_payout: 45.0,
                sla_window: 20.0,
            },
            JobSize::Medium => Template {
                gpu_count: 2,
                vram_per_gpu: 32,
                base_duration: 12.0,
                base_payout: 120.0,
                sla_window: 35.0,
            },
            JobSize::Large => Template {
                gpu_count: 4,
                vram_per_gpu: 50,
                base_duration: 20.0,
                base_payout: 220.0,
                sla_window: 50.0,
            },
        }
    }
}

/// Job factory plus the spawn timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobGenerator {
    base_interval: f64,
    interval: f64,
    last_spawn: f64,
}

impl JobGenerator {
    /// A generator whose first job is due `base_interval` seconds after `now`
    pub fn new(base_interval: f64, now: f64) -> Self {
        Self {
            base_interval,
            interval: base_interval,
            last_spawn: now,
        }
    }

    pub fn base_interval(&self) -> f64 {
        self.base_interval
    }

    /// Current seconds between generation attempts
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Whether a generation attempt is due at `now`
    pub fn is_due(&self, now: f64) -> bool {
        now - self.last_spawn >= self.interval
    }

    /// Reset the timer after a generation attempt
    pub fn record_attempt(&mut self, now: f64, next_interval: f64) {
        self.last_spawn = now;
        self.interval = next_interval;
    }

    /// Draw one job appropriate for the current phase and fleet
    ///
    /// `value_multiplier` scales payout (truncated to whole dollars) and
    /// `sla_extension` widens the deadline window.
    pub fn generate_job(
        total_revenue: f64,
        value_multiplier: f64,
        sla_extension: f64,
        available: usize,
        rng: &mut RngManager,
    ) -> JobRequest {
        let size = choose_size(total_revenue, available, rng);
        let (kind, pool) = match size {
            JobSize::Small => (JobKind::Inference, &INFERENCE_CUSTOMERS[..]),
            JobSize::Large => (JobKind::Training, &TRAINING_CUSTOMERS[..]),
            JobSize::Medium => {
                if rng.next_f64() < 0.5 {
                    (JobKind::Inference, &INFERENCE_CUSTOMERS[..])
                } else {
                    (JobKind::Training, &TRAINING_CUSTOMERS[..])
                }
            }
        };
        let (customer, task) = rng.choose(pool).copied().unwrap_or(("Walk-in", "Batch Job"));

        let template = size.template();
        JobRequest {
            kind,
            size,
            customer: customer.to_string(),
            task: task.to_string(),
            gpu_count: template.gpu_count,
            vram_per_gpu: template.vram_per_gpu,
            base_duration: template.base_duration,
            base_payout: (template.base_payout * value_multiplier).floor(),
            sla_window: template.sla_window + sla_extension,
        }
    }
}

/// Pick a size template from the revenue bracket's probability table
///
/// Below $30K: 70/30 small/medium. Up to $150K: 60/40, or 50/30/20 with
/// large jobs once 4 accelerators are usable. Beyond: 50/50, or 30/30/40.
pub fn choose_size(total_revenue: f64, available: usize, rng: &mut RngManager) -> JobSize {
    if available < 2 {
        return JobSize::Small;
    }

    let roll = rng.next_f64();
    if total_revenue < 30_000.0 {
        return if roll < 0.7 { JobSize::Small } else { JobSize::Medium };
    }

    let (small, medium) = match (total_revenue < 150_000.0, available < 4) {
        (true, true) => (0.6, 1.0),
        (true, false) => (0.5, 0.8),
        (false, true) => (0.5, 1.0),
        (false, false) => (0.3, 0.6),
    };
    if roll < small {
        JobSize::Small
    } else if roll < medium {
        JobSize::Medium
    } else {
        JobSize::Large
    }
}

/// Queue depth the cadence aims to keep
pub fn target_queue_depth(available: usize) -> usize {
    3 + available / 4
}

/// Spawn rate boost from fleet size
pub fn capacity_multiplier(available: usize) -> f64 {
    if available == 0 {
        1.0
    } else {
        1.5 + (available as f64).powf(0.7) / 1.5
    }
}

/// Outcome of one generation attempt's bookkeeping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPlan {
    pub target_queue_depth: usize,
    /// False once backlog reaches twice the target
    pub generate: bool,
    /// Extra deadline slack for a job arriving into this backlog
    pub backlog_sla_extension: f64,
    /// Interval until the next attempt
    pub next_interval: f64,
}

/// Compute backpressure for a generation attempt
///
/// `spawn_multiplier` is the product of the marketing and demand-spike
/// multipliers. The interval is recomputed even when generation is
/// suppressed.
pub fn plan_spawn(
    backlog: usize,
    available: usize,
    base_interval: f64,
    spawn_multiplier: f64,
) -> SpawnPlan {
    let target = target_queue_depth(available);
    let excess = backlog.saturating_sub(target) as f64;

    let backlog_sla_extension = (excess * BACKLOG_SLA_STEP).min(BACKLOG_SLA_CAP);
    let backpressure = 1.0 + excess * BACKPRESSURE_STEP;
    let total_multiplier = spawn_multiplier * capacity_multiplier(available);

    SpawnPlan {
        target_queue_depth: target,
        generate: backlog < target * 2,
        backlog_sla_extension,
        next_interval: base_interval * backpressure / total_multiplier,
    }
}

//! Snapshot - Read-only projection of a simulation
//!
//! A [`Snapshot`] is rebuilt from scratch on every call: derived figures
//! (utilization, PUE, rolling SLA compliance, revenue rate, unlocks) are
//! computed, never stored. [`Simulation::state_digest`] hashes the canonical
//! JSON of a snapshot so two runs can be compared for determinism.

use crate::catalog::{CoolingTier, GpuModel};
use crate::economy::{self, SchedulerTier};
use crate::models::accelerator::{Accelerator, AcceleratorId, Fleet};
use crate::models::cluster::{Cluster, ClusterId};
use crate::models::contract::{Contract, ContractStatus};
use crate::models::job::{Job, JobId, JobKind, JobSize, JobState};
use crate::orchestrator::engine::{Simulation, SimulationError};
use crate::orchestrator::milestones::{Achievement, Victory};
use serde::Serialize;
use sha2::{Digest, Sha256};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Everything a renderer needs, as plain data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub time: f64,
    pub cash: f64,
    pub total_revenue: f64,
    pub total_power_cost: f64,
    pub auto_assign: bool,
    pub accelerators: Vec<AcceleratorSnapshot>,
    pub pending_jobs: Vec<JobSnapshot>,
    pub active_jobs: Vec<JobSnapshot>,
    pub clusters: Vec<ClusterSnapshot>,
    /// Accelerators not in any cluster, in purchase order
    pub unclustered: Vec<AcceleratorId>,
    pub contracts: Vec<ContractSnapshot>,
    pub marketing: MarketingSnapshot,
    pub achievements: Vec<Achievement>,
    pub victory: Option<Victory>,
    pub active_spike: Option<SpikeSnapshot>,
    pub capacity: CapacitySnapshot,
    pub stats: StatsSnapshot,
    pub unlocked_models: Vec<GpuModel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceleratorSnapshot {
    pub id: AcceleratorId,
    pub model: GpuModel,
    pub name: String,
    pub vram_gb: u32,
    pub vram_used: u32,
    pub utilization: f64,
    pub current_job: Option<JobId>,
    pub cluster_id: Option<ClusterId>,
    pub reserved: bool,
}

/// How a placed job's accelerators work together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Coordination {
    /// Not placed yet
    Unplaced,
    Single,
    /// Several accelerators of one model
    Matched,
    /// Mixed models, bottlenecked by the slowest
    Mixed,
}

impl Coordination {
    fn of(assigned: &[AcceleratorId], fleet: &Fleet) -> Self {
        let mut models = assigned.iter().filter_map(|id| fleet.get(id)).map(Accelerator::model);
        let Some(first) = models.next() else {
            return Coordination::Unplaced;
        };
        if assigned.len() == 1 {
            Coordination::Single
        } else if models.all(|m| m == first) {
            Coordination::Matched
        } else {
            Coordination::Mixed
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSnapshot {
    pub id: JobId,
    pub kind: JobKind,
    pub size: JobSize,
    pub customer: String,
    pub task: String,
    pub gpu_count: usize,
    pub vram_per_gpu: u32,
    pub base_payout: f64,
    pub sla_deadline: f64,
    pub progress: f64,
    pub time_remaining: f64,
    pub assigned: Vec<AcceleratorId>,
    /// Speed-up over the base duration (1.0 until placed)
    pub performance_multiplier: f64,
    pub coordination: Coordination,
    pub started_at: Option<f64>,
    /// Deadline passed (pending) or start was late (active)
    pub sla_missed: bool,
}

impl JobSnapshot {
    fn capture(job: &Job, fleet: &Fleet, now: f64) -> Self {
        Self {
            id: job.id(),
            kind: job.kind(),
            size: job.size(),
            customer: job.customer().to_string(),
            task: job.task().to_string(),
            gpu_count: job.gpu_count(),
            vram_per_gpu: job.vram_per_gpu(),
            base_payout: job.base_payout(),
            sla_deadline: job.sla_deadline(),
            progress: job.progress(),
            time_remaining: match job.state() {
                JobState::Pending => job.base_duration(),
                _ => job.time_remaining(),
            },
            assigned: job.assigned().to_vec(),
            performance_multiplier: job.performance_multiplier(),
            coordination: Coordination::of(job.assigned(), fleet),
            started_at: job.started_at(),
            sla_missed: job.is_sla_missed(now),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSnapshot {
    pub id: ClusterId,
    pub name: String,
    pub members: Vec<AcceleratorId>,
    pub model: Option<GpuModel>,
    /// Pooled VRAM of all members
    pub total_vram: u32,
    pub available_vram: u32,
    pub is_available: bool,
    pub current_job: Option<JobId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractSnapshot {
    pub id: String,
    pub customer: String,
    pub title: String,
    pub status: &'static str,
    pub negotiation_progress: f64,
    pub money_invested: f64,
    pub negotiation_cost_total: f64,
    pub monthly_income: f64,
    pub reserves_gpus: usize,
    pub reserved: Vec<AcceleratorId>,
    pub months_remaining: f64,
    /// Unmet requirements (empty when eligible)
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketingSnapshot {
    pub level: u32,
    pub name: String,
    pub spawn_multiplier: f64,
    pub value_multiplier: f64,
    pub sla_extension: f64,
    pub next_cost: Option<f64>,
    pub next_unlock_revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpikeSnapshot {
    pub name: String,
    pub description: String,
    pub time_remaining: f64,
    pub spawn_multiplier: f64,
    pub value_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CapacitySnapshot {
    pub total: usize,
    pub reserved: usize,
    /// Not held by a contract
    pub available: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub jobs_completed: u64,
    pub sla_misses: u64,
    /// Percentage over the recent completion window
    pub sla_compliance: f64,
    pub avg_utilization: f64,
    pub revenue_per_hour: f64,
    pub pue: f64,
    pub cooling_tier: CoolingTier,
    pub network_penalty: f64,
    pub scheduler_tier: SchedulerTier,
    pub spawn_interval: f64,
}

// ============================================================================
// Capture
// ============================================================================

impl Simulation {
    /// Build a fresh read-only projection of the current state
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state();
        let now = self.now();
        let reserved = state.reserved_ids();

        let accelerators = state
            .fleet()
            .values()
            .map(|a: &Accelerator| AcceleratorSnapshot {
                id: a.id(),
                model: a.model(),
                name: a.name().to_string(),
                vram_gb: a.vram_gb(),
                vram_used: a.vram_used(),
                utilization: a.utilization(),
                current_job: a.current_job(),
                cluster_id: state.clusters().cluster_for(a.id()).map(Cluster::id),
                reserved: reserved.contains(&a.id()),
            })
            .collect();

        let clusters = state
            .clusters()
            .iter()
            .map(|c| ClusterSnapshot {
                id: c.id(),
                name: c.name(),
                members: c.members().to_vec(),
                model: c.model(state.fleet()),
                total_vram: c.total_vram(state.fleet()),
                available_vram: c.available_vram(state.fleet()),
                is_available: c.is_available(state.fleet()),
                current_job: c.current_job(),
            })
            .collect();

        let profile = state.profile(self.total_revenue());
        let contracts = state
            .contracts()
            .iter()
            .map(|c: &Contract| ContractSnapshot {
                id: c.id().to_string(),
                customer: c.spec().customer.clone(),
                title: c.spec().title.clone(),
                status: c.status().label(),
                negotiation_progress: c.negotiation_progress(),
                money_invested: c.money_invested(),
                negotiation_cost_total: c.spec().negotiation_cost_total,
                monthly_income: c.spec().monthly_income,
                reserves_gpus: c.spec().reserves_gpus,
                reserved: c.reserved().to_vec(),
                months_remaining: c.months_remaining(),
                issues: match c.status() {
                    ContractStatus::Available => c.check_requirements(&profile),
                    _ => Vec::new(),
                },
            })
            .collect();

        let marketing = self.marketing();
        let marketing = MarketingSnapshot {
            level: marketing.level(),
            name: marketing
                .current()
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            spawn_multiplier: marketing.spawn_multiplier(),
            value_multiplier: marketing.value_multiplier(),
            sla_extension: marketing.sla_extension(),
            next_cost: marketing.next().map(|t| t.cost),
            next_unlock_revenue: marketing.next().map(|t| t.unlock_revenue),
        };

        let active_spike = self.active_spike().map(|spike| SpikeSnapshot {
            name: spike.kind.name().to_string(),
            description: spike.kind.description().to_string(),
            time_remaining: spike.time_remaining,
            spawn_multiplier: spike.spawn_multiplier(),
            value_multiplier: spike.value_multiplier(),
        });

        let total = state.num_accelerators();
        let stats = StatsSnapshot {
            jobs_completed: self.jobs_completed(),
            sla_misses: self.sla_misses(),
            sla_compliance: self.sla_compliance(),
            avg_utilization: state.average_utilization(),
            revenue_per_hour: self.revenue_per_hour(),
            pue: economy::current_pue(state.fleet()),
            cooling_tier: economy::current_cooling_tier(state.fleet()),
            network_penalty: economy::network_penalty(total),
            scheduler_tier: SchedulerTier::for_revenue(self.total_revenue()),
            spawn_interval: self.spawn_interval(),
        };

        Snapshot {
            time: now,
            cash: self.cash(),
            total_revenue: self.total_revenue(),
            total_power_cost: self.total_power_cost(),
            auto_assign: self.auto_assign(),
            accelerators,
            pending_jobs: state
                .pending_jobs()
                .iter()
                .map(|j| JobSnapshot::capture(j, state.fleet(), now))
                .collect(),
            active_jobs: state
                .active_jobs()
                .iter()
                .map(|j| JobSnapshot::capture(j, state.fleet(), now))
                .collect(),
            clusters,
            unclustered: state.clusters().unclustered(state.fleet()),
            contracts,
            marketing,
            achievements: self.achievements().iter().copied().collect(),
            victory: self.victory(),
            active_spike,
            capacity: CapacitySnapshot {
                total,
                reserved: reserved.len(),
                available: total - reserved.len(),
            },
            stats,
            unlocked_models: economy::unlocked_models(self.catalog(), self.total_revenue()),
        }
    }

    /// SHA-256 hex digest of the snapshot's canonical JSON
    ///
    /// Includes the RNG state, so two simulations with equal digests will
    /// also evolve identically.
    pub fn state_digest(&self) -> Result<String, SimulationError> {
        #[derive(Serialize)]
        struct Digested<'a> {
            snapshot: &'a Snapshot,
            rng_state: u64,
            ticks: u64,
        }

        let snapshot = self.snapshot();
        compute_digest(&Digested {
            snapshot: &snapshot,
            rng_state: self.rng_state(),
            ticks: self.ticks(),
        })
    }
}

// ============================================================================
// Hashing
// ============================================================================

/// Hash any serializable value via canonical (key-sorted) JSON
pub fn compute_digest<T: Serialize>(value: &T) -> Result<String, SimulationError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(value)
        .map_err(|e| SimulationError::Serialization(e.to_string()))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| SimulationError::Serialization(e.to_string()))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

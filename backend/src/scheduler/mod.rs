//! Job scheduling and cluster-aware placement
//!
//! Each automatic pass walks the pending queue in earliest-deadline-first
//! order. A job tries a whole free cluster first (pooled VRAM), then falls
//! back to first-fit over accelerators that are neither clustered nor
//! reserved by a contract. A job gets its full placement or stays queued.
//!
//! # Example
//!
//! ```
//! use gpu_tycoon_core::catalog::{Catalog, GpuModel};
//! use gpu_tycoon_core::scheduler::schedule_pending;
//! use gpu_tycoon_core::{JobRequest, SimulationState};
//!
//! let catalog = Catalog::standard();
//! let mut state = SimulationState::new(&catalog);
//! state.add_accelerator(catalog.accelerator(GpuModel::L4).unwrap());
//! state.enqueue_job(JobRequest::new(1, 16, 5.0, 45.0, 20.0), 0.0);
//!
//! let placed = schedule_pending(&mut state, 0.0).unwrap();
//! assert_eq!(placed.len(), 1);
//! assert_eq!(state.active_jobs().len(), 1);
//! ```

pub mod edf;
pub mod manual;
pub mod placement;

pub use edf::edf_order;
pub use manual::plan_manual;
pub use placement::{
    commit, distribute_vram, plan_cluster_placement, plan_individual_placement, Allocation,
    PlacementPlan,
};

use crate::economy;
use crate::models::accelerator::AcceleratorId;
use crate::models::cluster::{ClusterError, ClusterId};
use crate::models::job::{JobError, JobId};
use crate::models::state::SimulationState;
use thiserror::Error;

/// Errors from manual assignment or from committing a placement
#[derive(Debug, Error, PartialEq)]
pub enum AssignError {
    #[error("Job not found in queue")]
    JobNotFound(JobId),

    #[error("GPU #{0} not found")]
    UnknownAccelerator(AcceleratorId),

    #[error("GPU #{0} selected more than once")]
    DuplicateAccelerator(AcceleratorId),

    #[error("Cluster #{0} is busy")]
    ClusterBusy(ClusterId),

    #[error("Cluster #{cluster} does not have enough combined VRAM ({available}GB < {required}GB)")]
    ClusterVram {
        cluster: ClusterId,
        available: u32,
        required: u32,
    },

    #[error("Job requires exactly {required} GPU(s), but {selected} selected")]
    WrongCount { required: usize, selected: usize },

    #[error("Cluster #{cluster} must be used as a complete unit. Missing GPUs: {missing:?}")]
    PartialCluster {
        cluster: ClusterId,
        missing: Vec<AcceleratorId>,
    },

    #[error("Cannot mix cluster GPUs with non-cluster GPUs")]
    MixedClusterSelection,

    #[error("GPU #{0} is reserved by a contract")]
    Reserved(AcceleratorId),

    #[error("GPU #{id} ({name}) is already busy")]
    Busy { id: AcceleratorId, name: String },

    #[error("GPU #{id} ({name}) has insufficient VRAM ({available}GB < {required}GB required)")]
    InsufficientVram {
        id: AcceleratorId,
        name: String,
        available: u32,
        required: u32,
    },

    #[error(transparent)]
    Job(#[from] JobError),

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Run one automatic scheduling pass; returns the placements made
pub fn schedule_pending(
    state: &mut SimulationState,
    now: f64,
) -> Result<Vec<PlacementPlan>, AssignError> {
    let mut placed = Vec::new();
    if state.pending.is_empty() || state.fleet.is_empty() {
        return Ok(placed);
    }

    let reserved = state.reserved_ids();
    if reserved.len() >= state.fleet.len() {
        return Ok(placed);
    }

    let penalty = economy::network_penalty(state.fleet.len());
    let clustered = state.clusters.clustered_ids();
    let individual: Vec<AcceleratorId> = state
        .fleet
        .keys()
        .copied()
        .filter(|id| !reserved.contains(id) && !clustered.contains(id))
        .collect();

    for job_id in edf_order(&state.pending) {
        let plan = {
            let Some(job) = state.pending_job(job_id) else {
                continue;
            };
            plan_cluster_placement(job, &state.clusters, &state.fleet, &reserved, penalty)
                .or_else(|| plan_individual_placement(job, &individual, &state.fleet, penalty))
        };
        if let Some(plan) = plan {
            commit(state, &plan, now)?;
            placed.push(plan);
        }
    }

    Ok(placed)
}

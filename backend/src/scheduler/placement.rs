//! Placement planning and commit
//!
//! Planning is read-only: it inspects the fleet and produces a
//! [`PlacementPlan`]. Only [`commit`] mutates state, and it validates
//! everything it touches before the first side effect.

use crate::models::accelerator::{Accelerator, AcceleratorId, Fleet};
use crate::models::cluster::{Cluster, ClusterError, ClusterId, ClusterManager};
use crate::models::job::{Job, JobId};
use crate::models::state::SimulationState;
use crate::scheduler::AssignError;
use std::collections::BTreeSet;
use tracing::debug;

/// VRAM granted to one accelerator by a placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub accelerator: AcceleratorId,
    pub vram_gb: u32,
}

/// A decided placement for a single job
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPlan {
    pub job_id: JobId,
    /// Set when the job runs on a whole cluster
    pub cluster_id: Option<ClusterId>,
    /// One entry per accelerator, in purchase order
    pub allocations: Vec<Allocation>,
    pub network_penalty: f64,
}

impl PlacementPlan {
    pub fn accelerator_ids(&self) -> Vec<AcceleratorId> {
        self.allocations.iter().map(|a| a.accelerator).collect()
    }

    pub fn total_vram(&self) -> u32 {
        self.allocations
            .iter()
            .fold(0u32, |acc, a| acc.saturating_add(a.vram_gb))
    }
}

/// True iff the accelerators span more than one model
pub fn is_mixed(accelerators: &[&Accelerator]) -> bool {
    accelerators
        .first()
        .is_some_and(|first| accelerators.iter().any(|a| a.model() != first.model()))
}

/// Spread `required` GB over `members`, largest accelerator first
///
/// Each member is filled up to its own capacity before the next one is
/// touched; members left over get zero. The result is in the members'
/// original order.
pub fn distribute_vram(members: &[&Accelerator], required: u32) -> Vec<Allocation> {
    let mut by_capacity: Vec<&Accelerator> = members.to_vec();
    by_capacity.sort_by_key(|a| std::cmp::Reverse(a.vram_gb()));

    let mut remaining = required;
    let mut granted = Vec::with_capacity(members.len());
    for accel in by_capacity {
        let vram_gb = accel.vram_gb().min(remaining);
        remaining -= vram_gb;
        granted.push((accel.id(), vram_gb));
    }

    members
        .iter()
        .map(|m| Allocation {
            accelerator: m.id(),
            vram_gb: granted
                .iter()
                .find(|(id, _)| *id == m.id())
                .map_or(0, |&(_, vram)| vram),
        })
        .collect()
}

/// Plan `job` onto `cluster` as one pooled unit
///
/// The network penalty only applies when member models are mixed and the job
/// wants more than one accelerator.
pub fn plan_on_cluster(job: &Job, cluster: &Cluster, fleet: &Fleet, penalty: f64) -> PlacementPlan {
    let mut members: Vec<&Accelerator> = cluster
        .members()
        .iter()
        .filter_map(|id| fleet.get(id))
        .collect();
    members.sort_by_key(|a| a.id());

    let network_penalty = if is_mixed(&members) && job.gpu_count() > 1 {
        penalty
    } else {
        0.0
    };

    PlacementPlan {
        job_id: job.id(),
        cluster_id: Some(cluster.id()),
        allocations: distribute_vram(&members, job.vram_per_gpu()),
        network_penalty,
    }
}

/// Find a free cluster whose pooled VRAM covers one unit of the job
///
/// A cluster qualifies only if every member is unreserved and idle. The job's
/// accelerator count is deliberately not multiplied in.
pub fn plan_cluster_placement(
    job: &Job,
    clusters: &ClusterManager,
    fleet: &Fleet,
    reserved: &BTreeSet<AcceleratorId>,
    penalty: f64,
) -> Option<PlacementPlan> {
    let candidates: Vec<&Cluster> = clusters
        .iter()
        .filter(|c| !c.members().iter().any(|id| reserved.contains(id)))
        .filter(|c| c.is_available(fleet))
        .filter(|c| c.total_vram(fleet) >= job.vram_per_gpu())
        .collect();

    let chosen = candidates
        .iter()
        .find(|c| c.is_homogeneous(fleet))
        .or_else(|| candidates.first())?;

    Some(plan_on_cluster(job, chosen, fleet, penalty))
}

/// First-fit FIFO over `candidates` (already unclustered and unreserved)
///
/// Takes the first `gpu_count` idle accelerators with enough VRAM each, in
/// the order given. No partial placement.
pub fn plan_individual_placement(
    job: &Job,
    candidates: &[AcceleratorId],
    fleet: &Fleet,
    penalty: f64,
) -> Option<PlacementPlan> {
    let needed = job.gpu_count();
    if needed == 0 {
        return None;
    }

    let chosen: Vec<&Accelerator> = candidates
        .iter()
        .filter_map(|id| fleet.get(id))
        .filter(|a| a.is_available() && a.vram_gb() >= job.vram_per_gpu())
        .take(needed)
        .collect();
    if chosen.len() < needed {
        return None;
    }

    let network_penalty = if needed > 1 && is_mixed(&chosen) {
        penalty
    } else {
        0.0
    };

    Some(PlacementPlan {
        job_id: job.id(),
        cluster_id: None,
        allocations: chosen
            .iter()
            .map(|a| Allocation {
                accelerator: a.id(),
                vram_gb: job.vram_per_gpu(),
            })
            .collect(),
        network_penalty,
    })
}

/// Apply a plan: start the job, occupy its accelerators, move it to active
///
/// Fails without side effects if the job is no longer queued, an accelerator
/// vanished or is busy, or the cluster is gone.
pub fn commit(
    state: &mut SimulationState,
    plan: &PlacementPlan,
    now: f64,
) -> Result<(), AssignError> {
    let position = state
        .pending
        .iter()
        .position(|j| j.id() == plan.job_id)
        .ok_or(AssignError::JobNotFound(plan.job_id))?;

    if let Some(cluster_id) = plan.cluster_id {
        if state.clusters.get(cluster_id).is_none() {
            return Err(ClusterError::NotFound(cluster_id).into());
        }
    }

    {
        let mut accelerators = Vec::with_capacity(plan.allocations.len());
        for allocation in &plan.allocations {
            let accel = state
                .fleet
                .get(&allocation.accelerator)
                .ok_or(AssignError::UnknownAccelerator(allocation.accelerator))?;
            if !accel.is_available() {
                return Err(AssignError::Busy {
                    id: accel.id(),
                    name: accel.name().to_string(),
                });
            }
            accelerators.push(accel);
        }
        state.pending[position].start(&accelerators, plan.network_penalty, now)?;
    }

    let job = state.pending.remove(position);
    for allocation in &plan.allocations {
        if let Some(accel) = state.fleet.get_mut(&allocation.accelerator) {
            accel.assign(job.id(), allocation.vram_gb);
        }
    }
    if let Some(cluster_id) = plan.cluster_id {
        state.clusters.assign_job(cluster_id, job.id())?;
    }

    debug!(
        job = job.id(),
        cluster = ?plan.cluster_id,
        accelerators = ?plan.accelerator_ids(),
        duration = job.duration(),
        penalty = plan.network_penalty,
        "job placed"
    );
    state.active.push(job);
    Ok(())
}

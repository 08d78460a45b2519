//! Manual placement validation
//!
//! The player picks a job and a set of accelerators. Selecting the exact
//! membership of a cluster places the job on that cluster with pooled VRAM;
//! any other selection must match the job's accelerator count and may not
//! touch a cluster at all.

use crate::models::accelerator::{Accelerator, AcceleratorId};
use crate::models::job::JobId;
use crate::models::state::SimulationState;
use crate::scheduler::placement::{is_mixed, plan_on_cluster, Allocation, PlacementPlan};
use crate::scheduler::AssignError;
use std::collections::BTreeSet;

/// Validate a manual request and turn it into a plan
///
/// Checks run in a fixed order and the first failure is reported. Nothing is
/// mutated.
pub fn plan_manual(
    state: &SimulationState,
    job_id: JobId,
    ids: &[AcceleratorId],
    penalty: f64,
) -> Result<PlacementPlan, AssignError> {
    let job = state
        .pending_job(job_id)
        .ok_or(AssignError::JobNotFound(job_id))?;

    let mut selected: Vec<&Accelerator> = Vec::with_capacity(ids.len());
    let mut seen = BTreeSet::new();
    for &id in ids {
        let accel = state
            .accelerator(id)
            .ok_or(AssignError::UnknownAccelerator(id))?;
        if !seen.insert(id) {
            return Err(AssignError::DuplicateAccelerator(id));
        }
        selected.push(accel);
    }

    let cluster = state.clusters.matching(ids);
    match cluster {
        Some(cluster) => {
            if !cluster.is_available(&state.fleet) {
                return Err(AssignError::ClusterBusy(cluster.id()));
            }
            let total = cluster.total_vram(&state.fleet);
            if total < job.vram_per_gpu() {
                return Err(AssignError::ClusterVram {
                    cluster: cluster.id(),
                    available: total,
                    required: job.vram_per_gpu(),
                });
            }
        }
        None => {
            if selected.len() != job.gpu_count() {
                return Err(AssignError::WrongCount {
                    required: job.gpu_count(),
                    selected: selected.len(),
                });
            }
            for &id in ids {
                if let Some(owner) = state.clusters.cluster_for(id) {
                    let missing: Vec<AcceleratorId> = owner
                        .members()
                        .iter()
                        .copied()
                        .filter(|m| !seen.contains(m))
                        .collect();
                    if !missing.is_empty() {
                        return Err(AssignError::PartialCluster {
                            cluster: owner.id(),
                            missing,
                        });
                    }
                    return Err(AssignError::MixedClusterSelection);
                }
            }
        }
    }

    let reserved = state.reserved_ids();
    if let Some(&id) = ids.iter().find(|id| reserved.contains(id)) {
        return Err(AssignError::Reserved(id));
    }

    if let Some(busy) = selected.iter().find(|a| !a.is_available()) {
        return Err(AssignError::Busy {
            id: busy.id(),
            name: busy.name().to_string(),
        });
    }

    if let Some(cluster) = cluster {
        return Ok(plan_on_cluster(job, cluster, &state.fleet, penalty));
    }

    if let Some(small) = selected.iter().find(|a| a.vram_gb() < job.vram_per_gpu()) {
        return Err(AssignError::InsufficientVram {
            id: small.id(),
            name: small.name().to_string(),
            available: small.vram_gb(),
            required: job.vram_per_gpu(),
        });
    }

    let network_penalty = if job.gpu_count() > 1 && is_mixed(&selected) {
        penalty
    } else {
        0.0
    };
    Ok(PlacementPlan {
        job_id: job.id(),
        cluster_id: None,
        allocations: selected
            .iter()
            .map(|a| Allocation {
                accelerator: a.id(),
                vram_gb: job.vram_per_gpu(),
            })
            .collect(),
        network_penalty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, GpuModel};
    use crate::models::job::JobRequest;

    fn state(models: &[GpuModel]) -> SimulationState {
        let catalog = Catalog::standard();
        let mut state = SimulationState::new(&catalog);
        for &m in models {
            state.add_accelerator(catalog.accelerator(m).unwrap());
        }
        state
    }

    #[test]
    fn test_unknown_job_checked_first() {
        let state = state(&[GpuModel::L4]);
        assert_eq!(
            plan_manual(&state, 5, &[99], 0.25),
            Err(AssignError::JobNotFound(5))
        );
    }

    #[test]
    fn test_count_must_match_outside_clusters() {
        let mut state = state(&[GpuModel::L4, GpuModel::L4]);
        let job = state.enqueue_job(JobRequest::new(1, 16, 5.0, 45.0, 20.0), 0.0);
        let err = plan_manual(&state, job, &[1, 2], 0.25).unwrap_err();
        assert_eq!(err.to_string(), "Job requires exactly 1 GPU(s), but 2 selected");
    }

    #[test]
    fn test_partial_cluster_rejected() {
        let mut state = state(&[GpuModel::A100; 3]);
        state.clusters.create(&[1, 2, 3], &state.fleet.clone()).unwrap();
        let job = state.enqueue_job(JobRequest::new(2, 32, 12.0, 120.0, 35.0), 0.0);
        let err = plan_manual(&state, job, &[1, 2], 0.25).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cluster #1 must be used as a complete unit. Missing GPUs: [3]"
        );
    }

    #[test]
    fn test_mixing_cluster_and_free_rejected() {
        let mut state = state(&[GpuModel::A100; 3]);
        state.clusters.create(&[1, 2], &state.fleet.clone()).unwrap();
        let job = state.enqueue_job(JobRequest::new(3, 32, 12.0, 120.0, 35.0), 0.0);
        assert_eq!(
            plan_manual(&state, job, &[1, 2, 3], 0.25),
            Err(AssignError::MixedClusterSelection)
        );
    }

    #[test]
    fn test_whole_cluster_uses_pooled_vram() {
        let mut state = state(&[GpuModel::L4, GpuModel::L4]);
        state.clusters.create(&[1, 2], &state.fleet.clone()).unwrap();
        // 40GB per unit exceeds each L4 but fits 48GB pooled; count is ignored
        let job = state.enqueue_job(JobRequest::new(4, 40, 20.0, 220.0, 50.0), 0.0);
        let plan = plan_manual(&state, job, &[2, 1], 0.25).unwrap();
        assert_eq!(plan.cluster_id, Some(1));
        assert_eq!(plan.total_vram(), 40);

        let big = state.enqueue_job(JobRequest::new(1, 50, 20.0, 220.0, 50.0), 0.0);
        assert_eq!(
            plan_manual(&state, big, &[1, 2], 0.25).unwrap_err().to_string(),
            "Cluster #1 does not have enough combined VRAM (48GB < 50GB)"
        );
    }

    #[test]
    fn test_vram_checked_per_accelerator() {
        let mut state = state(&[GpuModel::L4]);
        let job = state.enqueue_job(JobRequest::new(1, 32, 12.0, 120.0, 35.0), 0.0);
        assert_eq!(
            plan_manual(&state, job, &[1], 0.25).unwrap_err().to_string(),
            "GPU #1 (NVIDIA L4) has insufficient VRAM (24GB < 32GB required)"
        );
    }

    #[test]
    fn test_mixed_models_pay_network_penalty() {
        let mut state = state(&[GpuModel::A100, GpuModel::H100]);
        let job = state.enqueue_job(JobRequest::new(2, 32, 12.0, 120.0, 35.0), 0.0);
        let plan = plan_manual(&state, job, &[1, 2], 0.25).unwrap();
        assert_eq!(plan.network_penalty, 0.25);
        assert_eq!(plan.cluster_id, None);
    }
}

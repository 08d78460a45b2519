//! Simulation State
//!
//! Owns every entity of a running datacenter: the accelerator fleet, the
//! pending and active job queues, clusters and contracts.
//!
//! # Critical Invariants
//!
//! 1. **Single occupancy**: an accelerator holds at most one job, and that
//!    job is in the active queue and lists the accelerator as assigned
//! 2. **Exclusive membership**: an accelerator belongs to at most one cluster
//! 3. **Homogeneity**: every cluster spans exactly one accelerator model
//! 4. **Id references only**: jobs, clusters and contracts refer to
//!    accelerators by id; nothing else owns an accelerator

use crate::catalog::{AcceleratorSpec, Catalog};
use crate::economy;
use crate::models::accelerator::{Accelerator, AcceleratorId, Fleet};
use crate::models::cluster::ClusterManager;
use crate::models::contract::{ContractManager, FleetProfile};
use crate::models::job::{Job, JobId, JobRequest};
use std::collections::{BTreeMap, BTreeSet};

/// Complete entity state of one simulation
///
/// # Example
///
/// ```rust
/// use gpu_tycoon_core::catalog::{Catalog, GpuModel};
/// use gpu_tycoon_core::SimulationState;
///
/// let catalog = Catalog::standard();
/// let mut state = SimulationState::new(&catalog);
/// let id = state.add_accelerator(catalog.accelerator(GpuModel::L4).unwrap());
///
/// assert_eq!(id, 1);
/// assert_eq!(state.num_accelerators(), 1);
/// assert_eq!(state.unreserved_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) fleet: Fleet,

    /// Jobs waiting for placement, in arrival order
    pub(crate) pending: Vec<Job>,

    /// Jobs currently running, in start order
    pub(crate) active: Vec<Job>,

    pub(crate) clusters: ClusterManager,
    pub(crate) contracts: ContractManager,

    next_accelerator_id: AcceleratorId,
    next_job_id: JobId,
}

impl SimulationState {
    /// Empty fleet, empty queues, one contract per catalog entry
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            fleet: Fleet::new(),
            pending: Vec::new(),
            active: Vec::new(),
            clusters: ClusterManager::new(),
            contracts: ContractManager::new(catalog),
            next_accelerator_id: 1,
            next_job_id: 1,
        }
    }

    /// Install a new idle accelerator and return its id
    pub fn add_accelerator(&mut self, spec: &AcceleratorSpec) -> AcceleratorId {
        let id = self.next_accelerator_id;
        self.next_accelerator_id += 1;
        self.fleet.insert(id, Accelerator::new(id, spec));
        id
    }

    /// Append a pending job and return its id
    pub fn enqueue_job(&mut self, request: JobRequest, now: f64) -> JobId {
        let id = self.next_job_id;
        self.next_job_id += 1;
        self.pending.push(Job::new(id, request, now));
        id
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn accelerator(&self, id: AcceleratorId) -> Option<&Accelerator> {
        self.fleet.get(&id)
    }

    pub fn num_accelerators(&self) -> usize {
        self.fleet.len()
    }

    pub fn pending_jobs(&self) -> &[Job] {
        &self.pending
    }

    pub fn active_jobs(&self) -> &[Job] {
        &self.active
    }

    pub fn pending_job(&self, id: JobId) -> Option<&Job> {
        self.pending.iter().find(|j| j.id() == id)
    }

    pub fn active_job(&self, id: JobId) -> Option<&Job> {
        self.active.iter().find(|j| j.id() == id)
    }

    pub fn clusters(&self) -> &ClusterManager {
        &self.clusters
    }

    pub fn contracts(&self) -> &ContractManager {
        &self.contracts
    }

    /// Accelerators held by active contracts
    pub fn reserved_ids(&self) -> BTreeSet<AcceleratorId> {
        self.contracts.reserved_ids()
    }

    pub fn is_reserved(&self, id: AcceleratorId) -> bool {
        self.contracts.active().any(|c| c.reserved().contains(&id))
    }

    /// Accelerators the scheduler may use
    pub fn unreserved_count(&self) -> usize {
        let reserved = self.reserved_ids();
        self.fleet.keys().filter(|id| !reserved.contains(id)).count()
    }

    /// Fleet facts used for contract eligibility
    pub fn profile(&self, total_revenue: f64) -> FleetProfile {
        FleetProfile {
            accelerators: self.fleet.len(),
            h100_class: self
                .fleet
                .values()
                .filter(|a| a.model().is_h100_class())
                .count(),
            cooling: economy::current_cooling_tier(&self.fleet),
            total_revenue,
        }
    }

    /// Mean utilization across the whole fleet (0 when empty)
    pub fn average_utilization(&self) -> f64 {
        if self.fleet.is_empty() {
            return 0.0;
        }
        self.fleet.values().map(|a| a.utilization()).sum::<f64>() / self.fleet.len() as f64
    }

    /// Describe every broken structural invariant (empty when consistent)
    ///
    /// Intended for tests and debug assertions; cost is linear in the state.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let active: BTreeMap<JobId, &Job> = self.active.iter().map(|j| (j.id(), j)).collect();
        for accel in self.fleet.values() {
            if let Some(job_id) = accel.current_job() {
                match active.get(&job_id) {
                    None => violations.push(format!(
                        "accelerator {} holds job {} which is not active",
                        accel.id(),
                        job_id
                    )),
                    Some(job) if !job.assigned().contains(&accel.id()) => violations.push(format!(
                        "accelerator {} holds job {} which is not assigned to it",
                        accel.id(),
                        job_id
                    )),
                    _ => {}
                }
            }
        }

        for job in &self.active {
            for id in job.assigned() {
                if self.fleet.get(id).and_then(|a| a.current_job()) != Some(job.id()) {
                    violations.push(format!(
                        "job {} lists accelerator {} which does not hold it",
                        job.id(),
                        id
                    ));
                }
            }
        }

        for job in &self.pending {
            if !job.is_pending() {
                violations.push(format!("queued job {} has already started", job.id()));
            }
        }

        let mut seen = BTreeSet::new();
        for cluster in self.clusters.iter() {
            for &id in cluster.members() {
                if !seen.insert(id) {
                    violations.push(format!("accelerator {} is in two clusters", id));
                }
            }
            if !cluster.is_homogeneous(&self.fleet) {
                violations.push(format!("cluster {} mixes accelerator models", cluster.id()));
            }
            if cluster.is_empty() {
                violations.push(format!("cluster {} is empty", cluster.id()));
            }
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::GpuModel;

    #[test]
    fn test_ids_are_sequential() {
        let catalog = Catalog::standard();
        let mut state = SimulationState::new(&catalog);
        let spec = catalog.accelerator(GpuModel::L4).unwrap();
        assert_eq!(state.add_accelerator(spec), 1);
        assert_eq!(state.add_accelerator(spec), 2);

        let first = state.enqueue_job(JobRequest::new(1, 16, 5.0, 45.0, 20.0), 0.0);
        let second = state.enqueue_job(JobRequest::new(1, 16, 5.0, 45.0, 20.0), 1.0);
        assert_eq!((first, second), (1, 2));
        assert_eq!(state.pending_job(2).unwrap().sla_deadline(), 21.0);
    }

    #[test]
    fn test_profile_counts_h100_class() {
        let catalog = Catalog::standard();
        let mut state = SimulationState::new(&catalog);
        for model in [GpuModel::L4, GpuModel::H100, GpuModel::GB200] {
            state.add_accelerator(catalog.accelerator(model).unwrap());
        }
        let profile = state.profile(10.0);
        assert_eq!(profile.accelerators, 3);
        assert_eq!(profile.h100_class, 2);
        assert_eq!(profile.cooling, crate::catalog::CoolingTier::AdvancedLiquid);
    }

    #[test]
    fn test_detects_dangling_occupancy() {
        let catalog = Catalog::standard();
        let mut state = SimulationState::new(&catalog);
        let id = state.add_accelerator(catalog.accelerator(GpuModel::L4).unwrap());
        assert!(state.invariant_violations().is_empty());

        state.fleet.get_mut(&id).unwrap().assign(99, 16);
        assert_eq!(state.invariant_violations().len(), 1);
    }
}

//! Cluster model
//!
//! A cluster groups 2 to 8 accelerators of one model into a unit that the
//! scheduler places as if it were a single large accelerator (pooled VRAM).
//!
//! Clusters only store member ids. Every capacity figure is projected from
//! the fleet on demand and never cached.

use crate::catalog::GpuModel;
use crate::models::accelerator::{AcceleratorId, Fleet};
use crate::models::job::JobId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Cluster identifier (monotonic, starting at 1, never reused)
pub type ClusterId = u32;

pub const MIN_CLUSTER_SIZE: usize = 2;
pub const MAX_CLUSTER_SIZE: usize = 8;

/// Errors that can occur during cluster operations
#[derive(Debug, Error, PartialEq)]
pub enum ClusterError {
    #[error("Need at least 2 GPUs to create cluster")]
    TooFew,

    #[error("Maximum 8 GPUs per cluster")]
    TooMany,

    #[error("GPU #{0} not found")]
    UnknownAccelerator(AcceleratorId),

    #[error("GPU #{0} is listed more than once")]
    DuplicateMember(AcceleratorId),

    #[error("GPU #{0} is already in a cluster")]
    AlreadyClustered(AcceleratorId),

    #[error("GPU #{accelerator} is already in cluster #{cluster}")]
    AlreadyInCluster {
        accelerator: AcceleratorId,
        cluster: ClusterId,
    },

    #[error("Can only cluster same GPU types! ({0} are different)")]
    MixedTypes(String),

    #[error("Cluster not found")]
    NotFound(ClusterId),

    #[error("Can only add {expected} to this cluster (tried to add {found})")]
    TypeMismatch { expected: GpuModel, found: GpuModel },

    #[error("Cluster is full (max 8 GPUs)")]
    Full,

    #[error("GPU not in this cluster")]
    NotAMember(AcceleratorId),
}

/// A homogeneous group of accelerators scheduled as one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    id: ClusterId,
    members: Vec<AcceleratorId>,
    current_job: Option<JobId>,
}

impl Cluster {
    fn new(id: ClusterId, members: Vec<AcceleratorId>) -> Self {
        Self {
            id,
            members,
            current_job: None,
        }
    }

    pub fn id(&self) -> ClusterId {
        self.id
    }

    pub fn name(&self) -> String {
        format!("Cluster #{}", self.id)
    }

    /// Member ids in the order they joined
    pub fn members(&self) -> &[AcceleratorId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_CLUSTER_SIZE
    }

    pub fn contains(&self, id: AcceleratorId) -> bool {
        self.members.contains(&id)
    }

    /// True iff `ids` is exactly this cluster's membership (any order)
    pub fn matches_members(&self, ids: &[AcceleratorId]) -> bool {
        let requested: BTreeSet<_> = ids.iter().copied().collect();
        let members: BTreeSet<_> = self.members.iter().copied().collect();
        requested.len() == ids.len() && requested == members
    }

    pub fn current_job(&self) -> Option<JobId> {
        self.current_job
    }

    /// Sum of member VRAM (saturates at `u32::MAX`)
    pub fn total_vram(&self, fleet: &Fleet) -> u32 {
        self.members
            .iter()
            .filter_map(|id| fleet.get(id))
            .fold(0u32, |acc, a| acc.saturating_add(a.vram_gb()))
    }

    /// Sum of member VRAM not currently allocated (saturates at `u32::MAX`)
    pub fn available_vram(&self, fleet: &Fleet) -> u32 {
        self.members
            .iter()
            .filter_map(|id| fleet.get(id))
            .fold(0u32, |acc, a| {
                acc.saturating_add(a.vram_gb().saturating_sub(a.vram_used()))
            })
    }

    /// True iff no job holds the cluster and every member is idle
    pub fn is_available(&self, fleet: &Fleet) -> bool {
        self.current_job.is_none()
            && self
                .members
                .iter()
                .all(|id| fleet.get(id).is_some_and(|a| a.is_available()))
    }

    /// True iff members span at most one model
    pub fn is_homogeneous(&self, fleet: &Fleet) -> bool {
        self.models(fleet).len() <= 1
    }

    /// The model shared by the members (most common one if ever mixed)
    pub fn model(&self, fleet: &Fleet) -> Option<GpuModel> {
        let mut counts: BTreeMap<GpuModel, usize> = BTreeMap::new();
        for accel in self.members.iter().filter_map(|id| fleet.get(id)) {
            *counts.entry(accel.model()).or_default() += 1;
        }
        counts
            .into_iter()
            .max_by_key(|&(_, count)| count)
            .map(|(model, _)| model)
    }

    fn models(&self, fleet: &Fleet) -> BTreeSet<GpuModel> {
        self.members
            .iter()
            .filter_map(|id| fleet.get(id))
            .map(|a| a.model())
            .collect()
    }
}

/// Owns every cluster and enforces membership rules
///
/// # Example
/// ```
/// use gpu_tycoon_core::catalog::{Catalog, GpuModel};
/// use gpu_tycoon_core::{Accelerator, ClusterManager, Fleet};
///
/// let catalog = Catalog::standard();
/// let spec = catalog.accelerator(GpuModel::L4).unwrap();
/// let mut fleet = Fleet::new();
/// for id in 1..=3 {
///     fleet.insert(id, Accelerator::new(id, spec));
/// }
///
/// let mut clusters = ClusterManager::new();
/// let cluster_id = clusters.create(&[1, 2], &fleet).unwrap();
/// assert_eq!(clusters.get(cluster_id).unwrap().total_vram(&fleet), 48);
/// assert_eq!(clusters.unclustered(&fleet), vec![3]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterManager {
    clusters: BTreeMap<ClusterId, Cluster>,
    next_id: ClusterId,
}

impl Default for ClusterManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterManager {
    pub fn new() -> Self {
        Self {
            clusters: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Group `ids` into a new cluster
    ///
    /// # Errors
    /// Size outside 2..=8, unknown or repeated ids, ids already clustered,
    /// or more than one accelerator model.
    pub fn create(
        &mut self,
        ids: &[AcceleratorId],
        fleet: &Fleet,
    ) -> Result<ClusterId, ClusterError> {
        if ids.len() < MIN_CLUSTER_SIZE {
            return Err(ClusterError::TooFew);
        }
        if ids.len() > MAX_CLUSTER_SIZE {
            return Err(ClusterError::TooMany);
        }

        let mut seen = BTreeSet::new();
        let mut models = BTreeSet::new();
        for &id in ids {
            let accel = fleet
                .get(&id)
                .ok_or(ClusterError::UnknownAccelerator(id))?;
            if !seen.insert(id) {
                return Err(ClusterError::DuplicateMember(id));
            }
            if self.cluster_for(id).is_some() {
                return Err(ClusterError::AlreadyClustered(id));
            }
            models.insert(accel.model());
        }

        if models.len() > 1 {
            let names: Vec<String> = models.iter().map(|m| m.to_string()).collect();
            return Err(ClusterError::MixedTypes(names.join(", ")));
        }

        let id = self.next_id;
        self.next_id += 1;
        self.clusters.insert(id, Cluster::new(id, ids.to_vec()));
        Ok(id)
    }

    /// Add one accelerator to an existing cluster
    pub fn add_member(
        &mut self,
        cluster_id: ClusterId,
        accelerator: AcceleratorId,
        fleet: &Fleet,
    ) -> Result<(), ClusterError> {
        if !self.clusters.contains_key(&cluster_id) {
            return Err(ClusterError::NotFound(cluster_id));
        }
        let new_model = fleet
            .get(&accelerator)
            .ok_or(ClusterError::UnknownAccelerator(accelerator))?
            .model();
        if let Some(existing) = self.cluster_for(accelerator) {
            return Err(ClusterError::AlreadyInCluster {
                accelerator,
                cluster: existing.id(),
            });
        }

        let cluster = self
            .clusters
            .get_mut(&cluster_id)
            .ok_or(ClusterError::NotFound(cluster_id))?;
        if let Some(expected) = cluster.model(fleet) {
            if expected != new_model {
                return Err(ClusterError::TypeMismatch {
                    expected,
                    found: new_model,
                });
            }
        }
        if cluster.is_full() {
            return Err(ClusterError::Full);
        }

        cluster.members.push(accelerator);
        Ok(())
    }

    /// Remove one member; returns true if that emptied and deleted the cluster
    pub fn remove_member(
        &mut self,
        cluster_id: ClusterId,
        accelerator: AcceleratorId,
    ) -> Result<bool, ClusterError> {
        let cluster = self
            .clusters
            .get_mut(&cluster_id)
            .ok_or(ClusterError::NotFound(cluster_id))?;
        let position = cluster
            .members
            .iter()
            .position(|&id| id == accelerator)
            .ok_or(ClusterError::NotAMember(accelerator))?;
        cluster.members.remove(position);

        if cluster.members.is_empty() {
            self.clusters.remove(&cluster_id);
            return Ok(true);
        }
        Ok(false)
    }

    /// Delete a cluster and return it
    ///
    /// Members are freed from the grouping only; a job running on them keeps
    /// running until it completes.
    pub fn disband(&mut self, cluster_id: ClusterId) -> Result<Cluster, ClusterError> {
        self.clusters
            .remove(&cluster_id)
            .ok_or(ClusterError::NotFound(cluster_id))
    }

    /// Record that `job` now occupies the cluster
    pub fn assign_job(&mut self, cluster_id: ClusterId, job: JobId) -> Result<(), ClusterError> {
        let cluster = self
            .clusters
            .get_mut(&cluster_id)
            .ok_or(ClusterError::NotFound(cluster_id))?;
        cluster.current_job = Some(job);
        Ok(())
    }

    /// Clear every cluster occupied by `job`; returns how many were cleared
    pub fn release_job(&mut self, job: JobId) -> usize {
        let mut cleared = 0;
        for cluster in self.clusters.values_mut() {
            if cluster.current_job == Some(job) {
                cluster.current_job = None;
                cleared += 1;
            }
        }
        cleared
    }

    pub fn get(&self, cluster_id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(&cluster_id)
    }

    /// The cluster containing `accelerator`, if any
    pub fn cluster_for(&self, accelerator: AcceleratorId) -> Option<&Cluster> {
        self.clusters.values().find(|c| c.contains(accelerator))
    }

    /// The cluster whose membership is exactly `ids`, if any
    pub fn matching(&self, ids: &[AcceleratorId]) -> Option<&Cluster> {
        self.clusters.values().find(|c| c.matches_members(ids))
    }

    /// Clusters in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Every accelerator id that belongs to some cluster
    pub fn clustered_ids(&self) -> BTreeSet<AcceleratorId> {
        self.clusters
            .values()
            .flat_map(|c| c.members.iter().copied())
            .collect()
    }

    /// Fleet ids that belong to no cluster, in purchase order
    pub fn unclustered(&self, fleet: &Fleet) -> Vec<AcceleratorId> {
        let clustered = self.clustered_ids();
        fleet
            .keys()
            .copied()
            .filter(|id| !clustered.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::accelerator::Accelerator;

    fn fleet(models: &[GpuModel]) -> Fleet {
        let catalog = Catalog::standard();
        models
            .iter()
            .enumerate()
            .map(|(i, &model)| {
                let id = i as AcceleratorId + 1;
                (id, Accelerator::new(id, catalog.accelerator(model).unwrap()))
            })
            .collect()
    }

    #[test]
    fn test_pooled_vram_saturates() {
        let mut spec = Catalog::standard().accelerator(GpuModel::L4).unwrap().clone();
        spec.vram_gb = u32::MAX - 10;
        let mut fleet: Fleet = (1..=3).map(|id| (id, Accelerator::new(id, &spec))).collect();
        let mut clusters = ClusterManager::new();
        let id = clusters.create(&[1, 2, 3], &fleet).unwrap();
        let cluster = clusters.get(id).unwrap();

        assert_eq!(cluster.total_vram(&fleet), u32::MAX);
        assert_eq!(cluster.available_vram(&fleet), u32::MAX);

        if let Some(a) = fleet.get_mut(&1) {
            a.assign(7, u32::MAX - 10);
        }
        if let Some(a) = fleet.get_mut(&2) {
            a.assign(7, u32::MAX - 10);
        }
        assert_eq!(cluster.available_vram(&fleet), u32::MAX - 10);
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let fleet = fleet(&[GpuModel::L4; 4]);
        let mut clusters = ClusterManager::new();
        assert_eq!(clusters.create(&[1, 2], &fleet), Ok(1));
        assert_eq!(clusters.create(&[3, 4], &fleet), Ok(2));
    }

    #[test]
    fn test_create_rejects_bad_sizes() {
        let fleet = fleet(&[GpuModel::L4; 9]);
        let mut clusters = ClusterManager::new();
        assert_eq!(clusters.create(&[1], &fleet), Err(ClusterError::TooFew));
        let nine: Vec<AcceleratorId> = (1..=9).collect();
        assert_eq!(clusters.create(&nine, &fleet), Err(ClusterError::TooMany));
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_create_rejects_mixed_models() {
        let fleet = fleet(&[GpuModel::L4, GpuModel::A100]);
        let mut clusters = ClusterManager::new();
        let err = clusters.create(&[1, 2], &fleet).unwrap_err();
        assert_eq!(err, ClusterError::MixedTypes("L4, A100".to_string()));
        assert_eq!(
            err.to_string(),
            "Can only cluster same GPU types! (L4, A100 are different)"
        );
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_create_rejects_repeated_and_clustered_ids() {
        let fleet = fleet(&[GpuModel::L4; 4]);
        let mut clusters = ClusterManager::new();
        assert_eq!(
            clusters.create(&[1, 1], &fleet),
            Err(ClusterError::DuplicateMember(1))
        );
        clusters.create(&[1, 2], &fleet).unwrap();
        assert_eq!(
            clusters.create(&[2, 3], &fleet),
            Err(ClusterError::AlreadyClustered(2))
        );
    }

    #[test]
    fn test_add_member_checks_type_then_capacity() {
        let mut models = vec![GpuModel::L4; 9];
        models.push(GpuModel::A100);
        let fleet = fleet(&models);
        let mut clusters = ClusterManager::new();
        let id = clusters.create(&[1, 2, 3, 4, 5, 6, 7, 8], &fleet).unwrap();

        assert_eq!(
            clusters.add_member(id, 10, &fleet),
            Err(ClusterError::TypeMismatch {
                expected: GpuModel::L4,
                found: GpuModel::A100
            })
        );
        assert_eq!(clusters.add_member(id, 9, &fleet), Err(ClusterError::Full));
        assert_eq!(
            clusters.add_member(99, 9, &fleet),
            Err(ClusterError::NotFound(99))
        );
    }

    #[test]
    fn test_remove_last_member_deletes_cluster() {
        let fleet = fleet(&[GpuModel::L4; 2]);
        let mut clusters = ClusterManager::new();
        let id = clusters.create(&[1, 2], &fleet).unwrap();
        assert_eq!(clusters.remove_member(id, 1), Ok(false));
        assert_eq!(clusters.remove_member(id, 1), Err(ClusterError::NotAMember(1)));
        assert_eq!(clusters.remove_member(id, 2), Ok(true));
        assert!(clusters.get(id).is_none());
    }

    #[test]
    fn test_pooled_projections_follow_member_state() {
        let mut fleet = fleet(&[GpuModel::A100; 2]);
        let mut clusters = ClusterManager::new();
        let id = clusters.create(&[1, 2], &fleet).unwrap();

        fleet.get_mut(&1).unwrap().assign(7, 50);
        let cluster = clusters.get(id).unwrap();
        assert_eq!(cluster.total_vram(&fleet), 160);
        assert_eq!(cluster.available_vram(&fleet), 110);
        assert!(!cluster.is_available(&fleet));
        assert!(cluster.is_homogeneous(&fleet));
        assert_eq!(cluster.model(&fleet), Some(GpuModel::A100));
    }

    #[test]
    fn test_release_job_clears_matching_clusters_only() {
        let fleet = fleet(&[GpuModel::L4; 4]);
        let mut clusters = ClusterManager::new();
        let a = clusters.create(&[1, 2], &fleet).unwrap();
        let b = clusters.create(&[3, 4], &fleet).unwrap();
        clusters.assign_job(a, 11).unwrap();
        clusters.assign_job(b, 12).unwrap();

        assert_eq!(clusters.release_job(11), 1);
        assert_eq!(clusters.get(a).unwrap().current_job(), None);
        assert_eq!(clusters.get(b).unwrap().current_job(), Some(12));
    }

    #[test]
    fn test_matching_ignores_order() {
        let fleet = fleet(&[GpuModel::L4; 3]);
        let mut clusters = ClusterManager::new();
        let id = clusters.create(&[1, 2, 3], &fleet).unwrap();
        assert_eq!(clusters.matching(&[3, 1, 2]).map(|c| c.id()), Some(id));
        assert!(clusters.matching(&[1, 2]).is_none());
        assert!(clusters.matching(&[1, 2, 3, 3]).is_none());
    }
}

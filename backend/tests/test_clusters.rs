//! Tests for cluster membership rules
//!
//! Clusters are homogeneous groups of 2..=8 accelerators; an accelerator
//! belongs to at most one cluster.

use gpu_tycoon_core::catalog::{Catalog, GpuModel};
use gpu_tycoon_core::models::cluster::{MAX_CLUSTER_SIZE, MIN_CLUSTER_SIZE};
use gpu_tycoon_core::{
    Accelerator, ActionError, ClusterError, ClusterManager, Fleet, Simulation, SimulationConfig,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn fleet(models: &[GpuModel]) -> Fleet {
    let catalog = Catalog::standard();
    models
        .iter()
        .enumerate()
        .map(|(i, &m)| {
            let id = i as u32 + 1;
            (id, Accelerator::new(id, catalog.accelerator(m).unwrap()))
        })
        .collect()
}

fn rich_sim() -> Simulation {
    let mut catalog = Catalog::standard();
    for spec in &mut catalog.accelerators {
        spec.unlock_revenue = 0.0;
    }
    let config = SimulationConfig {
        starting_cash: 10_000_000.0,
        ..Default::default()
    };
    Simulation::new(config, Arc::new(catalog)).unwrap()
}

fn assert_homogeneous(clusters: &ClusterManager, fleet: &Fleet) {
    let mut seen = BTreeSet::new();
    for cluster in clusters.iter() {
        assert!(cluster.is_homogeneous(fleet), "cluster {} is mixed", cluster.id());
        assert!(cluster.len() <= MAX_CLUSTER_SIZE);
        for &id in cluster.members() {
            assert!(seen.insert(id), "accelerator {id} in two clusters");
        }
    }
}

#[test]
fn test_size_limits() {
    let fleet = fleet(&[GpuModel::L4; 10]);
    let mut clusters = ClusterManager::new();

    assert_eq!(clusters.create(&[1], &fleet), Err(ClusterError::TooFew));
    assert_eq!(clusters.create(&[], &fleet), Err(ClusterError::TooFew));
    let nine: Vec<u32> = (1..=9).collect();
    assert_eq!(clusters.create(&nine, &fleet), Err(ClusterError::TooMany));
    assert!(clusters.is_empty());

    let eight: Vec<u32> = (1..=8).collect();
    assert!(clusters.create(&eight, &fleet).is_ok());
    assert_eq!(MIN_CLUSTER_SIZE, 2);
}

#[test]
fn test_mixed_types_rejected() {
    let fleet = fleet(&[GpuModel::L4, GpuModel::A100]);
    let mut clusters = ClusterManager::new();
    let err = clusters.create(&[1, 2], &fleet).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Can only cluster same GPU types! (L4, A100 are different)"
    );
    assert!(clusters.is_empty());
}

#[test]
fn test_accelerator_in_one_cluster_only() {
    let fleet = fleet(&[GpuModel::L4; 4]);
    let mut clusters = ClusterManager::new();
    clusters.create(&[1, 2], &fleet).unwrap();

    assert_eq!(
        clusters.create(&[2, 3], &fleet),
        Err(ClusterError::AlreadyClustered(2))
    );
    assert_eq!(
        clusters.add_member(1, 1, &fleet),
        Err(ClusterError::AlreadyInCluster {
            accelerator: 1,
            cluster: 1
        })
    );
    assert_homogeneous(&clusters, &fleet);
}

#[test]
fn test_duplicate_ids_rejected() {
    let fleet = fleet(&[GpuModel::L4; 2]);
    let mut clusters = ClusterManager::new();
    assert_eq!(
        clusters.create(&[1, 1], &fleet),
        Err(ClusterError::DuplicateMember(1))
    );
}

#[test]
fn test_unknown_accelerator_rejected() {
    let fleet = fleet(&[GpuModel::L4; 2]);
    let mut clusters = ClusterManager::new();
    assert_eq!(
        clusters.create(&[1, 7], &fleet),
        Err(ClusterError::UnknownAccelerator(7))
    );
}

#[test]
fn test_add_member_keeps_homogeneity() {
    let fleet = fleet(&[GpuModel::H100, GpuModel::H100, GpuModel::A100, GpuModel::H100]);
    let mut clusters = ClusterManager::new();
    let id = clusters.create(&[1, 2], &fleet).unwrap();

    assert_eq!(
        clusters.add_member(id, 3, &fleet),
        Err(ClusterError::TypeMismatch {
            expected: GpuModel::H100,
            found: GpuModel::A100
        })
    );
    clusters.add_member(id, 4, &fleet).unwrap();
    assert_eq!(clusters.get(id).unwrap().members(), &[1, 2, 4]);
    assert_eq!(clusters.get(id).unwrap().total_vram(&fleet), 240);
    assert_homogeneous(&clusters, &fleet);
}

#[test]
fn test_add_member_rejects_full_cluster() {
    let fleet = fleet(&[GpuModel::L4; 9]);
    let mut clusters = ClusterManager::new();
    let eight: Vec<u32> = (1..=8).collect();
    let id = clusters.create(&eight, &fleet).unwrap();
    assert_eq!(clusters.add_member(id, 9, &fleet), Err(ClusterError::Full));
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
    assert_eq!(clusters.remove_member(id, 2), Err(ClusterError::NotFound(id)));
}

#[test]
fn test_ids_are_not_reused() {
    let fleet = fleet(&[GpuModel::L4; 4]);
    let mut clusters = ClusterManager::new();
    let first = clusters.create(&[1, 2], &fleet).unwrap();
    clusters.disband(first).unwrap();
    let second = clusters.create(&[1, 2], &fleet).unwrap();
    assert_eq!(first, 1);
    assert_eq!(second, 2);
    assert_eq!(clusters.get(second).unwrap().name(), "Cluster #2");
}

#[test]
fn test_matching_requires_exact_membership() {
    let fleet = fleet(&[GpuModel::L4; 3]);
    let mut clusters = ClusterManager::new();
    clusters.create(&[1, 2, 3], &fleet).unwrap();
    assert!(clusters.matching(&[3, 1, 2]).is_some());
    assert!(clusters.matching(&[1, 2]).is_none());
    assert!(clusters.matching(&[1, 2, 3, 3]).is_none());
}

// ============================================================================
// Through the simulation
// ============================================================================

#[test]
fn test_simulation_cluster_scenarios() {
    let mut sim = rich_sim();
    let l4 = sim.purchase_accelerator(GpuModel::L4).unwrap();
    let a100 = sim.purchase_accelerator(GpuModel::A100).unwrap();

    // two different types
    let err = sim.create_cluster(&[l4, a100]).unwrap_err();
    assert!(matches!(err, ActionError::Cluster(ClusterError::MixedTypes(_))));
    assert!(sim.state().clusters().is_empty());

    // one accelerator
    let err = sim.create_cluster(&[l4]).unwrap_err();
    assert_eq!(err.to_string(), "Need at least 2 GPUs to create cluster");

    // nine accelerators
    let mut nine = vec![l4];
    for _ in 0..8 {
        nine.push(sim.purchase_accelerator(GpuModel::L4).unwrap());
    }
    let err = sim.create_cluster(&nine).unwrap_err();
    assert_eq!(err.to_string(), "Maximum 8 GPUs per cluster");
    assert!(sim.state().clusters().is_empty());

    let id = sim.create_cluster(&nine[..8]).unwrap();
    assert_eq!(sim.state().clusters().get(id).unwrap().len(), 8);
    assert_eq!(sim.event_log().events_of_type("ClusterCreated").len(), 1);
}

#[test]
fn test_simulation_remove_and_disband() {
    let mut sim = rich_sim();
    let a = sim.purchase_accelerator(GpuModel::H100).unwrap();
    let b = sim.purchase_accelerator(GpuModel::H100).unwrap();
    let c = sim.purchase_accelerator(GpuModel::H100).unwrap();

    let id = sim.create_cluster(&[a, b]).unwrap();
    sim.add_to_cluster(id, c).unwrap();
    assert_eq!(sim.remove_from_cluster(id, a), Ok(false));
    assert_eq!(sim.state().clusters().unclustered(sim.state().fleet()), vec![a]);

    sim.disband_cluster(id).unwrap();
    assert!(sim.state().clusters().is_empty());
    assert_eq!(
        sim.disband_cluster(id),
        Err(ActionError::Cluster(ClusterError::NotFound(id)))
    );
}

#[test]
fn test_add_unknown_accelerator_through_simulation() {
    let mut sim = rich_sim();
    let a = sim.purchase_accelerator(GpuModel::L4).unwrap();
    let b = sim.purchase_accelerator(GpuModel::L4).unwrap();
    let id = sim.create_cluster(&[a, b]).unwrap();
    assert_eq!(sim.add_to_cluster(id, 42), Err(ActionError::Unavailable(42)));
}

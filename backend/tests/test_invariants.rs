//! Property tests: arbitrary player action sequences never break the
//! placement and membership invariants

use gpu_tycoon_core::catalog::{Catalog, GpuModel};
use gpu_tycoon_core::models::cluster::MAX_CLUSTER_SIZE;
use gpu_tycoon_core::{JobId, Simulation, SimulationConfig};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Buy(GpuModel),
    Cluster(Vec<u32>),
    Add(u32, u32),
    Remove(u32, u32),
    Disband(u32),
    Assign(usize, Vec<u32>),
    Tick(u8),
    Toggle,
}

fn model() -> impl Strategy<Value = GpuModel> {
    prop_oneof![
        Just(GpuModel::L4),
        Just(GpuModel::A100),
        Just(GpuModel::H100),
        Just(GpuModel::GB200),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => model().prop_map(Op::Buy),
        2 => prop::collection::vec(1u32..12, 0..10).prop_map(Op::Cluster),
        1 => (1u32..4, 1u32..12).prop_map(|(c, a)| Op::Add(c, a)),
        1 => (1u32..4, 1u32..12).prop_map(|(c, a)| Op::Remove(c, a)),
        1 => (1u32..4).prop_map(Op::Disband),
        2 => (0usize..8, prop::collection::vec(1u32..12, 0..5))
            .prop_map(|(j, ids)| Op::Assign(j, ids)),
        6 => (0u8..50).prop_map(Op::Tick),
        1 => Just(Op::Toggle),
    ]
}

fn open_sim() -> Simulation {
    let mut catalog = Catalog::standard();
    for spec in &mut catalog.accelerators {
        spec.unlock_revenue = 0.0;
    }
    let config = SimulationConfig {
        starting_cash: 5_000_000.0,
        ..Default::default()
    };
    Simulation::new(config, Arc::new(catalog)).unwrap()
}

fn apply(sim: &mut Simulation, op: &Op) {
    // rejected actions are fine; only the resulting state matters
    match op {
        Op::Buy(model) => {
            let _ = sim.purchase_accelerator(*model);
        }
        Op::Cluster(ids) => {
            let _ = sim.create_cluster(ids);
        }
        Op::Add(cluster, id) => {
            let _ = sim.add_to_cluster(*cluster, *id);
        }
        Op::Remove(cluster, id) => {
            let _ = sim.remove_from_cluster(*cluster, *id);
        }
        Op::Disband(cluster) => {
            let _ = sim.disband_cluster(*cluster);
        }
        Op::Assign(index, ids) => {
            let pending: Vec<JobId> = sim.state().pending_jobs().iter().map(|j| j.id()).collect();
            if let Some(&job) = pending.get(*index) {
                let _ = sim.assign_job(job, ids);
            }
        }
        Op::Tick(tenths) => {
            sim.tick(f64::from(*tenths) / 10.0).unwrap();
        }
        Op::Toggle => {
            sim.toggle_auto_assign();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_action_sequences_keep_state_consistent(ops in prop::collection::vec(op(), 1..80)) {
        let mut sim = open_sim();
        let mut progress: BTreeMap<JobId, f64> = BTreeMap::new();

        for op in &ops {
            apply(&mut sim, op);

            let state = sim.state();
            let violations = state.invariant_violations();
            prop_assert!(violations.is_empty(), "after {:?}: {:?}", op, violations);

            let mut clustered = BTreeSet::new();
            for cluster in state.clusters().iter() {
                prop_assert!(cluster.len() <= MAX_CLUSTER_SIZE);
                prop_assert!(!cluster.is_empty());
                prop_assert!(cluster.is_homogeneous(state.fleet()));
                for &id in cluster.members() {
                    prop_assert!(clustered.insert(id));
                }
            }

            for job in state.active_jobs() {
                let previous = progress.insert(job.id(), job.progress()).unwrap_or(0.0);
                prop_assert!(job.progress() >= previous);
                prop_assert!(job.progress() <= 1.0);
                for id in job.assigned() {
                    let accel = state.accelerator(*id).unwrap();
                    prop_assert_eq!(accel.current_job(), Some(job.id()));
                }
            }

            let busy = state
                .fleet()
                .values()
                .filter(|a| a.current_job().is_some())
                .count();
            let assigned: usize = state.active_jobs().iter().map(|j| j.assigned().len()).sum();
            prop_assert_eq!(busy, assigned);
        }
    }

    #[test]
    fn prop_tick_sequence_is_deterministic(seed in any::<u64>(), steps in prop::collection::vec(1u8..20, 1..60)) {
        let run = |seed: u64| {
            let mut sim = Simulation::new(
                SimulationConfig { rng_seed: seed, starting_cash: 20_000.0, ..Default::default() },
                Arc::new(Catalog::standard()),
            )
            .unwrap();
            for _ in 0..4 {
                sim.purchase_accelerator(GpuModel::L4).unwrap();
            }
            for &step in &steps {
                sim.tick(f64::from(step) / 10.0).unwrap();
            }
            sim.state_digest().unwrap()
        };
        prop_assert_eq!(run(seed), run(seed));
    }
}

//! Arrival generation tests: templates, determinism and backpressure

use gpu_tycoon_core::arrivals::{
    capacity_multiplier, plan_spawn, target_queue_depth, JobGenerator, TRAINING_CUSTOMERS,
};
use gpu_tycoon_core::models::{JobKind, JobSize};
use gpu_tycoon_core::RngManager;
use proptest::prelude::*;

#[test]
fn test_templates() {
    let mut rng = RngManager::new(1);
    let mut seen = [false; 3];
    for _ in 0..500 {
        let job = JobGenerator::generate_job(1_000_000.0, 1.0, 0.0, 8, &mut rng);
        let expected = match job.size {
            JobSize::Small => (0, 1, 16, 5.0, 45.0, 20.0),
            JobSize::Medium => (1, 2, 32, 12.0, 120.0, 35.0),
            JobSize::Large => (2, 4, 50, 20.0, 220.0, 50.0),
        };
        seen[expected.0] = true;
        assert_eq!(job.gpu_count, expected.1);
        assert_eq!(job.vram_per_gpu, expected.2);
        assert_eq!(job.base_duration, expected.3);
        assert_eq!(job.base_payout, expected.4);
        assert_eq!(job.sla_window, expected.5);
    }
    assert_eq!(seen, [true; 3]);
}

#[test]
fn test_large_jobs_are_training() {
    let mut rng = RngManager::new(8);
    for _ in 0..500 {
        let job = JobGenerator::generate_job(1_000_000.0, 1.0, 0.0, 8, &mut rng);
        if job.size == JobSize::Large {
            assert_eq!(job.kind, JobKind::Training);
            assert!(TRAINING_CUSTOMERS.iter().any(|&(c, _)| c == job.customer));
        }
    }
}

#[test]
fn test_same_seed_same_jobs() {
    let mut a = RngManager::new(2024);
    let mut b = RngManager::new(2024);
    for _ in 0..100 {
        assert_eq!(
            JobGenerator::generate_job(60_000.0, 1.2, 4.0, 6, &mut a),
            JobGenerator::generate_job(60_000.0, 1.2, 4.0, 6, &mut b)
        );
    }
    assert_eq!(a.state(), b.state());
}

#[test]
fn test_timer() {
    let mut generator = JobGenerator::new(2.0, 0.0);
    assert!(!generator.is_due(1.9));
    assert!(generator.is_due(2.0));

    generator.record_attempt(2.0, 3.5);
    assert_eq!(generator.interval(), 3.5);
    assert_eq!(generator.base_interval(), 2.0);
    assert!(!generator.is_due(5.0));
    assert!(generator.is_due(5.5));
}

#[test]
fn test_backpressure_with_empty_fleet() {
    // target 3, suppressed from 6 queued jobs on
    assert_eq!(target_queue_depth(0), 3);
    assert!(plan_spawn(5, 0, 2.0, 1.0).generate);

    let plan = plan_spawn(6, 0, 2.0, 1.0);
    assert!(!plan.generate);
    assert!((plan.next_interval - 3.2).abs() < 1e-9);
    assert_eq!(plan.backlog_sla_extension, 6.0);
}

#[test]
fn test_backlog_sla_extension_is_capped() {
    let plan = plan_spawn(40, 0, 2.0, 1.0);
    assert_eq!(plan.backlog_sla_extension, 20.0);
}

#[test]
fn test_bigger_fleet_spawns_faster() {
    let small = plan_spawn(0, 1, 2.0, 1.0);
    let big = plan_spawn(0, 16, 2.0, 1.0);
    assert_eq!(big.target_queue_depth, 7);
    assert!(big.next_interval < small.next_interval);
    assert!((big.next_interval - 2.0 / capacity_multiplier(16)).abs() < 1e-12);
}

#[test]
fn test_marketing_multiplier_shortens_interval() {
    let base = plan_spawn(0, 4, 2.0, 1.0);
    let boosted = plan_spawn(0, 4, 2.0, 2.0);
    assert!((boosted.next_interval * 2.0 - base.next_interval).abs() < 1e-12);
}

proptest! {
    #[test]
    fn prop_generation_gated_at_twice_target(backlog in 0usize..200, available in 0usize..100) {
        let plan = plan_spawn(backlog, available, 2.0, 1.0);
        prop_assert_eq!(plan.generate, backlog < 2 * target_queue_depth(available));
        prop_assert!(plan.next_interval > 0.0);
        prop_assert!(plan.backlog_sla_extension <= 20.0);
    }

    #[test]
    fn prop_interval_grows_with_backlog(backlog in 0usize..100, available in 0usize..50) {
        let now = plan_spawn(backlog, available, 2.0, 1.0);
        let later = plan_spawn(backlog + 1, available, 2.0, 1.0);
        prop_assert!(later.next_interval >= now.next_interval);
    }

    #[test]
    fn prop_size_fits_usable_accelerators(seed in any::<u64>(), available in 0usize..12, revenue in 0.0f64..2_000_000.0) {
        let mut rng = RngManager::new(seed);
        let job = JobGenerator::generate_job(revenue, 1.0, 0.0, available, &mut rng);
        if available < 2 {
            prop_assert_eq!(job.size, JobSize::Small);
        }
        if available < 4 {
            prop_assert!(job.size != JobSize::Large);
        }
    }
}

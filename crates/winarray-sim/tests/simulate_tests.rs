//! Simulator runs across seeds and window shapes

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use winarray_sim::{run_simulator, SimulatorConfig};

#[tokio::test]
async fn failures_and_margins_keep_invariants() {
    for seed in [1, 7, 42, 1234] {
        let config = SimulatorConfig::default()
            .with_seed(seed)
            .with_steps(120)
            .with_collection_size(400)
            .with_window(12, 4)
            .with_failure_rate(0.2);
        let report = run_simulator(config).await.unwrap();
        assert!(report.passed(), "{}", report.generate_text());
        assert!(report.stats.failures_injected > 0);
    }
}

#[tokio::test]
async fn small_collection_never_overfetches() {
    let config = SimulatorConfig::default()
        .with_steps(80)
        .with_collection_size(25)
        .with_window(10, 0)
        .with_failure_rate(0.0);
    let report = run_simulator(config).await.unwrap();

    assert!(report.passed(), "{}", report.generate_text());
    assert!(report.stats.final_store_len <= 25);
    assert_eq!(report.stats.failures_injected, 0);
}

#[tokio::test]
async fn same_seed_same_report() {
    let config = SimulatorConfig::default().with_seed(5).with_steps(50);
    let first = run_simulator(config.clone()).await.unwrap();
    let second = run_simulator(config).await.unwrap();

    assert_eq!(first.stats, second.stats);
    assert_eq!(first.violations, second.violations);
}

#[tokio::test]
async fn json_report_shape() {
    let config = SimulatorConfig::default().with_steps(10);
    let report = run_simulator(config).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["config"]["seed"], 42);
    assert_eq!(json["stats"]["steps"], 10);
    assert!(json["violations"].as_array().unwrap().is_empty());
    assert!(json["final_status"]["start_reached"].is_boolean());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn any_window_shape_passes(
        seed in any::<u64>(),
        window_len in 1usize..30,
        margin in 0usize..8,
        size in 0u64..300,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let config = SimulatorConfig::default()
            .with_seed(seed)
            .with_steps(40)
            .with_collection_size(size)
            .with_window(window_len, margin);
        let report = runtime.block_on(run_simulator(config)).unwrap();
        prop_assert!(report.passed(), "{}", report.generate_text());
    }
}

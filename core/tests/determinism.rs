//! Two runs, same seed, same baseline.
//! They must produce identical ledgers and snapshots.
//! Any divergence is a blocker — do not merge until fixed.

use std::sync::Arc;
use workforce_core::{
    config::SimConfig,
    jobs::{self, SimContext},
    reference_engine::ReferenceEngine,
    store::{ConnectionProvider, StoreProvider},
    validator::YearResult,
    workforce::generate_baseline,
};

fn run(seed: u64) -> Vec<String> {
    run_with_results(seed).1
}

fn run_with_results(seed: u64) -> (Vec<YearResult>, Vec<String>) {
    let provider = Arc::new(StoreProvider::in_memory().expect("in-memory store"));
    provider
        .acquire()
        .expect("store")
        .replace_baseline(&generate_baseline(300, 11, 2025))
        .expect("baseline");

    let config = SimConfig {
        random_seed: seed,
        ..SimConfig::default_test()
    };
    let engine = Arc::new(ReferenceEngine::build(provider.clone()));
    let ctx = SimContext::new(config.clone(), provider.clone(), engine);
    let results = jobs::multi_year_simulation(&ctx, true).expect("run");
    assert!(results.iter().all(|r| r.success));

    // Ledger payloads plus end-of-year compensation totals, in year order.
    let store = provider.acquire().expect("store");
    let lines = config
        .years()
        .into_iter()
        .flat_map(|year| {
            let mut lines: Vec<String> = store
                .ledger_events(year)
                .expect("ledger")
                .iter()
                .map(|e| serde_json::to_string(e).expect("serialize"))
                .collect();
            lines.push(format!(
                "{year}: total_compensation={}",
                store.total_compensation(year).expect("compensation")
            ));
            lines
        })
        .collect();
    (results, lines)
}

#[test]
fn same_seed_produces_identical_ledgers() {
    const SEED: u64 = 0xDEAD_BEEF_CAFE_1234;
    let log_a = run(SEED);
    let log_b = run(SEED);

    assert_eq!(
        log_a.len(), log_b.len(),
        "Ledger lengths differ: {} vs {}",
        log_a.len(), log_b.len()
    );
    for (i, (a, b)) in log_a.iter().zip(log_b.iter()).enumerate() {
        assert_eq!(a, b, "Ledger diverged at entry {i}:\n  A: {a}\n  B: {b}");
    }
}

#[test]
fn different_seeds_pick_different_employees() {
    // Hires and both termination counts come from the formula, so they do
    // not depend on the seed. Promotions are drawn per employee and do.
    let (results_a, log_a) = run_with_results(1);
    let (results_b, log_b) = run_with_results(2);

    let counts = |results: &[YearResult]| {
        results
            .iter()
            .map(|r| (r.year, r.total_hires, r.experienced_terminations, r.new_hire_terminations))
            .collect::<Vec<_>>()
    };
    assert_eq!(counts(&results_a), counts(&results_b));
    assert_ne!(log_a, log_b);
}

//! Single-year job: error surface, dependency recovery, and the streamed
//! full pipeline.

use std::sync::Arc;
use workforce_core::{
    config::SimConfig,
    error::SimError,
    jobs::{self, SimContext},
    reference_engine::ReferenceEngine,
    step::FULL_PIPELINE,
    store::{ConnectionProvider, StoreProvider, YearTable},
    types::SimYear,
    validator::YearValidator,
    workforce::generate_baseline,
};

fn provider() -> Arc<StoreProvider> {
    let provider = Arc::new(StoreProvider::in_memory().unwrap());
    provider
        .acquire()
        .unwrap()
        .replace_baseline(&generate_baseline(1000, 5, 2025))
        .unwrap();
    provider
}

fn context(provider: &Arc<StoreProvider>, year: SimYear) -> SimContext {
    let config = SimConfig {
        start_year: year,
        end_year: year,
        first_simulation_year: Some(2025),
        ..SimConfig::default_test()
    };
    let engine = Arc::new(ReferenceEngine::build(provider.clone()));
    SimContext::new(config, provider.clone(), engine)
}

#[test]
fn single_year_job_propagates_missing_dependency() {
    let provider = provider();
    match jobs::single_year_simulation(&context(&provider, 2026)) {
        Err(SimError::MissingDependency { year: 2026, ledger_rows: 0, snapshot_rows: 0 }) => {}
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[test]
fn single_year_job_rejects_invalid_config() {
    let provider = provider();
    let mut ctx = context(&provider, 2025);
    ctx.config.new_hire_termination_rate = 1.0;
    assert!(matches!(
        jobs::single_year_simulation(&ctx),
        Err(SimError::InvalidConfig(_))
    ));
}

#[test]
fn missing_previous_snapshot_is_rebuilt_once() {
    let provider = provider();
    let first = jobs::single_year_simulation(&context(&provider, 2025)).unwrap();
    assert_eq!(first.active_employees, 1030);

    let store = provider.acquire().unwrap();
    store.delete_for_year(YearTable::Snapshot, 2025).unwrap();
    store.delete_for_year(YearTable::SnapshotState, 2025).unwrap();

    let second = jobs::single_year_simulation(&context(&provider, 2026)).unwrap();
    assert!(second.success);
    assert_eq!(second.active_employees, 1061);
    assert_eq!(store.active_headcount(2025).unwrap(), 1030);
    assert!(store.count_for_year(YearTable::SnapshotState, 2025).unwrap() > 0);
}

#[test]
fn rebuild_after_a_refreshed_run_uses_the_full_starting_workforce() {
    let provider = provider();
    let refreshed = SimConfig {
        full_refresh: true,
        ..SimConfig::default_test()
    };
    let engine = Arc::new(ReferenceEngine::build(provider.clone()));
    let results = jobs::multi_year_simulation(&SimContext::new(refreshed, provider.clone(), engine), true)
        .unwrap();
    assert!(results.iter().all(|r| r.success), "{results:#?}");

    let store = provider.acquire().unwrap();
    assert_eq!(store.starting_workforce(2025).unwrap().len(), 1000);
    store.delete_for_year(YearTable::Snapshot, 2025).unwrap();
    store.delete_for_year(YearTable::SnapshotState, 2025).unwrap();

    let mut ctx = context(&provider, 2026);
    ctx.config.full_refresh = true;
    let rerun = jobs::single_year_simulation(&ctx).unwrap();
    assert!(rerun.success);
    assert_eq!(store.active_headcount(2025).unwrap(), 1030);
    assert_eq!(rerun.active_employees, 1061);
}

#[test]
fn missing_previous_ledger_is_fatal() {
    let provider = provider();
    jobs::single_year_simulation(&context(&provider, 2025)).unwrap();
    provider
        .acquire()
        .unwrap()
        .delete_for_year(YearTable::Ledger, 2025)
        .unwrap();

    match jobs::single_year_simulation(&context(&provider, 2026)) {
        Err(SimError::MissingDependency { year: 2026, ledger_rows: 0, snapshot_rows }) => {
            assert!(snapshot_rows > 0)
        }
        other => panic!("expected MissingDependency, got {other:?}"),
    }
}

#[test]
fn rerunning_a_year_is_idempotent() {
    let provider = provider();
    let ctx = context(&provider, 2025);
    let a = jobs::single_year_simulation(&ctx).unwrap();
    let rows = provider
        .acquire()
        .unwrap()
        .count_for_year(YearTable::Ledger, 2025)
        .unwrap();
    let b = jobs::single_year_simulation(&ctx).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        provider.acquire().unwrap().count_for_year(YearTable::Ledger, 2025).unwrap(),
        rows
    );
}

#[test]
fn full_pipeline_streams_every_step_in_order() {
    let provider = provider();
    let ctx = context(&provider, 2025);

    let mut lines = Vec::new();
    let summary = jobs::full_pipeline(&ctx, 2025, &mut |line| lines.push(line.to_string())).unwrap();

    assert_eq!(lines.len(), FULL_PIPELINE.len());
    for (line, step) in lines.iter().zip(FULL_PIPELINE) {
        assert!(line.starts_with(step), "{line} should come from {step}");
    }

    // The state step already ran inside the pipeline; the end-of-year
    // build replaced it.
    let store = provider.acquire().unwrap();
    assert_eq!(summary.rows, store.count_for_year(YearTable::Snapshot, 2025).unwrap());
    assert_eq!(summary.pre_existing_rows, summary.rows);
    assert_eq!(store.active_headcount(2025).unwrap(), 1030);

    let validator = YearValidator::new(ctx.config.clone(), provider.clone());
    assert!(validator.assert_year_complete(2025).is_ok());
}

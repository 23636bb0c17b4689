//! Completeness assertion and per-year metrics.

use chrono::NaiveDate;
use std::sync::Arc;
use workforce_core::{
    config::SimConfig,
    error::SimError,
    event::{EventCategory, EventRecord, EventType},
    step::{EVENT_SEQUENCE, HIRING_EVENTS, NEW_HIRE_TERMINATION_EVENTS, TERMINATION_EVENTS},
    store::{ConnectionProvider, SimStore, StoreProvider},
    types::SimYear,
    validator::{ValidationWarning, YearValidator},
    workforce::{generate_baseline, DetailedStatus, WorkforceSnapshotRow},
};

fn events(year: SimYear, prefix: &str, n: usize, ty: EventType, cat: EventCategory) -> Vec<EventRecord> {
    let date = NaiveDate::from_ymd_opt(year, 3, 15).unwrap();
    (0..n)
        .map(|i| EventRecord::new(year, format!("{prefix}{i:04}"), ty, cat, date))
        .collect()
}

fn snapshot(store: &SimStore, year: SimYear, active: usize, terminated: usize) {
    let row = |id: String, status: DetailedStatus| WorkforceSnapshotRow {
        simulation_year:      year,
        employee_id:          id,
        employment_status:    status.status(),
        current_compensation: 70_000.0,
        current_age:          40,
        current_tenure:       6,
        level:                2,
        detailed_status:      status,
    };
    let mut rows: Vec<_> = (0..active)
        .map(|i| row(format!("A{i:04}"), DetailedStatus::ContinuousActive))
        .collect();
    rows.extend((0..terminated).map(|i| row(format!("T{i:04}"), DetailedStatus::ExperiencedTermination)));
    store.replace_snapshot(year, &rows).unwrap();
}

fn setup(baseline: usize) -> (Arc<StoreProvider>, YearValidator) {
    let provider = Arc::new(StoreProvider::in_memory().unwrap());
    provider
        .acquire()
        .unwrap()
        .replace_baseline(&generate_baseline(baseline, 1, 2025))
        .unwrap();
    let validator = YearValidator::new(SimConfig::default_test(), provider.clone());
    (provider, validator)
}

#[test]
fn incomplete_years_are_rejected() {
    let (provider, validator) = setup(10);
    let store = provider.acquire().unwrap();

    match validator.assert_year_complete(2025) {
        Err(SimError::IncompleteYear { year: 2025, ledger_rows: 0, snapshot_rows: 0 }) => {}
        other => panic!("expected IncompleteYear, got {other:?}"),
    }

    // Ledger only.
    store
        .insert_staged_events(
            TERMINATION_EVENTS,
            &events(2025, "T", 2, EventType::Termination, EventCategory::ExperiencedTermination),
        )
        .unwrap();
    store.consolidate_ledger(2025, &EVENT_SEQUENCE).unwrap();
    match validator.assert_year_complete(2025) {
        Err(SimError::IncompleteYear { ledger_rows: 2, snapshot_rows: 0, .. }) => {}
        other => panic!("expected IncompleteYear, got {other:?}"),
    }

    // Snapshot only.
    snapshot(&store, 2026, 5, 0);
    assert!(matches!(
        validator.assert_year_complete(2026),
        Err(SimError::IncompleteYear { ledger_rows: 0, snapshot_rows: 5, .. })
    ));

    // Both.
    snapshot(&store, 2025, 8, 2);
    assert_eq!(validator.assert_year_complete(2025).unwrap(), (2, 10));
}

#[test]
fn on_target_year_passes_without_warnings() {
    let (provider, validator) = setup(100);
    let store = provider.acquire().unwrap();
    store
        .insert_staged_events(
            TERMINATION_EVENTS,
            &events(2025, "T", 12, EventType::Termination, EventCategory::ExperiencedTermination),
        )
        .unwrap();
    store
        .insert_staged_events(
            HIRING_EVENTS,
            &events(2025, "H", 20, EventType::Hire, EventCategory::NewHire),
        )
        .unwrap();
    store
        .insert_staged_events(
            NEW_HIRE_TERMINATION_EVENTS,
            &events(2025, "H", 5, EventType::Termination, EventCategory::NewHireTermination),
        )
        .unwrap();
    store.consolidate_ledger(2025, &EVENT_SEQUENCE).unwrap();
    snapshot(&store, 2025, 103, 17);

    let result = validator.validate_year(2025).unwrap();
    assert!(result.success);
    assert!(result.validation_passed);
    assert!(result.warnings.is_empty());
    assert!(result.error.is_none());
    assert_eq!(result.active_employees, 103);
    assert_eq!(result.experienced_terminations, 12);
    assert_eq!(result.new_hire_terminations, 5);
    assert_eq!(result.total_terminations, 17);
    assert_eq!(result.total_hires, 20);
    assert!((result.growth_rate - 0.03).abs() < 1e-9);
}

#[test]
fn variance_and_missing_terminations_are_warnings() {
    let (provider, validator) = setup(100);
    let store = provider.acquire().unwrap();
    store
        .insert_staged_events(
            HIRING_EVENTS,
            &events(2025, "H", 10, EventType::Hire, EventCategory::NewHire),
        )
        .unwrap();
    store.consolidate_ledger(2025, &EVENT_SEQUENCE).unwrap();
    snapshot(&store, 2025, 110, 0);

    let result = validator.validate_year(2025).unwrap();
    assert!(result.success, "warnings never fail a year");
    assert!(!result.validation_passed);
    assert_eq!(
        result.warnings,
        vec![
            ValidationWarning::GrowthVariance { expected: 103, actual: 110, variance: 7 },
            ValidationWarning::NoTerminations,
        ]
    );
}

#[test]
fn later_years_measure_growth_from_the_prior_snapshot() {
    let (provider, validator) = setup(100);
    let store = provider.acquire().unwrap();
    snapshot(&store, 2025, 200, 0);
    store
        .insert_staged_events(
            TERMINATION_EVENTS,
            &events(2026, "T", 1, EventType::Termination, EventCategory::ExperiencedTermination),
        )
        .unwrap();
    store.consolidate_ledger(2026, &EVENT_SEQUENCE).unwrap();
    snapshot(&store, 2026, 206, 1);

    let result = validator.validate_year(2026).unwrap();
    assert!((result.growth_rate - 0.03).abs() < 1e-9);
    assert!(result.warnings.is_empty());
}

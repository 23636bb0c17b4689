//! Snapshot-state builds: success, empty output, and engine failure all come
//! back as values.

use std::sync::{Arc, Mutex};
use workforce_core::{
    command::CommandRunner,
    error::{SimError, SimResult},
    reference_engine::ReferenceEngine,
    snapshot::{SnapshotKind, SnapshotManager, SnapshotResult},
    store::{ConnectionProvider, StoreProvider, YearTable},
    transform::{EngineOutput, EngineRequest, TransformEngine},
    workforce::{DetailedStatus, WorkforceSnapshotRow},
};

/// Reports success without producing anything.
struct SilentEngine {
    seen: Mutex<Vec<EngineRequest>>,
}

impl TransformEngine for SilentEngine {
    fn invoke(&self, request: &EngineRequest) -> SimResult<EngineOutput> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(EngineOutput::ok(""))
    }
}

struct BrokenEngine;

impl TransformEngine for BrokenEngine {
    fn invoke(&self, _request: &EngineRequest) -> SimResult<EngineOutput> {
        Ok(EngineOutput::failed(3, "relation does not exist"))
    }
}

fn seeded_provider(active: usize) -> Arc<StoreProvider> {
    let provider = Arc::new(StoreProvider::in_memory().unwrap());
    let rows: Vec<_> = (0..active)
        .map(|i| WorkforceSnapshotRow {
            simulation_year:      2025,
            employee_id:          format!("EMP_{i:06}"),
            employment_status:    DetailedStatus::ContinuousActive.status(),
            current_compensation: 65_000.0,
            current_age:          35,
            current_tenure:       3,
            level:                2,
            detailed_status:      DetailedStatus::ContinuousActive,
        })
        .collect();
    provider.acquire().unwrap().replace_snapshot(2025, &rows).unwrap();
    provider
}

#[test]
fn zero_rows_is_a_structured_failure() {
    let provider = seeded_provider(5);
    let engine = Arc::new(SilentEngine { seen: Mutex::new(Vec::new()) });
    let manager = SnapshotManager::new(provider, CommandRunner::new(engine.clone()));

    let result = manager.build_snapshot(2025, SnapshotKind::EndOfYear);
    assert!(!result.is_success());
    match result {
        SnapshotResult::Failure(f) => {
            assert_eq!(f.year, 2025);
            assert_eq!(f.kind, SnapshotKind::EndOfYear);
            assert!(matches!(f.error, SimError::SnapshotIntegrity { year: 2025, .. }));
        }
        SnapshotResult::Success(s) => panic!("expected failure, got {s:?}"),
    }

    // Year is the only variable, and snapshots never full-refresh.
    let seen = engine.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].selector, "scd_workforce_state");
    assert!(!seen[0].full_refresh);
    assert_eq!(seen[0].vars.year().unwrap(), 2025);
    assert!(seen[0].vars.get("random_seed").is_none());
}

#[test]
fn engine_failure_is_a_structured_failure() {
    let provider = seeded_provider(5);
    let manager = SnapshotManager::new(provider, CommandRunner::new(Arc::new(BrokenEngine)));
    let result = manager.build_snapshot(2025, SnapshotKind::Recovery);
    assert!(matches!(
        result.error(),
        Some(SimError::EngineExecution { exit_code: 3, .. })
    ));
}

#[test]
fn rebuild_replaces_previous_state() {
    let provider = seeded_provider(7);
    let engine = Arc::new(ReferenceEngine::build(provider.clone()));
    let manager = SnapshotManager::new(provider.clone(), CommandRunner::new(engine));

    let first = manager
        .build_snapshot(2025, SnapshotKind::EndOfYear)
        .into_result()
        .unwrap();
    assert_eq!(first.pre_existing_rows, 0);
    assert_eq!(first.rows, 7);

    let second = manager
        .build_snapshot(2025, SnapshotKind::PreviousYearDependency)
        .into_result()
        .unwrap();
    assert_eq!(second.pre_existing_rows, 7);
    assert_eq!(second.rows, 7);
    assert_eq!(
        provider
            .acquire()
            .unwrap()
            .count_for_year(YearTable::SnapshotState, 2025)
            .unwrap(),
        7
    );
}

#[test]
fn missing_source_snapshot_fails_without_panicking() {
    let provider = Arc::new(StoreProvider::in_memory().unwrap());
    let engine = Arc::new(ReferenceEngine::build(provider.clone()));
    let manager = SnapshotManager::new(provider, CommandRunner::new(engine));
    let result = manager.build_snapshot(2030, SnapshotKind::Recovery);
    assert!(!result.is_success());
    assert!(result.error().is_some());
}

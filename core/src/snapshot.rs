//! Snapshot-state builds for a year.
//!
//! One entry point serves three callers: the end-of-year build, the
//! previous-year dependency rebuild, and recovery. Every failure inside a
//! build comes back as `SnapshotResult::Failure`; nothing is propagated.

use crate::{
    command::CommandRunner,
    error::{SimError, SimResult},
    step::SNAPSHOT_STATE,
    store::{ConnectionProvider, YearTable},
    transform::EngineVars,
    types::SimYear,
};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    /// Built right after the year's workforce snapshot; expects no prior rows.
    EndOfYear,
    /// Rebuilt for year Y−1 before year Y runs.
    PreviousYearDependency,
    /// Rebuilt because the state was found missing; expects prior rows.
    Recovery,
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SnapshotKind::EndOfYear => "end_of_year",
            SnapshotKind::PreviousYearDependency => "previous_year_dependency",
            SnapshotKind::Recovery => "recovery",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub year:              SimYear,
    pub kind:              SnapshotKind,
    pub pre_existing_rows: i64,
    pub rows:              i64,
}

#[derive(Debug)]
pub struct SnapshotFailure {
    pub year:  SimYear,
    pub kind:  SnapshotKind,
    pub error: SimError,
}

#[derive(Debug)]
pub enum SnapshotResult {
    Success(SnapshotSummary),
    Failure(SnapshotFailure),
}

impl SnapshotResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SnapshotResult::Success(_))
    }

    pub fn error(&self) -> Option<&SimError> {
        match self {
            SnapshotResult::Success(_) => None,
            SnapshotResult::Failure(f) => Some(&f.error),
        }
    }

    /// Collapse into a `SimResult`, for callers where a failed build is fatal.
    pub fn into_result(self) -> SimResult<SnapshotSummary> {
        match self {
            SnapshotResult::Success(summary) => Ok(summary),
            SnapshotResult::Failure(f) => Err(f.error),
        }
    }
}

pub struct SnapshotManager {
    provider: Arc<dyn ConnectionProvider>,
    runner:   CommandRunner,
}

impl SnapshotManager {
    pub fn new(provider: Arc<dyn ConnectionProvider>, runner: CommandRunner) -> Self {
        Self { provider, runner }
    }

    pub fn build_snapshot(&self, year: SimYear, kind: SnapshotKind) -> SnapshotResult {
        match self.try_build(year, kind) {
            Ok(summary) => {
                log::info!(
                    "year={year} snapshot ({kind}): {} rows (replaced {})",
                    summary.rows,
                    summary.pre_existing_rows
                );
                SnapshotResult::Success(summary)
            }
            Err(error) => {
                log::warn!("year={year} snapshot ({kind}) failed: {error}");
                SnapshotResult::Failure(SnapshotFailure { year, kind, error })
            }
        }
    }

    fn try_build(&self, year: SimYear, kind: SnapshotKind) -> SimResult<SnapshotSummary> {
        let pre_existing_rows = {
            let store = self.provider.acquire()?;
            let existing = store.count_for_year(YearTable::SnapshotState, year)?;
            match kind {
                SnapshotKind::EndOfYear if existing > 0 => log::info!(
                    "year={year} snapshot ({kind}): {existing} existing rows will be replaced"
                ),
                SnapshotKind::Recovery if existing == 0 => log::warn!(
                    "year={year} snapshot ({kind}): no existing rows to recover from"
                ),
                _ => {}
            }
            store.delete_for_year(YearTable::SnapshotState, year)?;
            existing
        };

        // Incremental always: a refresh here would wipe other years' state.
        self.runner.run(
            SNAPSHOT_STATE,
            EngineVars::for_year(year),
            false,
            &format!("{kind} snapshot for {year}"),
        )?;

        let rows = self
            .provider
            .acquire()?
            .count_for_year(YearTable::SnapshotState, year)?;
        if rows == 0 {
            return Err(SimError::SnapshotIntegrity {
                year,
                kind: kind.to_string(),
            });
        }

        Ok(SnapshotSummary {
            year,
            kind,
            pre_existing_rows,
            rows,
        })
    }
}

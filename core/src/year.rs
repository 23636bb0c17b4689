//! One simulation year, start to finish.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Clean the year's ledger and snapshot rows
//!   2. Previous-year dependency check (years after the first only)
//!   3. Starting workforce
//!   4. Event sequence
//!   5. Ledger consolidation
//!   6. Workforce snapshot + end-of-year snapshot state
//!   7. Validation
//!
//! The first error aborts the year and is returned as-is. The multi-year
//! loop turns it into a failed `YearResult`; the single-year job lets it
//! surface.

use crate::{
    cleaner::DataCleaner,
    command::CommandRunner,
    config::SimConfig,
    error::{SimError, SimResult},
    sequencer::EventSequencer,
    snapshot::{SnapshotKind, SnapshotManager},
    step::{STARTING_WORKFORCE, WORKFORCE_SNAPSHOT, YEARLY_EVENTS},
    store::{ConnectionProvider, YearTable},
    transform::EngineVars,
    types::SimYear,
    validator::{YearResult, YearValidator},
};
use std::sync::Arc;

pub struct YearOrchestrator {
    config:    SimConfig,
    provider:  Arc<dyn ConnectionProvider>,
    runner:    CommandRunner,
    cleaner:   DataCleaner,
    sequencer: EventSequencer,
    snapshots: SnapshotManager,
    validator: YearValidator,
}

impl YearOrchestrator {
    pub fn new(config: SimConfig, provider: Arc<dyn ConnectionProvider>, runner: CommandRunner) -> Self {
        Self {
            cleaner:   DataCleaner::new(provider.clone()),
            sequencer: EventSequencer::new(config.clone(), provider.clone(), runner.clone()),
            snapshots: SnapshotManager::new(provider.clone(), runner.clone()),
            validator: YearValidator::new(config.clone(), provider.clone()),
            config,
            provider,
            runner,
        }
    }

    pub fn validator(&self) -> &YearValidator {
        &self.validator
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    pub fn run_year(&self, year: SimYear) -> SimResult<YearResult> {
        log::info!("year={year} start");

        let cleaned = self.cleaner.clean_years(&[year]);
        if !cleaned.is_clean() {
            log::warn!(
                "year={year} clean finished with {} failures",
                cleaned.failures.len()
            );
        }

        if year > self.config.first_year() {
            self.ensure_previous_year(year)?;
        }

        let full_refresh = self.config.full_refresh;
        self.runner.run(
            STARTING_WORKFORCE,
            EngineVars::for_year(year).with("first_simulation_year", self.config.first_year()),
            full_refresh,
            &format!("starting workforce for {year}"),
        )?;

        self.sequencer.run_year(year)?;

        self.runner.run(
            YEARLY_EVENTS,
            EngineVars::for_year(year),
            full_refresh,
            &format!("ledger consolidation for {year}"),
        )?;

        self.runner.run(
            WORKFORCE_SNAPSHOT,
            EngineVars::for_year(year),
            full_refresh,
            &format!("workforce snapshot for {year}"),
        )?;
        self.snapshots
            .build_snapshot(year, SnapshotKind::EndOfYear)
            .into_result()?;

        let result = self.validator.validate_year(year)?;
        log::info!(
            "year={year} done: {} active, {:+.2}% growth",
            result.active_employees,
            result.growth_rate * 100.0
        );
        Ok(result)
    }

    /// Year − 1 must have ledger and snapshot rows. A ledger with no
    /// snapshot gets exactly one rebuild before the year is abandoned.
    fn ensure_previous_year(&self, year: SimYear) -> SimResult<()> {
        let prev = year - 1;
        let (ledger_rows, snapshot_rows) = self.previous_counts(prev)?;
        if ledger_rows > 0 && snapshot_rows > 0 {
            return Ok(());
        }

        if ledger_rows > 0 {
            log::warn!("year={year} dependency: {prev} has a ledger but no snapshot; rebuilding once");
            self.runner.run(
                WORKFORCE_SNAPSHOT,
                EngineVars::for_year(prev),
                false,
                &format!("workforce snapshot rebuild for {prev}"),
            )?;
            let recovery = self.snapshots.build_snapshot(prev, SnapshotKind::Recovery);
            if let Some(e) = recovery.error() {
                log::warn!("year={year} dependency: recovery snapshot for {prev} failed: {e}");
            }

            let (ledger_rows, snapshot_rows) = self.previous_counts(prev)?;
            if snapshot_rows > 0 {
                log::info!("year={year} dependency: {prev} snapshot rebuilt ({snapshot_rows} rows)");
                return Ok(());
            }
            return Err(SimError::MissingDependency {
                year,
                ledger_rows,
                snapshot_rows,
            });
        }

        log::error!(
            "year={year} dependency: {prev} incomplete (ledger={ledger_rows} snapshot={snapshot_rows})"
        );
        Err(SimError::MissingDependency {
            year,
            ledger_rows,
            snapshot_rows,
        })
    }

    fn previous_counts(&self, prev: SimYear) -> SimResult<(i64, i64)> {
        let store = self.provider.acquire()?;
        Ok((
            store.count_for_year(YearTable::Ledger, prev)?,
            store.count_for_year(YearTable::Snapshot, prev)?,
        ))
    }
}

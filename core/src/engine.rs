//! The multi-year simulation engine.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Baseline validity gate
//!   2. Bulk clean of the requested range, then orphan cleanup outside
//!      [first_simulation_year, end_year]
//!   3. Dependency snapshot for start_year − 1 when resuming mid-range
//!   4. Each year in order: previous-year checks, then the year itself
//!   5. Run summary
//!
//! RULES:
//!   - Years run strictly in order; year Y reads year Y−1's snapshot.
//!   - A failed year becomes a failed `YearResult`, never an `Err`.
//!   - The output holds exactly one result per requested year.
//!   - `FailurePolicy` decides whether later years are still attempted.

use crate::{
    cleaner::DataCleaner,
    command::CommandRunner,
    config::{FailurePolicy, SimConfig},
    error::{SimError, SimResult},
    snapshot::SnapshotKind,
    store::ConnectionProvider,
    types::{RunId, SimYear},
    validator::YearResult,
    year::YearOrchestrator,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;

pub struct SimEngine {
    pub run_id: RunId,
    config:     SimConfig,
    provider:   Arc<dyn ConnectionProvider>,
    cleaner:    DataCleaner,
    years:      YearOrchestrator,
}

impl SimEngine {
    pub fn new(config: SimConfig, provider: Arc<dyn ConnectionProvider>, runner: CommandRunner) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            cleaner: DataCleaner::new(provider.clone()),
            years: YearOrchestrator::new(config.clone(), provider.clone(), runner),
            config,
            provider,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Run every year in `[start_year, end_year]`.
    ///
    /// `Err` only for failures before the first year starts (invalid
    /// baseline, config, or an unreachable store). Everything after that
    /// is reported per year.
    pub fn run(&self, baseline_valid: bool) -> SimResult<Vec<YearResult>> {
        self.run_with_summary(baseline_valid).map(|summary| summary.years)
    }

    /// Like `run`, returning the summary recorded under this engine's
    /// `run_id`.
    pub fn run_with_summary(&self, baseline_valid: bool) -> SimResult<RunSummary> {
        if !baseline_valid {
            log::error!("run {}: baseline workforce flagged invalid", self.run_id);
            return Err(SimError::BaselineInvalid);
        }
        self.config.validate()?;

        let years = self.config.years();
        self.register_run()?;
        log::info!(
            "run {}: years {}..={} seed={} policy={:?}",
            self.run_id,
            self.config.start_year,
            self.config.end_year,
            self.config.random_seed,
            self.config.failure_policy
        );

        // Years from the canonical first year up to start_year feed a
        // mid-range resume, so orphan cleanup keeps them.
        let retained: Vec<SimYear> = (self.config.first_year()..=self.config.end_year).collect();
        let cleaned = self.cleaner.clean_years(&years);
        let orphans = self.cleaner.clean_outside_range(&retained);
        for failure in cleaned.failures.iter().chain(&orphans.failures) {
            log::warn!(
                "run {}: clean {} year={:?} failed: {}",
                self.run_id,
                failure.table,
                failure.year,
                failure.error
            );
        }

        let start = self.config.start_year;
        if start > self.config.first_year() {
            let dependency = self
                .years
                .snapshots()
                .build_snapshot(start - 1, SnapshotKind::PreviousYearDependency);
            if let Some(e) = dependency.error() {
                log::warn!("run {}: dependency snapshot for {} failed: {e}", self.run_id, start - 1);
            }
        }

        let mut results = Vec::with_capacity(years.len());
        let mut first_failure: Option<SimYear> = None;
        for &year in &years {
            if let (Some(failed), FailurePolicy::FailFast) = (first_failure, self.config.failure_policy) {
                log::warn!("year={year} skipped: year {failed} failed and policy is fail_fast");
                results.push(YearResult::failed(
                    year,
                    format!("skipped: year {failed} failed"),
                ));
                continue;
            }

            let result = match self.attempt_year(year) {
                Ok(result) => result,
                Err(e) => {
                    log::error!("year={year} failed: {e}");
                    YearResult::failed(year, e.to_string())
                }
            };
            if !result.success && first_failure.is_none() {
                first_failure = Some(year);
            }
            results.push(result);
        }

        let summary = RunSummary::from_results(&self.run_id, &results);
        summary.log();
        self.complete_run(&summary);
        Ok(summary)
    }

    fn attempt_year(&self, year: SimYear) -> SimResult<YearResult> {
        if year > self.config.start_year {
            self.years.validator().assert_year_complete(year - 1)?;
            let dependency = self
                .years
                .snapshots()
                .build_snapshot(year - 1, SnapshotKind::PreviousYearDependency);
            if let Some(e) = dependency.error() {
                log::warn!("year={year} dependency snapshot for {} failed: {e}", year - 1);
            }
        }
        self.years.run_year(year)
    }

    fn register_run(&self) -> SimResult<()> {
        let store = self.provider.acquire()?;
        store.insert_run(
            &self.run_id,
            self.config.start_year,
            self.config.end_year,
            self.config.random_seed,
            env!("CARGO_PKG_VERSION"),
            &chrono::Utc::now().to_rfc3339(),
        )
    }

    /// Best effort: the results are already computed, so a registry write
    /// failure is logged and does not change them.
    fn complete_run(&self, summary: &RunSummary) {
        let outcome = self.provider.acquire().and_then(|store| {
            let json = serde_json::to_string(summary)?;
            store.complete_run(
                &self.run_id,
                summary.status(),
                &chrono::Utc::now().to_rfc3339(),
                &json,
            )
        });
        if let Err(e) = outcome {
            log::warn!("run {}: cannot record completion: {e}", self.run_id);
        }
    }
}

/// End-of-run report. Warnings and fatal errors are kept apart.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id:             RunId,
    pub successful_years:   usize,
    pub failed_years:       usize,
    pub total_hires:        i64,
    pub total_terminations: i64,
    pub years:              Vec<YearResult>,
}

impl RunSummary {
    pub fn from_results(run_id: &str, results: &[YearResult]) -> Self {
        let successful_years = results.iter().filter(|r| r.success).count();
        Self {
            run_id: run_id.to_string(),
            successful_years,
            failed_years: results.len() - successful_years,
            total_hires: results.iter().map(|r| r.total_hires).sum(),
            total_terminations: results.iter().map(|r| r.total_terminations).sum(),
            years: results.to_vec(),
        }
    }

    pub fn status(&self) -> &'static str {
        match (self.successful_years, self.failed_years) {
            (_, 0) => "completed",
            (0, _) => "failed",
            _ => "partial",
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Run {} ({}) ===", self.run_id, self.status());
        let _ = writeln!(
            out,
            "Years: {} successful, {} failed",
            self.successful_years, self.failed_years
        );
        for r in &self.years {
            if r.success {
                let _ = writeln!(
                    out,
                    "  {}: {:>6} active  {:+6.2}%  hires={} terms={}{}",
                    r.year,
                    r.active_employees,
                    r.growth_rate * 100.0,
                    r.total_hires,
                    r.total_terminations,
                    if r.validation_passed { "" } else { "  [validation failed]" }
                );
            } else {
                let _ = writeln!(out, "  {}: FAILED", r.year);
            }
        }

        let warnings: Vec<_> = self
            .years
            .iter()
            .flat_map(|r| r.warnings.iter().map(move |w| (r.year, w)))
            .collect();
        if !warnings.is_empty() {
            let _ = writeln!(out, "Warnings:");
            for (year, w) in warnings {
                let _ = writeln!(out, "  {year}: {w}");
            }
        }

        let errors: Vec<_> = self
            .years
            .iter()
            .filter_map(|r| r.error.as_deref().map(|e| (r.year, e)))
            .collect();
        if !errors.is_empty() {
            let _ = writeln!(out, "Errors:");
            for (year, e) in errors {
                // First line only; engine errors carry the full captured output.
                let _ = writeln!(out, "  {year}: {}", e.lines().next().unwrap_or_default());
            }
        }
        out
    }

    pub fn log(&self) {
        for line in self.render().lines() {
            if self.failed_years > 0 {
                log::warn!("{line}");
            } else {
                log::info!("{line}");
            }
        }
    }
}

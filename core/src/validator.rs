//! Completeness assertion and per-year metrics.
//!
//! Growth variance is a warning, never a failure. `validation_passed` is
//! false only when a year recorded no terminations at all.

use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    store::{ConnectionProvider, YearTable},
    types::SimYear,
};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationWarning {
    /// Ending headcount missed `round(before * (1 + g))` by more than the tolerance.
    GrowthVariance {
        expected: i64,
        actual:   i64,
        variance: i64,
    },
    /// The ledger holds no termination of either category for the year.
    NoTerminations,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::GrowthVariance { expected, actual, variance } => write!(
                f,
                "growth variance: expected {expected} active, got {actual} ({variance:+})"
            ),
            ValidationWarning::NoTerminations => f.write_str("no terminations recorded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearResult {
    pub year:                     SimYear,
    pub success:                  bool,
    pub active_employees:         i64,
    pub total_terminations:       i64,
    pub experienced_terminations: i64,
    pub new_hire_terminations:    i64,
    pub total_hires:              i64,
    pub growth_rate:              f64,
    pub validation_passed:        bool,
    pub error:                    Option<String>,
    pub warnings:                 Vec<ValidationWarning>,
}

impl YearResult {
    /// A failed year: zeroed metrics, the error message kept for the summary.
    pub fn failed(year: SimYear, error: impl Into<String>) -> Self {
        Self {
            year,
            success: false,
            active_employees: 0,
            total_terminations: 0,
            experienced_terminations: 0,
            new_hire_terminations: 0,
            total_hires: 0,
            growth_rate: 0.0,
            validation_passed: false,
            error: Some(error.into()),
            warnings: Vec::new(),
        }
    }
}

pub struct YearValidator {
    config:   SimConfig,
    provider: Arc<dyn ConnectionProvider>,
}

impl YearValidator {
    pub fn new(config: SimConfig, provider: Arc<dyn ConnectionProvider>) -> Self {
        Self { config, provider }
    }

    /// Both the ledger and the snapshot must hold rows for `year`.
    /// No recovery here: rebuilding is the caller's job.
    pub fn assert_year_complete(&self, year: SimYear) -> SimResult<(i64, i64)> {
        let store = self.provider.acquire()?;
        let ledger_rows = store.count_for_year(YearTable::Ledger, year)?;
        let snapshot_rows = store.count_for_year(YearTable::Snapshot, year)?;
        if ledger_rows < 1 || snapshot_rows < 1 {
            return Err(SimError::IncompleteYear {
                year,
                ledger_rows,
                snapshot_rows,
            });
        }
        Ok((ledger_rows, snapshot_rows))
    }

    pub fn validate_year(&self, year: SimYear) -> SimResult<YearResult> {
        self.assert_year_complete(year)?;

        let store = self.provider.acquire()?;
        let before = if year <= self.config.first_year() {
            store.baseline_active_count()?
        } else {
            store.active_headcount(year - 1)?
        };
        let after = store.active_headcount(year)?;
        let counts = store.event_counts(year)?;

        let growth_rate = if before > 0 {
            (after - before) as f64 / before as f64
        } else {
            0.0
        };

        let mut warnings = Vec::new();
        let expected = (before as f64 * (1.0 + self.config.target_growth_rate)).round() as i64;
        let variance = after - expected;
        if variance.abs() > self.config.growth_tolerance {
            log::warn!(
                "year={year} validate: expected {expected} active, got {after} ({variance:+})"
            );
            warnings.push(ValidationWarning::GrowthVariance {
                expected,
                actual: after,
                variance,
            });
        }

        let validation_passed = counts.total_terminations() > 0;
        if !validation_passed {
            log::warn!("year={year} validate: no terminations recorded");
            warnings.push(ValidationWarning::NoTerminations);
        }

        log::info!(
            "year={year} validate: active {before} -> {after} ({:+.2}%), hires={} \
             terms={} (experienced={} new_hire={})",
            growth_rate * 100.0,
            counts.hires,
            counts.total_terminations(),
            counts.experienced_terminations,
            counts.new_hire_terminations,
        );

        Ok(YearResult {
            year,
            success: true,
            active_employees: after,
            total_terminations: counts.total_terminations(),
            experienced_terminations: counts.experienced_terminations,
            new_hire_terminations: counts.new_hire_terminations,
            total_hires: counts.hires,
            growth_rate,
            validation_passed,
            error: None,
            warnings,
        })
    }
}

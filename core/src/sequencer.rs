//! Event generation for one year.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Experienced terminations
//!   2. Promotions
//!   3. Merit raises
//!   4. Hiring
//!   5. New-hire terminations
//!
//! Later steps read earlier steps' staged output: no promotion or merit for
//! an employee terminated earlier in the year, hiring sized from the
//! terminations, new-hire terminations drawn from the hires.

use crate::{
    command::CommandRunner,
    config::SimConfig,
    error::SimResult,
    hiring::{calculate_hiring_requirement, HiringRequirement},
    step::{EVENT_SEQUENCE, HIRING_EVENTS},
    store::ConnectionProvider,
    transform::EngineVars,
    types::SimYear,
};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct SequenceReport {
    pub steps_completed: Vec<&'static str>,
    /// The diagnostic computed before hiring, if the headcount was readable.
    pub requirement:     Option<HiringRequirement>,
}

pub struct EventSequencer {
    config:   SimConfig,
    provider: Arc<dyn ConnectionProvider>,
    runner:   CommandRunner,
}

impl EventSequencer {
    pub fn new(config: SimConfig, provider: Arc<dyn ConnectionProvider>, runner: CommandRunner) -> Self {
        Self { config, provider, runner }
    }

    /// Run the five event steps for `year`. The first failing step aborts
    /// the sequence and its error is returned.
    pub fn run_year(&self, year: SimYear) -> SimResult<SequenceReport> {
        let mut report = SequenceReport::default();

        for step in EVENT_SEQUENCE {
            if step == HIRING_EVENTS {
                report.requirement = self.hiring_diagnostic(year);
            }
            self.runner.run(
                step,
                EngineVars::for_events(year, &self.config),
                self.config.full_refresh,
                &format!("{step} for {year}"),
            )?;
            report.steps_completed.push(step);
        }

        log::info!("year={year} events: {} steps complete", report.steps_completed.len());
        Ok(report)
    }

    /// The requirement the hiring step is expected to meet. Diagnostic
    /// only: an unreadable headcount is logged and hiring still runs.
    fn hiring_diagnostic(&self, year: SimYear) -> Option<HiringRequirement> {
        match self.starting_active(year) {
            Ok(active) => {
                let requirement = calculate_hiring_requirement(
                    active,
                    self.config.target_growth_rate,
                    self.config.total_termination_rate,
                    self.config.new_hire_termination_rate,
                );
                requirement.log(year);
                Some(requirement)
            }
            Err(e) => {
                log::warn!("year={year} hiring: starting headcount unavailable: {e}");
                None
            }
        }
    }

    /// Baseline for the canonical first year, prior year's snapshot after.
    pub fn starting_active(&self, year: SimYear) -> SimResult<i64> {
        let store = self.provider.acquire()?;
        if year <= self.config.first_year() {
            store.baseline_active_count()
        } else {
            store.active_headcount(year - 1)
        }
    }
}

//! Reference workforce steps: the year's starting population, the
//! end-of-year snapshot built from the ledger, and the snapshot-state copy.

use crate::{
    error::SimResult,
    event::EventType,
    step::{StepContext, TransformStep, SNAPSHOT_STATE, STARTING_WORKFORCE, WORKFORCE_SNAPSHOT},
    store::YearTable,
    types::EmployeeId,
    workforce::{DetailedStatus, EmploymentStatus, WorkforceSnapshotRow},
};
use std::collections::{HashMap, HashSet};

// ── Starting workforce ─────────────────────────────────────────────

/// Stages the employees active on January 1st: the baseline for the
/// canonical first year, the prior year's active snapshot otherwise.
pub struct StartingWorkforceStep;

impl TransformStep for StartingWorkforceStep {
    fn name(&self) -> &'static str {
        STARTING_WORKFORCE
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let first_year = ctx.vars.i64("first_simulation_year")?;

        let (source, employees) = if i64::from(year) <= first_year {
            ("baseline_workforce", ctx.store.baseline_active()?)
        } else {
            (WORKFORCE_SNAPSHOT, ctx.store.snapshot_active(year - 1)?)
        };
        if employees.is_empty() {
            return Err(anyhow::anyhow!(
                "no active employees in {source} to start year {year} from"
            )
            .into());
        }

        let staged = ctx.store.replace_starting_workforce(year, &employees)?;
        Ok(format!(
            "{}: year={year} staged {staged} employees from {source}",
            self.name()
        ))
    }
}

// ── Workforce snapshot ─────────────────────────────────────────────

/// Applies the year's ledger to the starting workforce.
pub struct WorkforceSnapshotStep;

impl TransformStep for WorkforceSnapshotStep {
    fn name(&self) -> &'static str {
        WORKFORCE_SNAPSHOT
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let starting = ctx.store.starting_workforce(year)?;
        if starting.is_empty() {
            return Err(anyhow::anyhow!(
                "no starting workforce staged for year {year}; run {STARTING_WORKFORCE} first"
            )
            .into());
        }
        let ledger = ctx.store.ledger_events(year)?;

        let mut terminated: HashSet<EmployeeId> = HashSet::new();
        // Latest compensation and level per employee, in ledger order.
        let mut compensation: HashMap<EmployeeId, f64> = HashMap::new();
        let mut level: HashMap<EmployeeId, i64> = HashMap::new();
        let mut hires = Vec::new();

        for event in &ledger {
            match event.event_type {
                EventType::Termination => {
                    terminated.insert(event.employee_id.clone());
                }
                EventType::Promotion | EventType::Merit => {
                    if let Some(v) = event.new_value {
                        compensation.insert(event.employee_id.clone(), v);
                    }
                    if event.event_type == EventType::Promotion {
                        if let Some(l) = event.employee_level {
                            level.insert(event.employee_id.clone(), l);
                        }
                    }
                }
                EventType::Hire => hires.push(event),
            }
        }

        let mut rows = Vec::with_capacity(starting.len() + hires.len());
        for e in &starting {
            let detailed = if terminated.contains(&e.employee_id) {
                DetailedStatus::ExperiencedTermination
            } else {
                DetailedStatus::ContinuousActive
            };
            rows.push(WorkforceSnapshotRow {
                simulation_year:      year,
                employee_id:          e.employee_id.clone(),
                employment_status:    detailed.status(),
                current_compensation: compensation
                    .get(&e.employee_id)
                    .copied()
                    .unwrap_or(e.current_compensation),
                current_age:          e.current_age + 1,
                current_tenure:       e.current_tenure + 1,
                level:                level.get(&e.employee_id).copied().unwrap_or(e.level),
                detailed_status:      detailed,
            });
        }
        for hire in hires {
            let detailed = if terminated.contains(&hire.employee_id) {
                DetailedStatus::NewHireTermination
            } else {
                DetailedStatus::NewHireActive
            };
            rows.push(WorkforceSnapshotRow {
                simulation_year:      year,
                employee_id:          hire.employee_id.clone(),
                employment_status:    detailed.status(),
                current_compensation: hire.new_value.unwrap_or_default(),
                current_age:          hire.employee_age.unwrap_or_default(),
                current_tenure:       0,
                level:                hire.employee_level.unwrap_or(1),
                detailed_status:      detailed,
            });
        }

        let written = ctx.store.replace_snapshot(year, &rows)?;
        let active = rows
            .iter()
            .filter(|r| r.employment_status == EmploymentStatus::Active)
            .count();
        Ok(format!(
            "{}: year={year} wrote {written} rows ({active} active)",
            self.name()
        ))
    }
}

// ── Snapshot state ─────────────────────────────────────────────────

/// Copies the year's snapshot into the SCD-style state history.
pub struct SnapshotStateStep;

impl TransformStep for SnapshotStateStep {
    fn name(&self) -> &'static str {
        SNAPSHOT_STATE
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        ctx.store.delete_for_year(YearTable::SnapshotState, year)?;
        let recorded_at = chrono::Utc::now().to_rfc3339();
        let copied = ctx.store.copy_snapshot_to_state(year, &recorded_at)?;
        Ok(format!("{}: year={year} recorded {copied} rows", self.name()))
    }
}

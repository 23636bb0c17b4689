//! Reference event-generation steps and ledger consolidation.
//!
//! Selection is seeded uniform sampling with exact, rate-derived counts.
//! It stands in for the external engine's demographic hazard models; only
//! the counts are contractual, not which employees are picked.
//!
//! Each step reads the staged output of the steps before it in
//! `EVENT_SEQUENCE` and replaces only its own staged rows for the year.

use crate::{
    error::{SimError, SimResult},
    event::{EventCategory, EventRecord, EventType},
    hiring::calculate_hiring_requirement,
    rng::{RngBank, StepRng, StepSlot},
    step::{
        StepContext, TransformStep, EVENT_SEQUENCE, HIRING_EVENTS, MERIT_EVENTS,
        NEW_HIRE_TERMINATION_EVENTS, PROMOTION_EVENTS, TERMINATION_EVENTS, YEARLY_EVENTS,
    },
    types::{EmployeeId, SimYear},
    workforce::MAX_LEVEL,
};
use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};

const PROMOTION_PROBABILITY: f64 = 0.12;
const PROMOTION_MIN_TENURE: i64 = 1;
const MERIT_DAY: u32 = 182; // July 1st in non-leap years

fn day_of_year(year: SimYear, day: u32) -> SimResult<NaiveDate> {
    NaiveDate::from_yo_opt(year, day).ok_or(SimError::InvalidDate { year, day })
}

fn random_day(rng: &mut StepRng, year: SimYear, from_day: u32) -> SimResult<NaiveDate> {
    let from_day = from_day.clamp(1, 365);
    let day = from_day + rng.next_u64_below(u64::from(366 - from_day)) as u32;
    day_of_year(year, day)
}

/// Clear this step's previous output for the year (or every year on refresh).
fn reset_staging(ctx: &StepContext<'_>, step: &str, year: SimYear) -> SimResult<()> {
    if ctx.full_refresh {
        ctx.store.clear_staged_events(step)?;
    } else {
        ctx.store.delete_staged_events(year, step)?;
    }
    Ok(())
}

fn terminated_ids(ctx: &StepContext<'_>, year: SimYear) -> SimResult<HashSet<EmployeeId>> {
    Ok(ctx
        .store
        .staged_events(year, TERMINATION_EVENTS)?
        .into_iter()
        .map(|e| e.employee_id)
        .collect())
}

fn staged_message(step: &str, year: SimYear, count: usize) -> String {
    format!("{step}: year={year} staged {count} events")
}

// ── 1. Experienced terminations ────────────────────────────────────

pub struct TerminationStep;

impl TransformStep for TerminationStep {
    fn name(&self) -> &'static str {
        TERMINATION_EVENTS
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let rate = ctx.vars.f64("total_termination_rate")?;
        let mut rng = RngBank::new(ctx.vars.u64("random_seed")?).for_step(StepSlot::Termination, year);
        reset_staging(ctx, self.name(), year)?;

        let workforce = ctx.store.starting_workforce(year)?;
        let target = calculate_hiring_requirement(workforce.len() as i64, 0.0, rate, 0.0)
            .experienced_terminations as usize;

        let mut events = Vec::with_capacity(target);
        for idx in rng.sample_indices(workforce.len(), target) {
            let e = &workforce[idx];
            events.push(
                EventRecord::new(
                    year,
                    e.employee_id.clone(),
                    EventType::Termination,
                    EventCategory::ExperiencedTermination,
                    random_day(&mut rng, year, 1)?,
                )
                .with_values(Some(e.current_compensation), None)
                .with_profile(e.current_age, e.level),
            );
        }

        let staged = ctx.store.insert_staged_events(self.name(), &events)?;
        Ok(staged_message(self.name(), year, staged))
    }
}

// ── 2. Promotions ──────────────────────────────────────────────────

pub struct PromotionStep;

impl TransformStep for PromotionStep {
    fn name(&self) -> &'static str {
        PROMOTION_EVENTS
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let mut rng = RngBank::new(ctx.vars.u64("random_seed")?).for_step(StepSlot::Promotion, year);
        reset_staging(ctx, self.name(), year)?;

        let terminated = terminated_ids(ctx, year)?;
        let effective = day_of_year(year, 1)?;

        let mut events = Vec::new();
        for e in ctx.store.starting_workforce(year)? {
            if terminated.contains(&e.employee_id)
                || e.level >= MAX_LEVEL
                || e.current_tenure < PROMOTION_MIN_TENURE
            {
                continue;
            }
            if !rng.chance(PROMOTION_PROBABILITY) {
                continue;
            }
            let new_comp = (e.current_compensation * rng.uniform(1.10, 1.20)).round();
            events.push(
                EventRecord::new(
                    year,
                    e.employee_id.clone(),
                    EventType::Promotion,
                    EventCategory::Promotion,
                    effective,
                )
                .with_values(Some(e.current_compensation), Some(new_comp))
                .with_profile(e.current_age, e.level + 1),
            );
        }

        let staged = ctx.store.insert_staged_events(self.name(), &events)?;
        Ok(staged_message(self.name(), year, staged))
    }
}

// ── 3. Merit raises ────────────────────────────────────────────────

pub struct MeritStep;

impl TransformStep for MeritStep {
    fn name(&self) -> &'static str {
        MERIT_EVENTS
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let mut rng = RngBank::new(ctx.vars.u64("random_seed")?).for_step(StepSlot::Merit, year);
        reset_staging(ctx, self.name(), year)?;

        let terminated = terminated_ids(ctx, year)?;
        // Merit applies on top of any promotion raise earlier in the year.
        let promoted: HashMap<EmployeeId, f64> = ctx
            .store
            .staged_events(year, PROMOTION_EVENTS)?
            .into_iter()
            .filter_map(|e| e.new_value.map(|v| (e.employee_id, v)))
            .collect();
        let effective = day_of_year(year, MERIT_DAY)?;

        let mut events = Vec::new();
        for e in ctx.store.starting_workforce(year)? {
            if terminated.contains(&e.employee_id) {
                continue;
            }
            let base = promoted
                .get(&e.employee_id)
                .copied()
                .unwrap_or(e.current_compensation);
            let new_comp = (base * (1.0 + rng.uniform(0.02, 0.045))).round();
            events.push(
                EventRecord::new(
                    year,
                    e.employee_id.clone(),
                    EventType::Merit,
                    EventCategory::MeritRaise,
                    effective,
                )
                .with_values(Some(base), Some(new_comp)),
            );
        }

        let staged = ctx.store.insert_staged_events(self.name(), &events)?;
        Ok(staged_message(self.name(), year, staged))
    }
}

// ── 4. Hiring ──────────────────────────────────────────────────────

pub struct HiringStep;

impl TransformStep for HiringStep {
    fn name(&self) -> &'static str {
        HIRING_EVENTS
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let mut rng = RngBank::new(ctx.vars.u64("random_seed")?).for_step(StepSlot::Hiring, year);
        reset_staging(ctx, self.name(), year)?;

        let starting = ctx.store.starting_workforce(year)?.len() as i64;
        let requirement = calculate_hiring_requirement(
            starting,
            ctx.vars.f64("target_growth_rate")?,
            ctx.vars.f64("total_termination_rate")?,
            ctx.vars.f64("new_hire_termination_rate")?,
        );

        let hires = requirement.total_hires_needed.max(0) as usize;
        let mut events = Vec::with_capacity(hires);
        for i in 0..hires {
            let level = if rng.chance(0.3) { 2 } else { 1 };
            let age = 22 + rng.next_u64_below(18) as i64;
            let band = 55_000.0 + 25_000.0 * (level - 1) as f64;
            let compensation = (band * rng.uniform(0.9, 1.1)).round();
            events.push(
                EventRecord::new(
                    year,
                    format!("NH_{year}_{i:06}"),
                    EventType::Hire,
                    EventCategory::NewHire,
                    random_day(&mut rng, year, 1)?,
                )
                .with_values(None, Some(compensation))
                .with_profile(age, level),
            );
        }

        let staged = ctx.store.insert_staged_events(self.name(), &events)?;
        Ok(staged_message(self.name(), year, staged))
    }
}

// ── 5. New-hire terminations ───────────────────────────────────────

pub struct NewHireTerminationStep;

impl TransformStep for NewHireTerminationStep {
    fn name(&self) -> &'static str {
        NEW_HIRE_TERMINATION_EVENTS
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let rate = ctx.vars.f64("new_hire_termination_rate")?;
        let mut rng =
            RngBank::new(ctx.vars.u64("random_seed")?).for_step(StepSlot::NewHireTermination, year);
        reset_staging(ctx, self.name(), year)?;

        let hires = ctx.store.staged_events(year, HIRING_EVENTS)?;
        // Same half-away-from-zero rounding as the hiring requirement.
        let target = (hires.len() as f64 * rate).round() as usize;

        let mut events = Vec::with_capacity(target);
        for idx in rng.sample_indices(hires.len(), target) {
            let hire = &hires[idx];
            let date = random_day(&mut rng, year, hire.effective_date.ordinal())?;
            let mut event = EventRecord::new(
                year,
                hire.employee_id.clone(),
                EventType::Termination,
                EventCategory::NewHireTermination,
                date,
            )
            .with_values(hire.new_value, None);
            event.employee_age = hire.employee_age;
            event.employee_level = hire.employee_level;
            events.push(event);
        }

        let staged = ctx.store.insert_staged_events(self.name(), &events)?;
        Ok(staged_message(self.name(), year, staged))
    }
}

// ── Ledger consolidation ───────────────────────────────────────────

/// Rebuilds the year's ledger slice from the five staged event steps.
/// Always incremental: a refresh never wipes other years' ledger rows.
pub struct YearlyEventsStep;

impl TransformStep for YearlyEventsStep {
    fn name(&self) -> &'static str {
        YEARLY_EVENTS
    }

    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String> {
        let year = ctx.vars.year()?;
        let written = ctx.store.consolidate_ledger(year, &EVENT_SEQUENCE)?;
        Ok(format!("{}: year={year} wrote {written} ledger rows", self.name()))
    }
}

//! Step names and the in-process step trait.
//!
//! RULE: Every reference step implements TransformStep.
//! The reference engine dispatches a selector to exactly one step, or to
//! all of them in FULL_PIPELINE order for the `all` selector.

use crate::{error::SimResult, store::SimStore, transform::EngineVars};

pub const STARTING_WORKFORCE: &str = "int_starting_workforce";
pub const TERMINATION_EVENTS: &str = "int_termination_events";
pub const PROMOTION_EVENTS: &str = "int_promotion_events";
pub const MERIT_EVENTS: &str = "int_merit_events";
pub const HIRING_EVENTS: &str = "int_hiring_events";
pub const NEW_HIRE_TERMINATION_EVENTS: &str = "int_new_hire_termination_events";
pub const YEARLY_EVENTS: &str = "fct_yearly_events";
pub const WORKFORCE_SNAPSHOT: &str = "fct_workforce_snapshot";
pub const SNAPSHOT_STATE: &str = "scd_workforce_state";

/// Selector for "run everything for a year".
pub const ALL: &str = "all";

/// Event generation precedence. Fixed, never reordered.
pub const EVENT_SEQUENCE: [&str; 5] = [
    TERMINATION_EVENTS,
    PROMOTION_EVENTS,
    MERIT_EVENTS,
    HIRING_EVENTS,
    NEW_HIRE_TERMINATION_EVENTS,
];

/// Every step in the order a full-pipeline run executes them.
pub const FULL_PIPELINE: [&str; 9] = [
    STARTING_WORKFORCE,
    TERMINATION_EVENTS,
    PROMOTION_EVENTS,
    MERIT_EVENTS,
    HIRING_EVENTS,
    NEW_HIRE_TERMINATION_EVENTS,
    YEARLY_EVENTS,
    WORKFORCE_SNAPSHOT,
    SNAPSHOT_STATE,
];

/// Everything a step may touch during one invocation.
pub struct StepContext<'a> {
    pub store:        &'a SimStore,
    pub vars:         &'a EngineVars,
    pub full_refresh: bool,
}

/// The contract every in-process step must fulfill.
pub trait TransformStep: Send + Sync {
    /// Unique stable name; the selector that runs this step.
    fn name(&self) -> &'static str;

    /// Execute for the year in `ctx.vars`. Returns a one-line progress
    /// message (row counts) for the engine's stdout.
    fn run(&self, ctx: &StepContext<'_>) -> SimResult<String>;
}

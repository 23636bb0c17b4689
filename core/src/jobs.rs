//! Job entry points for hosts (CLI, scheduler).
//!
//! The two simulation jobs have different failure surfaces: the
//! single-year job propagates the first error, the multi-year job reports
//! one result per year.

use crate::{
    command::CommandRunner,
    config::SimConfig,
    engine::{RunSummary, SimEngine},
    error::SimResult,
    snapshot::{SnapshotKind, SnapshotManager, SnapshotSummary},
    step::ALL,
    store::ConnectionProvider,
    transform::{EngineVars, TransformEngine},
    types::SimYear,
    validator::YearResult,
    year::YearOrchestrator,
};
use std::sync::Arc;

/// Everything a job needs, built once by the host.
#[derive(Clone)]
pub struct SimContext {
    pub config:   SimConfig,
    pub provider: Arc<dyn ConnectionProvider>,
    pub runner:   CommandRunner,
}

impl SimContext {
    pub fn new(
        config: SimConfig,
        provider: Arc<dyn ConnectionProvider>,
        engine: Arc<dyn TransformEngine>,
    ) -> Self {
        Self {
            config,
            provider,
            runner: CommandRunner::new(engine),
        }
    }
}

/// Run `start_year` only. Errors propagate.
pub fn single_year_simulation(ctx: &SimContext) -> SimResult<YearResult> {
    ctx.config.validate()?;
    YearOrchestrator::new(ctx.config.clone(), ctx.provider.clone(), ctx.runner.clone())
        .run_year(ctx.config.start_year)
}

/// `single_year_simulation` wrapped in a summary under a fresh run id.
/// Single-year runs are not written to the run registry.
pub fn single_year_report(ctx: &SimContext) -> SimResult<RunSummary> {
    let result = single_year_simulation(ctx)?;
    Ok(RunSummary::from_results(
        &uuid::Uuid::new_v4().to_string(),
        &[result],
    ))
}

pub fn multi_year_simulation(ctx: &SimContext, baseline_valid: bool) -> SimResult<Vec<YearResult>> {
    multi_year_report(ctx, baseline_valid).map(|summary| summary.years)
}

/// The multi-year run's summary, under the run id recorded in the registry.
pub fn multi_year_report(ctx: &SimContext, baseline_valid: bool) -> SimResult<RunSummary> {
    SimEngine::new(ctx.config.clone(), ctx.provider.clone(), ctx.runner.clone())
        .run_with_summary(baseline_valid)
}

/// Every step for `year` in one streamed engine call, then the end-of-year
/// snapshot state. Progress lines go to `on_progress` as they arrive.
pub fn full_pipeline(
    ctx: &SimContext,
    year: SimYear,
    on_progress: &mut dyn FnMut(&str),
) -> SimResult<SnapshotSummary> {
    let vars = EngineVars::for_events(year, &ctx.config)
        .with("first_simulation_year", ctx.config.first_year());
    ctx.runner.run_streaming(
        ALL,
        vars,
        ctx.config.full_refresh,
        &format!("full pipeline for {year}"),
        on_progress,
    )?;

    SnapshotManager::new(ctx.provider.clone(), ctx.runner.clone())
        .build_snapshot(year, SnapshotKind::EndOfYear)
        .into_result()
}

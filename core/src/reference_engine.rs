//! In-process transformation engine over the SQLite store.
//!
//! Behaves like an external engine from the orchestrator's point of view:
//! step failures come back as a non-zero exit code with the error on
//! stderr, never as `Err`. `Err` means the engine could not be reached
//! (here: no store connection).
//!
//! REGISTRATION ORDER (fixed, documented, never reordered) matches
//! `step::FULL_PIPELINE`; the `all` selector runs the steps in this order.

use crate::{
    error::SimResult,
    event_steps::{
        HiringStep, MeritStep, NewHireTerminationStep, PromotionStep, TerminationStep,
        YearlyEventsStep,
    },
    step::{StepContext, TransformStep, ALL},
    store::ConnectionProvider,
    transform::{EngineOutput, EngineRequest, TransformEngine},
    workforce_steps::{SnapshotStateStep, StartingWorkforceStep, WorkforceSnapshotStep},
};
use std::sync::Arc;

/// Exit code for a step that ran and failed.
pub const EXIT_STEP_FAILED: i32 = 1;
/// Exit code for a selector that names no step.
pub const EXIT_UNKNOWN_SELECTOR: i32 = 2;

pub struct ReferenceEngine {
    provider: Arc<dyn ConnectionProvider>,
    steps:    Vec<Box<dyn TransformStep>>,
}

impl ReferenceEngine {
    pub fn new(provider: Arc<dyn ConnectionProvider>) -> Self {
        Self {
            provider,
            steps: Vec::new(),
        }
    }

    /// Build an engine with every reference step registered.
    pub fn build(provider: Arc<dyn ConnectionProvider>) -> Self {
        let mut engine = ReferenceEngine::new(provider);
        engine.register(Box::new(StartingWorkforceStep));
        engine.register(Box::new(TerminationStep));
        engine.register(Box::new(PromotionStep));
        engine.register(Box::new(MeritStep));
        engine.register(Box::new(HiringStep));
        engine.register(Box::new(NewHireTerminationStep));
        engine.register(Box::new(YearlyEventsStep));
        engine.register(Box::new(WorkforceSnapshotStep));
        engine.register(Box::new(SnapshotStateStep));
        engine
    }

    /// Register a step. Call in the documented execution order.
    pub fn register(&mut self, step: Box<dyn TransformStep>) {
        self.steps.push(step);
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    fn execute(
        &self,
        request: &EngineRequest,
        on_progress: &mut dyn FnMut(&str),
    ) -> SimResult<EngineOutput> {
        let selected: Vec<&dyn TransformStep> = if request.selector == ALL {
            self.steps.iter().map(|s| &**s).collect()
        } else {
            match self.steps.iter().find(|s| s.name() == request.selector) {
                Some(step) => vec![&**step],
                None => {
                    return Ok(EngineOutput::failed(
                        EXIT_UNKNOWN_SELECTOR,
                        format!("unknown selector '{}'", request.selector),
                    ))
                }
            }
        };

        let store = self.provider.acquire()?;
        let ctx = StepContext {
            store:        &store,
            vars:         &request.vars,
            full_refresh: request.full_refresh,
        };

        let mut output = EngineOutput::ok(String::new());
        for step in selected {
            match step.run(&ctx) {
                Ok(line) => {
                    on_progress(&line);
                    output.stdout.push_str(&line);
                    output.stdout.push('\n');
                }
                Err(e) => {
                    log::debug!("reference step={} failed: {e}", step.name());
                    output.exit_code = EXIT_STEP_FAILED;
                    output.stderr = format!("{}: {e}", step.name());
                    break;
                }
            }
        }
        Ok(output)
    }
}

impl TransformEngine for ReferenceEngine {
    fn invoke(&self, request: &EngineRequest) -> SimResult<EngineOutput> {
        self.execute(request, &mut |_| {})
    }

    fn invoke_streaming(
        &self,
        request: &EngineRequest,
        on_progress: &mut dyn FnMut(&str),
    ) -> SimResult<EngineOutput> {
        self.execute(request, on_progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{step::FULL_PIPELINE, store::StoreProvider, transform::EngineVars};

    #[test]
    fn registration_order_matches_full_pipeline() {
        let provider = Arc::new(StoreProvider::in_memory().unwrap());
        let engine = ReferenceEngine::build(provider);
        assert_eq!(engine.step_names(), FULL_PIPELINE.to_vec());
    }

    #[test]
    fn unknown_selector_is_a_non_zero_exit() {
        let provider = Arc::new(StoreProvider::in_memory().unwrap());
        let engine = ReferenceEngine::build(provider.clone());
        let out = engine
            .invoke(&EngineRequest {
                selector:     "int_bonus_events".into(),
                vars:         EngineVars::for_year(2025),
                full_refresh: false,
            })
            .unwrap();
        assert_eq!(out.exit_code, EXIT_UNKNOWN_SELECTOR);
        // Rejected before touching the store.
        assert_eq!(provider.acquisitions(), 0);
    }

    #[test]
    fn step_errors_surface_on_stderr() {
        let provider = Arc::new(StoreProvider::in_memory().unwrap());
        let engine = ReferenceEngine::build(provider);
        // Missing first_simulation_year variable.
        let out = engine
            .invoke(&EngineRequest {
                selector:     "int_starting_workforce".into(),
                vars:         EngineVars::for_year(2025),
                full_refresh: false,
            })
            .unwrap();
        assert_eq!(out.exit_code, EXIT_STEP_FAILED);
        assert!(out.stderr.contains("first_simulation_year"));
    }
}

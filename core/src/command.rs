//! Command runner: the only way the orchestrator talks to the engine.
//!
//! Translates a step invocation into an `EngineRequest` and normalises the
//! outcome: a non-zero exit becomes `SimError::EngineExecution` carrying
//! the captured output. Nothing is retried here.

use crate::{
    error::{SimError, SimResult},
    transform::{EngineOutput, EngineRequest, EngineVars, TransformEngine},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct CommandRunner {
    engine: Arc<dyn TransformEngine>,
}

impl CommandRunner {
    pub fn new(engine: Arc<dyn TransformEngine>) -> Self {
        Self { engine }
    }

    /// Run one step to completion.
    pub fn run(
        &self,
        step: &str,
        vars: EngineVars,
        full_refresh: bool,
        description: &str,
    ) -> SimResult<EngineOutput> {
        let request = build_request(step, vars, full_refresh);
        log::debug!("run step={step} refresh={full_refresh} ({description})");
        let output = self.engine.invoke(&request)?;
        check_output(step, description, output)
    }

    /// Run one step, forwarding each progress line as it arrives.
    pub fn run_streaming(
        &self,
        step: &str,
        vars: EngineVars,
        full_refresh: bool,
        description: &str,
        on_progress: &mut dyn FnMut(&str),
    ) -> SimResult<EngineOutput> {
        let request = build_request(step, vars, full_refresh);
        log::debug!("run (streaming) step={step} refresh={full_refresh} ({description})");
        let output = self.engine.invoke_streaming(&request, on_progress)?;
        check_output(step, description, output)
    }
}

fn build_request(step: &str, vars: EngineVars, full_refresh: bool) -> EngineRequest {
    EngineRequest {
        selector: step.to_string(),
        vars,
        full_refresh,
    }
}

fn check_output(step: &str, description: &str, output: EngineOutput) -> SimResult<EngineOutput> {
    if output.success() {
        return Ok(output);
    }
    log::error!(
        "step={step} failed with exit code {} ({description})",
        output.exit_code
    );
    Err(SimError::EngineExecution {
        step:        step.to_string(),
        description: description.to_string(),
        exit_code:   output.exit_code,
        stdout:      output.stdout,
        stderr:      output.stderr,
    })
}

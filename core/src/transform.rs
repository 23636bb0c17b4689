//! The transformation engine contract.
//!
//! The orchestrator never selects individual employees. It asks an engine to
//! run a named step with a variable set and reads back an exit code and the
//! captured output. `ProcessEngine` shells out to an external CLI;
//! `ReferenceEngine` (reference_engine.rs) runs the steps in-process.

use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    types::SimYear,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Variables passed to a step. Values are JSON scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineVars(Map<String, Value>);

impl EngineVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// The minimal variable set every step receives.
    pub fn for_year(year: SimYear) -> Self {
        Self::new().with("simulation_year", year)
    }

    /// Year plus the seed and every configured rate (event steps).
    pub fn for_events(year: SimYear, config: &SimConfig) -> Self {
        Self::for_year(year)
            .with("random_seed", config.random_seed)
            .with("target_growth_rate", config.target_growth_rate)
            .with("total_termination_rate", config.total_termination_rate)
            .with("new_hire_termination_rate", config.new_hire_termination_rate)
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn year(&self) -> SimResult<SimYear> {
        let raw = self.i64("simulation_year")?;
        SimYear::try_from(raw).map_err(|_| SimError::InvalidVariable {
            name: "simulation_year".into(),
        })
    }

    pub fn i64(&self, name: &str) -> SimResult<i64> {
        self.0
            .get(name)
            .and_then(Value::as_i64)
            .ok_or_else(|| SimError::InvalidVariable { name: name.into() })
    }

    pub fn u64(&self, name: &str) -> SimResult<u64> {
        self.0
            .get(name)
            .and_then(Value::as_u64)
            .ok_or_else(|| SimError::InvalidVariable { name: name.into() })
    }

    pub fn f64(&self, name: &str) -> SimResult<f64> {
        self.0
            .get(name)
            .and_then(Value::as_f64)
            .ok_or_else(|| SimError::InvalidVariable { name: name.into() })
    }

    /// Compact JSON payload, the form external CLIs take on `--vars`.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

/// One invocation of the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineRequest {
    pub selector:     String,
    pub vars:         EngineVars,
    pub full_refresh: bool,
}

/// What came back from the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineOutput {
    pub exit_code: i32,
    pub stdout:    String,
    pub stderr:    String,
}

impl EngineOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout:    stdout.into(),
            stderr:    String::new(),
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// The contract every transformation engine must fulfill.
///
/// A non-zero exit code is a normal return, not an `Err`; `Err` is
/// reserved for failing to invoke the engine at all.
pub trait TransformEngine: Send + Sync {
    fn invoke(&self, request: &EngineRequest) -> SimResult<EngineOutput>;

    /// Like `invoke`, but reports progress lines as they happen.
    /// The default replays stdout after the call completes.
    fn invoke_streaming(
        &self,
        request: &EngineRequest,
        on_progress: &mut dyn FnMut(&str),
    ) -> SimResult<EngineOutput> {
        let output = self.invoke(request)?;
        for line in output.stdout.lines() {
            on_progress(line);
        }
        Ok(output)
    }
}

/// Runs steps through an external command line tool.
///
/// The default invocation is
/// `dbt run --select <selector> --vars '<json>' [--full-refresh]`.
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    pub program:     String,
    pub base_args:   Vec<String>,
    pub project_dir: Option<PathBuf>,
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self {
            program:     "dbt".into(),
            base_args:   vec!["run".into()],
            project_dir: None,
        }
    }
}

impl ProcessEngine {
    pub fn new(program: &str, project_dir: Option<PathBuf>) -> Self {
        Self {
            program: program.into(),
            project_dir,
            ..Self::default()
        }
    }

    /// The full argument list for a request.
    pub fn args_for(&self, request: &EngineRequest) -> SimResult<Vec<String>> {
        let mut args = self.base_args.clone();
        args.push("--select".into());
        args.push(request.selector.clone());
        args.push("--vars".into());
        args.push(request.vars.to_json()?);
        if request.full_refresh {
            args.push("--full-refresh".into());
        }
        Ok(args)
    }

    fn command(&self, request: &EngineRequest) -> SimResult<Command> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(request)?);
        if let Some(dir) = &self.project_dir {
            cmd.current_dir(dir);
        }
        Ok(cmd)
    }
}

impl TransformEngine for ProcessEngine {
    fn invoke(&self, request: &EngineRequest) -> SimResult<EngineOutput> {
        let output = self.command(request)?.output()?;
        Ok(EngineOutput {
            // A signal-terminated process has no exit code.
            exit_code: output.status.code().unwrap_or(-1),
            stdout:    String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr:    String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn invoke_streaming(
        &self,
        request: &EngineRequest,
        on_progress: &mut dyn FnMut(&str),
    ) -> SimResult<EngineOutput> {
        let mut child = self
            .command(request)?
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stderr on a helper thread so a chatty engine cannot block
        // on a full pipe while we read stdout.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = pipe.read_to_string(&mut buf);
                buf
            })
        });

        let mut stdout = String::new();
        if let Some(pipe) = child.stdout.take() {
            for line in BufReader::new(pipe).lines() {
                let line = line?;
                on_progress(&line);
                stdout.push_str(&line);
                stdout.push('\n');
            }
        }

        let status = child.wait()?;
        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        Ok(EngineOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_vars_carry_seed_and_rates() {
        let config = SimConfig::default_test();
        let vars = EngineVars::for_events(2026, &config);
        assert_eq!(vars.year().unwrap(), 2026);
        assert_eq!(vars.u64("random_seed").unwrap(), 42);
        assert_eq!(vars.f64("total_termination_rate").unwrap(), 0.12);
        assert!(matches!(
            vars.f64("no_such_var"),
            Err(SimError::InvalidVariable { .. })
        ));
    }

    #[test]
    fn process_args_append_refresh_flag_last() {
        let engine = ProcessEngine::default();
        let request = EngineRequest {
            selector:     "int_hiring_events".into(),
            vars:         EngineVars::for_year(2025),
            full_refresh: true,
        };
        let args = engine.args_for(&request).unwrap();
        assert_eq!(
            args,
            vec![
                "run",
                "--select",
                "int_hiring_events",
                "--vars",
                r#"{"simulation_year":2025}"#,
                "--full-refresh",
            ]
        );
    }

    #[test]
    fn missing_program_is_an_invocation_error() {
        let engine = ProcessEngine::new("definitely-not-a-real-binary-7f3a", None);
        let request = EngineRequest {
            selector:     "x".into(),
            vars:         EngineVars::for_year(2025),
            full_refresh: false,
        };
        assert!(matches!(engine.invoke(&request), Err(SimError::Io(_))));
    }
}

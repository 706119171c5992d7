// External process execution shared by the login flow and the wrapped command
use crate::error::{Result, WrapperError};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// How long a child may run on after ctrl-c before it is killed
pub const INTERRUPT_GRACE: Duration = Duration::from_secs(10);

/// What to run and how
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Added on top of the inherited environment
    pub env: Vec<(String, String)>,
    /// Pipe stderr into the outcome instead of passing it through
    pub capture_stderr: bool,
}

impl ProcessSpec {
    /// Fully transparent run: inherited stdio, inherited environment
    pub fn passthrough(program: &str, args: &[String]) -> Self {
        Self {
            program: program.to_string(),
            args: args.to_vec(),
            env: Vec::new(),
            capture_stderr: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub signal: Option<i32>,
    /// Captured stderr (empty unless `capture_stderr` was set)
    pub stderr: String,
    /// A ctrl-c arrived while the process was running
    pub interrupted: bool,
}

impl ProcessOutcome {
    pub fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    fn from_status(status: ExitStatus, stderr: Vec<u8>, interrupted: bool) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            interrupted,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to report for this process, shell style for signals
    pub fn exit_code(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(signal)) => 128 + signal,
            (None, None) => 1,
        }
    }

    pub fn describe(&self) -> String {
        match (self.code, self.signal) {
            (Some(code), _) => format!("exit code {}", code),
            (None, Some(signal)) => format!("killed by signal {}", signal),
            (None, None) => "unknown exit status".to_string(),
        }
    }
}

/// Runs a process to completion
pub trait ProcessRunner {
    async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutcome>;
}

/// Real subprocesses via tokio.
///
/// The child shares our process group, so a ctrl-c reaches it directly. On
/// the first ctrl-c we keep waiting and report whatever the child exits with.
/// A second ctrl-c, or [`INTERRUPT_GRACE`] passing, kills the child and
/// yields `WrapperError::Interrupted`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &ProcessSpec) -> Result<ProcessOutcome> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(if spec.capture_stderr {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .kill_on_drop(true);

        tracing::debug!("Running {} {:?}", spec.program, spec.args);
        let child = command.spawn().map_err(|source| WrapperError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        // Dropping the wait future drops the child, which kills it.
        let wait = child.wait_with_output();
        tokio::pin!(wait);

        tokio::select! {
            output = &mut wait => {
                let output = output?;
                return Ok(finished(spec, ProcessOutcome::from_status(output.status, output.stderr, false)));
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!(
                    "Interrupted, waiting up to {}s for {} to exit",
                    INTERRUPT_GRACE.as_secs(),
                    spec.program
                );
            }
        }

        tokio::select! {
            output = &mut wait => {
                let output = output?;
                Ok(finished(spec, ProcessOutcome::from_status(output.status, output.stderr, true)))
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted again, stopping {}", spec.program);
                Err(WrapperError::Interrupted)
            }
            _ = tokio::time::sleep(INTERRUPT_GRACE) => {
                tracing::warn!("{} still running after interrupt, stopping it", spec.program);
                Err(WrapperError::Interrupted)
            }
        }
    }
}

fn finished(spec: &ProcessSpec, outcome: ProcessOutcome) -> ProcessOutcome {
    tracing::debug!("{} finished with {}", spec.program, outcome.describe());
    outcome
}

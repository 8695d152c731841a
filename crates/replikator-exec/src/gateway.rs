//! Process gateway — runs the external tool and captures its output.
//!
//! The gateway does not interpret output. A zero exit status yields stdout;
//! anything else yields stderr. A tool that could not be launched at all
//! also yields its (empty) stderr, so callers cannot tell "the tool reported
//! an error" apart from "the tool did not run" except by the text. The
//! spawn error itself is logged.
//!
//! Calls block until the process exits. There is no timeout.

use std::process::{Command, Stdio};

use tracing::{debug, error};

use crate::error::{ExecError, ExecResult};

/// A synchronous capability for running the replication tool.
///
/// `invoke` blocks the calling thread for the lifetime of the process;
/// async callers must run it on a blocking thread.
pub trait CommandGateway: Send + Sync + 'static {
    /// Run the tool with whitespace-separated `args`.
    ///
    /// Returns `Ok(stdout)` on success and `Err(stderr)` on any failure.
    fn invoke(&self, args: &str) -> Result<String, String>;
}

/// Runs a configured command (e.g. `sudo replikator-ctl`) as a child process.
#[derive(Debug, Clone)]
pub struct ProcessGateway {
    program: String,
    prefix_args: Vec<String>,
}

impl ProcessGateway {
    /// Build a gateway from a command prefix, split on whitespace.
    pub fn new(command: &str) -> ExecResult<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(ExecError::EmptyCommand)?;
        Ok(Self {
            program,
            prefix_args: parts.collect(),
        })
    }

    /// The full argv for a call, program first.
    pub fn command_line(&self, args: &str) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.prefix_args.iter().cloned())
            .chain(args.split_whitespace().map(str::to_string))
            .collect()
    }
}

impl CommandGateway for ProcessGateway {
    fn invoke(&self, args: &str) -> Result<String, String> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .args(args.split_whitespace())
            .stdin(Stdio::null());

        debug!("Running: {:?}", cmd);

        match cmd.output() {
            Ok(output) if output.status.success() => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(output) => {
                debug!(
                    program = %self.program,
                    code = output.status.code().unwrap_or(-1),
                    "replikator exited with failure"
                );
                Err(String::from_utf8_lossy(&output.stderr).into_owned())
            }
            Err(e) => {
                error!(program = %self.program, error = %e, "failed to launch replikator");
                Err(String::new())
            }
        }
    }
}

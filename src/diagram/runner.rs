//! Process execution seam for the compiler.

use anyhow::Result;

use crate::utils::exec::Cmd;

/// Captured result of one external tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Runs the external tools of a diagram build.
///
/// `Err` means the process could not be started at all.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, cmd: &Cmd) -> Result<ProcessOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &Cmd) -> Result<ProcessOutput> {
        cmd.output().map(ProcessOutput::from)
    }
}

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::Result;

/// What one shell invocation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs a command line and reports stdout, stderr and the exit code.
/// The production implementation shells out; tests substitute a recorder.
#[async_trait]
pub trait ShellExecutor {
    async fn run(&self, command: &str) -> Result<ShellOutput>;
}

/// Executes through `sh -c`.
#[derive(Debug, Default)]
pub struct SystemShell;

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn run(&self, command: &str) -> Result<ShellOutput> {
        log::trace!("sh -c {command}");
        let output = Command::new("sh").arg("-c").arg(command).output().await?;

        Ok(ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code().unwrap_or(-1),
        })
    }
}

//! Subprocess seam.
//!
//! The pipeline never spawns the engine directly; it goes through an
//! [`EngineRunner`], so tests can script the engine's behavior.

use async_trait::async_trait;
use std::io;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a program to completion and captures its output.
#[async_trait]
pub trait EngineRunner: Send + Sync {
    /// An `Err` means the program could not be started at all.
    async fn run(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput>;
}

/// Runs real subprocesses with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl EngineRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_requires_zero_exit() {
        let ok = ProcessOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        let failed = ProcessOutput {
            exit_code: Some(1),
            ..Default::default()
        };
        let killed = ProcessOutput::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[tokio::test]
    async fn test_missing_program_fails_to_spawn() {
        let err = ProcessRunner
            .run("deck-engine-test-no-such-binary", &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}

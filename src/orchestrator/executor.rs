//! Stage execution.
//!
//! `StageExecutor` is the seam between the runner and the outside world: it
//! runs a stage to completion and reports the status a shell would see in
//! `$?`. `ProcessExecutor` is the real implementation; tests drive the runner
//! with scripted executors instead.

use crate::errors::RunnerError;
use crate::stage::Stage;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use tokio::process::{Child, Command};

/// Runs one stage invocation to completion.
#[async_trait]
pub trait StageExecutor: Send + Sync {
    /// Execute the stage once and return its terminal exit status.
    async fn execute(&self, stage: &Stage) -> Result<i32, RunnerError>;
}

/// Convert a process exit status into a shell-style status code.
///
/// Normal exits report their code. A process killed by signal N reports
/// `128 + N`, so SIGTERM becomes 143.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Spawns stages as child processes with inherited output streams.
pub struct ProcessExecutor {
    /// Working directory for children; `None` keeps the runner's own
    working_dir: Option<PathBuf>,
}

impl ProcessExecutor {
    pub fn with_working_dir(working_dir: impl AsRef<Path>) -> Self {
        Self {
            working_dir: Some(working_dir.as_ref().to_path_buf()),
        }
    }

    /// Relative paths like `./stage_a` are anchored to the working directory
    /// explicitly, since resolution against a changed `current_dir` is
    /// platform-specific. Bare names are left for `PATH` lookup.
    fn resolve_program(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        match &self.working_dir {
            Some(dir) if path.is_relative() && path.components().count() > 1 => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Build a command with the stage's stdio and working directory.
    fn command(&self, program: impl AsRef<std::ffi::OsStr>) -> Command {
        let mut cmd = Command::new(program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Spawn the stage. An executable file without a `#!` line fails with
    /// ENOEXEC; like `execvp` and the shell, run it with `sh` instead.
    fn spawn(&self, program: &Path, args: &[String]) -> std::io::Result<Child> {
        let mut cmd = self.command(program);
        cmd.args(args);
        match cmd.spawn() {
            #[cfg(unix)]
            Err(err) if err.raw_os_error() == Some(libc::ENOEXEC) => {
                tracing::debug!(
                    program = %program.display(),
                    "No interpreter line, running stage with sh"
                );
                let mut cmd = self.command("sh");
                cmd.arg(program).args(args);
                cmd.spawn()
            }
            result => result,
        }
    }
}

#[async_trait]
impl StageExecutor for ProcessExecutor {
    async fn execute(&self, stage: &Stage) -> Result<i32, RunnerError> {
        let program = self.resolve_program(&stage.program);

        let start = Instant::now();
        let mut child = self.spawn(&program, &stage.args).map_err(|source| RunnerError::SpawnFailed {
            stage: stage.name.clone(),
            program: stage.command_line(),
            source,
        })?;

        tracing::debug!(
            stage = %stage.name,
            program = %program.display(),
            pid = child.id().unwrap_or(0),
            "Stage process spawned"
        );

        let status = child
            .wait()
            .await
            .map_err(|source| RunnerError::WaitFailed {
                stage: stage.name.clone(),
                source,
            })?;
        let exit_code = exit_code_of(status);

        tracing::debug!(
            stage = %stage.name,
            exit_code,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stage process exited"
        );

        Ok(exit_code)
    }
}

//! Typed errors for the stage runner.
//!
//! A stage that runs and exits is never an error: its exit code is data and
//! is carried in a `StageOutcome`. `RunnerError` covers the cases where the
//! runner could not observe an exit code at all, and maps each of them onto
//! the status a POSIX shell would have reported in `$?`.

use thiserror::Error;

/// Shell status for a program that was found but could not be executed.
pub const EXIT_NOT_EXECUTABLE: i32 = 126;

/// Shell status for a program that could not be found.
pub const EXIT_NOT_FOUND: i32 = 127;

/// Errors from spawning or waiting on a stage process.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn stage '{stage}' ({program}): {source}")]
    SpawnFailed {
        stage: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for stage '{stage}': {source}")]
    WaitFailed {
        stage: String,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    /// The exit status the whole run terminates with when this error aborts it.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerError::SpawnFailed { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => EXIT_NOT_FOUND,
                _ => EXIT_NOT_EXECUTABLE,
            },
            RunnerError::WaitFailed { .. } => 1,
        }
    }
}

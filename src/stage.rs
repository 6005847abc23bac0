//! Stage definitions for the runner.
//!
//! This module provides:
//! - `Stage` struct describing one external program invocation
//! - `RetryPolicy` deciding what an exit code means for that stage
//! - `default_stages` building the fixed three-stage sequence

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use crate::config::{Config, STAGE_A_PROGRAM, STAGE_B_PROGRAM, STAGE_C_PROGRAM};

/// What the runner should do after a stage exits with a given code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitVerdict {
    /// Exit code 0, move on to the next stage
    Success,
    /// Retriable code, wait and invoke the same stage again
    Retry,
    /// Any other code, stop the whole run with this exact status
    Abort(i32),
}

/// Per-stage exit code policy.
///
/// An empty retriable set means the stage runs exactly once and any
/// non-zero exit aborts the run. There is no attempt cap and no backoff:
/// every retry waits the same fixed delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retriable_exit_codes: BTreeSet<i32>,
    pub delay: Duration,
}

impl RetryPolicy {
    /// Run once, abort on any non-zero exit.
    pub fn fail_fast() -> Self {
        Self {
            retriable_exit_codes: BTreeSet::new(),
            delay: Duration::ZERO,
        }
    }

    /// Restart indefinitely while the exit code is in `codes`.
    pub fn retry_on(codes: impl IntoIterator<Item = i32>, delay: Duration) -> Self {
        Self {
            retriable_exit_codes: codes.into_iter().collect(),
            delay,
        }
    }

    /// Whether this policy ever re-invokes the stage.
    pub fn retries(&self) -> bool {
        !self.retriable_exit_codes.is_empty()
    }

    pub fn classify(&self, exit_code: i32) -> ExitVerdict {
        if exit_code == 0 {
            ExitVerdict::Success
        } else if self.retriable_exit_codes.contains(&exit_code) {
            ExitVerdict::Retry
        } else {
            ExitVerdict::Abort(exit_code)
        }
    }
}

/// One external program invocation treated as an atomic step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    /// Short identifier used in status lines and logs (e.g. "stage-a")
    pub name: String,
    /// Program to execute, resolved relative to the working directory
    pub program: String,
    pub args: Vec<String>,
    pub policy: RetryPolicy,
}

impl Stage {
    pub fn new(name: &str, program: &str, policy: RetryPolicy) -> Self {
        Self {
            name: name.to_string(),
            program: program.to_string(),
            args: Vec::new(),
            policy,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Command line as it would be typed in a shell, for display only.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The fixed stage sequence: the first stage restarts on the configured
/// retriable codes, the other two fail fast.
pub fn default_stages(config: &Config) -> Vec<Stage> {
    vec![
        Stage::new(
            "stage-a",
            STAGE_A_PROGRAM,
            RetryPolicy::retry_on(config.retriable_exit_codes.iter().copied(), config.retry_delay),
        ),
        Stage::new("stage-b", STAGE_B_PROGRAM, RetryPolicy::fail_fast()),
        Stage::new("stage-c", STAGE_C_PROGRAM, RetryPolicy::fail_fast()),
    ]
}

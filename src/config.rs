//! Fixed runtime configuration for stagerun.
//!
//! There is no config file. Everything the runner needs is a compile-time
//! default, and the only runtime inputs are the `--verbose` flag and
//! `RUST_LOG`, both of which affect diagnostics only.

use std::collections::BTreeSet;
use std::time::Duration;

/// Exit status a shell reports for a process terminated by SIGTERM (128 + 15).
pub const SIGTERM_EXIT_CODE: i32 = 143;

/// Pause before re-running a stage that exited with a retriable code.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Log filter used with `--verbose` when `RUST_LOG` is not set.
pub const VERBOSE_LOG_FILTER: &str = "debug";

/// Fixed program paths, relative to the working directory.
pub const STAGE_A_PROGRAM: &str = "./stage_a";
pub const STAGE_B_PROGRAM: &str = "./stage_b";
pub const STAGE_C_PROGRAM: &str = "./stage_c";

/// Runtime configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Exit codes that make the first stage restart instead of aborting.
    pub retriable_exit_codes: BTreeSet<i32>,
    /// Delay between a retriable exit and the next attempt.
    pub retry_delay: Duration,
    pub verbose: bool,
}

impl Config {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            ..Self::default()
        }
    }

    /// Log filter directive to use when `RUST_LOG` is absent.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            VERBOSE_LOG_FILTER
        } else {
            DEFAULT_LOG_FILTER
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retriable_exit_codes: BTreeSet::from([SIGTERM_EXIT_CODE]),
            retry_delay: RETRY_DELAY,
            verbose: false,
        }
    }
}

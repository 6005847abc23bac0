use crate::orchestrator::RunReport;
use crate::stage::Stage;
use crate::ui::icons::{CHECK, CLOCK, CROSS, RESTART, RUNNING, SPARKLE};
use console::style;
use std::time::Duration;

/// Status lines for the stage runner.
///
/// Everything is printed to stdout between child invocations, never while a
/// child is running, so the children's own output is never interleaved with
/// a partial status line. `console` drops colour automatically when stdout
/// is not a terminal.
pub struct RunnerUI {
    verbose: bool,
}

impl RunnerUI {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn print_line(&self, msg: impl AsRef<str>) {
        println!("{}", msg.as_ref());
    }

    /// Announce a stage invocation. Attempts after the first show their number.
    pub fn start_stage(&self, stage: &Stage, attempt: u32) {
        let attempt_note = if attempt > 1 {
            format!(" {}", style(format!("(attempt {})", attempt)).dim())
        } else {
            String::new()
        };
        self.print_line(format!(
            "{}Running {}...{}",
            RUNNING,
            style(&stage.name).yellow().bold(),
            attempt_note
        ));
        if self.verbose {
            self.print_line(format!(
                "    {} {}",
                style("→").dim(),
                style(stage.command_line()).dim()
            ));
        }
    }

    pub fn stage_success(&self, stage: &Stage, elapsed: Duration) {
        self.print_line(format!(
            "{}{} completed successfully {}",
            CHECK,
            style(&stage.name).green().bold(),
            style(format!("({})", format_elapsed(elapsed))).dim()
        ));
    }

    /// The stage exited with a retriable code and will be invoked again.
    pub fn stage_restart(&self, stage: &Stage, exit_code: i32, delay: Duration) {
        self.print_line(format!(
            "{}{} exited with code {}, restarting in {}...",
            RESTART,
            style(&stage.name).yellow().bold(),
            style(exit_code).yellow(),
            format_elapsed(delay)
        ));
    }

    pub fn stage_failed(&self, stage: &Stage, exit_code: i32) {
        self.print_line(format!(
            "{}{} failed with exit code {}, aborting",
            CROSS,
            style(&stage.name).red().bold(),
            style(exit_code).red().bold()
        ));
    }

    /// The stage could not be started at all.
    pub fn stage_error(&self, stage: &Stage, reason: &str, exit_code: i32) {
        self.print_line(format!(
            "{}{} could not run: {} {}",
            CROSS,
            style(&stage.name).red().bold(),
            reason,
            style(format!("(exit {})", exit_code)).dim()
        ));
    }

    pub fn run_complete(&self, report: &RunReport) {
        match report.exit_code() {
            0 => self.print_line(format!(
                "{}{} {}",
                SPARKLE,
                style("All stages completed successfully").green().bold(),
                style(format!("({})", format_elapsed(report.elapsed))).dim()
            )),
            code => self.print_line(format!(
                "{}{} {}",
                CROSS,
                style(format!("Run aborted with exit code {}", code)).red().bold(),
                style(format!("({})", format_elapsed(report.elapsed))).dim()
            )),
        }
        if self.verbose {
            for outcome in &report.outcomes {
                self.print_line(format!(
                    "    {}{}: exit {} after {} attempt(s)",
                    CLOCK,
                    outcome.stage,
                    outcome.exit_code,
                    outcome.attempts
                ));
            }
        }
    }
}

/// Format a duration as `Xs`, `X.Ys` under ten seconds, or `Xm Ys`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs >= 10 {
        format!("{}s", secs)
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

use crate::errors::RunnerError;
use crate::orchestrator::executor::StageExecutor;
use crate::orchestrator::state::{RunState, StateTracker};
use crate::stage::{ExitVerdict, Stage};
use crate::ui::RunnerUI;
use tokio::time::{Duration, Instant};

/// Result of running one stage to its final invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: String,
    /// Status of the last invocation: 0, or the code that aborts the run
    pub exit_code: i32,
    /// Number of invocations, including retries
    pub attempts: u32,
}

impl StageOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Summary of a complete run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Terminal state, `Succeeded` or `Aborted`
    pub state: RunState,
    /// Outcomes in execution order; stages skipped after an abort are absent
    pub outcomes: Vec<StageOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    /// Overall process exit status.
    pub fn exit_code(&self) -> i32 {
        self.state.exit_code().unwrap_or(1)
    }

    /// Exit status narrowed to what a process can report. Codes outside
    /// `0..=255` cannot be propagated exactly and become 1.
    pub fn process_exit_code(&self) -> u8 {
        let code = self.exit_code();
        u8::try_from(code).unwrap_or_else(|_| {
            tracing::warn!(exit_code = code, "Exit code out of range, exiting with 1");
            1
        })
    }

    /// Outcome for a stage by name, if it ran.
    pub fn outcome(&self, stage: &str) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|o| o.stage == stage)
    }
}

/// Runs stages strictly in order, one child at a time, applying each stage's
/// exit code policy.
pub struct StageRunner<E: StageExecutor> {
    executor: E,
    ui: RunnerUI,
    state: StateTracker,
}

impl<E: StageExecutor> StageRunner<E> {
    pub fn new(executor: E, ui: RunnerUI) -> Self {
        Self {
            executor,
            ui,
            state: StateTracker::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        self.state.current()
    }

    /// Every state the run has passed through.
    pub fn history(&self) -> &[RunState] {
        self.state.history()
    }

    /// Invoke one attempt of `stage`, announcing it first.
    async fn invoke(&mut self, stage: &Stage, attempt: u32) -> Result<i32, RunnerError> {
        self.state.transition(RunState::Running(stage.name.clone()));
        self.ui.start_stage(stage, attempt);
        tracing::info!(stage = %stage.name, attempt, "Starting stage");
        self.executor.execute(stage).await
    }

    /// Invoke `stage` until it exits with a code outside its retriable set.
    ///
    /// Retriable codes pause for the policy's fixed delay and restart the
    /// stage. There is no attempt limit. The returned outcome carries either
    /// 0 or the first non-retriable code.
    pub async fn run_with_retry(&mut self, stage: &Stage) -> Result<StageOutcome, RunnerError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let start = Instant::now();
            let exit_code = self.invoke(stage, attempt).await?;

            match stage.policy.classify(exit_code) {
                ExitVerdict::Success => {
                    self.ui.stage_success(stage, start.elapsed());
                    return Ok(StageOutcome {
                        stage: stage.name.clone(),
                        exit_code,
                        attempts: attempt,
                    });
                }
                ExitVerdict::Retry => {
                    tracing::info!(
                        stage = %stage.name,
                        attempt,
                        exit_code,
                        delay_ms = stage.policy.delay.as_millis() as u64,
                        "Stage exited with retriable code, restarting"
                    );
                    self.ui.stage_restart(stage, exit_code, stage.policy.delay);
                    tokio::time::sleep(stage.policy.delay).await;
                }
                ExitVerdict::Abort(code) => {
                    return Ok(StageOutcome {
                        stage: stage.name.clone(),
                        exit_code: code,
                        attempts: attempt,
                    });
                }
            }
        }
    }

    /// Invoke `stage` exactly once. Any non-zero code is final, whatever the
    /// stage's retriable set says.
    pub async fn run_once(&mut self, stage: &Stage) -> Result<StageOutcome, RunnerError> {
        let start = Instant::now();
        let exit_code = self.invoke(stage, 1).await?;
        if exit_code == 0 {
            self.ui.stage_success(stage, start.elapsed());
        }
        Ok(StageOutcome {
            stage: stage.name.clone(),
            exit_code,
            attempts: 1,
        })
    }

    /// Run every stage in order, stopping at the first non-retriable failure.
    ///
    /// Stages whose policy has retriable codes run with retry, all others run
    /// once. The report's exit code is 0 when every stage succeeded, otherwise
    /// the exact status of the stage that aborted the run.
    pub async fn run(&mut self, stages: &[Stage]) -> RunReport {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(stages.len());

        for stage in stages {
            let result = if stage.policy.retries() {
                self.run_with_retry(stage).await
            } else {
                self.run_once(stage).await
            };

            let spawned = result.is_ok();
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    let exit_code = err.exit_code();
                    tracing::debug!(stage = %stage.name, exit_code, error = %err, "Stage could not run");
                    self.ui.stage_error(stage, &err.to_string(), exit_code);
                    StageOutcome {
                        stage: stage.name.clone(),
                        exit_code,
                        attempts: 1,
                    }
                }
            };

            let succeeded = outcome.succeeded();
            let exit_code = outcome.exit_code;
            outcomes.push(outcome);

            if !succeeded {
                tracing::info!(stage = %stage.name, exit_code, "Aborting run");
                if spawned {
                    self.ui.stage_failed(stage, exit_code);
                }
                self.state.transition(RunState::Aborted(exit_code));
                return self.finish(outcomes, start.elapsed());
            }
        }

        self.state.transition(RunState::Succeeded);
        self.finish(outcomes, start.elapsed())
    }

    fn finish(&self, outcomes: Vec<StageOutcome>, elapsed: Duration) -> RunReport {
        let report = RunReport {
            state: self.state.current().clone(),
            outcomes,
            elapsed,
        };
        tracing::info!(
            state = %report.state,
            elapsed_ms = elapsed.as_millis() as u64,
            "Run finished"
        );
        self.ui.run_complete(&report);
        report
    }
}

use std::fmt;

/// Lifecycle of a run.
///
/// Transitions are strictly linear: `NotStarted` -> `Running` for each stage
/// in order -> `Succeeded` or `Aborted`. The only loop is a retrying stage
/// moving from `Running(stage)` back to `Running(stage)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running(String),
    Succeeded,
    Aborted(i32),
}

impl RunState {
    /// Process exit status for a finished run, `None` while still in progress.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunState::Succeeded => Some(0),
            RunState::Aborted(code) => Some(*code),
            RunState::NotStarted | RunState::Running(_) => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &RunState) -> bool {
        match (self, next) {
            (RunState::NotStarted, RunState::Running(_)) => true,
            (RunState::NotStarted, RunState::Succeeded) => true,
            (RunState::Running(_), RunState::Running(_)) => true,
            (RunState::Running(_), RunState::Succeeded | RunState::Aborted(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::NotStarted => write!(f, "not started"),
            RunState::Running(stage) => write!(f, "running {}", stage),
            RunState::Succeeded => write!(f, "succeeded"),
            RunState::Aborted(code) => write!(f, "aborted (exit {})", code),
        }
    }
}

/// Tracks the current state and rejects illegal transitions.
#[derive(Debug)]
pub struct StateTracker {
    current: RunState,
    history: Vec<RunState>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self {
            current: RunState::NotStarted,
            history: vec![RunState::NotStarted],
        }
    }

    pub fn current(&self) -> &RunState {
        &self.current
    }

    /// Every state entered so far, starting with `NotStarted`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Move to `next`. Illegal transitions are logged and ignored so a
    /// finished run can never be reopened.
    pub fn transition(&mut self, next: RunState) {
        if !self.current.can_transition_to(&next) {
            tracing::warn!(from = %self.current, to = %next, "Ignoring illegal run state transition");
            return;
        }
        tracing::trace!(from = %self.current, to = %next, "Run state transition");
        self.history.push(next.clone());
        self.current = next;
    }
}

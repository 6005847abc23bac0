pub mod executor;
pub mod runner;
pub mod state;

pub use executor::{ProcessExecutor, StageExecutor, exit_code_of};
pub use runner::{RunReport, StageOutcome, StageRunner};
pub use state::{RunState, StateTracker};

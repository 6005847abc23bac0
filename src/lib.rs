pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod stage;
pub mod ui;

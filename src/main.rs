use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

use stagerun::config::Config;
use stagerun::orchestrator::{ProcessExecutor, StageRunner};
use stagerun::stage::default_stages;
use stagerun::ui::RunnerUI;

/// Runs ./stage_a, ./stage_b and ./stage_c in order. The first stage is
/// restarted whenever it is terminated (exit 143); any other failure stops
/// the run and becomes the exit status.
#[derive(Parser)]
#[command(name = "stagerun")]
#[command(version, about = "Run the fixed stage sequence with restart-on-termination")]
pub struct Cli {
    /// Print stage command lines and debug diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.log_filter()));

    // stdout belongs to the status lines and the stages' own output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: &Cli) -> Result<u8> {
    let config = Config::new(cli.verbose);
    init_tracing(&config);

    let working_dir = std::env::current_dir().context("Failed to get current directory")?;
    let stages = default_stages(&config);
    tracing::debug!(
        working_dir = %working_dir.display(),
        stages = stages.len(),
        "Starting run"
    );

    let executor = ProcessExecutor::with_working_dir(&working_dir);
    let mut runner = StageRunner::new(executor, RunnerUI::new(cli.verbose));
    let report = runner.run(&stages).await;

    Ok(report.process_exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

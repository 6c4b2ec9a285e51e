use std::sync::Arc;

use census_worker::cli::{Cli, Commands, RunCmd};
use census_worker::core::config::Config;
use census_worker::utils::logging::init_logging;
use census_worker::utils::signal_handler::ShutdownController;
use census_worker::worker::initialize_dispatcher;
use census_worker::{WorkerError, WorkerResult};
use clap::Parser as _;
use dotenvy::dotenv;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();
    if let Err(e) = init_logging() {
        report_logging_failure(&e);
        std::process::exit(1);
    }

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run { run_command } => {
            if let Err(e) = run_worker(run_command).await {
                error!(error = %e, error_chain = ?e, "Census worker failed");
                std::process::exit(1);
            }
        }
    }
}

// No subscriber is installed yet, so stderr is the only place this can go.
#[allow(clippy::print_stderr)]
fn report_logging_failure(error: &WorkerError) {
    eprintln!("Failed to initialize logging: {}", error);
}

async fn run_worker(run_cmd: &RunCmd) -> WorkerResult<()> {
    info!("Starting census worker");
    let config = Config::from_run_cmd(run_cmd)?;
    debug!("Configuration initialized");

    let dispatcher = Arc::new(initialize_dispatcher(&config)?);
    let mut shutdown = ShutdownController::new();

    let token = shutdown.token();
    let runner = dispatcher.clone();
    let mut handle = tokio::spawn(async move { runner.run(token).await });

    tokio::select! {
        signal = shutdown.wait_for_shutdown() => {
            signal?;
        }
        joined = &mut handle => {
            // The dispatcher only returns once cancelled, so getting here means its task died.
            return joined.map_err(|e| WorkerError::WorkerAnyhowError(anyhow::anyhow!("dispatcher task failed: {}", e)));
        }
    }

    shutdown
        .handle_graceful_shutdown(
            || async move { handle.await.map_err(|e| anyhow::anyhow!("dispatcher task failed: {}", e)) },
            config.shutdown_timeout(),
        )
        .await?;

    info!("Census worker stopped");
    Ok(())
}

use clap::Parser;
use literal_sync::cli::{run, Cli};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing for the CLI, `info` unless RUST_LOG says otherwise.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    tracing::info!("CLI arguments parsed, invoking run");
    match run(cli) {
        Ok(true) => {
            tracing::info!("CLI completed successfully");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            tracing::warn!("CLI completed with failures or out-of-sync files");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}

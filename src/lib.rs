pub mod cli;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod orders;
pub mod pipeline;
pub mod review;
pub mod terminal;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub fn run() -> ExitCode {
    let cli = cli::Cli::parse();

    let fallback = if cli.verbose {
        config::verbose_log_filter()
    } else {
        config::default_log_filter()
    };

    // Initialize tracing; stdout belongs to the shell
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    cli.run()
}

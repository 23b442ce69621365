//! Logloom CLI entry point
//!
//! Parses arguments, loads configuration, initializes tracing, and
//! dispatches to the command handlers. Process exit codes come from
//! [`CliError::exit_code`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::warn;

use logloom_core::config::{GeneralConfig, LogloomConfig};
use logloom_core::error::{ConfigError, LogloomError};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("logloom: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Config(args) => {
            // Config commands must work even when the file is broken, so
            // tracing comes up on defaults instead of the file's settings.
            logging::init_tracing(&GeneralConfig::default(), cli.log_level.as_deref())?;
            commands::config::execute(args, &cli.config, &writer).await
        }
        Commands::Mine(args) => {
            let config = load_or_default(&cli.config, cli.log_level.as_deref()).await?;
            commands::mine::execute(args, &config, &writer).await
        }
        Commands::Dlt(args) => {
            let config = load_or_default(&cli.config, cli.log_level.as_deref()).await?;
            commands::dlt::execute(args, &config, &writer).await
        }
    }
}

/// Load the configuration and bring up tracing with its settings.
///
/// A missing file falls back to defaults (plus env overrides) so a bare
/// `logloom mine app.log` works without a `logloom.toml`; parse and
/// validation errors are fatal.
async fn load_or_default(
    path: &Path,
    level_override: Option<&str>,
) -> Result<LogloomConfig, CliError> {
    let (config, file_missing) = match LogloomConfig::load(path).await {
        Ok(config) => (config, false),
        Err(LogloomError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = LogloomConfig::default();
            config.apply_env_overrides();
            config
                .validate()
                .map_err(|e| CliError::Config(e.to_string()))?;
            (config, true)
        }
        Err(e) => return Err(CliError::Config(e.to_string())),
    };

    logging::init_tracing(&config.general, level_override)?;
    if file_missing {
        warn!(path = %path.display(), "configuration file not found, using defaults");
    }

    Ok(config)
}

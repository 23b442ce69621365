//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Logloom -- streaming log template mining with LLM-assisted analysis.
///
/// Use `logloom <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logloom", version, about, long_about = None)]
pub struct Cli {
    /// Path to the logloom.toml configuration file.
    #[arg(short, long, default_value = "logloom.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Mine templates from a plain text log file.
    Mine(MineArgs),

    /// Mine templates from a DLT Viewer export (CSV or TSV).
    Dlt(DltArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- mine ----

/// Mine templates from a plain text log file.
#[derive(Args, Debug)]
pub struct MineArgs {
    /// Log file to process.
    pub file: PathBuf,

    /// Write the structured report to this path instead of export.path.
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Override the state snapshot path from the config file.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Ignore any existing state snapshot and start cold.
    #[arg(long)]
    pub fresh: bool,

    /// Disable LLM annotation stages even if enabled in the config.
    #[arg(long)]
    pub no_llm: bool,
}

// ---- dlt ----

/// Mine templates from a DLT Viewer export file.
#[derive(Args, Debug)]
pub struct DltArgs {
    /// DLT export file to process (CSV with header, or tab-separated).
    pub file: PathBuf,

    /// Write the structured report to this path instead of export.path.
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Override the state snapshot path from the config file.
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Ignore any existing state snapshot and start cold.
    #[arg(long)]
    pub fresh: bool,

    /// Disable LLM annotation stages even if enabled in the config.
    #[arg(long)]
    pub no_llm: bool,
}

// ---- config ----

/// Manage logloom configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, miner, strata, llm, export).
        #[arg(long)]
        section: Option<String>,
    },
}

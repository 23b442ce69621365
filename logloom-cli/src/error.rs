//! CLI-specific error types and exit code mapping

use logloom_core::LogloomError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Input file could not be opened or read.
    #[error("input error: {0}")]
    Input(String),

    /// Structured report could not be written.
    #[error("export error: {0}")]
    Export(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, file create, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logloom-core.
    #[error("{0}")]
    Core(#[from] LogloomError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success                        |
    /// | 1    | General / command error        |
    /// | 2    | Configuration error            |
    /// | 3    | Input file error               |
    /// | 4    | Report export error            |
    /// | 10   | IO error                       |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Input(_) => 3,
            Self::Export(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) => 1,
        }
    }
}

impl From<logloom_miner::MinerError> for CliError {
    fn from(e: logloom_miner::MinerError) -> Self {
        Self::Core(e.into())
    }
}

impl From<logloom_ingest::IngestError> for CliError {
    fn from(e: logloom_ingest::IngestError) -> Self {
        Self::Input(e.to_string())
    }
}

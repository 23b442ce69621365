//! `logloom config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use logloom_core::config::LogloomConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// Attempts to load and validate the configuration file, reporting any errors.
///
/// # Errors
///
/// Returns `CliError::Config` if validation fails (parse errors, out-of-range values).
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let result = LogloomConfig::load(config_path).await;

    let report = match result {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

/// Execute the config show subcommand.
///
/// Loads and displays the effective configuration (file + env overrides +
/// defaults). The LLM API key is redacted; operators should keep it in the
/// environment variable anyway.
///
/// # Errors
///
/// Returns `CliError::Config` if loading fails or `CliError::Command` if the
/// section name is invalid.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let mut config = LogloomConfig::load(config_path)
        .await
        .map_err(|e| CliError::Config(e.to_string()))?;

    redact_credentials(&mut config);

    let source = config_path.display().to_string();
    let report = match section {
        Some(name) => {
            let config_toml = match name.as_str() {
                "general" => section_toml(&config.general),
                "miner" => section_toml(&config.miner),
                "strata" => section_toml(&config.strata),
                "llm" => section_toml(&config.llm),
                "export" => section_toml(&config.export),
                _ => {
                    return Err(CliError::Command(format!(
                        "unknown section: {name} (expected: general, miner, strata, llm, export)"
                    )));
                }
            };
            ConfigReport {
                source,
                section: Some(name),
                config_toml,
            }
        }
        None => ConfigReport {
            source,
            section: None,
            config_toml: section_toml(&config),
        },
    };

    writer.render(&report)?;

    Ok(())
}

fn section_toml<T: Serialize>(section: &T) -> String {
    toml::to_string_pretty(section).unwrap_or_else(|e| format!("(serialization error: {e})"))
}

/// Replace the configured API key with a placeholder.
///
/// The effective key may come from the file or the environment; either
/// way it must never appear in command output or logs.
fn redact_credentials(config: &mut LogloomConfig) {
    if config.llm.api_key.is_some() {
        config.llm.api_key = Some("***REDACTED***".to_owned());
    }
}

/// Configuration display report.
///
/// The `config_toml` field is only used for text rendering; JSON output
/// carries the source and section alone.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration (with redacted credentials)
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{section}]");
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

//! `logloom mine` command handler
//!
//! Mines templates from a plain-text log file: restores persisted
//! state (unless `--fresh`), streams every line through the engine,
//! stratifies the clusters, runs the enabled annotation stages, then
//! exports the structured report and renders the run summary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use logloom_core::Annotator;
use logloom_core::config::LogloomConfig;
use logloom_core::types::ClusterId;
use logloom_ingest::text::LineReader;
use logloom_miner::{
    MineChange, MinerConfig, MiningReport, PatternEvent, StateFile, Stratifier, TemplateMiner,
};

use crate::cli::MineArgs;
use crate::commands::render::RunReport;
use crate::commands::stages::{self, AnnotationReport, ClusterNote};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `mine` command.
pub async fn execute(
    args: MineArgs,
    config: &LogloomConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let annotator = stages::build_annotator(&config.llm, args.no_llm);
    let run = run_mine(args, config, annotator.as_ref(), writer).await?;
    writer.render(&run)?;
    Ok(())
}

/// Run the mining pass and collect structured results.
///
/// Returns the complete run report without rendering it, so the
/// computation stays separated from presentation. Streaming progress
/// (realtime classifications, the completion notice) is echoed to
/// stdout in text mode only.
async fn run_mine<A: Annotator>(
    args: MineArgs,
    config: &LogloomConfig,
    annotator: Option<&A>,
    writer: &OutputWriter,
) -> Result<RunReport, CliError> {
    let state_path = args
        .state
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.general.state_path));
    let (mut miner, state_file) = restore_miner(config, state_path, args.fresh)?;

    let reader = LineReader::open(&args.file)?;
    info!(path = %args.file.display(), "mining text log");

    let limits = &config.llm.limits;
    let mut annotations = AnnotationReport::default();
    let mut samples: Vec<String> = Vec::new();
    let mut new_patterns: Vec<PatternEvent> = Vec::new();
    let mut changed_patterns: Vec<PatternEvent> = Vec::new();
    let mut lines_read: u64 = 0;

    for item in reader {
        let line = item?;
        lines_read += 1;

        if samples.len() < limits.preprocessing_sample_lines {
            samples.push(line.clone());
        }

        let result = miner.process(&line);
        match result.change {
            MineChange::Created => {
                let template = template_of(&miner, result.cluster_id);

                if let Some(annotator) = annotator {
                    if config.llm.stages.realtime_classification
                        && annotations.classifications.len() < limits.realtime_classify_first
                    {
                        if writer.is_text() {
                            println!("[NEW PATTERN] {template}");
                        }
                        let text = stages::classify_new(annotator, &template, &line).await;
                        if writer.is_text() {
                            println!("LLM Analysis:\n{text}\n");
                        }
                        annotations.classifications.push(ClusterNote {
                            cluster_id: result.cluster_id,
                            template: template.clone(),
                            count: 1,
                            text,
                        });
                    }
                }

                new_patterns.push(PatternEvent {
                    line,
                    cluster_id: result.cluster_id,
                    template,
                });
            }
            MineChange::TemplateChanged => {
                changed_patterns.push(PatternEvent {
                    line,
                    cluster_id: result.cluster_id,
                    template: template_of(&miner, result.cluster_id),
                });
            }
            MineChange::Unchanged => {}
        }
    }

    info!(
        lines = lines_read,
        clusters = miner.cluster_count(),
        "mining pass complete"
    );
    if writer.is_text() {
        println!("[COMPLETE] Parsed {lines_read} log lines\n");
    }

    let strata = Stratifier::from_core(&config.strata).stratify(miner.clusters());
    let report = MiningReport::build(
        &miner,
        config.export.examples_per_template,
        new_patterns,
        changed_patterns,
    );

    if let Some(annotator) = annotator {
        stages::annotate_run(
            annotator,
            &config.llm,
            &miner,
            &strata,
            &report.changed_patterns,
            &samples,
            &HashMap::new(),
            &mut annotations,
        )
        .await;
    }

    save_state(&state_file, &miner);

    let export_path = args
        .export
        .unwrap_or_else(|| PathBuf::from(&config.export.path));
    write_export(&export_path, &report)?;

    Ok(RunReport {
        mining: report,
        strata,
        annotations,
        export_path: export_path.display().to_string(),
    })
}

/// Build the miner, restoring persisted state when available.
///
/// `--fresh` skips the load entirely. A snapshot that no longer fits
/// the configured tree parameters is discarded with a warning rather
/// than failing the run.
pub(super) fn restore_miner(
    config: &LogloomConfig,
    state_path: PathBuf,
    fresh: bool,
) -> Result<(TemplateMiner, StateFile), CliError> {
    let state_file = StateFile::new(state_path);
    let miner_config = MinerConfig::from_core(&config.miner);

    if fresh {
        debug!(path = %state_file.path().display(), "skipping state restore");
        let miner = TemplateMiner::new(miner_config)?;
        return Ok((miner, state_file));
    }

    let miner = match state_file.load() {
        Some(state) => match TemplateMiner::restore(miner_config.clone(), state) {
            Ok(miner) => {
                info!(
                    path = %state_file.path().display(),
                    clusters = miner.cluster_count(),
                    total_lines = miner.total_lines(),
                    "restored miner state"
                );
                miner
            }
            Err(err) => {
                warn!(
                    path = %state_file.path().display(),
                    error = %err,
                    "persisted state incompatible, starting fresh"
                );
                TemplateMiner::new(miner_config)?
            }
        },
        None => TemplateMiner::new(miner_config)?,
    };
    Ok((miner, state_file))
}

/// Persist the miner snapshot. Save failure is logged, never fatal:
/// the run's results have already been computed and must be delivered.
pub(super) fn save_state(state_file: &StateFile, miner: &TemplateMiner) {
    let snapshot = miner.snapshot();
    match state_file.save(&snapshot) {
        Ok(()) => {
            debug!(
                path = %state_file.path().display(),
                clusters = snapshot.cluster_count(),
                "miner state saved"
            );
        }
        Err(err) => {
            warn!(
                path = %state_file.path().display(),
                error = %err,
                "failed to save miner state"
            );
        }
    }
}

/// Write the structured report to the export file.
pub(super) fn write_export(path: &Path, report: &MiningReport) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .map_err(|e| CliError::Export(format!("{}: {e}", path.display())))?;
    info!(path = %path.display(), templates = report.templates.len(), "report exported");
    Ok(())
}

fn template_of(miner: &TemplateMiner, id: ClusterId) -> String {
    miner
        .cluster(id)
        .map(|c| c.template_string())
        .unwrap_or_default()
}

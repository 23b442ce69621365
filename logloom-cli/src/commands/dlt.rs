//! `logloom dlt` command handler
//!
//! Mines templates from a DLT CSV/TSV export. Only the message column
//! feeds the engine; ECU and application ids are aggregated per
//! cluster as provenance, decorate the exported report, and give the
//! anomaly-explanation stage its context.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use logloom_core::Annotator;
use logloom_core::config::LogloomConfig;
use logloom_core::types::ClusterId;
use logloom_ingest::IngestError;
use logloom_ingest::dlt::DltReader;
use logloom_miner::{MineChange, MiningReport, PatternEvent, Stratifier};

use crate::cli::DltArgs;
use crate::commands::mine::{restore_miner, save_state, write_export};
use crate::commands::render::RunReport;
use crate::commands::stages::{self, AnnotationReport, ClusterNote};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `dlt` command.
pub async fn execute(
    args: DltArgs,
    config: &LogloomConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let annotator = stages::build_annotator(&config.llm, args.no_llm);
    let run = run_dlt(args, config, annotator.as_ref(), writer).await?;
    writer.render(&run)?;
    Ok(())
}

/// Per-cluster DLT provenance collected during the pass.
///
/// Sets keep the id lists deduplicated and sorted. Provenance is a
/// per-run aggregate: restored clusters start with empty sets until
/// new records attach to them.
#[derive(Debug, Default)]
struct DltMeta {
    ecus: BTreeSet<String>,
    app_ids: BTreeSet<String>,
}

impl DltMeta {
    fn record(&mut self, ecu: &str, app_id: &str) {
        if !ecu.is_empty() {
            self.ecus.insert(ecu.to_owned());
        }
        if !app_id.is_empty() {
            self.app_ids.insert(app_id.to_owned());
        }
    }

    fn context_line(&self) -> String {
        format!(
            "ECUs: {}; Apps: {}",
            join(&self.ecus),
            join(&self.app_ids)
        )
    }

    fn is_empty(&self) -> bool {
        self.ecus.is_empty() && self.app_ids.is_empty()
    }
}

fn join(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

async fn run_dlt<A: Annotator>(
    args: DltArgs,
    config: &LogloomConfig,
    annotator: Option<&A>,
    writer: &OutputWriter,
) -> Result<RunReport, CliError> {
    let state_path = args
        .state
        .clone()
        .unwrap_or_else(|| dlt_state_path(config));
    let (mut miner, state_file) = restore_miner(config, state_path, args.fresh)?;

    let reader = DltReader::open(&args.file)?;
    info!(path = %args.file.display(), "mining dlt export");

    let limits = &config.llm.limits;
    let mut annotations = AnnotationReport::default();
    let mut metadata: HashMap<ClusterId, DltMeta> = HashMap::new();
    let mut samples: Vec<String> = Vec::new();
    let mut new_patterns: Vec<PatternEvent> = Vec::new();
    let mut changed_patterns: Vec<PatternEvent> = Vec::new();
    let mut records_read: u64 = 0;

    for item in reader {
        let record = match item {
            Ok(record) => record,
            Err(IngestError::Format { reason }) => {
                // A malformed row loses only itself, never the run.
                warn!(%reason, "malformed dlt row skipped");
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        records_read += 1;

        if samples.len() < limits.preprocessing_sample_lines {
            samples.push(record.message.clone());
        }

        let result = miner.process(&record.message);
        metadata
            .entry(result.cluster_id)
            .or_default()
            .record(&record.ecu, &record.app_id);

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
                        let text =
                            stages::classify_new(annotator, &template, &record.message).await;
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
                    line: record.message,
                    cluster_id: result.cluster_id,
                    template,
                });
            }
            MineChange::TemplateChanged => {
                changed_patterns.push(PatternEvent {
                    line: record.message,
                    cluster_id: result.cluster_id,
                    template: template_of(&miner, result.cluster_id),
                });
            }
            MineChange::Unchanged => {}
        }
    }

    info!(
        records = records_read,
        clusters = miner.cluster_count(),
        "mining pass complete"
    );
    if writer.is_text() {
        println!("[COMPLETE] Parsed {records_read} DLT log lines\n");
    }

    let strata = Stratifier::from_core(&config.strata).stratify(miner.clusters());
    let mut report = MiningReport::build(
        &miner,
        config.export.examples_per_template,
        new_patterns,
        changed_patterns,
    );
    report.dlt_format = true;
    for entry in &mut report.templates {
        if let Some(meta) = metadata.get(&entry.cluster_id) {
            if !meta.is_empty() {
                entry.ecus = Some(meta.ecus.iter().cloned().collect());
                entry.app_ids = Some(meta.app_ids.iter().cloned().collect());
            }
        }
    }

    if let Some(annotator) = annotator {
        let contexts: HashMap<ClusterId, String> = metadata
            .iter()
            .filter(|(_, meta)| !meta.is_empty())
            .map(|(id, meta)| (*id, meta.context_line()))
            .collect();
        stages::annotate_run(
            annotator,
            &config.llm,
            &miner,
            &strata,
            &report.changed_patterns,
            &samples,
            &contexts,
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

/// Default state path for DLT runs.
///
/// Text and DLT template spaces must not share a snapshot, so the DLT
/// default prefixes the configured state file name with `dlt_`.
/// An explicit `--state` overrides this.
fn dlt_state_path(config: &LogloomConfig) -> PathBuf {
    let base = Path::new(&config.general.state_path);
    let name = base
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "state.bin".to_owned());
    base.with_file_name(format!("dlt_{name}"))
}

fn template_of(miner: &logloom_miner::TemplateMiner, id: ClusterId) -> String {
    miner
        .cluster(id)
        .map(|c| c.template_string())
        .unwrap_or_default()
}

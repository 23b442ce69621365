//! Run report payload and its console layout.
//!
//! The mining engine returns structured results; this module is the
//! presentation consumer that turns them into a text report or a
//! single JSON document. The text layout shows clustering results
//! first, then one section per annotation stage that actually ran.

use std::collections::BTreeSet;
use std::io::Write;

use serde::Serialize;

use logloom_core::types::ClusterId;
use logloom_miner::{MiningReport, PatternInfo, StrataReport};

use crate::commands::stages::AnnotationReport;
use crate::output::Render;

/// Width of section banner rulers.
const RULER_WIDTH: usize = 80;
/// How many patterns each stratum shows in text output.
const PATTERNS_SHOWN: usize = 10;
/// How many ECU/app ids each DLT pattern row lists.
const IDS_SHOWN: usize = 3;

/// Complete output of one mining run.
///
/// JSON output flattens the mining report to the top level, with the
/// strata split, annotations, and export path alongside. The exported
/// file contains the mining report alone; this composite is what goes
/// to stdout.
#[derive(Debug, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub mining: MiningReport,
    pub strata: StrataReport,
    #[serde(skip_serializing_if = "AnnotationReport::is_empty")]
    pub annotations: AnnotationReport,
    pub export_path: String,
}

impl RunReport {
    /// ECU/app provenance for one cluster, from the decorated report.
    fn meta_for(&self, id: ClusterId) -> (&[String], &[String]) {
        for entry in &self.mining.templates {
            if entry.cluster_id == id {
                return (
                    entry.ecus.as_deref().unwrap_or(&[]),
                    entry.app_ids.as_deref().unwrap_or(&[]),
                );
            }
        }
        (&[], &[])
    }

    fn unique_ecus(&self) -> usize {
        let mut seen = BTreeSet::new();
        for entry in &self.mining.templates {
            if let Some(ecus) = &entry.ecus {
                for ecu in ecus {
                    seen.insert(ecu.as_str());
                }
            }
        }
        seen.len()
    }

    fn unique_apps(&self) -> usize {
        let mut seen = BTreeSet::new();
        for entry in &self.mining.templates {
            if let Some(app_ids) = &entry.app_ids {
                for app in app_ids {
                    seen.insert(app.as_str());
                }
            }
        }
        seen.len()
    }

    fn write_text_rows(
        &self,
        w: &mut dyn Write,
        patterns: &[PatternInfo],
    ) -> std::io::Result<()> {
        for p in patterns.iter().take(PATTERNS_SHOWN) {
            writeln!(
                w,
                "  [C{:>3}] Count: {:>4} ({:>5.1}%) | {}",
                p.cluster_id.as_u64(),
                p.count,
                p.percentage,
                p.template
            )?;
        }
        Ok(())
    }

    fn write_dlt_rows(
        &self,
        w: &mut dyn Write,
        patterns: &[PatternInfo],
    ) -> std::io::Result<()> {
        for p in patterns.iter().take(PATTERNS_SHOWN) {
            let (ecus, apps) = self.meta_for(p.cluster_id);
            writeln!(
                w,
                "  [C{:>3}] Count: {:>4} ({:>5.1}%)",
                p.cluster_id.as_u64(),
                p.count,
                p.percentage
            )?;
            writeln!(w, "       Template: {}", p.template)?;
            writeln!(w, "       ECUs: {}", join_first(ecus, IDS_SHOWN))?;
            writeln!(w, "       Apps: {}", join_first(apps, IDS_SHOWN))?;
            writeln!(w)?;
        }
        Ok(())
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let dlt = self.mining.dlt_format;

        if let Some(rules) = &self.annotations.preprocessing {
            banner(w, "PRE-CLUSTERING ANALYSIS")?;
            writeln!(w)?;
            writeln!(w, "{rules}")?;
            writeln!(w)?;
        }

        let title = if dlt {
            "DLT LOG CLUSTERING RESULTS"
        } else {
            "LOG CLUSTERING RESULTS"
        };
        banner(w, title)?;

        let frequent_header = if dlt {
            format!("Frequent Patterns ({} patterns):", self.strata.frequent.len())
        } else {
            format!(
                "Frequent Patterns (Normal Behavior - {} patterns):",
                self.strata.frequent.len()
            )
        };
        writeln!(w)?;
        writeln!(w, "{}", frequent_header.green())?;
        writeln!(w)?;
        if dlt {
            self.write_dlt_rows(w, &self.strata.frequent)?;
        } else {
            self.write_text_rows(w, &self.strata.frequent)?;
        }

        let rare_header = if dlt {
            format!("Rare Patterns ({} patterns):", self.strata.rare.len())
        } else {
            format!(
                "Rare Patterns (Potential Anomalies - {} patterns):",
                self.strata.rare.len()
            )
        };
        writeln!(w)?;
        writeln!(w, "{}", rare_header.yellow())?;
        writeln!(w)?;
        if dlt {
            self.write_dlt_rows(w, &self.strata.rare)?;
        } else {
            self.write_text_rows(w, &self.strata.rare)?;
            writeln!(w)?;
        }

        writeln!(w, "Statistics:")?;
        writeln!(w, "  Total log lines: {}", self.mining.total_lines)?;
        writeln!(w, "  Total patterns: {}", self.mining.total_patterns)?;
        if dlt {
            writeln!(w, "  Unique ECUs: {}", self.unique_ecus())?;
            writeln!(w, "  Unique Apps: {}", self.unique_apps())?;
        } else {
            writeln!(
                w,
                "  New patterns detected: {}",
                self.mining.new_patterns.len()
            )?;
            writeln!(w, "  Changed patterns: {}", self.mining.changed_patterns.len())?;
        }

        // Realtime classifications were streamed during the pass in
        // text mode; they only appear here in the JSON document.

        if let Some(analysis) = &self.annotations.rare_analysis {
            let analysis_title = if dlt {
                "LLM ANALYSIS"
            } else {
                "LLM-GUIDED ANOMALY ANALYSIS"
            };
            writeln!(w)?;
            banner(w, analysis_title)?;
            writeln!(w)?;
            writeln!(w, "{analysis}")?;
        }

        if !self.annotations.explanations.is_empty() {
            writeln!(w)?;
            banner(w, "ANOMALY EXPLANATIONS")?;
            writeln!(w)?;
            for note in &self.annotations.explanations {
                writeln!(w, "Anomaly: {}", note.template)?;
                writeln!(w, "{}", note.text)?;
                writeln!(w)?;
            }
        }

        if !self.annotations.refinements.is_empty() {
            let refine_title = if dlt {
                "LLM CLUSTER REFINEMENT"
            } else {
                "POST-CLUSTERING ENHANCEMENT (LLM Refinement)"
            };
            writeln!(w)?;
            banner(w, refine_title)?;
            writeln!(w)?;
            for note in &self.annotations.refinements {
                writeln!(
                    w,
                    "Refining Cluster {} (Count: {})...",
                    note.cluster_id.as_u64(),
                    note.count
                )?;
                writeln!(w, "{}", note.text)?;
                writeln!(w)?;
            }
        }

        if !self.annotations.reviews.is_empty() {
            writeln!(w)?;
            banner(w, "CHANGED PATTERN REVIEW")?;
            writeln!(w)?;
            for note in &self.annotations.reviews {
                writeln!(w, "Template: {}", note.template)?;
                writeln!(w, "{}", note.text)?;
                writeln!(w)?;
            }
        }

        if let Some(merges) = &self.annotations.merges {
            writeln!(w)?;
            banner(w, "SEMANTIC CLUSTER MERGING")?;
            writeln!(w)?;
            writeln!(w, "{merges}")?;
        }

        writeln!(w)?;
        if dlt {
            writeln!(w, "[EXPORT] DLT results exported to {}", self.export_path)?;
        } else {
            writeln!(
                w,
                "[EXPORT] Structured logs exported to {}",
                self.export_path
            )?;
        }

        Ok(())
    }
}

fn banner(w: &mut dyn Write, title: &str) -> std::io::Result<()> {
    use colored::Colorize;

    let ruler = "=".repeat(RULER_WIDTH);
    writeln!(w, "{ruler}")?;
    writeln!(w, "{}", title.bold())?;
    writeln!(w, "{ruler}")
}

fn join_first(values: &[String], cap: usize) -> String {
    values
        .iter()
        .take(cap)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

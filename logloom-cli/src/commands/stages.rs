//! LLM annotation stages around the mining run.
//!
//! Annotation is strictly auxiliary: every stage degrades gracefully,
//! so a failed or unreachable model never blocks the mining results.
//! A failed request is logged and its error message takes the place of
//! the annotation text, mirroring what the operator would want to see
//! in the report.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use logloom_core::Annotator;
use logloom_core::config::LlmSettings;
use logloom_core::types::{ClusterDigest, ClusterId};
use logloom_llm::GeminiClient;
use logloom_miner::{PatternEvent, StrataReport, TemplateMiner};

/// Build the annotation client, or decide to run without one.
///
/// Returns `None` when annotation is disabled (config or `--no-llm`)
/// or when the client cannot be constructed, typically because no API
/// key is available. Construction failure is a warning, not an error:
/// the mining run proceeds unannotated.
pub fn build_annotator(settings: &LlmSettings, no_llm: bool) -> Option<GeminiClient> {
    if no_llm || !settings.enabled {
        return None;
    }
    match GeminiClient::from_settings(settings) {
        Ok(client) => Some(client),
        Err(err) => {
            warn!(error = %err, "LLM annotation disabled");
            None
        }
    }
}

/// One annotated cluster: which cluster, what it looked like, and what
/// the model said about it.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterNote {
    pub cluster_id: ClusterId,
    pub template: String,
    pub count: u64,
    pub text: String,
}

/// Collected annotation output for a single run.
///
/// Field order follows the stage execution order. Sections that did
/// not run are omitted from JSON output entirely.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnnotationReport {
    /// Preprocessing rule suggestions from sampled raw lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preprocessing: Option<String>,
    /// Realtime classifications of newly created patterns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classifications: Vec<ClusterNote>,
    /// Aggregate analysis of the rare stratum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rare_analysis: Option<String>,
    /// Per-anomaly explanations for top rare patterns.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explanations: Vec<ClusterNote>,
    /// Template refinement suggestions for top clusters.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub refinements: Vec<ClusterNote>,
    /// Generalization reviews for templates that changed this run.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<ClusterNote>,
    /// Cluster merge suggestions across top templates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merges: Option<String>,
}

impl AnnotationReport {
    /// True when no stage produced any output.
    pub fn is_empty(&self) -> bool {
        self.preprocessing.is_none()
            && self.classifications.is_empty()
            && self.rare_analysis.is_none()
            && self.explanations.is_empty()
            && self.refinements.is_empty()
            && self.reviews.is_empty()
            && self.merges.is_none()
    }
}

/// Run the post-pass annotation stages enabled in `settings.stages`.
///
/// `contexts` carries optional per-cluster context strings for anomaly
/// explanation (the DLT path fills it with ECU/app provenance; plain
/// text mining leaves it empty). Realtime classifications are pushed
/// into `report` by the caller during the pass; this only fills the
/// remaining sections.
#[allow(clippy::too_many_arguments)]
pub async fn annotate_run<A: Annotator>(
    annotator: &A,
    settings: &LlmSettings,
    miner: &TemplateMiner,
    strata: &StrataReport,
    changed_patterns: &[PatternEvent],
    preprocessing_samples: &[String],
    contexts: &HashMap<ClusterId, String>,
    report: &mut AnnotationReport,
) {
    let toggles = &settings.stages;
    let limits = &settings.limits;

    if toggles.pre_clustering && !preprocessing_samples.is_empty() {
        report.preprocessing =
            Some(suggest_preprocessing(annotator, preprocessing_samples).await);
    }

    if toggles.post_clustering && !strata.rare.is_empty() {
        let rare: Vec<ClusterDigest> = strata
            .rare
            .iter()
            .filter_map(|p| miner.digest(p.cluster_id))
            .collect();
        report.rare_analysis =
            Some(analyze_rare(annotator, &rare, miner.total_lines()).await);
    }

    if toggles.anomaly_explanation {
        for info in strata.rare.iter().take(limits.max_anomalies_to_explain) {
            let digest = match miner.digest(info.cluster_id) {
                Some(digest) => digest,
                None => continue,
            };
            let example = match digest.examples.first() {
                Some(example) => example.clone(),
                None => continue,
            };
            let context = contexts.get(&info.cluster_id).map(String::as_str);
            let text = explain_anomaly(annotator, &digest.template, &example, context).await;
            report.explanations.push(ClusterNote {
                cluster_id: digest.id,
                template: digest.template,
                count: digest.count,
                text,
            });
        }
    }

    if toggles.post_clustering {
        for digest in miner
            .digests_ranked()
            .into_iter()
            .take(limits.max_clusters_to_refine)
        {
            info!(cluster = %digest.id, count = digest.count, "requesting template refinement");
            let text = refine_template(annotator, &digest).await;
            report.refinements.push(ClusterNote {
                cluster_id: digest.id,
                template: digest.template,
                count: digest.count,
                text,
            });
        }

        // Templates that drifted this run get a generalization review.
        if let Some(event) = changed_patterns.first() {
            if let Some(digest) = miner.digest(event.cluster_id) {
                let text =
                    suggest_refinement(annotator, &digest.template, &digest.examples).await;
                report.reviews.push(ClusterNote {
                    cluster_id: digest.id,
                    template: digest.template,
                    count: digest.count,
                    text,
                });
            }
        }
    }

    if toggles.semantic_merging {
        let candidates: Vec<(ClusterId, String)> = miner
            .digests_ranked()
            .into_iter()
            .take(limits.max_clusters_for_merging)
            .map(|d| (d.id, d.template))
            .collect();
        // A merge suggestion over a single cluster is meaningless.
        if candidates.len() >= 2 {
            report.merges = Some(merge_clusters(annotator, &candidates).await);
        }
    }
}

// ---- degrading stage wrappers ----
//
// Each wrapper turns an annotation failure into report text so the
// run never aborts on a model error.

pub async fn analyze_rare<A: Annotator>(
    annotator: &A,
    rare: &[ClusterDigest],
    total_lines: u64,
) -> String {
    match annotator.analyze_rare_patterns(rare, total_lines).await {
        Ok(text) => text,
        Err(err) => {
            warn!(stage = "analyze_rare", error = %err, "annotation request failed");
            format!("Error analyzing patterns: {err}")
        }
    }
}

pub async fn classify_new<A: Annotator>(annotator: &A, template: &str, example: &str) -> String {
    match annotator.classify_new_pattern(template, example).await {
        Ok(text) => text,
        Err(err) => {
            warn!(stage = "classify_new", error = %err, "annotation request failed");
            format!("Error classifying pattern: {err}")
        }
    }
}

pub async fn suggest_refinement<A: Annotator>(
    annotator: &A,
    template: &str,
    examples: &[String],
) -> String {
    match annotator.suggest_pattern_refinement(template, examples).await {
        Ok(text) => text,
        Err(err) => {
            warn!(stage = "suggest_refinement", error = %err, "annotation request failed");
            format!("Error suggesting refinement: {err}")
        }
    }
}

pub async fn refine_template<A: Annotator>(annotator: &A, digest: &ClusterDigest) -> String {
    match annotator.refine_cluster_template(digest).await {
        Ok(text) => text,
        Err(err) => {
            warn!(stage = "refine_template", error = %err, "annotation request failed");
            format!("Error refining template: {err}")
        }
    }
}

pub async fn suggest_preprocessing<A: Annotator>(annotator: &A, samples: &[String]) -> String {
    match annotator.suggest_preprocessing_rules(samples).await {
        Ok(text) => text,
        Err(err) => {
            warn!(stage = "preprocessing", error = %err, "annotation request failed");
            format!("Error suggesting preprocessing: {err}")
        }
    }
}

pub async fn explain_anomaly<A: Annotator>(
    annotator: &A,
    template: &str,
    example: &str,
    context: Option<&str>,
) -> String {
    match annotator.explain_anomaly(template, example, context).await {
        Ok(text) => text,
        Err(err) => {
            warn!(stage = "explain_anomaly", error = %err, "annotation request failed");
            format!("Error explaining anomaly: {err}")
        }
    }
}

pub async fn merge_clusters<A: Annotator>(
    annotator: &A,
    clusters: &[(ClusterId, String)],
) -> String {
    match annotator.merge_similar_clusters(clusters).await {
        Ok(text) => text,
        Err(err) => {
            warn!(stage = "merge_clusters", error = %err, "annotation request failed");
            format!("Error merging clusters: {err}")
        }
    }
}

//! 작업별 프롬프트 조립
//!
//! 일곱 가지 주석 작업의 지시문을 만듭니다. 모든 프롬프트는 짧은
//! 응답을 명시적으로 요구하고, 포함하는 패턴과 샘플 수에 상한을
//! 둡니다. 응답 형식은 표시용 자연어이며 여기서 파싱하지 않습니다.

use logloom_core::{ClusterDigest, ClusterId};

/// 정제 프롬프트에 넣는 샘플 라인 수 상한
const REFINE_SAMPLE_CAP: usize = 3;
/// 병합 프롬프트에 넣는 템플릿 수 상한
const MERGE_TEMPLATE_CAP: usize = 10;
/// 전처리 프롬프트에 넣는 샘플 라인 수 상한
const PREPROCESS_SAMPLE_CAP: usize = 10;

/// 희귀 패턴 집합 분석 프롬프트
pub fn analyze_rare_patterns(rare: &[ClusterDigest], total_lines: u64, limit: usize) -> String {
    let mut prompt = format!(
        "Analyze these rare log patterns. Be CONCISE (2-3 sentences per pattern max).

Total lines: {total_lines}

Patterns:
"
    );
    for digest in rare.iter().take(limit) {
        prompt.push_str(&format!(
            "\n- Count: {}, Template: {}",
            digest.count, digest.template
        ));
    }
    prompt.push_str(
        "

For each critical pattern only, provide:
- Severity (INFO/WARNING/ERROR/CRITICAL)
- Issue (1 sentence)
- Action (1 sentence)

Skip INFO patterns. Be brief.",
    );
    prompt
}

/// 신규 패턴 분류 프롬프트
pub fn classify_new_pattern(line: &str, template: &str) -> String {
    format!(
        "Classify in 1 line each:

Log: {line}
Template: {template}

Category: <Auth/DB/Network/System/App>
Severity: <INFO/WARN/ERROR/CRITICAL>
Status: <Normal/Anomaly>
Why: <1 sentence>"
    )
}

/// 템플릿 일반화 검토 프롬프트
pub fn suggest_pattern_refinement(template: &str, examples: &[String]) -> String {
    let mut prompt = format!(
        "Template: {template}

Examples:
"
    );
    for example in examples.iter().take(REFINE_SAMPLE_CAP) {
        prompt.push_str(&format!("\n- {example}"));
    }
    prompt.push_str(
        "

Correct? Suggest improvements (1-2 sentences max).",
    );
    prompt
}

/// 단일 클러스터 정제 프롬프트
pub fn refine_cluster_template(digest: &ClusterDigest) -> String {
    let mut prompt = format!(
        "Refine this log pattern. Be CONCISE.

Cluster: {}
Template: {}

Samples:
",
        digest.id.as_u64(),
        digest.template
    );
    for example in digest.examples.iter().take(REFINE_SAMPLE_CAP) {
        prompt.push_str(&format!("\n- {example}"));
    }
    prompt.push_str(
        "

Provide (keep each to 1 line max):
Refined Template: <better template>
Label: <short descriptive name>
Severity: <INFO/WARNING/ERROR/CRITICAL>
Merge With: <cluster IDs or None>
Explanation: <1 sentence only>",
    );
    prompt
}

/// 전처리 규칙 제안 프롬프트
pub fn suggest_preprocessing_rules(samples: &[String]) -> String {
    let mut prompt = String::from(
        "Suggest preprocessing rules. Be CONCISE (max 10 lines total).

Sample Logs:
",
    );
    for sample in samples.iter().take(PREPROCESS_SAMPLE_CAP) {
        prompt.push_str(&format!("\n- {sample}"));
    }
    prompt.push_str(
        "

List only:
1. Top 5 regex masks (format: pattern -> replacement)
2. Key normalization rules (1 sentence each max)

Be brief.",
    );
    prompt
}

/// 이상 라인 상세 설명 프롬프트
pub fn explain_anomaly(line: &str, template: &str, context: Option<&str>) -> String {
    let mut prompt = format!(
        "Explain this anomalous log entry in natural language for a developer.

Log Entry: {line}
Template: {template}
"
    );
    if let Some(context) = context {
        prompt.push_str(&format!("Context: {context}\n"));
    }
    prompt.push_str(
        "

Provide (1 sentence each max):
1. What: <what happened>
2. Cause: <likely root cause>
3. Action: <immediate fix>
4. Check: <related systems>

Be concise.",
    );
    prompt
}

/// 의미 중복 클러스터 병합 제안 프롬프트
pub fn merge_similar_clusters(clusters: &[(ClusterId, String)]) -> String {
    let mut prompt = String::from(
        "Find templates that mean the same thing. Be CONCISE.

Templates:
",
    );
    for (pos, (id, template)) in clusters.iter().take(MERGE_TEMPLATE_CAP).enumerate() {
        prompt.push_str(&format!("\n{}. [{}] {}", pos + 1, id.as_u64(), template));
    }
    prompt.push_str(
        "

List merge groups (1 line each):
Group 1: [IDs] - <1 word reason>
Group 2: [IDs] - <1 word reason>

Only list if truly equivalent.",
    );
    prompt
}

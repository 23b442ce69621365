//! LLM 주석 trait — 패턴 분석/분류/정제를 위한 서비스 경계
//!
//! 마이닝 엔진과 CLI는 이 trait에만 의존하고, 실제 모델 호출은
//! `logloom-llm` 크레이트가 구현합니다. 테스트에서는 고정 응답을
//! 돌려주는 구현으로 대체할 수 있습니다.

use crate::error::AnnotateError;
use crate::types::{ClusterDigest, ClusterId};

/// 패턴 주석 서비스
///
/// 모든 메서드는 자연어 텍스트를 돌려줍니다. 호출자는 응답을
/// 파싱하지 않고 그대로 표시하거나 기록합니다.
#[allow(async_fn_in_trait)]
pub trait Annotator: Send + Sync {
    /// 희귀 패턴 집합을 분석해 잠재적 이상 징후를 설명합니다.
    async fn analyze_rare_patterns(
        &self,
        rare: &[ClusterDigest],
        total_lines: u64,
    ) -> Result<String, AnnotateError>;

    /// 새로 발견된 패턴을 분류합니다 (정상/주의/이상).
    async fn classify_new_pattern(
        &self,
        template: &str,
        example: &str,
    ) -> Result<String, AnnotateError>;

    /// 템플릿과 예시를 보고 더 나은 일반화를 제안합니다.
    async fn suggest_pattern_refinement(
        &self,
        template: &str,
        examples: &[String],
    ) -> Result<String, AnnotateError>;

    /// 단일 클러스터의 템플릿 정제를 제안합니다.
    async fn refine_cluster_template(
        &self,
        digest: &ClusterDigest,
    ) -> Result<String, AnnotateError>;

    /// 샘플 라인을 보고 마이닝 전 전처리 규칙을 제안합니다.
    async fn suggest_preprocessing_rules(
        &self,
        samples: &[String],
    ) -> Result<String, AnnotateError>;

    /// 이상 패턴 하나를 문맥과 함께 설명합니다.
    async fn explain_anomaly(
        &self,
        template: &str,
        example: &str,
        context: Option<&str>,
    ) -> Result<String, AnnotateError>;

    /// 의미상 같은 이벤트로 보이는 클러스터 병합을 제안합니다.
    async fn merge_similar_clusters(
        &self,
        clusters: &[(ClusterId, String)],
    ) -> Result<String, AnnotateError>;
}

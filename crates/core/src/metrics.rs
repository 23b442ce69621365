//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logloom_`
//! - 모듈명: `miner_`, `ingest_`, `annotate_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use logloom_core::metrics;
//! use metrics::counter;
//!
//! counter!(logloom_core::metrics::MINER_LINES_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 입력 형식 레이블 키 (text, dlt_csv, dlt_tsv)
pub const LABEL_FORMAT: &str = "format";

/// LLM 스테이지 레이블 키 (pre_clustering, realtime, analysis, post_clustering)
pub const LABEL_STAGE: &str = "stage";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Miner 메트릭 ──────────────────────────────────────────────────

/// Miner: 처리된 전체 로그 라인 수 (counter)
pub const MINER_LINES_TOTAL: &str = "logloom_miner_lines_total";

/// Miner: 새로 생성된 클러스터 수 (counter)
pub const MINER_CLUSTERS_CREATED_TOTAL: &str = "logloom_miner_clusters_created_total";

/// Miner: 템플릿이 일반화된 횟수 (counter)
pub const MINER_TEMPLATES_CHANGED_TOTAL: &str = "logloom_miner_templates_changed_total";

/// Miner: 현재 클러스터 수 (gauge)
pub const MINER_CLUSTERS: &str = "logloom_miner_clusters";

// ─── Ingest 메트릭 ─────────────────────────────────────────────────

/// Ingest: 읽어들인 레코드 수 (counter, label: format)
pub const INGEST_RECORDS_TOTAL: &str = "logloom_ingest_records_total";

/// Ingest: 메시지가 없어 건너뛴 레코드 수 (counter)
pub const INGEST_RECORDS_SKIPPED_TOTAL: &str = "logloom_ingest_records_skipped_total";

// ─── Annotate 메트릭 ───────────────────────────────────────────────

/// Annotate: LLM 요청 수 (counter, label: stage)
pub const ANNOTATE_REQUESTS_TOTAL: &str = "logloom_annotate_requests_total";

/// Annotate: 실패한 LLM 요청 수 (counter)
pub const ANNOTATE_FAILURES_TOTAL: &str = "logloom_annotate_failures_total";

/// Annotate: LLM 요청 지연 시간 (histogram, 초)
pub const ANNOTATE_REQUEST_DURATION_SECONDS: &str = "logloom_annotate_request_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// LLM 요청 지연 시간 히스토그램 버킷 (초)
///
/// 100ms ~ 120s 범위 (모델 응답은 수 초 단위가 일반적)
pub const ANNOTATE_DURATION_BUCKETS: [f64; 8] = [0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 120.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 호출하여 HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Miner
    describe_counter!(
        MINER_LINES_TOTAL,
        "Total number of log lines fed into the template miner"
    );
    describe_counter!(
        MINER_CLUSTERS_CREATED_TOTAL,
        "Total number of new clusters created by the miner"
    );
    describe_counter!(
        MINER_TEMPLATES_CHANGED_TOTAL,
        "Total number of template generalizations (tokens widened to wildcards)"
    );
    describe_gauge!(MINER_CLUSTERS, "Current number of clusters in the miner");

    // Ingest
    describe_counter!(
        INGEST_RECORDS_TOTAL,
        "Total number of records read from input sources"
    );
    describe_counter!(
        INGEST_RECORDS_SKIPPED_TOTAL,
        "Total number of records skipped because no message could be extracted"
    );

    // Annotate
    describe_counter!(
        ANNOTATE_REQUESTS_TOTAL,
        "Total number of annotation requests sent to the LLM"
    );
    describe_counter!(
        ANNOTATE_FAILURES_TOTAL,
        "Total number of failed LLM annotation requests"
    );
    describe_histogram!(
        ANNOTATE_REQUEST_DURATION_SECONDS,
        "Time to complete a single LLM annotation request in seconds"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    // 메트릭 이름 전체 목록 (테스트용)
    const ALL_METRIC_NAMES: &[&str] = &[
        MINER_LINES_TOTAL,
        MINER_CLUSTERS_CREATED_TOTAL,
        MINER_TEMPLATES_CHANGED_TOTAL,
        MINER_CLUSTERS,
        INGEST_RECORDS_TOTAL,
        INGEST_RECORDS_SKIPPED_TOTAL,
        ANNOTATE_REQUESTS_TOTAL,
        ANNOTATE_FAILURES_TOTAL,
        ANNOTATE_REQUEST_DURATION_SECONDS,
    ];

    #[test]
    fn all_metrics_start_with_logloom_prefix() {
        for name in ALL_METRIC_NAMES {
            assert!(
                name.starts_with("logloom_"),
                "Metric '{}' does not start with 'logloom_' prefix",
                name
            );
        }
    }

    #[test]
    fn all_metrics_have_9_entries() {
        assert_eq!(
            ALL_METRIC_NAMES.len(),
            9,
            "Expected 9 metrics (4 Miner + 2 Ingest + 3 Annotate)"
        );
    }

    #[test]
    fn describe_all_does_not_panic() {
        // describe_all() should not panic even without a recorder installed
        describe_all();
    }

    #[test]
    fn label_keys_are_lowercase() {
        let labels = [LABEL_FORMAT, LABEL_STAGE, LABEL_RESULT];
        for label in &labels {
            assert_eq!(
                label.to_lowercase(),
                *label,
                "Label key '{}' should be lowercase",
                label
            );
        }
    }

    #[test]
    fn annotate_duration_buckets_are_sorted() {
        let buckets = ANNOTATE_DURATION_BUCKETS;
        for i in 1..buckets.len() {
            assert!(
                buckets[i] > buckets[i - 1],
                "Bucket values must be in ascending order"
            );
        }
    }
}

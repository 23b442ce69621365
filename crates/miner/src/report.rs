//! 구조화 내보내기 리포트
//!
//! 마이닝이 끝난 엔진 상태를 JSON으로 내보낼 수 있는 형태로
//! 정리합니다. 텍스트 로그 리포트는 `total_lines`, `total_patterns`,
//! `templates`, `new_patterns`, `changed_patterns` 키를 가지며, DLT
//! 리포트는 `dlt_format` 플래그와 템플릿별 `ecus`/`app_ids` 집계가
//! 추가됩니다. 리포트 생성은 엔진을 읽기만 합니다.

use serde::Serialize;

use logloom_core::types::ClusterId;

use crate::miner::TemplateMiner;

/// 실행 중 관측된 패턴 이벤트
///
/// 새 클러스터를 만들었거나 템플릿을 일반화시킨 라인을 그 시점의
/// 템플릿과 함께 기록합니다.
#[derive(Debug, Clone, Serialize)]
pub struct PatternEvent {
    /// 이벤트를 일으킨 원본 라인
    pub line: String,
    /// 귀속된 클러스터
    pub cluster_id: ClusterId,
    /// 이벤트 직후의 템플릿 문자열
    pub template: String,
}

/// 템플릿 하나의 내보내기 항목
#[derive(Debug, Clone, Serialize)]
pub struct TemplateEntry {
    /// 템플릿 문자열 표현
    pub template: String,
    /// 귀속된 라인 수
    pub count: u64,
    /// 클러스터 id
    pub cluster_id: ClusterId,
    /// 이 템플릿이 관측된 ECU 목록 (DLT 입력에서만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecus: Option<Vec<String>>,
    /// 이 템플릿이 관측된 애플리케이션 id 목록 (DLT 입력에서만)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_ids: Option<Vec<String>>,
    /// 보존된 예시 라인 (오래된 것부터)
    pub example_logs: Vec<String>,
}

/// 마이닝 실행 리포트
#[derive(Debug, Clone, Serialize)]
pub struct MiningReport {
    /// 처리한 총 라인 수 (복원된 상태 포함)
    pub total_lines: u64,
    /// 전체 클러스터 수
    pub total_patterns: usize,
    /// DLT 입력 여부 (텍스트 입력이면 직렬화에서 생략)
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dlt_format: bool,
    /// count 내림차순으로 정렬된 템플릿 목록
    pub templates: Vec<TemplateEntry>,
    /// 이번 실행에서 새로 생성된 클러스터 이벤트
    pub new_patterns: Vec<PatternEvent>,
    /// 이번 실행에서 템플릿이 변한 클러스터 이벤트
    pub changed_patterns: Vec<PatternEvent>,
}

impl MiningReport {
    /// 엔진 상태에서 리포트를 만듭니다.
    ///
    /// 템플릿은 count 내림차순이며, 예시 라인은 클러스터별로
    /// `examples_per_template`개까지 담습니다. DLT 메타데이터가
    /// 필요하면 생성 후 호출 측에서 항목을 채웁니다.
    pub fn build(
        miner: &TemplateMiner,
        examples_per_template: usize,
        new_patterns: Vec<PatternEvent>,
        changed_patterns: Vec<PatternEvent>,
    ) -> Self {
        let templates = miner
            .ranked()
            .into_iter()
            .map(|cluster| TemplateEntry {
                template: cluster.template_string(),
                count: cluster.count(),
                cluster_id: cluster.id(),
                ecus: None,
                app_ids: None,
                example_logs: cluster
                    .examples()
                    .take(examples_per_template)
                    .map(str::to_owned)
                    .collect(),
            })
            .collect();

        Self {
            total_lines: miner.total_lines(),
            total_patterns: miner.cluster_count(),
            dlt_format: false,
            templates,
            new_patterns,
            changed_patterns,
        }
    }
}

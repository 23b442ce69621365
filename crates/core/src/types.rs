//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 마이닝 엔진, LLM 주석 서비스, CLI가 공유하는 데이터 구조를 정의합니다.
//! 엔진 내부 상태(트리, 클러스터 저장소)는 `logloom-miner` 크레이트에 있고,
//! 여기에는 경계를 넘나드는 읽기 전용 뷰만 둡니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 클러스터 식별자
///
/// 단조 증가로 발급되며, 한 번 발급된 id는 절대 재사용되거나
/// 재할당되지 않습니다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClusterId(pub u64);

impl ClusterId {
    /// 원시 정수 값을 반환합니다.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// 클러스터 스냅샷
///
/// 주석 프롬프트와 출력 렌더링에 쓰이는 읽기 전용 뷰입니다.
/// 스냅샷을 떠낸 뒤의 엔진 상태 변화는 반영되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterDigest {
    /// 클러스터 id
    pub id: ClusterId,
    /// 렌더링된 템플릿 (와일드카드는 `<*>`)
    pub template: String,
    /// 매칭된 라인 수
    pub count: u64,
    /// 전체 라인 대비 비율 (0.0~100.0)
    pub percentage: f64,
    /// 보존된 예시 라인 (최신순 아님, 링 버퍼 순서)
    pub examples: Vec<String>,
}

impl fmt::Display for ClusterDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} count={} ({:.1}%) {}",
            self.id, self.count, self.percentage, self.template,
        )
    }
}

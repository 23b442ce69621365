//! 빈도 계층화
//!
//! 마이닝이 끝난 클러스터 집합을 `frequent`와 `rare` 두 계층으로
//! 나눕니다. 클러스터는 다음 두 조건 중 하나라도 만족하면 희귀입니다.
//!
//! - count가 절대 임계값 이하 (`count <= rare_count_threshold`)
//! - 전체 라인 대비 비율이 상대 임계값 미만
//!   (`percentage < frequency_threshold_percent`)
//!
//! 두 임계값은 OR로 결합됩니다. 짧은 구간에서 절대 횟수로, 긴 구간에서
//! 상대 비율로 희귀를 잡기 위함입니다. 계층화는 클러스터 저장소를
//! 읽기만 하는 순수 함수입니다.

use serde::Serialize;

use logloom_core::config::StrataSettings;
use logloom_core::types::ClusterId;

use crate::cluster::LogCluster;

/// 계층화된 패턴 요약
#[derive(Debug, Clone, Serialize)]
pub struct PatternInfo {
    /// 클러스터 id
    pub cluster_id: ClusterId,
    /// 템플릿 문자열 표현
    pub template: String,
    /// 귀속된 라인 수
    pub count: u64,
    /// 전체 라인 대비 비율 (0.0 ~ 100.0)
    pub percentage: f64,
}

/// 계층화 결과
///
/// 모든 클러스터는 정확히 한 계층에 속하며, 각 계층 안에서는
/// count 내림차순(동률이면 id 오름차순)으로 정렬됩니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrataReport {
    /// 빈번 패턴
    pub frequent: Vec<PatternInfo>,
    /// 희귀 패턴
    pub rare: Vec<PatternInfo>,
    /// 분모로 사용한 전체 라인 수 (클러스터 count의 합)
    pub total_lines: u64,
}

/// 빈도 계층화기
#[derive(Debug, Clone)]
pub struct Stratifier {
    rare_count_threshold: u64,
    frequency_threshold_percent: f64,
}

impl Stratifier {
    /// 임계값을 지정해 계층화기를 생성합니다.
    pub fn new(rare_count_threshold: u64, frequency_threshold_percent: f64) -> Self {
        Self {
            rare_count_threshold,
            frequency_threshold_percent,
        }
    }

    /// core 설정에서 계층화기를 만듭니다.
    pub fn from_core(settings: &StrataSettings) -> Self {
        Self::new(
            settings.rare_count_threshold,
            settings.frequency_threshold_percent,
        )
    }

    /// 클러스터 집합을 두 계층으로 나눕니다.
    ///
    /// 비율의 분모는 입력된 클러스터 count의 합입니다. 클러스터가
    /// 없으면 빈 결과를 반환합니다.
    pub fn stratify<'a, I>(&self, clusters: I) -> StrataReport
    where
        I: IntoIterator<Item = &'a LogCluster>,
    {
        let clusters: Vec<&LogCluster> = clusters.into_iter().collect();
        let total_lines: u64 = clusters.iter().map(|c| c.count()).sum();
        if total_lines == 0 {
            return StrataReport::default();
        }

        let mut frequent = Vec::new();
        let mut rare = Vec::new();
        for cluster in clusters {
            let info = PatternInfo {
                cluster_id: cluster.id(),
                template: cluster.template_string(),
                count: cluster.count(),
                percentage: percentage_of(cluster.count(), total_lines),
            };
            if self.is_rare(&info) {
                rare.push(info);
            } else {
                frequent.push(info);
            }
        }

        rank(&mut frequent);
        rank(&mut rare);

        StrataReport {
            frequent,
            rare,
            total_lines,
        }
    }

    fn is_rare(&self, info: &PatternInfo) -> bool {
        info.count <= self.rare_count_threshold
            || info.percentage < self.frequency_threshold_percent
    }
}

impl Default for Stratifier {
    fn default() -> Self {
        Self::from_core(&StrataSettings::default())
    }
}

fn rank(patterns: &mut [PatternInfo]) {
    patterns.sort_by(|a, b| b.count.cmp(&a.count).then(a.cluster_id.cmp(&b.cluster_id)));
}

#[allow(clippy::cast_precision_loss)]
fn percentage_of(count: u64, total: u64) -> f64 {
    count as f64 / total as f64 * 100.0
}

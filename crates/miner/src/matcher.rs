//! 후보 클러스터 매칭
//!
//! 트리가 좁혀 준 후보 목록에서 토큰 시퀀스와 가장 유사한 클러스터를
//! 고릅니다. 유사도는 위치별 일치 비율이며, 템플릿의 와일드카드 위치는
//! 항상 일치로 칩니다.

use logloom_core::types::ClusterId;

use crate::cluster::{ClusterStore, TemplateToken};

/// 토큰 시퀀스와 템플릿의 유사도를 계산합니다.
///
/// 두 시퀀스의 길이가 같다는 전제에서, 일치하는 위치의 비율을
/// 반환합니다. 빈 시퀀스끼리는 1.0입니다.
pub(crate) fn similarity(tokens: &[String], template: &[TemplateToken]) -> f64 {
    debug_assert_eq!(tokens.len(), template.len());
    if template.is_empty() {
        return 1.0;
    }
    let matched = tokens
        .iter()
        .zip(template)
        .filter(|&(token, slot)| slot.matches(token))
        .count();
    matched as f64 / template.len() as f64
}

/// 후보 목록에서 임계값 이상으로 가장 유사한 클러스터를 찾습니다.
///
/// 유사도가 같으면 후보 목록에서 먼저 나온 클러스터가 이깁니다.
/// 후보 목록은 생성 순서이므로 이 선택은 결정적입니다. 임계값에
/// 정확히 걸린 후보도 매칭으로 칩니다.
pub(crate) fn best_match(
    store: &ClusterStore,
    candidates: &[ClusterId],
    tokens: &[String],
    threshold: f64,
) -> Option<(ClusterId, f64)> {
    let mut best: Option<(ClusterId, f64)> = None;
    for &id in candidates {
        if let Some(cluster) = store.get(id) {
            if cluster.template().len() != tokens.len() {
                continue;
            }
            let sim = similarity(tokens, cluster.template());
            if sim < threshold {
                continue;
            }
            match best {
                Some((_, best_sim)) if sim <= best_sim => {}
                _ => best = Some((id, sim)),
            }
        }
    }
    best
}

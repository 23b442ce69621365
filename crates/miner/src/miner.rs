//! 템플릿 마이닝 엔진
//!
//! [`TemplateMiner`]는 토크나이저, 트리 인덱스, 클러스터 저장소를 묶어
//! 라인 단위의 스트리밍 마이닝을 수행합니다. 라인 하나를 처리하는 흐름:
//!
//! ```text
//! line -> Tokenizer -> TreeIndex.route() -> best_match()
//!           ├─ 매칭: generalize() + count 증가        -> TemplateChanged | Unchanged
//!           └─ 미매칭: ClusterStore.create() + insert() -> Created
//! ```
//!
//! 처리 결과는 [`MineResult`]로 반환되며 출력이나 export는 엔진 밖의
//! 소비자 몫입니다. 엔진 자체는 어떤 I/O도 하지 않습니다.
//!
//! # 사용 예시
//! ```
//! use logloom_miner::{MinerConfig, TemplateMiner};
//!
//! let mut miner = TemplateMiner::new(MinerConfig::default())?;
//! let result = miner.process("user 42 logged in");
//! println!("cluster {}", result.cluster_id);
//! # Ok::<(), logloom_miner::MinerError>(())
//! ```

use tracing::debug;

use logloom_core::metrics as m;
use logloom_core::types::{ClusterDigest, ClusterId};

use crate::cluster::{ClusterStore, LogCluster};
use crate::config::MinerConfig;
use crate::error::MinerError;
use crate::matcher;
use crate::persist::PersistedState;
use crate::tokenize::Tokenizer;
use crate::tree::TreeIndex;

/// 라인 처리가 클러스터 집합에 일으킨 변화
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineChange {
    /// 매칭되는 클러스터가 없어 새로 생성됨
    Created,
    /// 기존 클러스터에 매칭되었고 템플릿 일부가 와일드카드로 일반화됨
    TemplateChanged,
    /// 기존 클러스터에 매칭되었고 템플릿은 그대로임
    Unchanged,
}

/// 한 라인의 처리 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MineResult {
    /// 라인이 귀속된 클러스터
    pub cluster_id: ClusterId,
    /// 이 라인이 일으킨 변화
    pub change: MineChange,
}

/// 스트리밍 로그 템플릿 마이닝 엔진
///
/// 내부 상태(트리, 클러스터, 카운터)는 모두 이 구조체가 소유하며,
/// 전역 상태나 공유 가변 참조는 없습니다. 같은 설정과 같은 입력
/// 순서는 항상 같은 클러스터 분할을 만듭니다.
#[derive(Debug)]
pub struct TemplateMiner {
    config: MinerConfig,
    tokenizer: Tokenizer,
    tree: TreeIndex,
    store: ClusterStore,
    /// 엔진 수명 동안 처리한 라인 수 (복원된 상태 포함)
    total_lines: u64,
}

impl TemplateMiner {
    /// 빈 상태의 엔진을 생성합니다.
    ///
    /// # Errors
    /// 설정 값이 유효 범위를 벗어나거나 마스킹 정규식이 컴파일되지
    /// 않으면 에러를 반환합니다.
    pub fn new(config: MinerConfig) -> Result<Self, MinerError> {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.masking)?;
        let tree = TreeIndex::new(
            config.max_depth,
            config.max_children,
            config.parametrize_numeric_tokens,
        );
        Ok(Self {
            config,
            tokenizer,
            tree,
            store: ClusterStore::new(),
            total_lines: 0,
        })
    }

    /// 저장된 스냅샷에서 엔진을 복원합니다.
    ///
    /// 스냅샷에 기록된 트리 파라미터가 현재 설정과 다르면 복원을
    /// 거부합니다. 다른 파라미터로 만들어진 트리를 이어 쓰면 이후
    /// 라우팅이 증분 구축과 달라지기 때문입니다.
    ///
    /// # Errors
    /// 설정 검증 실패, 트리 파라미터 불일치, 클러스터 id 카운터가
    /// 기존 id보다 뒤처졌거나 누적 라인 수가 클러스터 카운트 합과
    /// 다른 스냅샷이면 에러를 반환합니다.
    pub fn restore(config: MinerConfig, state: PersistedState) -> Result<Self, MinerError> {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.masking)?;

        if state.tree.max_depth() != config.max_depth
            || state.tree.max_children() != config.max_children
            || state.tree.parametrize_numeric_tokens() != config.parametrize_numeric_tokens
        {
            return Err(MinerError::State {
                reason: format!(
                    "snapshot tree parameters (depth={}, children={}, numeric={}) \
                     do not match config (depth={}, children={}, numeric={})",
                    state.tree.max_depth(),
                    state.tree.max_children(),
                    state.tree.parametrize_numeric_tokens(),
                    config.max_depth,
                    config.max_children,
                    config.parametrize_numeric_tokens,
                ),
            });
        }

        let store = ClusterStore::from_parts(state.next_id, state.clusters).ok_or_else(|| {
            MinerError::State {
                reason: "next cluster id is not ahead of existing cluster ids".to_owned(),
            }
        })?;

        // count 보존 불변식은 복원 경계에서도 성립해야 한다
        let counted = store.total_count();
        if counted != state.total_lines {
            return Err(MinerError::State {
                reason: format!(
                    "snapshot total_lines {} does not match cluster count sum {counted}",
                    state.total_lines,
                ),
            });
        }

        debug!(
            clusters = store.len(),
            total_lines = state.total_lines,
            "restored miner state from snapshot"
        );

        Ok(Self {
            config,
            tokenizer,
            tree: state.tree,
            store,
            total_lines: state.total_lines,
        })
    }

    /// 라인 하나를 처리하고 귀속 결과를 반환합니다.
    ///
    /// 매칭에 실패한 라인은 항상 새 클러스터가 되므로 처리 자체는
    /// 실패하지 않습니다. 전체 클러스터 count 합은 처리한 라인 수와
    /// 항상 일치합니다.
    pub fn process(&mut self, line: &str) -> MineResult {
        let tokens = self.tokenizer.tokenize(line);
        self.total_lines += 1;
        metrics::counter!(m::MINER_LINES_TOTAL).increment(1);

        if let Some(candidates) = self.tree.route(&tokens) {
            let matched = matcher::best_match(
                &self.store,
                candidates,
                &tokens,
                self.config.sim_threshold,
            );
            if let Some((id, similarity)) = matched {
                if let Some(cluster) = self.store.get_mut(id) {
                    let generalized = cluster.generalize(&tokens);
                    cluster.record_match(line, self.config.max_examples);
                    let change = if generalized {
                        metrics::counter!(m::MINER_TEMPLATES_CHANGED_TOTAL).increment(1);
                        debug!(
                            cluster_id = id.as_u64(),
                            similarity,
                            template = cluster.template_string().as_str(),
                            "template generalized"
                        );
                        MineChange::TemplateChanged
                    } else {
                        MineChange::Unchanged
                    };
                    return MineResult {
                        cluster_id: id,
                        change,
                    };
                }
            }
        }

        let id = self.store.create(&tokens, line, self.config.max_examples);
        self.tree.insert(&tokens, id);
        metrics::counter!(m::MINER_CLUSTERS_CREATED_TOTAL).increment(1);
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!(m::MINER_CLUSTERS).set(self.store.len() as f64);
        debug!(
            cluster_id = id.as_u64(),
            token_count = tokens.len(),
            "created new cluster"
        );
        MineResult {
            cluster_id: id,
            change: MineChange::Created,
        }
    }

    /// 엔진 수명 동안 처리한 총 라인 수를 반환합니다.
    ///
    /// 복원된 스냅샷에 포함된 라인도 셉니다. 전체 클러스터 count 합과
    /// 같습니다.
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    /// 현재 클러스터 수를 반환합니다.
    pub fn cluster_count(&self) -> usize {
        self.store.len()
    }

    /// id로 클러스터를 조회합니다.
    pub fn cluster(&self, id: ClusterId) -> Option<&LogCluster> {
        self.store.get(id)
    }

    /// 모든 클러스터를 id 오름차순으로 순회합니다.
    pub fn clusters(&self) -> impl Iterator<Item = &LogCluster> {
        self.store.iter()
    }

    /// 모든 클러스터를 count 내림차순(동률이면 id 오름차순)으로 반환합니다.
    pub fn ranked(&self) -> Vec<&LogCluster> {
        self.store.ranked()
    }

    /// 엔진 설정을 반환합니다.
    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// 클러스터 하나의 요약을 만듭니다.
    pub fn digest(&self, id: ClusterId) -> Option<ClusterDigest> {
        self.store.get(id).map(|c| self.make_digest(c))
    }

    /// 모든 클러스터의 요약을 count 내림차순으로 만듭니다.
    pub fn digests_ranked(&self) -> Vec<ClusterDigest> {
        self.store
            .ranked()
            .into_iter()
            .map(|c| self.make_digest(c))
            .collect()
    }

    fn make_digest(&self, cluster: &LogCluster) -> ClusterDigest {
        ClusterDigest {
            id: cluster.id(),
            template: cluster.template_string(),
            count: cluster.count(),
            percentage: percentage_of(cluster.count(), self.total_lines),
            examples: cluster.examples().map(str::to_owned).collect(),
        }
    }

    /// 현재 상태의 스냅샷을 만듭니다.
    ///
    /// 스냅샷을 복원한 뒤 같은 라인 시퀀스를 다시 넣으면 새 클러스터
    /// 생성이나 템플릿 변화가 일어나지 않습니다.
    pub fn snapshot(&self) -> PersistedState {
        let (next_id, clusters) = self.store.to_parts();
        PersistedState {
            next_id,
            clusters,
            tree: self.tree.clone(),
            total_lines: self.total_lines,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage_of(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use logloom_core::config::MaskingRule;

    fn miner() -> TemplateMiner {
        TemplateMiner::new(MinerConfig::default()).unwrap()
    }

    #[test]
    fn first_line_creates_cluster() {
        let mut miner = miner();
        let result = miner.process("user 42 logged in");
        assert_eq!(result.change, MineChange::Created);
        assert_eq!(result.cluster_id, ClusterId(1));
        assert_eq!(miner.cluster_count(), 1);
        assert_eq!(miner.total_lines(), 1);
    }

    #[test]
    fn similar_line_generalizes_template() {
        let mut miner = miner();
        let first = miner.process("user 42 logged in");
        let second = miner.process("user 99 logged in");

        assert_eq!(second.cluster_id, first.cluster_id);
        assert_eq!(second.change, MineChange::TemplateChanged);

        let cluster = miner.cluster(first.cluster_id).unwrap();
        assert_eq!(cluster.template_string(), "user <*> logged in");
        assert_eq!(cluster.count(), 2);
    }

    #[test]
    fn dissimilar_line_creates_second_cluster() {
        let mut miner = miner();
        miner.process("user 42 logged in");
        miner.process("user 99 logged in");
        let third = miner.process("disk full on node7");

        assert_eq!(third.change, MineChange::Created);
        assert_eq!(third.cluster_id, ClusterId(2));
        assert_eq!(miner.cluster_count(), 2);

        let disk = miner.cluster(third.cluster_id).unwrap();
        assert_eq!(disk.template_string(), "disk full on node7");
        assert_eq!(disk.count(), 1);
    }

    #[test]
    fn repeated_line_is_unchanged() {
        let mut miner = miner();
        miner.process("service started");
        let repeat = miner.process("service started");
        assert_eq!(repeat.change, MineChange::Unchanged);
        assert_eq!(miner.cluster_count(), 1);
    }

    #[test]
    fn counts_always_sum_to_total_lines() {
        let mut miner = miner();
        let lines = [
            "user 42 logged in",
            "user 99 logged in",
            "disk full on node7",
            "user 7 logged out",
            "service started",
            "service started",
        ];
        for line in lines {
            miner.process(line);
        }
        let sum: u64 = miner.clusters().map(LogCluster::count).sum();
        assert_eq!(sum, miner.total_lines());
        assert_eq!(sum, lines.len() as u64);
    }

    #[test]
    fn empty_line_forms_its_own_cluster() {
        let mut miner = miner();
        let first = miner.process("");
        let second = miner.process("   ");

        // 둘 다 토큰이 없으므로 같은 (빈 템플릿) 클러스터에 귀속된다
        assert_eq!(first.change, MineChange::Created);
        assert_eq!(second.cluster_id, first.cluster_id);
        assert_eq!(second.change, MineChange::Unchanged);
    }

    #[test]
    fn masking_collapses_variants_without_wildcards() {
        let config = MinerConfig {
            masking: vec![MaskingRule {
                pattern: r"\d+".to_owned(),
                replacement: "<NUM>".to_owned(),
            }],
            ..MinerConfig::default()
        };
        let mut miner = TemplateMiner::new(config).unwrap();

        miner.process("user 42 logged in");
        let second = miner.process("user 99 logged in");

        // 마스킹이 숫자를 먼저 치환하므로 두 라인의 토큰이 동일하다
        assert_eq!(second.change, MineChange::Unchanged);
        let cluster = miner.cluster(second.cluster_id).unwrap();
        assert_eq!(cluster.template_string(), "user <NUM> logged in");
    }

    #[test]
    fn wildcard_positions_never_revert() {
        let mut miner = miner();
        miner.process("req 1 took 30 ms");
        miner.process("req 2 took 45 ms");
        let before: usize = miner.cluster(ClusterId(1)).unwrap().wildcard_count();
        miner.process("req 1 took 30 ms");
        let after = miner.cluster(ClusterId(1)).unwrap().wildcard_count();
        assert!(after >= before);
        assert_eq!(after, 2);
    }

    #[test]
    fn digest_reports_percentage_of_total() {
        let mut miner = miner();
        miner.process("user 42 logged in");
        miner.process("user 99 logged in");
        miner.process("disk full on node7");
        miner.process("user 7 logged in");

        let digest = miner.digest(ClusterId(1)).unwrap();
        assert_eq!(digest.count, 3);
        assert!((digest.percentage - 75.0).abs() < 1e-9);
        assert_eq!(digest.template, "user <*> logged in");
        assert_eq!(digest.examples.len(), 3);
    }

    #[test]
    fn digests_ranked_orders_by_count_desc() {
        let mut miner = miner();
        miner.process("rare event");
        miner.process("common thing one");
        miner.process("common thing two");

        let digests = miner.digests_ranked();
        assert_eq!(digests.len(), 2);
        assert_eq!(digests[0].count, 2);
        assert_eq!(digests[1].count, 1);
    }

    #[test]
    fn snapshot_restore_preserves_decisions() {
        let mut original = miner();
        original.process("user 42 logged in");
        original.process("user 99 logged in");
        original.process("disk full on node7");

        let snapshot = original.snapshot();
        let mut restored = TemplateMiner::restore(MinerConfig::default(), snapshot).unwrap();

        assert_eq!(restored.cluster_count(), 2);
        assert_eq!(restored.total_lines(), 3);

        // 복원 후 다음 라인은 증분 구축과 같은 클러스터로 귀속된다
        let next = restored.process("user 7 logged in");
        assert_eq!(next.cluster_id, ClusterId(1));
        assert_eq!(next.change, MineChange::Unchanged);
    }

    #[test]
    fn replay_after_restore_changes_nothing() {
        let lines = [
            "user 42 logged in",
            "user 99 logged in",
            "disk full on node7",
        ];
        let mut original = miner();
        let assigned: Vec<ClusterId> =
            lines.iter().map(|l| original.process(l).cluster_id).collect();

        let mut restored = TemplateMiner::restore(MinerConfig::default(), original.snapshot())
            .unwrap();
        for (line, expected) in lines.iter().zip(&assigned) {
            let replayed = restored.process(line);
            assert_eq!(replayed.cluster_id, *expected);
            assert_eq!(replayed.change, MineChange::Unchanged);
        }
        assert_eq!(restored.cluster_count(), 2);
    }

    #[test]
    fn restore_rejects_mismatched_tree_parameters() {
        let mut original = miner();
        original.process("user 42 logged in");
        let snapshot = original.snapshot();

        let other = MinerConfig {
            max_depth: 6,
            ..MinerConfig::default()
        };
        let err = TemplateMiner::restore(other, snapshot).unwrap_err();
        assert!(matches!(err, MinerError::State { .. }));
    }

    #[test]
    fn restore_rejects_inconsistent_line_count() {
        let mut original = miner();
        original.process("user 42 logged in");
        original.process("disk full on node7");

        let mut snapshot = original.snapshot();
        snapshot.total_lines += 1;

        let err = TemplateMiner::restore(MinerConfig::default(), snapshot).unwrap_err();
        assert!(matches!(err, MinerError::State { .. }));
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = MinerConfig {
            sim_threshold: 0.0,
            ..MinerConfig::default()
        };
        assert!(TemplateMiner::new(config).is_err());
    }

    #[test]
    fn new_rejects_bad_masking_regex() {
        let config = MinerConfig {
            masking: vec![MaskingRule {
                pattern: "(unclosed".to_owned(),
                replacement: "<X>".to_owned(),
            }],
            ..MinerConfig::default()
        };
        assert!(matches!(
            TemplateMiner::new(config),
            Err(MinerError::Mask { .. })
        ));
    }

    // Property-based tests using proptest
    #[cfg(test)]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn process_arbitrary_lines_does_not_panic(
                lines in prop::collection::vec(".{0,200}", 0..50)
            ) {
                let mut miner = TemplateMiner::new(MinerConfig::default()).unwrap();
                for line in &lines {
                    miner.process(line);
                }
            }

            #[test]
            fn counts_conserved_for_arbitrary_input(
                lines in prop::collection::vec("[a-z0-9 ]{0,80}", 1..60)
            ) {
                let mut miner = TemplateMiner::new(MinerConfig::default()).unwrap();
                for line in &lines {
                    miner.process(line);
                }
                let sum: u64 = miner.clusters().map(LogCluster::count).sum();
                prop_assert_eq!(sum, lines.len() as u64);
                prop_assert_eq!(miner.total_lines(), lines.len() as u64);
            }

            #[test]
            fn template_length_matches_token_count(
                lines in prop::collection::vec("[a-z0-9 ]{1,80}", 1..40)
            ) {
                let mut miner = TemplateMiner::new(MinerConfig::default()).unwrap();
                for line in &lines {
                    let result = miner.process(line);
                    let token_count = line.split_whitespace().count();
                    let cluster = miner.cluster(result.cluster_id).unwrap();
                    prop_assert_eq!(cluster.template().len(), token_count);
                }
            }

            #[test]
            fn wildcards_monotonic_for_arbitrary_input(
                lines in prop::collection::vec("[a-z0-9]{1,8} [a-z0-9]{1,8} [a-z0-9]{1,8}", 1..60)
            ) {
                let mut miner = TemplateMiner::new(MinerConfig::default()).unwrap();
                let mut seen: std::collections::HashMap<ClusterId, usize> =
                    std::collections::HashMap::new();
                for line in &lines {
                    let result = miner.process(line);
                    let wildcards = miner
                        .cluster(result.cluster_id)
                        .unwrap()
                        .wildcard_count();
                    if let Some(&previous) = seen.get(&result.cluster_id) {
                        prop_assert!(wildcards >= previous);
                    }
                    seen.insert(result.cluster_id, wildcards);
                }
            }
        }
    }
}

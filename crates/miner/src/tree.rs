//! 깊이 제한 트리 인덱스
//!
//! 토큰 시퀀스를 소수의 후보 클러스터로 라우팅하는 검색 구조입니다.
//! 루트에서 토큰 수로 먼저 분기하고, 이후 `max_depth - 1` 단계까지
//! 각 위치의 토큰 값으로 분기합니다. 리터럴 자식이 없으면 와일드카드
//! 분기로 떨어지며, 도달한 리프 노드가 후보 클러스터 목록을 들고 있습니다.
//!
//! 노드는 아레나(`Vec<TreeNode>`)에 저장되고 [`NodeId`]로만 참조되므로
//! 순환 참조나 공유 가변 상태가 없습니다. 마지막 토큰은 분기에 쓰지 않고
//! 리프 후보 풀에 남겨, 끝 토큰만 다른 라인들이 같은 리프에서 만나게 합니다.
//!
//! 분기 상한: 노드당 자식 수는 `max_children`으로 제한됩니다. 리터럴
//! 슬롯이 소진되면 와일드카드 분기가 생성되어 이후의 새로운 값들은 전부
//! 그 분기로 수렴합니다. 리프의 후보 목록 자체는 잘리지 않습니다.
//! 목록에서 빠진 클러스터는 영영 라우팅되지 않아 같은 라인이 새 클러스터를
//! 만들게 되기 때문입니다.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use logloom_core::types::ClusterId;

use crate::tokenize::has_digits;

/// 아레나 내 노드 인덱스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct NodeId(usize);

/// 노드의 자식 분기 키
///
/// 와일드카드 분기는 별도 variant로 구분되어 `<*>`라는 리터럴 토큰과
/// 충돌하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) enum BranchKey {
    /// 정확히 이 토큰 값일 때 내려가는 분기
    Literal(String),
    /// 매칭되는 리터럴 분기가 없을 때 내려가는 분기
    Any,
}

/// 트리 노드
///
/// 내부 노드는 `children`으로 분기하고, 라우팅이 끝나는 노드는
/// `clusters`에 후보 클러스터 id를 쌓습니다.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct TreeNode {
    children: HashMap<BranchKey, NodeId>,
    clusters: Vec<ClusterId>,
}

/// 깊이 제한 트리 인덱스
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TreeIndex {
    nodes: Vec<TreeNode>,
    /// 토큰 수 → 해당 길이의 서브트리 루트
    length_roots: HashMap<usize, NodeId>,
    max_depth: usize,
    max_children: usize,
    parametrize_numeric_tokens: bool,
}

impl TreeIndex {
    /// 빈 인덱스를 생성합니다.
    pub(crate) fn new(max_depth: usize, max_children: usize, parametrize_numeric_tokens: bool) -> Self {
        Self {
            nodes: Vec::new(),
            length_roots: HashMap::new(),
            max_depth,
            max_children,
            parametrize_numeric_tokens,
        }
    }

    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn max_children(&self) -> usize {
        self.max_children
    }

    pub(crate) fn parametrize_numeric_tokens(&self) -> bool {
        self.parametrize_numeric_tokens
    }

    /// 분기에 사용할 토큰 수를 계산합니다.
    ///
    /// 마지막 토큰은 분기에 쓰지 않으며, 깊이 예산(`max_depth - 1`)을
    /// 넘지 않습니다.
    fn routing_len(&self, token_count: usize) -> usize {
        token_count.saturating_sub(1).min(self.max_depth - 1)
    }

    /// 토큰 시퀀스를 후보 클러스터 목록으로 라우팅합니다.
    ///
    /// 각 단계에서 리터럴 분기를 먼저 시도하고, 없으면 와일드카드
    /// 분기로 떨어집니다. 둘 다 없으면 후보가 없는 것입니다.
    pub(crate) fn route(&self, tokens: &[String]) -> Option<&[ClusterId]> {
        let mut cur = *self.length_roots.get(&tokens.len())?;
        for token in &tokens[..self.routing_len(tokens.len())] {
            let node = &self.nodes[cur.0];
            cur = match node.children.get(&BranchKey::Literal(token.clone())) {
                Some(&child) => child,
                None => *node.children.get(&BranchKey::Any)?,
            };
        }
        Some(&self.nodes[cur.0].clusters)
    }

    /// 새 클러스터를 토큰 시퀀스가 도달하는 리프에 등록합니다.
    ///
    /// 경로상의 노드가 없으면 만들어 가며 내려갑니다. 숫자가 포함된
    /// 토큰은 리터럴 분기를 만들지 않고 와일드카드 분기로 라우팅됩니다
    /// (`parametrize_numeric_tokens`가 켜진 경우).
    pub(crate) fn insert(&mut self, tokens: &[String], cluster_id: ClusterId) {
        let mut cur = self.length_root(tokens.len());
        for i in 0..self.routing_len(tokens.len()) {
            cur = self.step_insert(cur, &tokens[i]);
        }
        self.nodes[cur.0].clusters.push(cluster_id);
    }

    /// 삽입 경로에서 한 단계 내려갑니다.
    fn step_insert(&mut self, cur: NodeId, token: &str) -> NodeId {
        let literal = BranchKey::Literal(token.to_owned());
        if let Some(&child) = self.nodes[cur.0].children.get(&literal) {
            return child;
        }

        if self.parametrize_numeric_tokens && has_digits(token) {
            return self.child_or_create(cur, BranchKey::Any);
        }

        let children = &self.nodes[cur.0].children;
        if children.contains_key(&BranchKey::Any) {
            if children.len() < self.max_children {
                self.create_child(cur, literal)
            } else {
                // 리터럴 슬롯 소진: 와일드카드 분기로 수렴
                self.child_or_create(cur, BranchKey::Any)
            }
        } else if children.len() + 1 < self.max_children {
            self.create_child(cur, literal)
        } else {
            // 마지막 슬롯은 와일드카드 분기 몫으로 남긴다
            self.child_or_create(cur, BranchKey::Any)
        }
    }

    /// 토큰 수에 해당하는 길이 루트를 찾거나 만듭니다.
    fn length_root(&mut self, token_count: usize) -> NodeId {
        if let Some(&root) = self.length_roots.get(&token_count) {
            return root;
        }
        let root = self.alloc_node();
        self.length_roots.insert(token_count, root);
        root
    }

    fn child_or_create(&mut self, parent: NodeId, key: BranchKey) -> NodeId {
        if let Some(&child) = self.nodes[parent.0].children.get(&key) {
            return child;
        }
        self.create_child(parent, key)
    }

    fn create_child(&mut self, parent: NodeId, key: BranchKey) -> NodeId {
        let child = self.alloc_node();
        self.nodes[parent.0].children.insert(key, child);
        child
    }

    fn alloc_node(&mut self) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(TreeNode::default());
        id
    }

    /// 인덱스에 등록된 전체 노드 수 (테스트/벤치마크용)
    #[cfg(test)]
    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

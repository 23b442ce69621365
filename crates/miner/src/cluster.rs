//! 클러스터 레코드와 저장소
//!
//! [`LogCluster`]는 템플릿, 매칭 카운트, 예시 링 버퍼를 담는 단일
//! 클러스터 레코드입니다. [`ClusterStore`]가 모든 클러스터를 소유하며,
//! 트리 인덱스는 [`ClusterId`]로만 참조합니다.
//!
//! 불변식:
//! - 템플릿 길이는 생성 이후 변하지 않는다.
//! - 와일드카드 위치는 늘어나기만 하고 리터럴로 되돌아가지 않는다.
//! - id는 단조 증가로 발급되며 재사용되지 않는다. 클러스터는 삭제되지 않는다.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use logloom_core::types::ClusterId;

/// 템플릿 한 위치의 토큰
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateToken {
    /// 리터럴 토큰 (이 위치에서 아직 단일 값만 관측됨)
    Literal(String),
    /// 와일드카드 (이 위치에서 서로 다른 값이 관측됨)
    Wildcard,
}

impl TemplateToken {
    /// 주어진 토큰이 이 템플릿 위치에 매칭되는지 확인합니다.
    ///
    /// 와일드카드는 모든 값에 매칭됩니다.
    pub fn matches(&self, token: &str) -> bool {
        match self {
            TemplateToken::Literal(lit) => lit == token,
            TemplateToken::Wildcard => true,
        }
    }
}

impl fmt::Display for TemplateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateToken::Literal(lit) => f.write_str(lit),
            TemplateToken::Wildcard => f.write_str("<*>"),
        }
    }
}

/// 단일 클러스터 레코드
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogCluster {
    id: ClusterId,
    template: Vec<TemplateToken>,
    count: u64,
    examples: VecDeque<String>,
}

impl LogCluster {
    /// 토큰 시퀀스에서 새 클러스터를 생성합니다.
    ///
    /// 템플릿은 입력 토큰 그대로(전부 리터럴), 카운트는 1로 시작하고
    /// 생성 라인이 첫 예시로 들어갑니다.
    pub(crate) fn new(id: ClusterId, tokens: &[String], line: &str, max_examples: usize) -> Self {
        let template = tokens
            .iter()
            .map(|t| TemplateToken::Literal(t.clone()))
            .collect();
        let mut examples = VecDeque::with_capacity(max_examples.min(16));
        if max_examples > 0 {
            examples.push_back(line.to_owned());
        }
        Self {
            id,
            template,
            count: 1,
            examples,
        }
    }

    /// 클러스터 id를 반환합니다.
    pub fn id(&self) -> ClusterId {
        self.id
    }

    /// 템플릿 토큰 시퀀스를 반환합니다.
    pub fn template(&self) -> &[TemplateToken] {
        &self.template
    }

    /// 템플릿을 공백으로 이어붙인 문자열로 반환합니다 (와일드카드는 `<*>`).
    pub fn template_string(&self) -> String {
        let mut out = String::new();
        for (i, token) in self.template.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            match token {
                TemplateToken::Literal(lit) => out.push_str(lit),
                TemplateToken::Wildcard => out.push_str("<*>"),
            }
        }
        out
    }

    /// 매칭된 라인 수를 반환합니다.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 보존된 예시 라인을 오래된 순으로 반환합니다.
    pub fn examples(&self) -> impl Iterator<Item = &str> {
        self.examples.iter().map(String::as_str)
    }

    /// 템플릿의 와일드카드 위치 수를 반환합니다.
    pub fn wildcard_count(&self) -> usize {
        self.template
            .iter()
            .filter(|t| matches!(t, TemplateToken::Wildcard))
            .count()
    }

    /// 매칭된 라인을 반영합니다: 카운트 증가, 예시 링 버퍼 갱신.
    ///
    /// 버퍼가 가득 차면 가장 오래된 예시를 버립니다.
    pub(crate) fn record_match(&mut self, line: &str, max_examples: usize) {
        self.count += 1;
        if max_examples == 0 {
            return;
        }
        self.examples.push_back(line.to_owned());
        while self.examples.len() > max_examples {
            self.examples.pop_front();
        }
    }

    /// 토큰 시퀀스와 다른 위치를 와일드카드로 일반화합니다.
    ///
    /// 호출 전제: `tokens.len() == self.template.len()` (트리 라우팅이 보장).
    /// 하나라도 새로 와일드카드가 되면 `true`를 반환합니다.
    pub(crate) fn generalize(&mut self, tokens: &[String]) -> bool {
        debug_assert_eq!(tokens.len(), self.template.len());
        let mut changed = false;
        for (slot, token) in self.template.iter_mut().zip(tokens) {
            if let TemplateToken::Literal(lit) = slot {
                if lit != token {
                    *slot = TemplateToken::Wildcard;
                    changed = true;
                }
            }
        }
        changed
    }
}

/// 클러스터 저장소
///
/// id 순서가 유지되는 맵으로 전체 클러스터를 소유합니다.
/// `next_id`는 1부터 시작해 생성 시마다 증가하며, 복원 시에도
/// 과거에 발급된 값으로 되돌아가지 않습니다.
#[derive(Debug, Default)]
pub(crate) struct ClusterStore {
    clusters: BTreeMap<ClusterId, LogCluster>,
    next_id: u64,
}

impl ClusterStore {
    /// 빈 저장소를 생성합니다.
    pub(crate) fn new() -> Self {
        Self {
            clusters: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// 새 클러스터를 생성하고 id를 반환합니다.
    pub(crate) fn create(&mut self, tokens: &[String], line: &str, max_examples: usize) -> ClusterId {
        let id = ClusterId(self.next_id);
        self.next_id += 1;
        self.clusters
            .insert(id, LogCluster::new(id, tokens, line, max_examples));
        id
    }

    pub(crate) fn get(&self, id: ClusterId) -> Option<&LogCluster> {
        self.clusters.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ClusterId) -> Option<&mut LogCluster> {
        self.clusters.get_mut(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.clusters.len()
    }

    /// id 오름차순으로 전체 클러스터를 순회합니다.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &LogCluster> {
        self.clusters.values()
    }

    /// 카운트 내림차순, 같으면 id 오름차순으로 정렬한 목록을 반환합니다.
    pub(crate) fn ranked(&self) -> Vec<&LogCluster> {
        let mut ranked: Vec<&LogCluster> = self.clusters.values().collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.id.cmp(&b.id)));
        ranked
    }

    /// 전체 클러스터 카운트 합계를 반환합니다.
    pub(crate) fn total_count(&self) -> u64 {
        self.clusters.values().map(|c| c.count).sum()
    }

    /// 스냅샷 직렬화용으로 분해합니다.
    pub(crate) fn to_parts(&self) -> (u64, Vec<LogCluster>) {
        (self.next_id, self.clusters.values().cloned().collect())
    }

    /// 스냅샷에서 저장소를 재구성합니다.
    ///
    /// `next_id`가 기존 id와 겹치면 id 불변식이 깨지므로 `None`을 반환합니다.
    pub(crate) fn from_parts(next_id: u64, clusters: Vec<LogCluster>) -> Option<Self> {
        let max_id = clusters.iter().map(|c| c.id.0).max().unwrap_or(0);
        if next_id <= max_id {
            return None;
        }
        let clusters = clusters.into_iter().map(|c| (c.id, c)).collect();
        Some(Self { clusters, next_id })
    }
}

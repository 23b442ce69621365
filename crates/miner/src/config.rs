//! 마이닝 엔진 설정
//!
//! [`MinerConfig`]는 core의 [`MinerSettings`](logloom_core::config::MinerSettings)를
//! 기반으로 엔진이 직접 사용하는 평탄화된 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logloom_core::config::LogloomConfig;
//! use logloom_miner::config::MinerConfig;
//!
//! let core_config = LogloomConfig::default();
//! let config = MinerConfig::from_core(&core_config.miner);
//! ```

use serde::{Deserialize, Serialize};

use logloom_core::config::MaskingRule;

use crate::error::MinerError;

/// 템플릿 마이닝 엔진 설정
///
/// core의 `MinerSettings`에서 파생되며, 엔진 생성 시점에 한 번
/// 검증된 뒤 변경되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// 유사도 임계값 (0.0 초과 1.0 이하)
    pub sim_threshold: f64,
    /// 트리 최대 깊이 (루트 포함, 토큰 분기는 max_depth - 1 단계)
    pub max_depth: usize,
    /// 노드당 최대 자식 분기 수 (와일드카드 분기 포함)
    pub max_children: usize,
    /// 클러스터당 보존할 예시 라인 수
    pub max_examples: usize,
    /// 숫자가 포함된 토큰을 와일드카드 분기로 라우팅할지 여부
    pub parametrize_numeric_tokens: bool,
    /// 토큰화 전에 적용할 마스킹 규칙
    pub masking: Vec<MaskingRule>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            sim_threshold: 0.5,
            max_depth: 4,
            max_children: 100,
            max_examples: 5,
            parametrize_numeric_tokens: true,
            masking: Vec::new(),
        }
    }
}

impl MinerConfig {
    /// core의 `MinerSettings`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &logloom_core::config::MinerSettings) -> Self {
        Self {
            sim_threshold: core.sim_threshold,
            max_depth: core.max_depth,
            max_children: core.max_children,
            max_examples: core.max_examples,
            parametrize_numeric_tokens: core.parametrize_numeric_tokens,
            masking: core.masking.clone(),
        }
    }

    /// 설정값의 유효성을 검증합니다.
    ///
    /// 마스킹 규칙의 정규식 컴파일 가능 여부는 여기서 검증하지 않고
    /// [`Tokenizer::new`](crate::tokenize::Tokenizer::new)에서 확인합니다.
    pub fn validate(&self) -> Result<(), MinerError> {
        const MAX_DEPTH_LIMIT: usize = 32;
        const MAX_CHILDREN_LIMIT: usize = 4096;
        const MAX_EXAMPLES_LIMIT: usize = 1000;

        if self.sim_threshold <= 0.0 || self.sim_threshold > 1.0 {
            return Err(MinerError::Config {
                field: "sim_threshold".to_owned(),
                reason: "must be in (0.0, 1.0]".to_owned(),
            });
        }

        if self.max_depth < 2 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(MinerError::Config {
                field: "max_depth".to_owned(),
                reason: format!("must be 2-{}", MAX_DEPTH_LIMIT),
            });
        }

        if self.max_children == 0 || self.max_children > MAX_CHILDREN_LIMIT {
            return Err(MinerError::Config {
                field: "max_children".to_owned(),
                reason: format!("must be 1-{}", MAX_CHILDREN_LIMIT),
            });
        }

        if self.max_examples == 0 || self.max_examples > MAX_EXAMPLES_LIMIT {
            return Err(MinerError::Config {
                field: "max_examples".to_owned(),
                reason: format!("must be 1-{}", MAX_EXAMPLES_LIMIT),
            });
        }

        Ok(())
    }
}

/// 마이닝 엔진 설정 빌더
///
/// 테스트와 CLI에서 개별 필드만 바꿔 쓸 때 사용합니다.
#[derive(Default)]
pub struct MinerConfigBuilder {
    config: MinerConfig,
}

impl MinerConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 유사도 임계값을 설정합니다.
    pub fn sim_threshold(mut self, threshold: f64) -> Self {
        self.config.sim_threshold = threshold;
        self
    }

    /// 트리 최대 깊이를 설정합니다.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// 노드당 최대 자식 수를 설정합니다.
    pub fn max_children(mut self, children: usize) -> Self {
        self.config.max_children = children;
        self
    }

    /// 클러스터당 예시 보존 수를 설정합니다.
    pub fn max_examples(mut self, examples: usize) -> Self {
        self.config.max_examples = examples;
        self
    }

    /// 숫자 토큰 와일드카드 라우팅 여부를 설정합니다.
    pub fn parametrize_numeric_tokens(mut self, enabled: bool) -> Self {
        self.config.parametrize_numeric_tokens = enabled;
        self
    }

    /// 마스킹 규칙을 설정합니다.
    pub fn masking(mut self, rules: Vec<MaskingRule>) -> Self {
        self.config.masking = rules;
        self
    }

    /// 설정을 검증하고 `MinerConfig`를 생성합니다.
    pub fn build(self) -> Result<MinerConfig, MinerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! 설정 관리 — logloom.toml 파싱 및 런타임 설정
//!
//! [`LogloomConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGLOOM_MINER_SIM_THRESHOLD=0.6` 형식)
//! 3. 설정 파일 (`logloom.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logloom_core::error::LogloomError> {
//! use logloom_core::config::LogloomConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogloomConfig::load("logloom.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogloomConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogloomError};

/// Logloom 통합 설정
///
/// `logloom.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogloomConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 템플릿 마이너 설정
    #[serde(default)]
    pub miner: MinerSettings,
    /// 빈도 계층화 설정
    #[serde(default)]
    pub strata: StrataSettings,
    /// LLM 주석 설정
    #[serde(default)]
    pub llm: LlmSettings,
    /// 내보내기 설정
    #[serde(default)]
    pub export: ExportSettings,
}

impl LogloomConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogloomError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogloomError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogloomError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogloomError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogloomError> {
        toml::from_str(toml_str).map_err(|e| {
            LogloomError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGLOOM_{SECTION}_{FIELD}`
    /// 예: `LOGLOOM_MINER_SIM_THRESHOLD=0.6`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGLOOM_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGLOOM_GENERAL_LOG_FORMAT");
        override_string(&mut self.general.state_path, "LOGLOOM_GENERAL_STATE_PATH");

        // Miner
        override_f64(&mut self.miner.sim_threshold, "LOGLOOM_MINER_SIM_THRESHOLD");
        override_usize(&mut self.miner.max_depth, "LOGLOOM_MINER_MAX_DEPTH");
        override_usize(&mut self.miner.max_children, "LOGLOOM_MINER_MAX_CHILDREN");
        override_usize(&mut self.miner.max_examples, "LOGLOOM_MINER_MAX_EXAMPLES");
        override_bool(
            &mut self.miner.parametrize_numeric_tokens,
            "LOGLOOM_MINER_PARAMETRIZE_NUMERIC_TOKENS",
        );

        // Strata
        override_u64(
            &mut self.strata.rare_count_threshold,
            "LOGLOOM_STRATA_RARE_COUNT_THRESHOLD",
        );
        override_f64(
            &mut self.strata.frequency_threshold_percent,
            "LOGLOOM_STRATA_FREQUENCY_THRESHOLD_PERCENT",
        );

        // LLM
        override_bool(&mut self.llm.enabled, "LOGLOOM_LLM_ENABLED");
        override_opt_string(&mut self.llm.api_key, "LOGLOOM_LLM_API_KEY");
        override_string(&mut self.llm.api_key_env, "LOGLOOM_LLM_API_KEY_ENV");
        override_string(&mut self.llm.model, "LOGLOOM_LLM_MODEL");
        override_f64(&mut self.llm.temperature, "LOGLOOM_LLM_TEMPERATURE");
        override_u32(
            &mut self.llm.max_output_tokens,
            "LOGLOOM_LLM_MAX_OUTPUT_TOKENS",
        );
        override_string(&mut self.llm.endpoint, "LOGLOOM_LLM_ENDPOINT");
        override_u64(&mut self.llm.timeout_secs, "LOGLOOM_LLM_TIMEOUT_SECS");
        override_u32(&mut self.llm.max_retries, "LOGLOOM_LLM_MAX_RETRIES");
        override_u64(
            &mut self.llm.retry_backoff_ms,
            "LOGLOOM_LLM_RETRY_BACKOFF_MS",
        );

        // Stages
        override_bool(
            &mut self.llm.stages.pre_clustering,
            "LOGLOOM_STAGES_PRE_CLUSTERING",
        );
        override_bool(
            &mut self.llm.stages.post_clustering,
            "LOGLOOM_STAGES_POST_CLUSTERING",
        );
        override_bool(
            &mut self.llm.stages.realtime_classification,
            "LOGLOOM_STAGES_REALTIME_CLASSIFICATION",
        );
        override_bool(
            &mut self.llm.stages.semantic_merging,
            "LOGLOOM_STAGES_SEMANTIC_MERGING",
        );
        override_bool(
            &mut self.llm.stages.anomaly_explanation,
            "LOGLOOM_STAGES_ANOMALY_EXPLANATION",
        );

        // Limits
        override_usize(
            &mut self.llm.limits.max_clusters_to_refine,
            "LOGLOOM_LIMITS_MAX_CLUSTERS_TO_REFINE",
        );
        override_usize(
            &mut self.llm.limits.max_clusters_for_merging,
            "LOGLOOM_LIMITS_MAX_CLUSTERS_FOR_MERGING",
        );
        override_usize(
            &mut self.llm.limits.max_anomalies_to_explain,
            "LOGLOOM_LIMITS_MAX_ANOMALIES_TO_EXPLAIN",
        );
        override_usize(
            &mut self.llm.limits.preprocessing_sample_lines,
            "LOGLOOM_LIMITS_PREPROCESSING_SAMPLE_LINES",
        );
        override_usize(
            &mut self.llm.limits.realtime_classify_first,
            "LOGLOOM_LIMITS_REALTIME_CLASSIFY_FIRST",
        );
        override_usize(
            &mut self.llm.limits.rare_patterns_in_prompt,
            "LOGLOOM_LIMITS_RARE_PATTERNS_IN_PROMPT",
        );

        // Export
        override_string(&mut self.export.path, "LOGLOOM_EXPORT_PATH");
        override_usize(
            &mut self.export.examples_per_template,
            "LOGLOOM_EXPORT_EXAMPLES_PER_TEMPLATE",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogloomError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // sim_threshold는 (0, 1] 범위여야 함
        if self.miner.sim_threshold <= 0.0 || self.miner.sim_threshold > 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "miner.sim_threshold".to_owned(),
                reason: "must be in (0.0, 1.0]".to_owned(),
            }
            .into());
        }

        // max_depth는 루트(길이)와 리프를 빼고 최소 한 단계는 있어야 함
        if !(2..=32).contains(&self.miner.max_depth) {
            return Err(ConfigError::InvalidValue {
                field: "miner.max_depth".to_owned(),
                reason: "must be in 2..=32".to_owned(),
            }
            .into());
        }

        if !(1..=4096).contains(&self.miner.max_children) {
            return Err(ConfigError::InvalidValue {
                field: "miner.max_children".to_owned(),
                reason: "must be in 1..=4096".to_owned(),
            }
            .into());
        }

        if !(1..=1000).contains(&self.miner.max_examples) {
            return Err(ConfigError::InvalidValue {
                field: "miner.max_examples".to_owned(),
                reason: "must be in 1..=1000".to_owned(),
            }
            .into());
        }

        if !(0.0..=100.0).contains(&self.strata.frequency_threshold_percent) {
            return Err(ConfigError::InvalidValue {
                field: "strata.frequency_threshold_percent".to_owned(),
                reason: "must be in 0.0..=100.0".to_owned(),
            }
            .into());
        }

        // LLM 설정은 활성화된 경우에만 검증
        if self.llm.enabled {
            if !(0.0..=2.0).contains(&self.llm.temperature) {
                return Err(ConfigError::InvalidValue {
                    field: "llm.temperature".to_owned(),
                    reason: "must be in 0.0..=2.0".to_owned(),
                }
                .into());
            }

            if !(1..=600).contains(&self.llm.timeout_secs) {
                return Err(ConfigError::InvalidValue {
                    field: "llm.timeout_secs".to_owned(),
                    reason: "must be in 1..=600".to_owned(),
                }
                .into());
            }

            if self.llm.model.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "llm.model".to_owned(),
                    reason: "model must not be empty when llm is enabled".to_owned(),
                }
                .into());
            }

            if self.llm.endpoint.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "llm.endpoint".to_owned(),
                    reason: "endpoint must not be empty when llm is enabled".to_owned(),
                }
                .into());
            }
        }

        if self.export.examples_per_template == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.examples_per_template".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
    /// 마이너 상태 스냅샷 파일 경로
    pub state_path: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
            state_path: "logloom_state.bin".to_owned(),
        }
    }
}

/// 템플릿 마이너 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerSettings {
    /// 유사도 임계값 (0.0 초과 1.0 이하)
    pub sim_threshold: f64,
    /// 파싱 트리 최대 깊이 (루트 포함)
    pub max_depth: usize,
    /// 노드당 최대 리터럴 자식 수
    pub max_children: usize,
    /// 클러스터당 보존할 예시 라인 수
    pub max_examples: usize,
    /// 숫자가 포함된 토큰을 와일드카드 경로로 라우팅할지 여부
    pub parametrize_numeric_tokens: bool,
    /// 토큰화 전에 적용할 마스킹 규칙
    pub masking: Vec<MaskingRule>,
}

impl Default for MinerSettings {
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

/// 마스킹 규칙
///
/// 토큰화 전에 원본 라인에 적용되는 정규식 치환입니다.
/// IP 주소, 타임스탬프 같은 고변동 값을 미리 접어 둘 때 사용합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingRule {
    /// 정규식 패턴
    pub pattern: String,
    /// 치환 문자열 (예: `<IP>`)
    pub replacement: String,
}

/// 빈도 계층화 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrataSettings {
    /// 이 횟수 이하로 등장한 클러스터는 희귀로 분류
    pub rare_count_threshold: u64,
    /// 이 비율(%) 미만으로 등장한 클러스터는 희귀로 분류
    pub frequency_threshold_percent: f64,
}

impl Default for StrataSettings {
    fn default() -> Self {
        Self {
            rare_count_threshold: 2,
            frequency_threshold_percent: 5.0,
        }
    }
}

/// LLM 주석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// API 키 (설정 파일에 직접 기재, 권장하지 않음)
    pub api_key: Option<String>,
    /// API 키를 읽을 환경변수 이름
    pub api_key_env: String,
    /// 모델 이름
    pub model: String,
    /// 샘플링 온도 (0.0~2.0)
    pub temperature: f64,
    /// 응답 최대 토큰 수
    pub max_output_tokens: u32,
    /// API 엔드포인트 (버전 경로까지)
    pub endpoint: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 실패 시 최대 재시도 횟수
    pub max_retries: u32,
    /// 재시도 간격 (밀리초, 시도 횟수에 비례해 증가)
    pub retry_backoff_ms: u64,
    /// 스테이지 활성화 토글
    #[serde(default)]
    pub stages: StageToggles,
    /// 스테이지별 상한
    #[serde(default)]
    pub limits: StageLimits,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_key_env: "GEMINI_API_KEY".to_owned(),
            model: "gemini-2.5-pro".to_owned(),
            temperature: 0.1,
            max_output_tokens: 500,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            timeout_secs: 30,
            max_retries: 2,
            retry_backoff_ms: 500,
            stages: StageToggles::default(),
            limits: StageLimits::default(),
        }
    }
}

/// LLM 스테이지 활성화 토글
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    /// 마이닝 전 샘플 라인으로 전처리 규칙 제안
    pub pre_clustering: bool,
    /// 마이닝 후 희귀 패턴 분석 및 템플릿 정제
    pub post_clustering: bool,
    /// 새 패턴 발견 즉시 분류
    pub realtime_classification: bool,
    /// 의미상 중복되는 클러스터 병합 제안
    pub semantic_merging: bool,
    /// 이상 패턴 상세 설명
    pub anomaly_explanation: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            pre_clustering: false,
            post_clustering: true,
            realtime_classification: false,
            semantic_merging: false,
            anomaly_explanation: false,
        }
    }
}

/// LLM 스테이지별 상한
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageLimits {
    /// 정제 제안을 요청할 최대 클러스터 수
    pub max_clusters_to_refine: usize,
    /// 병합 제안에 포함할 최대 클러스터 수
    pub max_clusters_for_merging: usize,
    /// 상세 설명을 요청할 최대 이상 패턴 수
    pub max_anomalies_to_explain: usize,
    /// 전처리 제안에 보낼 샘플 라인 수
    pub preprocessing_sample_lines: usize,
    /// 실시간 분류할 신규 패턴 수 (앞에서부터)
    pub realtime_classify_first: usize,
    /// 희귀 분석 프롬프트에 넣을 최대 패턴 수
    pub rare_patterns_in_prompt: usize,
}

impl Default for StageLimits {
    fn default() -> Self {
        Self {
            max_clusters_to_refine: 2,
            max_clusters_for_merging: 5,
            max_anomalies_to_explain: 1,
            preprocessing_sample_lines: 10,
            realtime_classify_first: 5,
            rare_patterns_in_prompt: 5,
        }
    }
}

/// 내보내기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// 기본 내보내기 파일 경로
    pub path: String,
    /// 템플릿당 내보낼 예시 라인 수
    pub examples_per_template: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            path: "structured_logs.json".to_owned(),
            examples_per_template: 3,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_opt_string(target: &mut Option<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = Some(val);
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

fn override_f64(target: &mut f64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<f64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse f64 from env var, ignoring"
            ),
        }
    }
}

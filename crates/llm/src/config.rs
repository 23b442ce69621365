//! 클라이언트 실행 설정
//!
//! `LlmSettings`에서 실제 호출에 필요한 값만 뽑아 고정합니다.
//! API 키는 설정 파일 값이 우선이고, 없으면 `api_key_env`가 가리키는
//! 환경변수에서 읽습니다. 둘 다 비어 있으면 구성 단계에서 실패합니다.

use logloom_core::config::{LlmSettings, StageLimits};

use crate::error::LlmError;

/// Gemini 클라이언트가 사용하는 실행 설정
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// 모델 이름 (예: `gemini-2.5-pro`)
    pub model: String,
    /// 확정된 API 키
    pub api_key: String,
    /// API 엔드포인트 (버전 경로까지)
    pub endpoint: String,
    /// 샘플링 온도
    pub temperature: f64,
    /// 응답 최대 토큰 수
    pub max_output_tokens: u32,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 실패 시 최대 재시도 횟수
    pub max_retries: u32,
    /// 재시도 간격 기준값 (밀리초)
    pub retry_backoff_ms: u64,
    /// 스테이지별 상한
    pub limits: StageLimits,
}

impl LlmConfig {
    /// 코어 설정에서 실행 설정을 만듭니다.
    ///
    /// # Errors
    /// API 키를 어디에서도 찾지 못하면 [`LlmError::MissingApiKey`]를
    /// 반환합니다.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        let api_key = resolve_api_key(settings)?;
        Ok(Self {
            model: settings.model.clone(),
            api_key,
            endpoint: settings.endpoint.trim_end_matches('/').to_owned(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            timeout_secs: settings.timeout_secs,
            max_retries: settings.max_retries,
            retry_backoff_ms: settings.retry_backoff_ms,
            limits: settings.limits.clone(),
        })
    }
}

/// 설정 파일의 키가 우선, 없거나 비어 있으면 환경변수를 읽는다.
fn resolve_api_key(settings: &LlmSettings) -> Result<String, LlmError> {
    if let Some(key) = &settings.api_key {
        if !key.trim().is_empty() {
            return Ok(key.clone());
        }
    }
    match std::env::var(&settings.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(LlmError::MissingApiKey {
            env: settings.api_key_env.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    fn settings_with_env(env: &str) -> LlmSettings {
        let mut settings = LlmSettings::default();
        settings.api_key_env = env.to_owned();
        settings
    }

    #[test]
    fn explicit_key_wins_over_env() {
        let mut settings = settings_with_env("LOGLOOM_TEST_KEY_UNSET");
        settings.api_key = Some("from-config".to_owned());
        let config = LlmConfig::from_settings(&settings).unwrap();
        assert_eq!(config.api_key, "from-config");
    }

    #[test]
    #[serial]
    fn env_var_used_when_config_key_absent() {
        let settings = settings_with_env("LOGLOOM_TEST_KEY_ENV");
        // SAFETY: #[serial] 테스트라 다른 테스트와 환경변수가 겹치지 않습니다.
        unsafe { std::env::set_var("LOGLOOM_TEST_KEY_ENV", "from-env") };
        let config = LlmConfig::from_settings(&settings);
        unsafe { std::env::remove_var("LOGLOOM_TEST_KEY_ENV") };
        assert_eq!(config.unwrap().api_key, "from-env");
    }

    #[test]
    #[serial]
    fn empty_config_key_falls_back_to_env() {
        let mut settings = settings_with_env("LOGLOOM_TEST_KEY_FALLBACK");
        settings.api_key = Some("   ".to_owned());
        // SAFETY: #[serial] 테스트라 다른 테스트와 환경변수가 겹치지 않습니다.
        unsafe { std::env::set_var("LOGLOOM_TEST_KEY_FALLBACK", "from-env") };
        let config = LlmConfig::from_settings(&settings);
        unsafe { std::env::remove_var("LOGLOOM_TEST_KEY_FALLBACK") };
        assert_eq!(config.unwrap().api_key, "from-env");
    }

    #[test]
    fn missing_everywhere_is_error() {
        let settings = settings_with_env("LOGLOOM_TEST_KEY_MISSING");
        let err = LlmConfig::from_settings(&settings).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey { env } if env == "LOGLOOM_TEST_KEY_MISSING"));
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let mut settings = settings_with_env("LOGLOOM_TEST_KEY_UNSET");
        settings.api_key = Some("k".to_owned());
        settings.endpoint = "https://example.test/v1beta/".to_owned();
        let config = LlmConfig::from_settings(&settings).unwrap();
        assert_eq!(config.endpoint, "https://example.test/v1beta");
    }
}

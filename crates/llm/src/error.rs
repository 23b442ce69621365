//! LLM 크레이트 에러 타입
//!
//! 전송 계층의 실패를 구분해 담고, 경계를 넘을 때는
//! `AnnotateError`로 변환합니다. 인증 실패와 타임아웃은 별도
//! 변형으로 보존해 상위에서 구분할 수 있게 합니다.

use logloom_core::AnnotateError;
use thiserror::Error;

/// Gemini 클라이언트 에러
#[derive(Debug, Error)]
pub enum LlmError {
    /// 설정 파일과 환경변수 어디에도 API 키가 없음
    #[error("API key not found: set the {env} environment variable or llm.api_key")]
    MissingApiKey {
        /// 조회한 환경변수 이름
        env: String,
    },

    /// HTTP 요청 실패 (연결, TLS, 본문 해석)
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API가 비정상 상태 코드를 반환
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문에서 추린 메시지
        message: String,
    },

    /// 응답에 candidate가 하나도 없음
    #[error("response contained no candidates")]
    EmptyCandidates,

    /// 요청이 제한 시간을 초과
    #[error("request timed out after {secs}s")]
    Timeout {
        /// 설정된 제한 시간 (초)
        secs: u64,
    },
}

impl From<LlmError> for AnnotateError {
    fn from(err: LlmError) -> Self {
        let msg = err.to_string();
        match err {
            LlmError::MissingApiKey { .. }
            | LlmError::Api {
                status: 401 | 403, ..
            } => AnnotateError::Auth(msg),
            LlmError::Timeout { secs } => AnnotateError::Timeout { secs },
            LlmError::EmptyCandidates => AnnotateError::EmptyResponse,
            LlmError::Api { .. } | LlmError::Request(_) => AnnotateError::Service(msg),
        }
    }
}

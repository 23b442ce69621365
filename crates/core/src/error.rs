//! 에러 타입 -- 도메인별 에러 정의

/// Logloom 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogloomError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 마이닝 엔진 에러
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// 입력 소스 에러
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// 주석 서비스 에러
    #[error("annotate error: {0}")]
    Annotate(#[from] AnnotateError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 마이닝 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 엔진 설정 에러
    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    /// 저장 상태 로드/저장 실패
    #[error("state error: {0}")]
    State(String),
}

/// 입력 소스 에러
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 입력 읽기 실패
    #[error("read failed: {0}")]
    Read(String),

    /// 지원하지 않는 레코드 형식
    #[error("unsupported record format: {0}")]
    Format(String),
}

/// 주석 서비스 에러
///
/// [`Annotator`](crate::annotate::Annotator) 구현이 반환하는 에러입니다.
/// 어떤 변형이든 실행을 중단시키지 않고 인라인 에러 문자열로 강등됩니다.
#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    /// API 키를 찾을 수 없음
    #[error("api key unavailable: {0}")]
    Auth(String),

    /// 서비스 호출 실패 (네트워크, HTTP 상태, 할당량 등)
    #[error("annotation service error: {0}")]
    Service(String),

    /// 응답 시간 초과
    #[error("annotation timed out after {secs}s")]
    Timeout { secs: u64 },

    /// 응답에 텍스트 후보가 없음
    #[error("annotation service returned no text")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = LogloomError::Config(ConfigError::InvalidValue {
            field: "miner.sim_threshold".to_owned(),
            reason: "must be within (0.0, 1.0]".to_owned(),
        });
        let msg = err.to_string();
        assert!(msg.contains("sim_threshold"));
        assert!(msg.contains("(0.0, 1.0]"));
    }

    #[test]
    fn engine_error_display() {
        let err = EngineError::State("truncated blob".to_owned());
        assert!(err.to_string().contains("truncated blob"));
    }

    #[test]
    fn annotate_timeout_display() {
        let err = AnnotateError::Timeout { secs: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: LogloomError = io_err.into();
        assert!(matches!(err, LogloomError::Io(_)));
    }

    #[test]
    fn source_error_converts() {
        let err: LogloomError = SourceError::Format("no message column".to_owned()).into();
        assert!(matches!(err, LogloomError::Source(_)));
    }
}

//! 마이닝 엔진 에러 타입
//!
//! [`MinerError`]는 템플릿 마이닝 엔진 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<MinerError> for LogloomError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logloom_core::error::{EngineError, LogloomError};

/// 템플릿 마이닝 엔진 도메인 에러
///
/// 설정 검증, 마스킹 규칙 컴파일, 상태 스냅샷 저장/복원 등
/// 엔진 내부의 모든 에러 상황을 포괄합니다.
#[derive(Debug, thiserror::Error)]
pub enum MinerError {
    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 마스킹 규칙 정규식 컴파일 실패
    #[error("mask compile error: '{pattern}': {reason}")]
    Mask {
        /// 문제가 된 정규식 패턴
        pattern: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 상태 스냅샷 인코딩/디코딩 실패
    #[error("state error: {reason}")]
    State {
        /// 실패 사유
        reason: String,
    },

    /// 지원하지 않는 상태 스냅샷 버전
    #[error("state version mismatch: found {found}, expected {expected}")]
    StateVersion {
        /// 블롭에 기록된 버전
        found: u32,
        /// 현재 코덱이 지원하는 버전
        expected: u32,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MinerError> for LogloomError {
    fn from(err: MinerError) -> Self {
        match err {
            MinerError::Config { .. } | MinerError::Mask { .. } => {
                LogloomError::Engine(EngineError::InvalidConfig(err.to_string()))
            }
            _ => LogloomError::Engine(EngineError::State(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = MinerError::Config {
            field: "sim_threshold".to_owned(),
            reason: "must be in (0.0, 1.0]".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sim_threshold"));
        assert!(msg.contains("(0.0, 1.0]"));
    }

    #[test]
    fn mask_error_display() {
        let err = MinerError::Mask {
            pattern: "[unclosed".to_owned(),
            reason: "unclosed character class".to_owned(),
        };
        assert!(err.to_string().contains("[unclosed"));
    }

    #[test]
    fn state_version_display() {
        let err = MinerError::StateVersion {
            found: 9,
            expected: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains('9'));
        assert!(msg.contains('1'));
    }

    #[test]
    fn config_error_converts_to_invalid_config() {
        let err = MinerError::Config {
            field: "max_depth".to_owned(),
            reason: "too small".to_owned(),
        };
        let top: LogloomError = err.into();
        assert!(matches!(
            top,
            LogloomError::Engine(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn state_error_converts_to_engine_state() {
        let err = MinerError::State {
            reason: "bad magic".to_owned(),
        };
        let top: LogloomError = err.into();
        assert!(matches!(top, LogloomError::Engine(EngineError::State(_))));
    }
}

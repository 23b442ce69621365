//! 입력 어댑터 에러 타입
//!
//! [`IngestError`]는 입력 파일 읽기와 레코드 추출에서 발생하는 에러를
//! 표현합니다. `From<IngestError> for LogloomError` 변환이 구현되어
//! 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logloom_core::error::{LogloomError, SourceError};

/// 입력 어댑터 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// 파일 열기/읽기 실패
    #[error("read error: {path}: {source}")]
    Io {
        /// 입력 파일 경로
        path: String,
        /// 원인이 된 I/O 에러
        #[source]
        source: std::io::Error,
    },

    /// 레코드 형식 문제 (인식할 수 없는 헤더 등)
    #[error("record format error: {reason}")]
    Format {
        /// 형식 문제 사유
        reason: String,
    },
}

impl From<IngestError> for LogloomError {
    fn from(err: IngestError) -> Self {
        let msg = err.to_string();
        match err {
            IngestError::Io { .. } => LogloomError::Source(SourceError::Read(msg)),
            IngestError::Format { .. } => LogloomError::Source(SourceError::Format(msg)),
        }
    }
}

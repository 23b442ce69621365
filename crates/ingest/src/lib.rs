#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`text`]: 텍스트 라인 리더
//! - [`dlt`]: DLT CSV/TSV 레코드 리더
//! - [`error`]: 입력 어댑터 에러 타입

pub mod dlt;
pub mod error;
pub mod text;

// --- 주요 타입 re-export ---

pub use dlt::{DltReader, DltRecord};
pub use error::IngestError;
pub use text::LineReader;

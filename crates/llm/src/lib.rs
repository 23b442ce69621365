#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`client`]: Gemini generateContent 클라이언트 ([`GeminiClient`])
//! - [`config`]: 실행 설정 (core 설정에서 파생)
//! - [`prompt`]: 작업별 프롬프트 조립
//! - [`error`]: 클라이언트 에러 타입

pub mod client;
pub mod config;
pub mod error;
pub mod prompt;

// --- 주요 타입 re-export ---

pub use client::GeminiClient;
pub use config::LlmConfig;
pub use error::LlmError;

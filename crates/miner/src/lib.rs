#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`tokenize`]: 마스킹 규칙 적용 및 공백 기준 토큰 분리
//! - `tree`: 토큰 수 → 토큰 값 순으로 분기하는 깊이 제한 트리 인덱스
//! - [`cluster`]: 클러스터 레코드와 저장소 (템플릿, 카운트, 예시 버퍼)
//! - `matcher`: 위치별 유사도 계산과 최적 후보 선택
//! - [`miner`]: 라인 단위 처리 오케스트레이션 ([`TemplateMiner`])
//! - [`stratify`]: frequent/rare 계층화
//! - [`persist`]: 상태 스냅샷 인코딩/디코딩 및 파일 입출력
//! - [`report`]: 내보내기용 구조화된 결과 조립
//! - [`config`]: 엔진 설정 (core 설정에서 파생)
//! - [`error`]: 도메인 에러 타입
//!
//! # 처리 흐름
//!
//! ```text
//! line -> Tokenizer -> TreeIndex.route -> best_match -> ClusterStore 갱신
//!            |              |                 |               |
//!         masking      토큰 수/값 분기    유사도 >= 임계값   병합 or 생성
//! ```

pub mod cluster;
pub mod config;
pub mod error;
mod matcher;
pub mod miner;
pub mod persist;
pub mod report;
pub mod stratify;
pub mod tokenize;
mod tree;

// --- 주요 타입 re-export ---

// 엔진
pub use miner::{MineChange, MineResult, TemplateMiner};

// 설정
pub use config::{MinerConfig, MinerConfigBuilder};

// 에러
pub use error::MinerError;

// 클러스터
pub use cluster::{LogCluster, TemplateToken};

// 계층화
pub use stratify::{PatternInfo, StrataReport, Stratifier};

// 영속화
pub use persist::{PersistedState, StateCodec, StateFile};

// 결과 조립
pub use report::{MiningReport, PatternEvent, TemplateEntry};

// 토큰화
pub use tokenize::Tokenizer;

//! 상태 스냅샷 인코딩과 파일 입출력
//!
//! 스냅샷 blob은 매직 바이트 `LOOM`, little-endian u32 포맷 버전,
//! bincode로 직렬화한 [`PersistedState`] 순서로 구성됩니다. 버전이
//! 다른 blob은 복호화를 거부하고, 읽기 단계의 모든 실패는 콜드
//! 스타트로 처리됩니다. 손상된 스냅샷이 실행 전체를 막아서는 안
//! 되기 때문입니다.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cluster::LogCluster;
use crate::error::MinerError;
use crate::tree::TreeIndex;

/// 스냅샷 blob 식별용 매직 바이트
const STATE_MAGIC: [u8; 4] = *b"LOOM";
/// 스냅샷 포맷 버전
const STATE_VERSION: u32 = 1;
/// 매직 + 버전 헤더 길이
const HEADER_LEN: usize = 8;

/// 엔진 상태 스냅샷
///
/// 클러스터 전체, 트리 인덱스, 다음 id 카운터, 누적 라인 수를
/// 담습니다. [`TemplateMiner::snapshot`]으로 만들고
/// [`TemplateMiner::restore`]로 되돌립니다.
///
/// [`TemplateMiner::snapshot`]: crate::TemplateMiner::snapshot
/// [`TemplateMiner::restore`]: crate::TemplateMiner::restore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub(crate) next_id: u64,
    pub(crate) clusters: Vec<LogCluster>,
    pub(crate) tree: TreeIndex,
    pub(crate) total_lines: u64,
}

impl PersistedState {
    /// 스냅샷에 담긴 클러스터 수를 반환합니다.
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// 스냅샷 시점까지 처리한 누적 라인 수를 반환합니다.
    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }
}

/// 스냅샷 바이트 인코딩/디코딩
pub struct StateCodec;

impl StateCodec {
    /// 스냅샷을 바이트로 인코딩합니다.
    ///
    /// # Errors
    /// 직렬화에 실패하면 에러를 반환합니다.
    pub fn encode(state: &PersistedState) -> Result<Bytes, MinerError> {
        let payload = bincode::serialize(state).map_err(|e| MinerError::State {
            reason: format!("snapshot encode failed: {e}"),
        })?;
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.extend_from_slice(&STATE_MAGIC);
        buf.extend_from_slice(&STATE_VERSION.to_le_bytes());
        buf.extend_from_slice(&payload);
        Ok(Bytes::from(buf))
    }

    /// 바이트에서 스냅샷을 복호화합니다.
    ///
    /// # Errors
    /// 헤더가 짧거나, 매직 바이트가 다르거나, 버전이 맞지 않거나,
    /// 본문 역직렬화에 실패하면 에러를 반환합니다.
    pub fn decode(bytes: &[u8]) -> Result<PersistedState, MinerError> {
        if bytes.len() < HEADER_LEN {
            return Err(MinerError::State {
                reason: format!("snapshot blob too short: {} bytes", bytes.len()),
            });
        }
        if bytes[..4] != STATE_MAGIC {
            return Err(MinerError::State {
                reason: "unrecognized magic bytes".to_owned(),
            });
        }
        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != STATE_VERSION {
            return Err(MinerError::StateVersion {
                found: version,
                expected: STATE_VERSION,
            });
        }
        bincode::deserialize(&bytes[HEADER_LEN..]).map_err(|e| MinerError::State {
            reason: format!("snapshot decode failed: {e}"),
        })
    }
}

/// 고정 경로의 스냅샷 파일
///
/// 읽기 실패는 모두 콜드 스타트(`None`)로 수렴하고, 쓰기 실패만
/// 에러로 전파합니다.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// 경로를 지정해 스냅샷 파일 핸들을 만듭니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 스냅샷 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 스냅샷을 읽습니다.
    ///
    /// 파일이 없으면 조용히, 읽기나 복호화에 실패하면 경고를 남기고
    /// `None`을 반환합니다.
    pub fn load(&self) -> Option<PersistedState> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "state file not found, cold start");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file unreadable, cold start");
                return None;
            }
        };
        match StateCodec::decode(&bytes) {
            Ok(state) => {
                debug!(
                    path = %self.path.display(),
                    clusters = state.cluster_count(),
                    total_lines = state.total_lines(),
                    "state snapshot loaded"
                );
                Some(state)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file corrupt, cold start");
                None
            }
        }
    }

    /// 스냅샷을 기록합니다.
    ///
    /// # Errors
    /// 인코딩이나 파일 쓰기에 실패하면 에러를 반환합니다.
    pub fn save(&self, state: &PersistedState) -> Result<(), MinerError> {
        let bytes = StateCodec::encode(state)?;
        fs::write(&self.path, &bytes)?;
        debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            clusters = state.cluster_count(),
            "state snapshot saved"
        );
        Ok(())
    }
}

//! DLT 내보내기 리더
//!
//! DLT Viewer가 내보낸 로그 파일을 레코드 단위로 순회합니다. 첫 라인에
//! 메시지 컬럼을 가진 헤더가 있으면 CSV로 읽고, 헤더를 인식하지 못하면
//! 탭 구분 형식으로 폴백하여 다섯 번째 컬럼을 메시지로 취급합니다.
//! 메시지가 비어 있는 행은 건너뛰고 skip 카운터에 기록하며, 헤더보다
//! 컬럼이 많은 행은 항목 단위의 형식 오류로 전달합니다.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use logloom_core::metrics as m;
use tracing::debug;

use crate::error::IngestError;

/// DLT 내보내기 파일의 로그 레코드 하나
///
/// 메시지 외의 필드는 원본에 해당 컬럼이 없으면 빈 문자열입니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DltRecord {
    /// 기록 시각 (원본 표기 그대로)
    pub timestamp: String,
    /// 레코드 순번
    pub index: String,
    /// 발신 ECU 식별자
    pub ecu: String,
    /// 애플리케이션 식별자
    pub app_id: String,
    /// 로그 메시지 본문
    pub message: String,
}

/// DLT 내보내기 파일의 레코드 이터레이터
///
/// # 사용 예시
/// ```no_run
/// use logloom_ingest::DltReader;
///
/// let reader = DltReader::open("export.csv")?;
/// for record in reader {
///     let record = record?;
///     println!("[{}] {}", record.ecu, record.message);
/// }
/// # Ok::<(), logloom_ingest::IngestError>(())
/// ```
#[derive(Debug)]
pub struct DltReader {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    mode: Mode,
    /// 헤더가 아닌 것으로 판명된 첫 라인. 다음 호출에서 데이터로 처리한다.
    pending: Option<String>,
}

#[derive(Debug)]
enum Mode {
    Csv(ColumnMap),
    Tsv,
}

impl Mode {
    fn label(&self) -> &'static str {
        match self {
            Mode::Csv(_) => "dlt_csv",
            Mode::Tsv => "dlt_tsv",
        }
    }
}

/// CSV 헤더에서 찾아낸 컬럼 위치
#[derive(Debug)]
struct ColumnMap {
    timestamp: Option<usize>,
    index: Option<usize>,
    ecu: Option<usize>,
    app_id: Option<usize>,
    message: usize,
    /// 헤더의 전체 컬럼 수. 이를 넘는 행은 형식 오류로 본다.
    width: usize,
}

impl ColumnMap {
    /// 헤더 필드를 해석합니다. 메시지 컬럼이 없으면 헤더로 보지 않습니다.
    fn from_header(fields: &[String]) -> Option<Self> {
        let mut timestamp = None;
        let mut index = None;
        let mut ecu = None;
        let mut app_id = None;
        let mut message = None;
        for (pos, name) in fields.iter().enumerate() {
            match name.trim() {
                "Timestamp" | "timestamp" => timestamp = Some(pos),
                "Index" | "index" => index = Some(pos),
                "ECU" | "ecu" => ecu = Some(pos),
                "Application ID" | "application_id" => app_id = Some(pos),
                "Log Message" | "message" => message = Some(pos),
                _ => {}
            }
        }
        message.map(|message| Self {
            timestamp,
            index,
            ecu,
            app_id,
            message,
            width: fields.len(),
        })
    }

    fn extract(&self, fields: &[String]) -> Option<DltRecord> {
        let message = fields.get(self.message)?.trim();
        if message.is_empty() {
            return None;
        }
        Some(DltRecord {
            timestamp: pick(fields, self.timestamp),
            index: pick(fields, self.index),
            ecu: pick(fields, self.ecu),
            app_id: pick(fields, self.app_id),
            message: message.to_owned(),
        })
    }
}

fn pick(fields: &[String], pos: Option<usize>) -> String {
    match pos.and_then(|pos| fields.get(pos)) {
        Some(value) => value.trim().to_owned(),
        None => String::new(),
    }
}

/// 큰따옴표 규칙을 지키며 한 라인을 CSV 필드로 나눕니다 (`""` 는 이스케이프).
fn split_csv(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// 탭 구분 라인에서 레코드를 추출합니다. 다섯 컬럼 미만이면 버립니다.
fn extract_tsv(line: &str) -> Option<DltRecord> {
    let parts: Vec<&str> = line.split('\t').collect();
    if parts.len() < 5 {
        return None;
    }
    let message = parts[4].trim();
    if message.is_empty() {
        return None;
    }
    Some(DltRecord {
        timestamp: parts[0].trim().to_owned(),
        index: parts[1].trim().to_owned(),
        ecu: parts[2].trim().to_owned(),
        app_id: parts[3].trim().to_owned(),
        message: message.to_owned(),
    })
}

impl DltReader {
    /// 파일을 열고 첫 라인으로 형식을 판별합니다.
    ///
    /// # Errors
    /// 파일을 열 수 없거나 첫 라인을 읽지 못하면 에러를 반환합니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut lines = BufReader::new(file).lines();

        let mut mode = Mode::Tsv;
        let mut pending = None;
        if let Some(first) = lines.next() {
            let first = first.map_err(|source| IngestError::Io {
                path: path.display().to_string(),
                source,
            })?;
            match ColumnMap::from_header(&split_csv(&first)) {
                Some(map) => mode = Mode::Csv(map),
                None => pending = Some(first),
            }
        }

        debug!(path = %path.display(), format = mode.label(), "opened dlt export");
        Ok(Self {
            lines,
            path: path.to_path_buf(),
            mode,
            pending,
        })
    }

    /// 읽고 있는 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for DltReader {
    type Item = Result<DltRecord, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.pending.take() {
                Some(line) => line,
                None => match self.lines.next()? {
                    Ok(line) => line,
                    Err(source) => {
                        return Some(Err(IngestError::Io {
                            path: self.path.display().to_string(),
                            source,
                        }));
                    }
                },
            };
            if line.trim().is_empty() {
                continue;
            }
            let record = match &self.mode {
                Mode::Csv(map) => {
                    let fields = split_csv(&line);
                    if fields.len() > map.width {
                        return Some(Err(IngestError::Format {
                            reason: format!(
                                "expected {} fields, saw {}",
                                map.width,
                                fields.len()
                            ),
                        }));
                    }
                    map.extract(&fields)
                }
                Mode::Tsv => extract_tsv(&line),
            };
            match record {
                Some(record) => {
                    metrics::counter!(m::INGEST_RECORDS_TOTAL, m::LABEL_FORMAT => self.mode.label())
                        .increment(1);
                    return Some(Ok(record));
                }
                None => {
                    metrics::counter!(m::INGEST_RECORDS_SKIPPED_TOTAL).increment(1);
                }
            }
        }
    }
}

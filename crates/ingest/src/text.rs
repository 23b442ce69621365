//! 텍스트 라인 리더
//!
//! 일반 텍스트 로그 파일을 라인 단위로 순회합니다. 각 라인은 앞뒤
//! 공백이 제거되고, 빈 라인은 건너뜁니다. 라인 하나를 읽다 실패하면
//! 그 항목만 에러로 전달하고 순회는 계속됩니다.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use logloom_core::metrics as m;

use crate::error::IngestError;

/// 텍스트 로그 파일의 라인 이터레이터
///
/// # 사용 예시
/// ```no_run
/// use logloom_ingest::LineReader;
///
/// let reader = LineReader::open("app.log")?;
/// for line in reader {
///     let line = line?;
///     println!("{line}");
/// }
/// # Ok::<(), logloom_ingest::IngestError>(())
/// ```
#[derive(Debug)]
pub struct LineReader {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
}

impl LineReader {
    /// 파일을 열어 라인 리더를 만듭니다.
    ///
    /// # Errors
    /// 파일을 열 수 없으면 에러를 반환합니다.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| IngestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            path: path.to_path_buf(),
        })
    }

    /// 읽고 있는 파일 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for LineReader {
    type Item = Result<String, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    metrics::counter!(m::INGEST_RECORDS_TOTAL, m::LABEL_FORMAT => "text")
                        .increment(1);
                    return Some(Ok(trimmed.to_owned()));
                }
                Err(source) => {
                    return Some(Err(IngestError::Io {
                        path: self.path.display().to_string(),
                        source,
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn fixture(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn reads_lines_in_order() {
        let (_dir, path) = fixture("first line\nsecond line\nthird line\n");
        let lines: Vec<String> = LineReader::open(&path)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(lines, vec!["first line", "second line", "third line"]);
    }

    #[test]
    fn skips_blank_lines() {
        let (_dir, path) = fixture("alpha\n\n   \n\t\nbeta\n");
        let lines: Vec<String> = LineReader::open(&path)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(lines, vec!["alpha", "beta"]);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let (_dir, path) = fixture("  padded line  \n\ttabbed\t\n");
        let lines: Vec<String> = LineReader::open(&path)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(lines, vec!["padded line", "tabbed"]);
    }

    #[test]
    fn empty_file_yields_nothing() {
        let (_dir, path) = fixture("");
        assert_eq!(LineReader::open(&path).unwrap().count(), 0);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = LineReader::open("/no/such/file.log").unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        assert!(err.to_string().contains("/no/such/file.log"));
    }

    #[test]
    fn file_without_trailing_newline() {
        let (_dir, path) = fixture("only line");
        let lines: Vec<String> = LineReader::open(&path)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(lines, vec!["only line"]);
    }
}

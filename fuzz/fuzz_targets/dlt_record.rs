#![no_main]

use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use libfuzzer_sys::fuzz_target;

use logloom_ingest::DltReader;

/// 반복 실행 간에 재사용하는 스크래치 파일 경로
static EXPORT_PATH: OnceLock<PathBuf> = OnceLock::new();

fuzz_target!(|data: &[u8]| {
    let path = EXPORT_PATH.get_or_init(|| {
        let dir = std::env::temp_dir().join("logloom-fuzz-dlt");
        fs::create_dir_all(&dir).expect("scratch dir must be creatable");
        dir.join("export.csv")
    });

    if fs::write(path, data).is_err() {
        return;
    }

    // 헤더 판별과 CSV/TSV 파싱이 어떤 바이트 열에도 패닉하지 않아야 한다
    let reader = match DltReader::open(path) {
        Ok(reader) => reader,
        Err(_) => return,
    };
    for item in reader {
        if let Ok(record) = item {
            // 메시지가 빈 레코드는 걸러졌어야 한다
            assert!(!record.message.is_empty());
        }
    }
});

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use logloom_miner::{MinerConfig, TemplateMiner};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 마이닝할 라인 목록
    lines: Vec<String>,
    /// 유사도 임계값 (1~100%로 접어서 사용)
    sim_threshold_percent: u8,
    /// 숫자 토큰 와일드카드 라우팅 여부
    parametrize_numeric_tokens: bool,
}

fuzz_target!(|input: FuzzInput| {
    let config = MinerConfig {
        sim_threshold: f64::from(input.sim_threshold_percent % 100 + 1) / 100.0,
        parametrize_numeric_tokens: input.parametrize_numeric_tokens,
        ..MinerConfig::default()
    };

    let mut miner = match TemplateMiner::new(config) {
        Ok(miner) => miner,
        Err(_) => return,
    };

    // 라인 수 제한 (성능)
    for line in input.lines.iter().take(256) {
        let result = miner.process(line);

        // 반환된 클러스터 ID는 항상 조회 가능해야 한다
        assert!(miner.cluster(result.cluster_id).is_some());
    }

    // 클러스터 카운트 합은 처리한 라인 수와 일치해야 한다
    let sum: u64 = miner.clusters().map(|c| c.count()).sum();
    assert_eq!(sum, miner.total_lines());
});

#![no_main]

use libfuzzer_sys::fuzz_target;

use logloom_miner::StateCodec;

fuzz_target!(|data: &[u8]| {
    // 어떤 바이트 열이 와도 크래시나 패닉 없이 Ok 또는 Err을 반환해야 한다
    if let Ok(state) = StateCodec::decode(data) {
        // 디코딩에 성공한 상태는 다시 인코딩할 수 있어야 한다
        StateCodec::encode(&state).expect("decoded state must re-encode");
    }
});

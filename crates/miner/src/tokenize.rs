//! 토큰화 — 마스킹 규칙 적용 및 공백 기준 분리
//!
//! 라인은 먼저 설정된 마스킹 규칙(정규식 치환)을 순서대로 통과한 뒤
//! 공백 기준으로 토큰화됩니다. 마스킹은 IP 주소나 16진수 ID처럼
//! 변동이 큰 값을 트리 분기 전에 접어 두는 용도입니다.

use regex::Regex;

use logloom_core::config::MaskingRule;

use crate::error::MinerError;

/// 라인 토크나이저
///
/// 생성 시점에 모든 마스킹 규칙을 컴파일하며, 이후 토큰화는
/// 할당 외에는 실패하지 않습니다.
#[derive(Debug)]
pub struct Tokenizer {
    masks: Vec<(Regex, String)>,
}

impl Tokenizer {
    /// 마스킹 규칙을 컴파일하여 새 토크나이저를 생성합니다.
    ///
    /// 규칙 중 하나라도 유효한 정규식이 아니면 [`MinerError::Mask`]를 반환합니다.
    pub fn new(rules: &[MaskingRule]) -> Result<Self, MinerError> {
        let mut masks = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&rule.pattern).map_err(|e| MinerError::Mask {
                pattern: rule.pattern.clone(),
                reason: e.to_string(),
            })?;
            masks.push((regex, rule.replacement.clone()));
        }
        Ok(Self { masks })
    }

    /// 라인을 토큰 시퀀스로 변환합니다.
    ///
    /// 마스킹 규칙을 설정 순서대로 적용한 뒤 공백으로 분리합니다.
    /// 빈 라인이나 공백만 있는 라인은 빈 시퀀스가 됩니다.
    pub fn tokenize(&self, line: &str) -> Vec<String> {
        if self.masks.is_empty() {
            return line.split_whitespace().map(str::to_owned).collect();
        }

        let mut masked = line.to_owned();
        for (regex, replacement) in &self.masks {
            masked = regex.replace_all(&masked, replacement.as_str()).into_owned();
        }
        masked.split_whitespace().map(str::to_owned).collect()
    }
}

/// 토큰에 ASCII 숫자가 포함되어 있는지 확인합니다.
///
/// 숫자 포함 토큰은 삽입 시 리터럴 분기 대신 와일드카드 분기로
/// 라우팅되어, 같은 위치의 가변 값들이 한 리프에 모이게 됩니다.
pub(crate) fn has_digits(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit())
}

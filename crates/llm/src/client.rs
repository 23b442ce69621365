//! Gemini generateContent 클라이언트
//!
//! `Annotator`의 일곱 작업을 모두 Gemini API 호출로 구현합니다.
//! 타임아웃은 HTTP 클라이언트에 걸고, 일시적 실패(전송 오류, 429,
//! 5xx)는 설정된 횟수까지 재시도합니다. API 키는 URL에 싣지 않고
//! 헤더로 보내 에러 메시지에 노출되지 않게 합니다.

use std::time::{Duration, Instant};

use logloom_core::config::LlmSettings;
use logloom_core::metrics as m;
use logloom_core::{AnnotateError, Annotator, ClusterDigest, ClusterId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::prompt;

/// API 에러 본문을 메시지로 넘길 때의 길이 상한
const API_MESSAGE_CAP: usize = 200;

/// Gemini generateContent API 클라이언트
pub struct GeminiClient {
    config: LlmConfig,
    http: reqwest::Client,
}

impl GeminiClient {
    /// 실행 설정으로 클라이언트를 만듭니다.
    ///
    /// # Errors
    /// HTTP 클라이언트 구성이 실패하면 에러를 반환합니다.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, http })
    }

    /// 코어 설정에서 바로 클라이언트를 만듭니다.
    ///
    /// # Errors
    /// API 키 확인 또는 클라이언트 구성이 실패하면 에러를 반환합니다.
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, LlmError> {
        Self::new(LlmConfig::from_settings(settings)?)
    }

    /// 실행 설정을 반환합니다.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn request_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    /// 프롬프트 하나를 보내고 응답 텍스트를 돌려줍니다.
    async fn generate(&self, stage: &'static str, prompt_text: &str) -> Result<String, LlmError> {
        metrics::counter!(m::ANNOTATE_REQUESTS_TOTAL, m::LABEL_STAGE => stage).increment(1);
        let started = Instant::now();

        let mut attempt = 0u32;
        let result = loop {
            match self.generate_once(prompt_text).await {
                Ok(text) => break Ok(text),
                Err(err) if attempt < self.config.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    let backoff_ms = self.config.retry_backoff_ms * u64::from(attempt);
                    warn!(
                        stage,
                        attempt,
                        backoff_ms,
                        error = %err,
                        "annotation request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Err(err) => break Err(err),
            }
        };

        metrics::histogram!(m::ANNOTATE_REQUEST_DURATION_SECONDS, m::LABEL_STAGE => stage)
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(text) => {
                debug!(stage, chars = text.len(), "annotation response received");
            }
            Err(_) => {
                metrics::counter!(m::ANNOTATE_FAILURES_TOTAL, m::LABEL_STAGE => stage).increment(1);
            }
        }
        result
    }

    async fn generate_once(&self, prompt_text: &str) -> Result<String, LlmError> {
        let body = GenerateRequest::new(
            prompt_text,
            self.config.temperature,
            self.config.max_output_tokens,
        );

        let response = self
            .http
            .post(self.request_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| self.wrap_transport(err))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: extract_api_message(&raw),
            });
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|err| self.wrap_transport(err))?;
        payload.first_text().ok_or(LlmError::EmptyCandidates)
    }

    fn wrap_transport(&self, err: reqwest::Error) -> LlmError {
        if err.is_timeout() {
            LlmError::Timeout {
                secs: self.config.timeout_secs,
            }
        } else {
            LlmError::Request(err)
        }
    }
}

/// 전송 오류와 429/5xx만 재시도 대상으로 본다.
fn is_retryable(err: &LlmError) -> bool {
    match err {
        LlmError::Request(_) | LlmError::Timeout { .. } => true,
        LlmError::Api { status, .. } => *status == 429 || *status >= 500,
        LlmError::MissingApiKey { .. } | LlmError::EmptyCandidates => false,
    }
}

/// 에러 본문에서 `error.message`를 추립니다. JSON이 아니면 앞부분만 자릅니다.
fn extract_api_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.pointer("/error/message").and_then(|v| v.as_str()) {
            return message.to_owned();
        }
    }
    let trimmed = body.trim();
    if trimmed.chars().count() > API_MESSAGE_CAP {
        trimmed.chars().take(API_MESSAGE_CAP).collect()
    } else {
        trimmed.to_owned()
    }
}

// ─── 요청/응답 구조 ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

impl<'a> GenerateRequest<'a> {
    fn new(text: &'a str, temperature: f64, max_output_tokens: u32) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// 첫 candidate의 텍스트 파트를 이어 붙입니다. 비어 있으면 None.
    fn first_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let content = candidate.content?;
        let text: String = content.parts.into_iter().map(|part| part.text).collect();
        let text = text.trim().to_owned();
        if text.is_empty() { None } else { Some(text) }
    }
}

impl Annotator for GeminiClient {
    async fn analyze_rare_patterns(
        &self,
        rare: &[ClusterDigest],
        total_lines: u64,
    ) -> Result<String, AnnotateError> {
        let text = prompt::analyze_rare_patterns(
            rare,
            total_lines,
            self.config.limits.rare_patterns_in_prompt,
        );
        Ok(self.generate("analyze_rare", &text).await?)
    }

    async fn classify_new_pattern(
        &self,
        template: &str,
        example: &str,
    ) -> Result<String, AnnotateError> {
        let text = prompt::classify_new_pattern(example, template);
        Ok(self.generate("classify_new", &text).await?)
    }

    async fn suggest_pattern_refinement(
        &self,
        template: &str,
        examples: &[String],
    ) -> Result<String, AnnotateError> {
        let text = prompt::suggest_pattern_refinement(template, examples);
        Ok(self.generate("suggest_refinement", &text).await?)
    }

    async fn refine_cluster_template(
        &self,
        digest: &ClusterDigest,
    ) -> Result<String, AnnotateError> {
        let text = prompt::refine_cluster_template(digest);
        Ok(self.generate("refine_template", &text).await?)
    }

    async fn suggest_preprocessing_rules(
        &self,
        samples: &[String],
    ) -> Result<String, AnnotateError> {
        let text = prompt::suggest_preprocessing_rules(samples);
        Ok(self.generate("preprocessing", &text).await?)
    }

    async fn explain_anomaly(
        &self,
        template: &str,
        example: &str,
        context: Option<&str>,
    ) -> Result<String, AnnotateError> {
        let text = prompt::explain_anomaly(example, template, context);
        Ok(self.generate("explain_anomaly", &text).await?)
    }

    async fn merge_similar_clusters(
        &self,
        clusters: &[(ClusterId, String)],
    ) -> Result<String, AnnotateError> {
        let text = prompt::merge_similar_clusters(clusters);
        Ok(self.generate("merge_clusters", &text).await?)
    }
}

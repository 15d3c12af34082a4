//! Gemini `generateContent` client.
//!
//! Gemini answers with `candidates[0].content.parts[]`, so completions come back
//! as `RawResponse::Parts` and are flattened by the extractor.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::ai::{http_timeout_from_env, CompletionRequest, CompletionService, ModelTier, RawResponse};
use crate::error::AiError;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  /// Whole-request HTTP timeout the client was built with.
  pub timeout: Duration,
}

impl Gemini {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let fast_model =
      std::env::var("GEMINI_FAST_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());
    let strong_model =
      std::env::var("GEMINI_STRONG_MODEL").unwrap_or_else(|_| "gemini-2.5-pro".into());

    let timeout = http_timeout_from_env();
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model, timeout })
  }

  fn build_request(req: &CompletionRequest) -> GenerateRequest {
    GenerateRequest {
      system_instruction: Content { role: None, parts: vec![Part { text: req.system.clone() }] },
      contents: vec![Content { role: Some("user".into()), parts: vec![Part { text: req.user.clone() }] }],
      generation_config: GenerationConfig {
        temperature: req.temperature,
        max_output_tokens: req.max_output_tokens,
        response_mime_type: req.structured.then(|| "application/json".to_string()),
      },
    }
  }
}

#[async_trait]
impl CompletionService for Gemini {
  fn provider(&self) -> &str { "gemini" }

  fn model(&self, tier: ModelTier) -> &str {
    match tier {
      ModelTier::Strong => &self.strong_model,
      ModelTier::Fast => &self.fast_model,
    }
  }

  #[instrument(level = "info", skip(self, req), fields(model = %self.model(req.tier), structured = req.structured, user_len = req.user.len()))]
  async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, AiError> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model(req.tier));
    let body = Self::build_request(&req);
    let start = std::time::Instant::now();

    let res = self.client.post(&url)
      .header("x-goog-api-key", &self.api_key)
      .json(&body).send().await
      .map_err(|e| AiError::from_reqwest(e, self.timeout))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(AiError::Http { status, message });
    }

    let body: GenerateResponse = res.json().await.map_err(|e| AiError::Decode(e.to_string()))?;
    if let Some(usage) = &body.usage_metadata {
      info!(elapsed = ?start.elapsed(), prompt_tokens = ?usage.prompt_token_count, completion_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }

    let candidate = body.candidates.into_iter().next()
      .ok_or_else(|| AiError::Decode("response has no candidates".into()))?;
    let parts = candidate.content
      .and_then(|c| c.get("parts").cloned())
      .unwrap_or(Value::Array(Vec::new()));
    Ok(RawResponse::from_value(parts))
  }
}

// --- generateContent DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  system_instruction: Content,
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}
#[derive(Serialize)]
struct Content {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  parts: Vec<Part>,
}
#[derive(Serialize)]
struct Part { text: String }
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_output_tokens: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_mime_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate {
  #[serde(default)] content: Option<Value>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

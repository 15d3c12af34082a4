//! Minimal OpenAI client for our use-cases.
//!
//! We only call chat.completions and request either plain text or a JSON object.
//! Calls are instrumented and log model names, latencies, and token usage (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::ai::{http_timeout_from_env, CompletionRequest, CompletionService, ModelTier, RawResponse};
use crate::error::AiError;
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  /// Whole-request HTTP timeout the client was built with.
  pub timeout: Duration,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let timeout = http_timeout_from_env();
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model, timeout })
  }

  fn build_request(&self, req: &CompletionRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
      model: self.model(req.tier).to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: req.system.clone() },
        ChatMessageReq { role: "user".into(), content: req.user.clone() },
      ],
      temperature: req.temperature,
      response_format: req.structured.then(|| ResponseFormat { r#type: "json_object".into() }),
      max_tokens: req.max_output_tokens,
    }
  }
}

#[async_trait]
impl CompletionService for OpenAI {
  fn provider(&self) -> &str { "openai" }

  fn model(&self, tier: ModelTier) -> &str {
    match tier {
      ModelTier::Strong => &self.strong_model,
      ModelTier::Fast => &self.fast_model,
    }
  }

  #[instrument(level = "info", skip(self, req), fields(model = %self.model(req.tier), structured = req.structured, user_len = req.user.len()))]
  async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, AiError> {
    let url = format!("{}/chat/completions", self.base_url);
    let body = self.build_request(&req);
    let start = std::time::Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "eduai-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&body).send().await
      .map_err(|e| AiError::from_reqwest(e, self.timeout))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(AiError::Http { status, message });
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| AiError::Decode(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(elapsed = ?start.elapsed(), prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }

    let message = body.choices.into_iter().next()
      .map(|c| c.message)
      .ok_or_else(|| AiError::Decode("response has no choices".into()))?;
    Ok(message.into_raw())
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }

/// `content` is a string for chat.completions but a list of parts on some
/// compatible gateways; `parsed` appears when the gateway enforces a schema.
#[derive(Deserialize)]
struct ChatMessageResp {
  #[serde(default)] content: Option<Value>,
  #[serde(default)] parsed: Option<Value>,
  #[serde(default)] refusal: Option<String>,
}

impl ChatMessageResp {
  fn into_raw(self) -> RawResponse {
    if let Some(Value::Object(parsed)) = self.parsed {
      return RawResponse::Parsed(parsed);
    }
    match self.content {
      Some(v) => RawResponse::from_value(v),
      None => RawResponse::Text(self.refusal.unwrap_or_default()),
    }
  }
}

#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

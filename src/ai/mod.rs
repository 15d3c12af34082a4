//! Completion-service capability shared by the roadmap pipeline and the tutor.
//!
//! Providers (OpenAI, Gemini) implement `CompletionService`; callers pick a
//! `ModelTier` and the provider maps it to a concrete model from its env config.
//! Whatever the provider returns is normalized into one `RawResponse` variant
//! and handed to `extract` for decoding.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::error::AiError;

pub mod extract;
pub mod gemini;
pub mod openai;

pub use extract::{extract_object, response_text};

/// Which configured model a call should use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelTier {
  /// Higher-capability model (roadmap planning).
  Strong,
  /// Cheaper model (week expansion, tutor chat, MCQs).
  Fast,
}

#[derive(Clone, Debug)]
pub struct CompletionRequest {
  pub tier: ModelTier,
  pub system: String,
  pub user: String,
  pub temperature: f32,
  pub max_output_tokens: Option<u32>,
  /// Ask the provider to constrain output to a single JSON object.
  pub structured: bool,
}

/// A completion as returned by a provider, before any decoding.
#[derive(Clone, Debug, PartialEq)]
pub enum RawResponse {
  /// Plain text body.
  Text(String),
  /// Provider already parsed a structured object for us.
  Parsed(Map<String, Value>),
  /// Object with nested `text` / `content` / `parts` keys.
  Object(Map<String, Value>),
  /// List of content parts (strings or `{ "text": ... }` objects).
  Parts(Vec<Value>),
}

impl RawResponse {
  /// Classify an arbitrary JSON value into one of the known shapes.
  pub fn from_value(v: Value) -> Self {
    match v {
      Value::String(s) => RawResponse::Text(s),
      Value::Array(parts) => RawResponse::Parts(parts),
      Value::Object(mut map) => match map.remove("parsed") {
        Some(Value::Object(parsed)) => RawResponse::Parsed(parsed),
        Some(other) => {
          map.insert("parsed".into(), other);
          RawResponse::Object(map)
        }
        None => RawResponse::Object(map),
      },
      Value::Null => RawResponse::Text(String::new()),
      other => RawResponse::Text(other.to_string()),
    }
  }
}

/// A chat/completion provider usable from many concurrent requests.
#[async_trait]
pub trait CompletionService: Send + Sync {
  /// Provider name for logs (e.g. "openai").
  fn provider(&self) -> &str;

  /// Model name backing a tier.
  fn model(&self, tier: ModelTier) -> &str;

  async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, AiError>;
}

/// Run one completion under its own deadline.
pub async fn complete_within(
  service: &dyn CompletionService,
  req: CompletionRequest,
  limit: Duration,
) -> Result<RawResponse, AiError> {
  match tokio::time::timeout(limit, service.complete(req)).await {
    Ok(result) => result,
    Err(_) => Err(AiError::Timeout(limit)),
  }
}

/// Plain-text completion: run the call and flatten whatever shape came back.
pub async fn complete_text(
  service: &dyn CompletionService,
  req: CompletionRequest,
) -> Result<String, AiError> {
  let raw = service.complete(req).await?;
  Ok(response_text(&raw).trim().to_string())
}

/// Build the provider selected by AI_PROVIDER ("openai" default, or "gemini").
/// Returns None when the provider has no credentials or is unknown.
pub fn from_env() -> Option<Arc<dyn CompletionService>> {
  let provider = std::env::var("AI_PROVIDER")
    .unwrap_or_else(|_| "openai".into())
    .trim()
    .to_ascii_lowercase();

  let service: Option<Arc<dyn CompletionService>> = match provider.as_str() {
    "openai" => openai::OpenAI::from_env().map(|c| Arc::new(c) as Arc<dyn CompletionService>),
    "gemini" => gemini::Gemini::from_env().map(|c| Arc::new(c) as Arc<dyn CompletionService>),
    other => {
      error!(target: "eduai_backend", provider = %other, "Unknown AI_PROVIDER; use 'openai' or 'gemini'");
      None
    }
  };

  if let Some(s) = &service {
    info!(
      target: "eduai_backend",
      provider = %s.provider(),
      strong_model = %s.model(ModelTier::Strong),
      fast_model = %s.model(ModelTier::Fast),
      "AI provider enabled."
    );
  }
  service
}

/// Read the HTTP client timeout shared by providers.
pub(crate) fn http_timeout_from_env() -> Duration {
  let secs = std::env::var("AI_HTTP_TIMEOUT_SECS")
    .ok()
    .and_then(|s| s.parse::<u64>().ok())
    .unwrap_or(120);
  Duration::from_secs(secs)
}

#[cfg(test)]
pub(crate) mod testing {
  //! Scripted in-process provider for pipeline tests.

  use std::collections::HashMap;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use super::*;

  /// One scripted outcome.
  #[derive(Clone)]
  pub enum Reply {
    Ok(RawResponse),
    Err(fn() -> AiError),
    /// Sleep, then answer.
    Slow(Duration, RawResponse),
  }

  impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
      Reply::Ok(RawResponse::Text(s.into()))
    }
  }

  /// Strong-tier calls get `plan`; fast-tier calls are matched by the
  /// "Week number: N" line of the prompt, falling back to `default_fast`.
  pub struct ScriptedService {
    pub plan: Reply,
    pub weeks: HashMap<u32, Reply>,
    pub default_fast: Reply,
    pub calls: Mutex<Vec<CompletionRequest>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
  }

  impl ScriptedService {
    pub fn new(plan: Reply, default_fast: Reply) -> Self {
      Self {
        plan,
        weeks: HashMap::new(),
        default_fast,
        calls: Mutex::new(Vec::new()),
        in_flight: AtomicUsize::new(0),
        max_in_flight: AtomicUsize::new(0),
      }
    }

    pub fn with_week(mut self, week: u32, reply: Reply) -> Self {
      self.weeks.insert(week, reply);
      self
    }

    pub fn calls_for(&self, tier: ModelTier) -> usize {
      self.calls.lock().unwrap().iter().filter(|c| c.tier == tier).count()
    }

    /// Calls started and not yet finished or dropped.
    pub fn in_flight(&self) -> usize {
      self.in_flight.load(Ordering::SeqCst)
    }
  }

  /// Releases an in-flight slot even when the call future is dropped mid-await.
  struct InFlight<'a>(&'a AtomicUsize);

  impl Drop for InFlight<'_> {
    fn drop(&mut self) {
      self.0.fetch_sub(1, Ordering::SeqCst);
    }
  }

  fn week_of(prompt: &str) -> Option<u32> {
    prompt
      .lines()
      .find_map(|l| l.trim().strip_prefix("- Week number:"))
      .and_then(|n| n.trim().parse().ok())
  }

  #[async_trait]
  impl CompletionService for ScriptedService {
    fn provider(&self) -> &str { "scripted" }

    fn model(&self, tier: ModelTier) -> &str {
      match tier {
        ModelTier::Strong => "scripted-strong",
        ModelTier::Fast => "scripted-fast",
      }
    }

    async fn complete(&self, req: CompletionRequest) -> Result<RawResponse, AiError> {
      self.calls.lock().unwrap().push(req.clone());
      let reply = match req.tier {
        ModelTier::Strong => self.plan.clone(),
        ModelTier::Fast => week_of(&req.user)
          .and_then(|w| self.weeks.get(&w).cloned())
          .unwrap_or_else(|| self.default_fast.clone()),
      };
      let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
      let _slot = InFlight(&self.in_flight);
      self.max_in_flight.fetch_max(now, Ordering::SeqCst);
      match reply {
        Reply::Ok(raw) => Ok(raw),
        Reply::Err(make) => Err(make()),
        Reply::Slow(delay, raw) => {
          tokio::time::sleep(delay).await;
          Ok(raw)
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::testing::{Reply, ScriptedService};
  use super::*;
  use serde_json::json;

  #[test]
  fn from_value_classifies_shapes() {
    assert_eq!(RawResponse::from_value(json!("hi")), RawResponse::Text("hi".into()));
    assert!(matches!(RawResponse::from_value(json!([{"text": "a"}])), RawResponse::Parts(_)));
    assert!(matches!(RawResponse::from_value(json!({"parsed": {"a": 1}})), RawResponse::Parsed(_)));
    // A "parsed" that is not an object is just part of the envelope.
    match RawResponse::from_value(json!({"parsed": [1], "text": "x"})) {
      RawResponse::Object(map) => assert!(map.contains_key("parsed")),
      other => panic!("unexpected {other:?}"),
    }
    assert_eq!(RawResponse::from_value(Value::Null), RawResponse::Text(String::new()));
  }

  #[tokio::test]
  async fn complete_within_converts_deadline_into_timeout() {
    let svc = ScriptedService::new(
      Reply::Slow(Duration::from_secs(5), RawResponse::Text("late".into())),
      Reply::text("fast"),
    );
    let req = CompletionRequest {
      tier: ModelTier::Strong,
      system: String::new(),
      user: String::new(),
      temperature: 0.0,
      max_output_tokens: None,
      structured: false,
    };
    let err = complete_within(&svc, req, Duration::from_millis(20)).await.unwrap_err();
    assert!(matches!(err, AiError::Timeout(d) if d == Duration::from_millis(20)));
  }

  #[tokio::test]
  async fn complete_text_flattens_parts() {
    let svc = ScriptedService::new(
      Reply::text("unused"),
      Reply::Ok(RawResponse::Parts(vec![json!({"text": " Hello, "}), json!("world ")])),
    );
    let req = CompletionRequest {
      tier: ModelTier::Fast,
      system: String::new(),
      user: "q".into(),
      temperature: 0.7,
      max_output_tokens: Some(10),
      structured: false,
    };
    assert_eq!(complete_text(&svc, req).await.unwrap(), "Hello, world");
  }
}

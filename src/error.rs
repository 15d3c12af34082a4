//! Error taxonomy for completion calls and the roadmap pipeline.
//!
//! `AiError` describes what went wrong talking to a provider, `MalformedAiResponse`
//! what went wrong reading its answer. `RoadmapError` says which pipeline stage failed.

use std::time::Duration;

/// Failures of the completion service itself.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
  /// No provider configured (missing credentials) or provider unreachable.
  #[error("completion service unavailable: {0}")]
  ServiceUnavailable(String),

  /// Provider answered with a non-success status.
  #[error("completion service HTTP {status}: {message}")]
  Http { status: u16, message: String },

  /// Request could not be sent or the body could not be read.
  #[error("completion request failed: {0}")]
  Transport(String),

  #[error("completion request timed out after {0:?}")]
  Timeout(Duration),

  /// Provider answered 2xx with a body we could not interpret.
  #[error("unexpected completion body: {0}")]
  Decode(String),
}

impl AiError {
  pub fn is_unavailable(&self) -> bool {
    matches!(self, AiError::ServiceUnavailable(_))
  }
}

impl AiError {
  /// Classify a reqwest failure. `limit` is the client's configured timeout.
  pub fn from_reqwest(e: reqwest::Error, limit: Duration) -> Self {
    if e.is_timeout() {
      AiError::Timeout(limit)
    } else if e.is_connect() {
      AiError::ServiceUnavailable(e.to_string())
    } else {
      AiError::Transport(e.to_string())
    }
  }
}

/// The extractor could not find or parse a structured object in a completion.
/// `raw` and `sanitized` are already truncated for diagnostics.
#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed AI response: {reason}")]
pub struct MalformedAiResponse {
  pub reason: String,
  pub raw: String,
  pub sanitized: String,
}

/// Why a single pipeline stage (planning or one week's expansion) failed.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
  #[error(transparent)]
  Service(#[from] AiError),

  #[error(transparent)]
  Malformed(#[from] MalformedAiResponse),

  /// The document parsed but lacks required structure.
  #[error("{0}")]
  Structure(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RoadmapError {
  /// Rejected before any completion call was made.
  #[error("invalid roadmap request: {0}")]
  Validation(String),

  /// Fatal: no roadmap without a skeleton.
  #[error("roadmap planner failed: {0}")]
  Planner(#[source] StageError),

  /// Non-fatal at pipeline level; the week stays empty.
  #[error("expansion of week {week} failed: {source}")]
  Expander {
    week: u32,
    #[source]
    source: StageError,
  },
}

impl RoadmapError {
  /// True when the failure comes from a missing or unreachable completion service.
  pub fn is_service_unavailable(&self) -> bool {
    match self {
      RoadmapError::Planner(StageError::Service(e))
      | RoadmapError::Expander { source: StageError::Service(e), .. } => e.is_unavailable(),
      _ => false,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn planner_error_messages_include_cause() {
    let err = RoadmapError::Planner(StageError::Structure("planner returned no phases".into()));
    assert_eq!(err.to_string(), "roadmap planner failed: planner returned no phases");
    assert!(!err.is_service_unavailable());
  }

  #[test]
  fn unavailable_is_detected_through_stage() {
    let err = RoadmapError::Planner(AiError::ServiceUnavailable("no key".into()).into());
    assert!(err.is_service_unavailable());
    let err = RoadmapError::Expander { week: 3, source: AiError::Timeout(Duration::from_secs(1)).into() };
    assert!(!err.is_service_unavailable());
    assert!(err.to_string().starts_with("expansion of week 3 failed"));
  }
}

//! HTTP endpoint handlers. These are thin wrappers that forward to the roadmap
//! pipeline and tutor helpers. Each handler is instrumented with request sizes.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::error::{AiError, RoadmapError};
use crate::protocol::*;
use crate::roadmap::{generate_roadmap, render_markdown, RoadmapRequest};
use crate::state::AppState;
use crate::tutor::{self, clamp_mcq_count, DEFAULT_MCQ_DIFFICULTY};

/// Failure surfaced to clients as `{"detail": ...}`.
#[derive(Debug)]
pub enum ApiError {
  Roadmap(RoadmapError),
  Ai(AiError),
}

impl From<RoadmapError> for ApiError {
  fn from(e: RoadmapError) -> Self { ApiError::Roadmap(e) }
}

impl From<AiError> for ApiError {
  fn from(e: AiError) -> Self { ApiError::Ai(e) }
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::Roadmap(RoadmapError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Roadmap(e) if e.is_service_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Roadmap(_) => StatusCode::BAD_GATEWAY,
      ApiError::Ai(e) if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Ai(_) => StatusCode::BAD_GATEWAY,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let detail = match &self {
      ApiError::Roadmap(e) => e.to_string(),
      ApiError::Ai(e) => e.to_string(),
    };
    if status.is_server_error() {
      error!(target: "eduai_backend", %status, %detail, "Request failed");
    } else {
      warn!(target: "eduai_backend", %status, %detail, "Request rejected");
    }
    (status, Json(ErrorOut { detail })).into_response()
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, ai_enabled: state.ai.is_some() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_roadmaps(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(state.catalog.clone())
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_generate_roadmap(
  State(state): State<Arc<AppState>>,
  Json(body): Json<RoadmapGenerateIn>,
) -> Result<Json<GeneratedRoadmapOut>, ApiError> {
  let req = RoadmapRequest::validate(&body, &state.roadmap)?;
  let ai = state.ai()?;
  let roadmap = generate_roadmap(ai, &state.prompts, &state.roadmap, &req).await?;
  let markdown = render_markdown(&roadmap, &req.topic);
  info!(target: "roadmap", id = %roadmap.id, total_xp = roadmap.total_xp, markdown_len = markdown.len(), "HTTP roadmap generated");
  Ok(Json(GeneratedRoadmapOut { roadmap, markdown }))
}

#[instrument(level = "info", skip(body), fields(phases = body.roadmap.phases.len()))]
pub async fn http_roadmap_markdown(Json(body): Json<MarkdownIn>) -> impl IntoResponse {
  let topic = body
    .topic
    .filter(|t| !t.trim().is_empty())
    .unwrap_or_else(|| body.roadmap.skill.clone());
  Json(MarkdownOut { markdown: render_markdown(&body.roadmap, &topic) })
}

#[instrument(level = "info")]
pub async fn http_ai_root() -> impl IntoResponse {
  Json(AiRootOut { status: "ai router mounted" })
}

#[instrument(level = "info", skip(state, body), fields(prompt_len = body.prompt.len()))]
pub async fn http_ai_test(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AskIn>,
) -> Result<Json<TestOut>, ApiError> {
  if body.prompt.trim().is_empty() {
    return Ok(Json(TestOut { response: tutor::EMPTY_PROMPT_REPLY.to_string() }));
  }
  let response = tutor::answer(state.ai()?, &state.prompts, &body.prompt).await?;
  Ok(Json(TestOut { response }))
}

/// One tutor turn: store the user text, ask the model, store the reply.
/// Blank text gets the canned reply and leaves the history untouched.
async fn tutor_turn(state: &AppState, conversation_id: Option<u64>, text: &str) -> Result<(String, u64), ApiError> {
  let blank = text.trim().is_empty();
  let ai = if blank { None } else { Some(state.ai()?) };
  let conversation_id = match conversation_id {
    Some(id) => id,
    None => state.create_conversation().await,
  };
  let Some(ai) = ai else {
    return Ok((tutor::EMPTY_PROMPT_REPLY.to_string(), conversation_id));
  };
  state.add_message(conversation_id, "user", text).await;
  let reply = tutor::answer(ai, &state.prompts, text).await?;
  state.add_message(conversation_id, "assistant", &reply).await;
  Ok((reply, conversation_id))
}

#[instrument(level = "info", skip(state, body), fields(prompt_len = body.prompt.len(), conversation_id = ?body.conversation_id))]
pub async fn http_ai_ask(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AskIn>,
) -> Result<Json<AskOut>, ApiError> {
  let (response, conversation_id) = tutor_turn(&state, body.conversation_id, &body.prompt).await?;
  Ok(Json(AskOut { response, conversation_id }))
}

#[instrument(level = "info", skip(state, body), fields(message_len = body.message.len(), conversation_id = ?body.conversation_id))]
pub async fn http_ai_chat(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> Result<Json<ChatOut>, ApiError> {
  let (reply, conversation_id) = tutor_turn(&state, body.conversation_id, &body.message).await?;
  Ok(Json(ChatOut { reply, conversation_id }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_create_conversation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let conversation_id = state.create_conversation().await;
  Json(ConversationCreatedOut { conversation_id })
}

/// Unknown ids answer with an empty message list.
#[instrument(level = "info", skip(state))]
pub async fn http_get_conversation(
  State(state): State<Arc<AppState>>,
  Path(id): Path<u64>,
) -> impl IntoResponse {
  let messages = state.get_messages(id).await.unwrap_or_default();
  Json(MessagesOut { messages })
}

#[instrument(level = "info", skip(state, body), fields(topic = %body.topic))]
pub async fn http_ai_mcq(
  State(state): State<Arc<AppState>>,
  Json(body): Json<McqIn>,
) -> Result<Json<tutor::McqOutcome>, ApiError> {
  let ai = state.ai()?;
  let difficulty = body
    .difficulty
    .filter(|d| !d.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_MCQ_DIFFICULTY.to_string());
  let count = clamp_mcq_count(body.count);
  let outcome = tutor::generate_mcq(ai, &state.prompts, body.topic.trim(), &difficulty, count).await?;
  Ok(Json(outcome))
}

//! Public protocol structs for the HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Roadmap, TutorMessage};

/// Raw roadmap request. Numbers stay as JSON values until validation so that
/// "12", 12 and 12.0 are all accepted.
#[derive(Debug, Default, Deserialize)]
pub struct RoadmapGenerateIn {
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub duration_weeks: Option<Value>,
    #[serde(default)]
    pub hours_per_week: Option<Value>,
    #[serde(default)]
    pub learner_background: Option<String>,
    #[serde(default)]
    pub target_goal: Option<String>,
}

#[derive(Serialize)]
pub struct GeneratedRoadmapOut {
    pub roadmap: Roadmap,
    pub markdown: String,
}

#[derive(Deserialize)]
pub struct MarkdownIn {
    pub roadmap: Roadmap,
    #[serde(default)]
    pub topic: Option<String>,
}
#[derive(Serialize)]
pub struct MarkdownOut {
    pub markdown: String,
}

#[derive(Deserialize)]
pub struct AskIn {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub conversation_id: Option<u64>,
}
#[derive(Serialize)]
pub struct AskOut {
    pub response: String,
    pub conversation_id: u64,
}

#[derive(Serialize)]
pub struct TestOut {
    pub response: String,
}

#[derive(Deserialize)]
pub struct ChatIn {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<u64>,
}
#[derive(Serialize)]
pub struct ChatOut {
    pub reply: String,
    pub conversation_id: u64,
}

#[derive(Serialize)]
pub struct ConversationCreatedOut {
    pub conversation_id: u64,
}

#[derive(Serialize)]
pub struct MessagesOut {
    pub messages: Vec<TutorMessage>,
}

#[derive(Deserialize)]
pub struct McqIn {
    pub topic: String,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub count: Option<i64>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub ai_enabled: bool,
}

#[derive(Serialize)]
pub struct AiRootOut {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub detail: String,
}

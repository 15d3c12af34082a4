//! Domain models used by the backend: the roadmap document, catalog cards,
//! MCQ sets and tutor conversations.
//!
//! The roadmap document's field names and nesting are consumed verbatim by the
//! frontend and by whatever persists roadmaps, so they must stay stable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Learner level requested for a roadmap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  #[default]
  Beginner,
  Intermediate,
  Advanced,
}

impl Level {
  /// Case-insensitive parse; `None` for anything outside the three levels.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "beginner" => Some(Level::Beginner),
      "intermediate" => Some(Level::Intermediate),
      "advanced" => Some(Level::Advanced),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Level::Beginner => "beginner",
      Level::Intermediate => "intermediate",
      Level::Advanced => "advanced",
    }
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// External learning resource (course page, docs, video...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  #[serde(default)] pub title: String,
  #[serde(default)] pub url: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub provider: Option<String>,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")] pub kind: Option<String>,
}

/// One task line inside a day. Only learn items carry a `resource`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
  #[serde(default)] pub description: String,
  #[serde(default)] pub xp: u32,
  #[serde(default)] pub completed: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub resource: Option<Resource>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Day {
  #[serde(default)] pub day_number: u32,
  #[serde(default)] pub title: String,
  #[serde(default)] pub time_estimate_hours: Option<f32>,
  /// Sum of this day's item xp, as reported by the expander.
  #[serde(default)] pub xp_reward: u32,
  #[serde(default)] pub completed: bool,
  #[serde(default)] pub learn_items: Vec<Item>,
  #[serde(default)] pub practice_items: Vec<Item>,
  #[serde(default)] pub project_items: Vec<Item>,
  #[serde(default)] pub reflection_items: Vec<Item>,
}

impl Day {
  /// All items of the day, in category order.
  pub fn items(&self) -> impl Iterator<Item = &Item> {
    self.learn_items.iter()
      .chain(&self.practice_items)
      .chain(&self.project_items)
      .chain(&self.reflection_items)
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Week {
  #[serde(default)] pub week_number: u32,
  #[serde(default)] pub theme: String,
  #[serde(default)] pub outcome: String,
  #[serde(default)] pub summary: String,
  #[serde(default)] pub week_xp: u32,
  #[serde(default)] pub quiz_questions: Vec<String>,
  #[serde(default)] pub weekly_resources: Vec<Resource>,
  /// Empty until the week is expanded.
  #[serde(default)] pub days: Vec<Day>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Phase {
  #[serde(default)] pub id: String,
  #[serde(default)] pub name: String,
  #[serde(default)] pub order: u32,
  #[serde(default)] pub goal: String,
  #[serde(default)] pub start_week: u32,
  #[serde(default)] pub end_week: u32,
  #[serde(default)] pub milestone_summary: String,
  #[serde(default)] pub phase_xp: u32,
  #[serde(default)] pub weeks: Vec<Week>,
}

/// The roadmap document. Produced as a skeleton (phases and weeks, no days)
/// by the planner, filled in by expansion and finalized by aggregation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Roadmap {
  #[serde(default)] pub id: String,
  #[serde(default)] pub title: String,
  #[serde(default)] pub skill: String,
  #[serde(default)] pub level: Level,
  #[serde(default)] pub description: String,
  #[serde(default)] pub duration_weeks: u32,
  #[serde(default)] pub hours_per_week: u32,
  #[serde(default)] pub target_outcome: String,
  #[serde(default)] pub prerequisites: String,
  #[serde(default)] pub total_xp: u32,
  #[serde(default)] pub phases: Vec<Phase>,
}

impl Roadmap {
  pub fn weeks(&self) -> impl Iterator<Item = &Week> {
    self.phases.iter().flat_map(|p| p.weeks.iter())
  }
}

/// Dashboard card for the static roadmap catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogCard {
  pub id: u32,
  pub title: String,
  #[serde(default)] pub progress: u32,
  #[serde(default)] pub xp: u32,
  #[serde(default)] pub color: String,
}

/// One multiple-choice question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct McqQuestion {
  pub question: String,
  pub choices: Vec<String>,
  pub answer_index: u32,
  #[serde(default)] pub explanation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct McqSet {
  #[serde(default)] pub topic: String,
  #[serde(default)] pub difficulty: String,
  pub questions: Vec<McqQuestion>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TutorMessage {
  pub id: u64,
  pub role: String,
  pub content: String,
  pub created_at: DateTime<Utc>,
}

/// In-memory tutor conversation.
#[derive(Clone, Debug, Serialize)]
pub struct Conversation {
  pub id: u64,
  pub created_at: DateTime<Utc>,
  pub messages: Vec<TutorMessage>,
}

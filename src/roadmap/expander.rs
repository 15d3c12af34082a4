//! Week expansion: one fast-tier call turning a week's theme into daily tasks.
//!
//! The model is told that day xp must equal the sum of item xp and week xp the
//! sum of day xp. Those totals are taken as reported; nothing here recomputes them.

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::ai::{complete_within, extract_object, CompletionRequest, CompletionService, ModelTier};
use crate::config::{Prompts, RoadmapSettings};
use crate::domain::{Day, Item, Level, Resource, Week};
use crate::error::{RoadmapError, StageError};
use crate::roadmap::lenient::{array_field, as_u32, f32_field, resource, str_field, string_list, u32_field};
use crate::roadmap::request::RoadmapRequest;
use crate::util::fill_template;

/// Everything the expander needs about one week. No cross-week state.
#[derive(Clone, Debug, PartialEq)]
pub struct WeekContext {
  pub topic: String,
  pub level: Level,
  pub week_number: u32,
  pub theme: String,
  pub outcome: String,
  pub summary: String,
  pub hours_per_week: u32,
}

impl WeekContext {
  pub fn new(req: &RoadmapRequest, week: &Week) -> Self {
    Self {
      topic: req.topic.clone(),
      level: req.level,
      week_number: week.week_number,
      theme: week.theme.clone(),
      outcome: week.outcome.clone(),
      summary: week.summary.clone(),
      hours_per_week: req.hours_per_week,
    }
  }
}

/// Daily detail for one week, ready to attach to its `Week`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeekExpansion {
  pub days: Vec<Day>,
  pub week_xp: u32,
  pub quiz_questions: Vec<String>,
  pub weekly_resources: Vec<Resource>,
}

impl WeekExpansion {
  pub fn apply_to(self, week: &mut Week) {
    week.days = self.days;
    week.week_xp = self.week_xp;
    week.quiz_questions = self.quiz_questions;
    week.weekly_resources = self.weekly_resources;
  }
}

pub fn expander_prompt(prompts: &Prompts, ctx: &WeekContext) -> String {
  let week_number = ctx.week_number.to_string();
  let hours = ctx.hours_per_week.to_string();
  fill_template(
    &prompts.expander_user_template,
    &[
      ("topic", &ctx.topic),
      ("level", ctx.level.as_str()),
      ("week_number", &week_number),
      ("theme", &ctx.theme),
      ("outcome", if ctx.outcome.is_empty() { "not specified" } else { &ctx.outcome }),
      ("summary", if ctx.summary.is_empty() { "not specified" } else { &ctx.summary }),
      ("hours_per_week", &hours),
    ],
  )
}

/// Expand one week. Errors are returned to the orchestrator, which decides
/// they are not fatal.
#[instrument(level = "info", skip_all, fields(topic = %ctx.topic, week = ctx.week_number))]
pub async fn expand_week(
  ai: &dyn CompletionService,
  prompts: &Prompts,
  settings: &RoadmapSettings,
  ctx: &WeekContext,
) -> Result<WeekExpansion, RoadmapError> {
  let fail = |source: StageError| RoadmapError::Expander { week: ctx.week_number, source };

  let request = CompletionRequest {
    tier: ModelTier::Fast,
    system: prompts.expander_system.clone(),
    user: expander_prompt(prompts, ctx),
    temperature: settings.expand_temperature,
    max_output_tokens: Some(settings.expand_max_tokens),
    structured: true,
  };

  let raw = complete_within(ai, request, settings.expand_timeout())
    .await
    .map_err(|e| fail(e.into()))?;
  let doc = extract_object(&raw).map_err(|e| fail(e.into()))?;
  let expansion = expansion_from_document(&doc);

  let day_sum = expansion.days.iter().map(|d| d.xp_reward).fold(0u32, u32::saturating_add);
  if day_sum != expansion.week_xp {
    debug!(target: "roadmap", week = ctx.week_number, week_xp = expansion.week_xp, day_sum, "Reported week_xp differs from day totals");
  }
  debug!(target: "roadmap", week = ctx.week_number, days = expansion.days.len(), week_xp = expansion.week_xp, "Week expanded");
  Ok(expansion)
}

/// Read days and totals from the expander's document. Missing `days` means an
/// empty week; non-numeric `week_xp` means 0.
pub fn expansion_from_document(doc: &Map<String, Value>) -> WeekExpansion {
  let days = array_field(doc, "days")
    .iter()
    .filter_map(Value::as_object)
    .enumerate()
    .map(|(i, d)| day_from(d, i as u32 + 1))
    .collect();

  WeekExpansion {
    days,
    week_xp: u32_field(doc, "week_xp").unwrap_or(0),
    quiz_questions: string_list(doc, "quiz_questions", "question"),
    weekly_resources: array_field(doc, "weekly_resources").iter().filter_map(resource).collect(),
  }
}

fn day_from(d: &Map<String, Value>, fallback_number: u32) -> Day {
  let day_number = u32_field(d, "day_number").unwrap_or(fallback_number);
  Day {
    day_number,
    title: str_field(d, "title").unwrap_or_else(|| format!("Day {day_number}")),
    time_estimate_hours: f32_field(d, "time_estimate_hours"),
    xp_reward: u32_field(d, "xp_reward").unwrap_or(0),
    completed: false,
    learn_items: items(d, "learn_items", true),
    practice_items: items(d, "practice_items", false),
    project_items: items(d, "project_items", false),
    reflection_items: items(d, "reflection_items", false),
  }
}

fn items(d: &Map<String, Value>, key: &str, with_resource: bool) -> Vec<Item> {
  array_field(d, key)
    .iter()
    .filter_map(|v| item_from(v, with_resource))
    .collect()
}

fn item_from(v: &Value, with_resource: bool) -> Option<Item> {
  match v {
    Value::String(s) if !s.trim().is_empty() => Some(Item {
      description: s.trim().to_string(),
      ..Item::default()
    }),
    Value::Object(o) => {
      let description = str_field(o, "description")
        .or_else(|| str_field(o, "title"))
        .or_else(|| str_field(o, "task"))?;
      Some(Item {
        description,
        xp: o.get("xp").and_then(as_u32).unwrap_or(0),
        completed: false,
        resource: if with_resource { o.get("resource").and_then(resource) } else { None },
      })
    }
    _ => None,
  }
}

//! Skeleton planning: one strong-tier call producing phases and weeks, no days.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};

use crate::ai::{complete_within, extract_object, CompletionRequest, CompletionService, ModelTier};
use crate::config::{Prompts, RoadmapSettings};
use crate::domain::{Phase, Roadmap, Week};
use crate::error::{RoadmapError, StageError};
use crate::roadmap::lenient::{array_field, object_field, str_field, text_or_list, u32_field};
use crate::roadmap::request::RoadmapRequest;
use crate::util::{fill_template, slugify};

const MAX_ID_LEN: usize = 80;

pub fn planner_prompt(prompts: &Prompts, req: &RoadmapRequest) -> String {
  let duration = req.duration_weeks.to_string();
  let hours = req.hours_per_week.to_string();
  fill_template(
    &prompts.planner_user_template,
    &[
      ("topic", &req.topic),
      ("level", req.level.as_str()),
      ("duration_weeks", &duration),
      ("hours_per_week", &hours),
      ("learner_background", req.learner_background.as_deref().unwrap_or("not specified")),
      ("target_goal", req.target_goal.as_deref().unwrap_or("not specified")),
    ],
  )
}

/// Ask the strong model for a skeleton and normalize it. Any failure is fatal.
#[instrument(level = "info", skip_all, fields(topic = %req.topic, weeks = req.duration_weeks, level = %req.level))]
pub async fn plan_skeleton(
  ai: &dyn CompletionService,
  prompts: &Prompts,
  settings: &RoadmapSettings,
  req: &RoadmapRequest,
) -> Result<Roadmap, RoadmapError> {
  let request = CompletionRequest {
    tier: ModelTier::Strong,
    system: prompts.planner_system.clone(),
    user: planner_prompt(prompts, req),
    temperature: settings.plan_temperature,
    max_output_tokens: Some(settings.plan_max_tokens),
    structured: true,
  };

  let start = std::time::Instant::now();
  let raw = complete_within(ai, request, settings.plan_timeout()).await.map_err(|e| {
    error!(target: "roadmap", topic = %req.topic, error = %e, "Planner call failed");
    RoadmapError::Planner(e.into())
  })?;

  let doc = extract_object(&raw).map_err(|e| {
    error!(target: "roadmap", topic = %req.topic, reason = %e.reason, raw = %e.raw, sanitized = %e.sanitized, "Planner returned unparseable body");
    RoadmapError::Planner(e.into())
  })?;

  let roadmap = skeleton_from_document(&doc, req).map_err(|e| {
    error!(target: "roadmap", topic = %req.topic, error = %e, "Planner returned unusable structure");
    RoadmapError::Planner(e)
  })?;

  let weeks = roadmap.weeks().count();
  info!(target: "roadmap", phases = roadmap.phases.len(), weeks, elapsed = ?start.elapsed(), "Roadmap skeleton planned");
  warn_on_week_gaps(&roadmap);
  Ok(roadmap)
}

/// Default id when the planner omits one: topic slug plus duration.
pub fn default_roadmap_id(topic: &str, duration_weeks: u32) -> String {
  let slug = slugify(topic);
  if slug.is_empty() {
    return "roadmap".into();
  }
  let id = format!("{slug}-{duration_weeks}-weeks");
  let cut = crate::util::truncate_on_char_boundary(&id, MAX_ID_LEN);
  cut.trim_end_matches('-').to_string()
}

/// Turn the planner's document into a skeleton. Request values win for level,
/// duration and hours; other top-level fields get defaults when missing.
pub fn skeleton_from_document(doc: &Map<String, Value>, req: &RoadmapRequest) -> Result<Roadmap, StageError> {
  let raw_phases = array_field(doc, "phases");
  if raw_phases.is_empty() {
    return Err(StageError::Structure("planner returned no phases".into()));
  }

  let mut cursor = 1u32;
  let phases: Vec<Phase> = raw_phases
    .iter()
    .filter_map(Value::as_object)
    .enumerate()
    .map(|(idx, p)| phase_from(p, idx, req.duration_weeks, &mut cursor))
    .collect();
  if phases.is_empty() {
    return Err(StageError::Structure("planner returned no phases".into()));
  }

  Ok(Roadmap {
    id: str_field(doc, "id").unwrap_or_else(|| default_roadmap_id(&req.topic, req.duration_weeks)),
    title: str_field(doc, "title").unwrap_or_else(|| format!("{} Roadmap", req.topic)),
    skill: str_field(doc, "skill").unwrap_or_else(|| slugify(&req.topic)),
    level: req.level,
    description: str_field(doc, "description").unwrap_or_else(|| {
      format!("A {}-week {} roadmap for {}.", req.duration_weeks, req.level, req.topic)
    }),
    duration_weeks: req.duration_weeks,
    hours_per_week: req.hours_per_week,
    target_outcome: str_field(doc, "target_outcome")
      .or_else(|| req.target_goal.clone())
      .unwrap_or_default(),
    prerequisites: text_or_list(doc, "prerequisites").unwrap_or_default(),
    total_xp: 0,
    phases,
  })
}

/// `cursor` is the first week not yet claimed by an earlier phase; it seeds
/// week numbers the planner left out.
fn phase_from(p: &Map<String, Value>, idx: usize, duration: u32, cursor: &mut u32) -> Phase {
  let n = idx as u32 + 1;
  let timeline = object_field(p, "timeline");
  let start_week = u32_field(p, "start_week")
    .or_else(|| timeline.and_then(|t| u32_field(t, "start_week")))
    .unwrap_or(*cursor)
    .clamp(1, duration.max(1));
  let declared_end = u32_field(p, "end_week")
    .or_else(|| timeline.and_then(|t| u32_field(t, "end_week")));
  let name = str_field(p, "name").unwrap_or_else(|| format!("Phase {n}"));
  let goal = str_field(p, "goal").unwrap_or_default();

  let mut weeks: Vec<Week> = array_field(p, "weeks")
    .iter()
    .filter_map(Value::as_object)
    .enumerate()
    .map(|(i, w)| week_from(w, start_week.saturating_add(i as u32)))
    .collect();

  // Phase given only as a range: lay out one week per number so it can still be expanded.
  if weeks.is_empty() {
    let end = declared_end
      .or_else(|| u32_field(p, "duration_weeks").map(|d| start_week.saturating_add(d.max(1) - 1)))
      .unwrap_or(start_week)
      .clamp(start_week, duration.max(start_week));
    weeks = (start_week..=end)
      .map(|number| Week {
        week_number: number,
        theme: format!("{name} (week {})", number - start_week + 1),
        outcome: goal.clone(),
        ..Week::default()
      })
      .collect();
  }

  let last = weeks.iter().map(|w| w.week_number).max().unwrap_or(start_week);
  let end_week = declared_end.unwrap_or(last);
  *cursor = end_week.max(last).saturating_add(1);

  Phase {
    id: str_field(p, "id").unwrap_or_else(|| format!("phase-{n}")),
    name,
    order: u32_field(p, "order").unwrap_or(n),
    goal,
    start_week,
    end_week,
    milestone_summary: str_field(p, "milestone_summary").unwrap_or_default(),
    phase_xp: 0,
    weeks,
  }
}

fn week_from(w: &Map<String, Value>, fallback_number: u32) -> Week {
  let week_number = u32_field(w, "week_number").unwrap_or(fallback_number);
  Week {
    week_number,
    theme: str_field(w, "theme").unwrap_or_else(|| format!("Week {week_number}")),
    outcome: str_field(w, "outcome").unwrap_or_default(),
    summary: str_field(w, "summary").unwrap_or_default(),
    ..Week::default()
  }
}

/// Coverage of 1..=duration is the planner's job; we only report drift.
fn warn_on_week_gaps(roadmap: &Roadmap) {
  let seen: BTreeSet<u32> = roadmap.weeks().map(|w| w.week_number).collect();
  let listed = roadmap.weeks().count();
  let expected: BTreeSet<u32> = (1..=roadmap.duration_weeks).collect();
  if seen != expected || listed != seen.len() {
    let missing: Vec<u32> = expected.difference(&seen).copied().collect();
    warn!(target: "roadmap", duration = roadmap.duration_weeks, listed, ?missing, "Skeleton weeks do not cover the duration exactly once");
  }
}

//! Loading agent configuration (prompts, roadmap pipeline settings, catalog) from TOML.
//!
//! See `AgentConfig`, `Prompts` and `RoadmapSettings` for the expected schema.
//! Every section is optional; missing keys fall back to the defaults below.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::CatalogCard;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub roadmap: RoadmapSettings,
  #[serde(default)]
  pub catalog: Vec<CatalogCard>,
}

/// Knobs for the roadmap pipeline: fan-out width, per-call timeouts, sampling.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RoadmapSettings {
  /// Max week-expansion calls in flight at once.
  pub expand_concurrency: usize,
  pub plan_timeout_secs: u64,
  pub expand_timeout_secs: u64,
  pub plan_temperature: f32,
  pub expand_temperature: f32,
  pub plan_max_tokens: u32,
  pub expand_max_tokens: u32,
  pub default_duration_weeks: u32,
  pub default_hours_per_week: u32,
}

impl Default for RoadmapSettings {
  fn default() -> Self {
    Self {
      expand_concurrency: 4,
      plan_timeout_secs: 90,
      expand_timeout_secs: 60,
      plan_temperature: 0.35,
      expand_temperature: 0.4,
      plan_max_tokens: 4000,
      expand_max_tokens: 2500,
      default_duration_weeks: 16,
      default_hours_per_week: 10,
    }
  }
}

impl RoadmapSettings {
  pub fn plan_timeout(&self) -> Duration { Duration::from_secs(self.plan_timeout_secs) }
  pub fn expand_timeout(&self) -> Duration { Duration::from_secs(self.expand_timeout_secs) }
}

/// Prompts used against the completion service. Placeholders use `{name}` syntax.
/// Override them in TOML to tune tone or structure.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Roadmap skeleton (strong tier)
  pub planner_system: String,
  pub planner_user_template: String,
  // Week expansion (fast tier)
  pub expander_system: String,
  pub expander_user_template: String,
  // Tutor chat
  pub tutor_system: String,
  // MCQ generation
  pub mcq_system: String,
  pub mcq_user_template: String,
}

const PLANNER_USER_TEMPLATE: &str = r#"Create a learning roadmap SKELETON for this learner:

- Topic/Skill: {topic}
- Level: {level}
- Total duration: exactly {duration_weeks} weeks
- Time per week: {hours_per_week} hours
- Learner background: {learner_background}
- Target goal: {target_goal}

Split the {duration_weeks} weeks into ordered phases. Every week number from 1 to {duration_weeks}
must appear exactly once across all phases, in order. Give each week a theme, an outcome and a
one-sentence summary. Do NOT include days, tasks or resources; those are planned later.

Return a SINGLE JSON OBJECT shaped like this example:

{
  "id": "web-dev-complete-beginner",
  "title": "Web Development for Complete Beginners",
  "skill": "web-development",
  "level": "beginner",
  "description": "Short overview of the roadmap.",
  "duration_weeks": 12,
  "hours_per_week": 10,
  "target_outcome": "What the learner can do at the end.",
  "prerequisites": "What they should know before starting.",
  "phases": [
    {
      "id": "phase-1",
      "name": "Foundations",
      "order": 1,
      "goal": "What this phase focuses on.",
      "start_week": 1,
      "end_week": 4,
      "milestone_summary": "One-sentence milestone.",
      "weeks": [
        { "week_number": 1, "theme": "HTML basics", "outcome": "Build a static page.", "summary": "Tags, structure and semantics." }
      ]
    }
  ]
}

IMPORTANT:
- Respond ONLY with the JSON object.
- No explanations, markdown, code fences or commentary.
- The response must START with '{' and END with '}'."#;

const EXPANDER_USER_TEMPLATE: &str = r#"Expand ONE week of a {level} roadmap on "{topic}" into daily tasks.

- Week number: {week_number}
- Theme: {theme}
- Weekly outcome: {outcome}
- Summary: {summary}
- Time budget: {hours_per_week} hours for the whole week

Rules:
- Typically 5 days, numbered from 1.
- Each day has learn_items, practice_items, project_items and reflection_items.
- Every item has a non-negative integer "xp" and "completed": false.
- Learn items may carry a "resource" with title, url, provider and type.
- Each day's "xp_reward" MUST equal the sum of its own items' xp.
- "week_xp" MUST equal the sum of the days' xp_reward.
- Every "completed" flag is false.
- Optionally add 2-4 "quiz_questions" and a few "weekly_resources".

Return a SINGLE JSON OBJECT shaped like this example:

{
  "week_number": {week_number},
  "week_xp": 60,
  "quiz_questions": ["..."],
  "weekly_resources": [{ "title": "...", "url": "https://...", "provider": "...", "type": "docs" }],
  "days": [
    {
      "day_number": 1,
      "title": "...",
      "time_estimate_hours": 2,
      "xp_reward": 60,
      "completed": false,
      "learn_items": [{ "description": "...", "xp": 20, "completed": false, "resource": { "title": "...", "url": "https://...", "provider": "...", "type": "video" } }],
      "practice_items": [{ "description": "...", "xp": 20, "completed": false }],
      "project_items": [{ "description": "...", "xp": 15, "completed": false }],
      "reflection_items": [{ "description": "...", "xp": 5, "completed": false }]
    }
  ]
}

Respond ONLY with the JSON object. No markdown, no commentary."#;

impl Default for Prompts {
  fn default() -> Self {
    Self {
      planner_system: "You are an expert curriculum designer. You output strict JSON only.".into(),
      planner_user_template: PLANNER_USER_TEMPLATE.into(),
      expander_system: "You are a meticulous study planner who turns a weekly theme into daily tasks with exact XP arithmetic. You output strict JSON only.".into(),
      expander_user_template: EXPANDER_USER_TEMPLATE.into(),
      tutor_system: "You are EduAi, a friendly, adaptive AI mentor who simplifies complex topics.".into(),
      mcq_system: "You write clear multiple-choice questions for learners. You output strict JSON only.".into(),
      mcq_user_template: "Create {count} multiple-choice questions for topic '{topic}' at {difficulty} difficulty. For each question give 4 choices, mark the correct answer index (0-3), and a 1-2 sentence explanation. Return JSON ONLY in this format: {\"questions\": [{\"question\":\"...\",\"choices\":[\"a\",\"b\",\"c\",\"d\"],\"answer_index\":0,\"explanation\":\"...\"}]}".into(),
    }
  }
}

/// Load `AgentConfig` from a TOML file. On any parsing/IO error, returns None.
pub fn load_agent_config(path: &Path) -> Option<AgentConfig> {
  let shown = path.display().to_string();
  match std::fs::read_to_string(path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "eduai_backend", path = %shown, "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "eduai_backend", path = %shown, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "eduai_backend", path = %shown, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

/// Attempt to load `AgentConfig` from EDUAI_CONFIG_PATH.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("EDUAI_CONFIG_PATH").ok()?;
  load_agent_config(Path::new(&path))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn partial_toml_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
      file,
      r#"
[roadmap]
expand_concurrency = 8

[prompts]
tutor_system = "Be brief."

[[catalog]]
id = 7
title = "Rust in Practice"
"#
    )
    .unwrap();

    let cfg = load_agent_config(file.path()).expect("config should load");
    assert_eq!(cfg.roadmap.expand_concurrency, 8);
    assert_eq!(cfg.roadmap.plan_timeout_secs, 90);
    assert_eq!(cfg.prompts.tutor_system, "Be brief.");
    assert!(cfg.prompts.planner_user_template.contains("{duration_weeks}"));
    assert_eq!(cfg.catalog.len(), 1);
    assert_eq!(cfg.catalog[0].xp, 0);
  }

  #[test]
  fn invalid_toml_yields_none() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[roadmap\nexpand_concurrency = ").unwrap();
    assert!(load_agent_config(file.path()).is_none());
    assert!(load_agent_config(Path::new("/definitely/not/here.toml")).is_none());
  }
}

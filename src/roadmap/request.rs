//! Validation of incoming roadmap requests.

use serde_json::Value;

use crate::config::RoadmapSettings;
use crate::domain::Level;
use crate::error::RoadmapError;
use crate::protocol::RoadmapGenerateIn;

pub const MIN_DURATION_WEEKS: u32 = 12;
pub const MAX_DURATION_WEEKS: u32 = 52;

/// A validated, clamped roadmap request. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct RoadmapRequest {
  pub topic: String,
  pub level: Level,
  pub duration_weeks: u32,
  pub hours_per_week: u32,
  pub learner_background: Option<String>,
  pub target_goal: Option<String>,
}

impl RoadmapRequest {
  /// Validate raw input. Duration is clamped to [12, 52], hours to at least 1.
  pub fn validate(input: &RoadmapGenerateIn, settings: &RoadmapSettings) -> Result<Self, RoadmapError> {
    let topic = input.topic.trim();
    if topic.is_empty() {
      return Err(RoadmapError::Validation("topic must not be empty".into()));
    }

    let level = match input.level.as_deref().map(str::trim) {
      None | Some("") => Level::default(),
      Some(s) => Level::parse(s).ok_or_else(|| {
        RoadmapError::Validation(format!("level must be beginner, intermediate or advanced (got '{s}')"))
      })?,
    };

    let duration = whole_number("duration_weeks", input.duration_weeks.as_ref())?
      .unwrap_or(settings.default_duration_weeks as i64);
    let hours = whole_number("hours_per_week", input.hours_per_week.as_ref())?
      .unwrap_or(settings.default_hours_per_week as i64);

    Ok(Self {
      topic: topic.to_string(),
      level,
      duration_weeks: duration.clamp(MIN_DURATION_WEEKS as i64, MAX_DURATION_WEEKS as i64) as u32,
      hours_per_week: hours.clamp(1, u32::MAX as i64) as u32,
      learner_background: non_blank(input.learner_background.as_deref()),
      target_goal: non_blank(input.target_goal.as_deref()),
    })
  }
}

fn non_blank(s: Option<&str>) -> Option<String> {
  s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Integer from a JSON number, integral float or numeric string. `Ok(None)` when absent.
fn whole_number(name: &str, v: Option<&Value>) -> Result<Option<i64>, RoadmapError> {
  let invalid = || RoadmapError::Validation(format!("{name} must be a whole number"));
  let f = match v {
    None | Some(Value::Null) => return Ok(None),
    Some(Value::Number(n)) => match n.as_i64() {
      Some(i) => return Ok(Some(i)),
      None => n.as_f64().ok_or_else(invalid)?,
    },
    Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
    Some(_) => return Err(invalid()),
  };
  if !f.is_finite() || f.fract() != 0.0 {
    return Err(invalid());
  }
  Ok(Some(f.clamp(i64::MIN as f64, i64::MAX as f64) as i64))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn input(v: Value) -> RoadmapGenerateIn {
    serde_json::from_value(v).unwrap()
  }

  fn validate(v: Value) -> Result<RoadmapRequest, RoadmapError> {
    RoadmapRequest::validate(&input(v), &RoadmapSettings::default())
  }

  #[test]
  fn duration_is_clamped_into_range() {
    let r = validate(json!({ "topic": "Linear Algebra", "duration_weeks": 4, "hours_per_week": 5 })).unwrap();
    assert_eq!(r.duration_weeks, 12);
    assert_eq!(r.hours_per_week, 5);
    assert_eq!(validate(json!({ "topic": "x", "duration_weeks": 80 })).unwrap().duration_weeks, 52);
    assert_eq!(validate(json!({ "topic": "x", "duration_weeks": -3 })).unwrap().duration_weeks, 12);
    assert_eq!(validate(json!({ "topic": "x", "duration_weeks": "20" })).unwrap().duration_weeks, 20);
    assert_eq!(validate(json!({ "topic": "x", "duration_weeks": 30.0 })).unwrap().duration_weeks, 30);
  }

  #[test]
  fn defaults_apply_when_fields_absent() {
    let r = validate(json!({ "topic": "  Rust  ", "level": null, "learner_background": "  " })).unwrap();
    assert_eq!(r.topic, "Rust");
    assert_eq!(r.level, Level::Beginner);
    assert_eq!(r.duration_weeks, 16);
    assert_eq!(r.hours_per_week, 10);
    assert_eq!(r.learner_background, None);
  }

  #[test]
  fn hours_have_a_floor_of_one() {
    assert_eq!(validate(json!({ "topic": "x", "hours_per_week": 0 })).unwrap().hours_per_week, 1);
  }

  #[test]
  fn invalid_inputs_are_rejected() {
    assert!(matches!(validate(json!({ "topic": "   " })), Err(RoadmapError::Validation(_))));
    assert!(matches!(validate(json!({ "topic": "x", "duration_weeks": "twelve" })), Err(RoadmapError::Validation(_))));
    assert!(matches!(validate(json!({ "topic": "x", "duration_weeks": 12.5 })), Err(RoadmapError::Validation(_))));
    assert!(matches!(validate(json!({ "topic": "x", "duration_weeks": [12] })), Err(RoadmapError::Validation(_))));
    assert!(matches!(validate(json!({ "topic": "x", "level": "expert" })), Err(RoadmapError::Validation(_))));
  }

  #[test]
  fn level_is_case_insensitive() {
    assert_eq!(validate(json!({ "topic": "x", "level": "Advanced" })).unwrap().level, Level::Advanced);
  }
}

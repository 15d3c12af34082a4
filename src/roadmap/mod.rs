//! Roadmap generation pipeline.
//!
//! plan (strong tier, one call) -> expand every week (fast tier, bounded fan-out)
//! -> aggregate XP. A planner failure aborts the request; an expander failure
//! only leaves its own week without days.

pub mod aggregate;
pub mod expander;
pub mod lenient;
pub mod markdown;
pub mod planner;
pub mod request;

use futures::stream::{self, StreamExt};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::ai::CompletionService;
use crate::config::{Prompts, RoadmapSettings};
use crate::domain::Roadmap;
use crate::error::RoadmapError;

use aggregate::aggregate;
use expander::{expand_week, WeekContext, WeekExpansion};
use planner::plan_skeleton;

pub use markdown::render_markdown;
pub use request::RoadmapRequest;

/// Generate a complete roadmap. At most `expand_concurrency` expander calls
/// are in flight; each task owns exactly one (phase, week) slot, so results
/// are written back without shared mutable state.
pub async fn generate_roadmap(
  ai: &dyn CompletionService,
  prompts: &Prompts,
  settings: &RoadmapSettings,
  req: &RoadmapRequest,
) -> Result<Roadmap, RoadmapError> {
  let generation_id = Uuid::new_v4();
  let span = info_span!("generate_roadmap", %generation_id, topic = %req.topic, weeks = req.duration_weeks);
  run_pipeline(ai, prompts, settings, req).instrument(span).await
}

async fn run_pipeline(
  ai: &dyn CompletionService,
  prompts: &Prompts,
  settings: &RoadmapSettings,
  req: &RoadmapRequest,
) -> Result<Roadmap, RoadmapError> {
  let start = std::time::Instant::now();
  let mut roadmap = plan_skeleton(ai, prompts, settings, req).await?;

  let targets: Vec<(usize, usize, WeekContext)> = roadmap
    .phases
    .iter()
    .enumerate()
    .flat_map(|(pi, phase)| {
      phase
        .weeks
        .iter()
        .enumerate()
        .map(move |(wi, week)| (pi, wi, WeekContext::new(req, week)))
    })
    .collect();
  let total = targets.len();

  let results: Vec<(usize, usize, u32, Result<WeekExpansion, RoadmapError>)> = stream::iter(targets)
    .map(|(pi, wi, ctx)| async move {
      let out = expand_week(ai, prompts, settings, &ctx).await;
      (pi, wi, ctx.week_number, out)
    })
    .buffer_unordered(settings.expand_concurrency.max(1))
    .collect()
    .await;

  let mut failed = 0usize;
  for (pi, wi, week_number, out) in results {
    let Some(week) = roadmap.phases.get_mut(pi).and_then(|p| p.weeks.get_mut(wi)) else { continue };
    match out {
      Ok(expansion) => expansion.apply_to(week),
      Err(e) => {
        failed += 1;
        warn!(target: "roadmap", topic = %req.topic, week_number, error = %e, "Week left without daily detail");
        week.days.clear();
        week.week_xp = 0;
      }
    }
  }

  aggregate(&mut roadmap);
  info!(
    target: "roadmap",
    weeks = total,
    expanded = total - failed,
    failed,
    total_xp = roadmap.total_xp,
    elapsed = ?start.elapsed(),
    "Roadmap generated"
  );
  Ok(roadmap)
}

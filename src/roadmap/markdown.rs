//! Markdown export of a roadmap, with checkboxes and XP badges.

use std::fmt::Write as _;

use crate::domain::{Day, Item, Phase, Resource, Roadmap, Week};
use crate::roadmap::aggregate::{earned_xp, progress_percent};

const BAR_CELLS: u32 = 20;

fn heading(level: usize, text: &str) -> String {
  format!("{} {}", "#".repeat(level), text)
}

fn resource_label(r: &Resource) -> String {
  let mut label = if r.title.is_empty() { "Resource".to_string() } else { r.title.clone() };
  if let Some(p) = &r.provider { let _ = write!(label, " ({p})"); }
  label
}

fn render_resources(out: &mut Vec<String>, resources: &[Resource]) {
  if resources.is_empty() { return; }
  out.push(heading(5, "📚 Resources"));
  for r in resources {
    let mut label = resource_label(r);
    if let Some(kind) = &r.kind { let _ = write!(label, " [{kind}]"); }
    if r.url.is_empty() {
      out.push(format!("- {label}"));
    } else {
      out.push(format!("- [{label}]({})", r.url));
    }
  }
}

fn render_item(item: &Item) -> String {
  let checkbox = if item.completed { "[x]" } else { "[ ]" };
  let xp = if item.xp > 0 { format!(" _(+{} XP)_", item.xp) } else { String::new() };
  match &item.resource {
    Some(r) if !r.url.is_empty() => {
      format!("- {checkbox} {}{xp} — [{}]({})", item.description, resource_label(r), r.url)
    }
    _ => format!("- {checkbox} {}{xp}", item.description),
  }
}

fn render_day(out: &mut Vec<String>, week_number: u32, day: &Day) {
  let title = if day.title.is_empty() { format!("Day {}", day.day_number) } else { day.title.clone() };
  let checkbox = if day.completed { "☑" } else { "☐" };
  let xp = if day.xp_reward > 0 { format!(" | 🏆 {} XP", day.xp_reward) } else { String::new() };
  out.push(heading(4, &format!("{checkbox} Week {week_number} – Day {}: {title}{xp}", day.day_number)));

  if let Some(hours) = day.time_estimate_hours.filter(|h| *h > 0.0) {
    out.push(format!("⏱️ _~{hours:.1} hours total_"));
  }

  let sections: [(&str, &[Item]); 4] = [
    ("📖 Learn", &day.learn_items),
    ("💪 Practice", &day.practice_items),
    ("🚀 Mini Project / Challenge", &day.project_items),
    ("💭 Reflection", &day.reflection_items),
  ];
  for (label, items) in sections {
    if items.is_empty() { continue; }
    out.push(String::new());
    out.push(heading(5, label));
    out.extend(items.iter().map(render_item));
  }
}

/// Week range from the weeks actually present, else the declared range.
fn week_range(phase: &Phase) -> (u32, u32) {
  let numbers = phase.weeks.iter().map(|w| w.week_number);
  match (numbers.clone().min(), numbers.max()) {
    (Some(lo), Some(hi)) => (lo, hi),
    _ => (phase.start_week.max(1), phase.end_week.max(phase.start_week).max(1)),
  }
}

fn render_week(out: &mut Vec<String>, week: &Week) {
  let progress = progress_percent(&week.days);
  let checkbox = if progress == 100 { "☑" } else { "☐" };
  out.push(heading(3, &format!("{checkbox} Week {} – {} | {progress}%", week.week_number, week.theme)));
  out.push(format!("**Weekly Outcome:** {}", week.outcome));
  out.push(format!("**Week XP:** {} 🏆", week.week_xp));
  if !week.summary.is_empty() {
    out.push(String::new());
    out.push(week.summary.clone());
  }

  let mut days: Vec<&Day> = week.days.iter().collect();
  days.sort_by_key(|d| d.day_number);
  for day in days {
    out.push(String::new());
    render_day(out, week.week_number, day);
  }

  if !week.quiz_questions.is_empty() {
    out.push(String::new());
    out.push(heading(4, "📝 Week Quiz"));
    for (i, q) in week.quiz_questions.iter().enumerate() {
      out.push(format!("{}. {q}", i + 1));
    }
  }

  if !week.weekly_resources.is_empty() {
    out.push(String::new());
    render_resources(out, &week.weekly_resources);
  }
  out.push("\n---\n".into());
}

pub fn render_markdown(roadmap: &Roadmap, topic: &str) -> String {
  let mut out: Vec<String> = Vec::new();
  let earned = earned_xp(roadmap);
  let progress = progress_percent(roadmap.weeks().flat_map(|w| w.days.iter()));

  let title = if roadmap.title.is_empty() { format!("{topic} Roadmap") } else { roadmap.title.clone() };
  out.push(heading(1, &title));
  out.push(String::new());
  out.push(format!("> **Progress:** {progress}% | **XP Earned:** {earned} / {} 🏆", roadmap.total_xp));
  out.push(String::new());

  let filled = ((progress as f64 / 100.0) * BAR_CELLS as f64).round() as u32;
  let filled = filled.min(BAR_CELLS);
  out.push(format!(
    "`{}{}` {progress}%",
    "█".repeat(filled as usize),
    "░".repeat((BAR_CELLS - filled) as usize)
  ));
  out.push(String::new());

  out.push(heading(2, "📋 Overview"));
  out.push(format!("- **Topic:** {topic}"));
  out.push(format!("- **Level:** {}", roadmap.level));
  out.push(format!("- **Duration:** {} weeks", roadmap.duration_weeks));
  out.push(format!("- **Weekly Commitment:** {} hours/week", roadmap.hours_per_week));
  out.push(format!("- **Total XP Available:** {} 🏆", roadmap.total_xp));
  if !roadmap.target_outcome.is_empty() {
    out.push(format!("- **Target Outcome:** {}", roadmap.target_outcome));
  }
  if !roadmap.prerequisites.is_empty() {
    out.push(format!("- **Prerequisites:** {}", roadmap.prerequisites));
  }
  if !roadmap.description.is_empty() {
    out.push(String::new());
    out.push(roadmap.description.clone());
  }
  out.push("\n---\n".into());

  let mut phases: Vec<&Phase> = roadmap.phases.iter().collect();
  phases.sort_by_key(|p| p.order);
  for phase in phases {
    let (start, end) = week_range(phase);
    let range = if start == end { format!("Week {start}") } else { format!("Weeks {start}–{end}") };
    let phase_progress = progress_percent(phase.weeks.iter().flat_map(|w| w.days.iter()));
    out.push(heading(2, &format!("Phase {}: {} ({range}) | {phase_progress}% ⭐", phase.order, phase.name)));
    out.push(format!("**🎯 Phase Goal:** {}", phase.goal));
    out.push(format!("**🏆 Phase XP:** {}", phase.phase_xp));
    if !phase.milestone_summary.is_empty() {
      out.push(format!("**🎖️ Milestone:** {}", phase.milestone_summary));
    }
    out.push(String::new());

    let mut weeks: Vec<&Week> = phase.weeks.iter().collect();
    weeks.sort_by_key(|w| w.week_number);
    for week in weeks {
      render_week(&mut out, week);
    }
  }

  out.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Level;

  fn sample() -> Roadmap {
    let learn = Item {
      description: "Read chapter 1".into(),
      xp: 10,
      completed: true,
      resource: Some(Resource { title: "Strang".into(), url: "https://ocw.mit.edu".into(), provider: Some("MIT".into()), kind: None }),
    };
    let day = Day { day_number: 1, title: "Vectors".into(), time_estimate_hours: Some(1.0), xp_reward: 10, learn_items: vec![learn], ..Day::default() };
    Roadmap {
      title: "LA".into(),
      level: Level::Beginner,
      duration_weeks: 12,
      hours_per_week: 5,
      total_xp: 10,
      phases: vec![
        Phase { name: "Later".into(), order: 2, start_week: 2, end_week: 2, ..Phase::default() },
        Phase {
          name: "Basics".into(),
          order: 1,
          phase_xp: 10,
          weeks: vec![Week {
            week_number: 1,
            theme: "Vectors".into(),
            week_xp: 10,
            quiz_questions: vec!["What is a vector?".into()],
            days: vec![day],
            ..Week::default()
          }],
          ..Phase::default()
        },
      ],
      ..Roadmap::default()
    }
  }

  #[test]
  fn renders_progress_items_and_resources() {
    let md = render_markdown(&sample(), "Linear Algebra");
    assert!(md.starts_with("# LA\n"));
    assert!(md.contains("**XP Earned:** 10 / 10"));
    assert!(md.contains("`░░░░░░░░░░░░░░░░░░░░` 0%"));
    assert!(md.contains("- [x] Read chapter 1 _(+10 XP)_ — [Strang (MIT)](https://ocw.mit.edu)"));
    assert!(md.contains("⏱️ _~1.0 hours total_"));
    assert!(md.contains("1. What is a vector?"));
    assert!(md.contains("#### ☐ Week 1 – Day 1: Vectors | 🏆 10 XP"));
  }

  #[test]
  fn huge_client_xp_values_render() {
    let mut r = sample();
    let week = &mut r.phases[1].weeks[0];
    let mut big = week.days[0].clone();
    big.completed = true;
    big.xp_reward = 4_000_000_000;
    week.days = vec![big.clone(), big];
    let md = render_markdown(&r, "Linear Algebra");
    assert!(md.contains(&format!("**XP Earned:** {} / 10", u32::MAX)));
  }

  #[test]
  fn phases_are_ordered_and_ranges_inferred() {
    let md = render_markdown(&sample(), "Linear Algebra");
    let basics = md.find("Phase 1: Basics (Week 1)").unwrap();
    let later = md.find("Phase 2: Later (Week 2)").unwrap();
    assert!(basics < later);
  }
}

//! XP roll-up and progress figures. Pure and local.

use crate::domain::{Day, Roadmap};

/// phase_xp = Σ week_xp of its weeks; total_xp = Σ phase_xp.
/// Week totals are trusted as reported, not re-derived from days or items.
pub fn aggregate(roadmap: &mut Roadmap) {
  for phase in &mut roadmap.phases {
    phase.phase_xp = phase.weeks.iter().fold(0u32, |acc, w| acc.saturating_add(w.week_xp));
  }
  roadmap.total_xp = roadmap.phases.iter().fold(0u32, |acc, p| acc.saturating_add(p.phase_xp));
}

/// XP a learner has collected: a completed day counts its full reward,
/// otherwise only its completed items count.
pub fn earned_xp(roadmap: &Roadmap) -> u32 {
  roadmap
    .weeks()
    .flat_map(|w| w.days.iter())
    .map(|day| {
      if day.completed {
        day.xp_reward
      } else {
        day.items().filter(|i| i.completed).fold(0u32, |acc, i| acc.saturating_add(i.xp))
      }
    })
    .fold(0u32, u32::saturating_add)
}

/// Rounded share of completed days, 0 when there are none.
pub fn progress_percent<'a>(days: impl IntoIterator<Item = &'a Day>) -> u32 {
  let (total, done) = days
    .into_iter()
    .fold((0u32, 0u32), |(t, c), d| (t.saturating_add(1), c.saturating_add(d.completed as u32)));
  if total == 0 {
    0
  } else {
    ((done as f64 / total as f64) * 100.0).round() as u32
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Item, Phase, Week};

  fn week(n: u32, xp: u32, days: Vec<Day>) -> Week {
    Week { week_number: n, week_xp: xp, days, ..Week::default() }
  }

  fn day(xp: u32, completed: bool, items: &[(u32, bool)]) -> Day {
    Day {
      xp_reward: xp,
      completed,
      practice_items: items
        .iter()
        .map(|&(xp, completed)| Item { description: "x".into(), xp, completed, resource: None })
        .collect(),
      ..Day::default()
    }
  }

  #[test]
  fn totals_roll_up_from_week_xp() {
    let mut r = Roadmap {
      phases: vec![
        Phase { weeks: vec![week(1, 100, vec![]), week(2, 0, vec![])], phase_xp: 999, ..Phase::default() },
        Phase { weeks: vec![week(3, 250, vec![])], ..Phase::default() },
        Phase::default(),
      ],
      ..Roadmap::default()
    };
    aggregate(&mut r);
    let phase_xp: Vec<u32> = r.phases.iter().map(|p| p.phase_xp).collect();
    assert_eq!(phase_xp, vec![100, 250, 0]);
    assert_eq!(r.total_xp, 350);
  }

  #[test]
  fn week_xp_is_trusted_over_day_sums() {
    let mut r = Roadmap {
      phases: vec![Phase { weeks: vec![week(1, 10, vec![day(40, false, &[])])], ..Phase::default() }],
      ..Roadmap::default()
    };
    aggregate(&mut r);
    assert_eq!(r.total_xp, 10);
  }

  #[test]
  fn earned_xp_counts_completed_days_and_items() {
    let r = Roadmap {
      phases: vec![Phase {
        weeks: vec![week(1, 0, vec![
          day(50, true, &[(10, false)]),
          day(30, false, &[(10, true), (20, false)]),
        ])],
        ..Phase::default()
      }],
      ..Roadmap::default()
    };
    assert_eq!(earned_xp(&r), 60);
  }

  #[test]
  fn earned_xp_saturates_on_huge_rewards() {
    let r = Roadmap {
      phases: vec![Phase {
        weeks: vec![week(1, 0, vec![
          day(4_000_000_000, true, &[]),
          day(4_000_000_000, true, &[]),
          day(0, false, &[(u32::MAX, true), (u32::MAX, true)]),
        ])],
        ..Phase::default()
      }],
      ..Roadmap::default()
    };
    assert_eq!(earned_xp(&r), u32::MAX);
  }

  #[test]
  fn progress_rounds_and_handles_empty() {
    assert_eq!(progress_percent(&Vec::<Day>::new()), 0);
    let days = vec![day(0, true, &[]), day(0, false, &[]), day(0, false, &[])];
    assert_eq!(progress_percent(&days), 33);
  }
}

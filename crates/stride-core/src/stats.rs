//! The stats engine — pure window arithmetic over the ledger.
//!
//! Backends gather `(active goal count, completed instance dates)` and
//! call into here; no storage types leak in.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{goal::Goal, instance::DailyInstance};

// ─── Window ──────────────────────────────────────────────────────────────────

/// A stats aggregation period anchored at "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
  Day,
  Week,
  Month,
}

impl Window {
  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "day" => Some(Self::Day),
      "week" => Some(Self::Week),
      "month" => Some(Self::Month),
      _ => None,
    }
  }

  /// Does `date` fall in this window, anchored at `today`?
  ///
  /// Day: same calendar day. Week: same ISO week (and ISO week-year).
  /// Month: same calendar year and month.
  pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
    match self {
      Self::Day => date == today,
      Self::Week => date.iso_week() == today.iso_week(),
      Self::Month => {
        date.year() == today.year() && date.month() == today.month()
      }
    }
  }

  /// Goal-count multiplier: total models "possible completions in the
  /// window", not "number of goals".
  pub fn scale(&self, today: NaiveDate) -> u32 {
    match self {
      Self::Day => 1,
      Self::Week => 7,
      Self::Month => days_in_month(today),
    }
  }
}

/// Number of days in the month containing `day`.
pub fn days_in_month(day: NaiveDate) -> u32 {
  let (year, month) = (day.year(), day.month());
  let (next_year, next_month) =
    if month == 12 { (year + 1, 1) } else { (year, month + 1) };
  NaiveDate::from_ymd_opt(next_year, next_month, 1)
    .and_then(|first| first.pred_opt())
    .map(|last| last.day())
    .unwrap_or(30)
}

// ─── Aggregates ──────────────────────────────────────────────────────────────

/// Completion counts for one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowStats {
  pub window:    Window,
  pub completed: u32,
  pub total:     u32,
}

/// Compute stats for `window`: `completed` counts the given completion
/// dates that fall in the window, `total` scales the active goal count.
pub fn compute(
  active_goals: usize,
  completed_dates: impl IntoIterator<Item = NaiveDate>,
  window: Window,
  today: NaiveDate,
) -> WindowStats {
  let completed = completed_dates
    .into_iter()
    .filter(|d| window.contains(*d, today))
    .count() as u32;
  WindowStats {
    window,
    completed,
    total: active_goals as u32 * window.scale(today),
  }
}

/// One active goal paired with its completion state for today.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayEntry {
  pub goal:      Goal,
  pub completed: bool,
}

/// An active goal with today's instance, if one has been materialised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalToday {
  pub goal:           Goal,
  pub today_instance: Option<DailyInstance>,
}

/// The composed dashboard read: three window aggregates plus the
/// per-goal state for today. Assembled atomically by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
  pub day:   WindowStats,
  pub week:  WindowStats,
  pub month: WindowStats,
  pub today: Vec<TodayEntry>,
}

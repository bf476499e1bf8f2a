//! DailyInstance — the per-calendar-day completion record for a goal.
//!
//! Instances are materialised lazily: the first read or write for a
//! `(goal, date)` pair creates the row. At most one instance exists per
//! pair, and instances are never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One goal-day. `target_value` is a point-in-time snapshot taken from
/// the goal at creation; later goal edits do not change past instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyInstance {
  pub id:              Uuid,
  pub goal_id:         Uuid,
  pub user_id:         Uuid,
  /// Calendar day — no time-of-day component exists by construction.
  pub date:            NaiveDate,
  pub target_value:    Option<f64>,
  pub completed_value: Option<f64>,
  pub is_completed:    bool,
  /// Set exactly when `is_completed` transitions false → true; cleared
  /// on true → false. Re-sending `true` does not refresh it.
  pub completed_at:    Option<DateTime<Utc>>,
  pub created_at:      DateTime<Utc>,
}

/// Partial update: only present fields apply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstancePatch {
  pub completed_value: Option<f64>,
  pub is_completed:    Option<bool>,
}

impl DailyInstance {
  /// Apply a patch in place, running the `completed_at` state machine.
  pub fn apply(&mut self, patch: &InstancePatch, now: DateTime<Utc>) {
    if let Some(value) = patch.completed_value {
      self.completed_value = Some(value);
    }
    if let Some(done) = patch.is_completed {
      self.set_completed(done, now);
    }
  }

  /// The completion state machine:
  ///
  /// ```text
  /// [uncompleted, None]    --true-->  [completed, Some(now)]
  /// [completed, Some(t)]   --true-->  [completed, Some(t)]    (no change)
  /// [completed, Some(t)]   --false--> [uncompleted, None]
  /// [uncompleted, *]       --false--> [uncompleted, None]     (no-op)
  /// ```
  pub fn set_completed(&mut self, done: bool, now: DateTime<Utc>) {
    self.is_completed = done;
    if done {
      if self.completed_at.is_none() {
        self.completed_at = Some(now);
      }
    } else {
      self.completed_at = None;
    }
  }
}

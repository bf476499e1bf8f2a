//! Goal — a user-defined habit/target definition.
//!
//! Goals are never hard-deleted; `is_active = false` marks a soft
//! delete so historical daily instances stay queryable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// How completion of a goal is measured.
///
/// Immutable after creation — there is deliberately no way to patch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
  /// Done / not done.
  Boolean,
  /// A measured quantity against `target_value` (e.g. 8 glasses).
  Numeric,
  /// A measured duration against `target_value` (e.g. 30 minutes).
  Duration,
}

impl GoalType {
  /// Parse the wire discriminant. Unrecognized strings are a
  /// validation error, mirroring goal creation checks.
  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "boolean" => Ok(Self::Boolean),
      "numeric" => Ok(Self::Numeric),
      "duration" => Ok(Self::Duration),
      other => Err(Error::UnknownGoalType(other.to_string())),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Boolean => "boolean",
      Self::Numeric => "numeric",
      Self::Duration => "duration",
    }
  }
}

/// A goal definition owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
  pub id:           Uuid,
  pub user_id:      Uuid,
  pub title:        String,
  pub description:  Option<String>,
  pub goal_type:    GoalType,
  /// Target for numeric/duration goals; unitless for boolean goals.
  pub target_value: Option<f64>,
  pub unit:         Option<String>,
  pub is_active:    bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::GoalStore::create_goal`].
/// `id`, `is_active` and the timestamps are always set by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewGoal {
  pub title:        String,
  pub description:  Option<String>,
  pub goal_type:    GoalType,
  pub target_value: Option<f64>,
  pub unit:         Option<String>,
}

impl NewGoal {
  /// Creation-time validation shared by all backends.
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::TitleRequired);
    }
    Ok(())
  }
}

/// Partial update: only present fields overwrite. `goal_type` is
/// absent by design — the type is immutable after creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoalPatch {
  pub title:        Option<String>,
  pub description:  Option<String>,
  pub target_value: Option<f64>,
  pub unit:         Option<String>,
  pub is_active:    Option<bool>,
}

impl Goal {
  /// Apply a patch in place and stamp `updated_at`.
  pub fn apply(&mut self, patch: &GoalPatch, now: DateTime<Utc>) {
    if let Some(title) = &patch.title {
      self.title = title.clone();
    }
    if let Some(description) = &patch.description {
      self.description = Some(description.clone());
    }
    if let Some(target) = patch.target_value {
      self.target_value = Some(target);
    }
    if let Some(unit) = &patch.unit {
      self.unit = Some(unit.clone());
    }
    if let Some(active) = patch.is_active {
      self.is_active = active;
    }
    self.updated_at = now;
  }
}

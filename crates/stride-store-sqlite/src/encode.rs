//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar days are `YYYY-MM-DD`,
//! UUIDs are hyphenated lowercase strings. Decode failures mean a
//! corrupt row and surface as [`Error::Storage`].

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use stride_core::{
  Error, Result,
  goal::{Goal, GoalType},
  instance::DailyInstance,
  user::{User, UserCredentials},
};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(|e| Error::Storage(format!("bad uuid {s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Storage(format!("bad timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Storage(format!("bad date {s:?}: {e}")))
}

pub fn decode_goal_type(s: &str) -> Result<GoalType> {
  GoalType::parse(s)
    .map_err(|_| Error::Storage(format!("bad goal type {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `goals` row.
pub struct RawGoal {
  pub id:           String,
  pub user_id:      String,
  pub title:        String,
  pub description:  Option<String>,
  pub goal_type:    String,
  pub target_value: Option<f64>,
  pub unit:         Option<String>,
  pub is_active:    bool,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawGoal {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      user_id:      row.get(1)?,
      title:        row.get(2)?,
      description:  row.get(3)?,
      goal_type:    row.get(4)?,
      target_value: row.get(5)?,
      unit:         row.get(6)?,
      is_active:    row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
    })
  }

  pub fn into_goal(self) -> Result<Goal> {
    Ok(Goal {
      id:           decode_uuid(&self.id)?,
      user_id:      decode_uuid(&self.user_id)?,
      title:        self.title,
      description:  self.description,
      goal_type:    decode_goal_type(&self.goal_type)?,
      target_value: self.target_value,
      unit:         self.unit,
      is_active:    self.is_active,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `daily_instances` row.
pub struct RawInstance {
  pub id:              String,
  pub goal_id:         String,
  pub user_id:         String,
  pub date:            String,
  pub target_value:    Option<f64>,
  pub completed_value: Option<f64>,
  pub is_completed:    bool,
  pub completed_at:    Option<String>,
  pub created_at:      String,
}

impl RawInstance {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      goal_id:         row.get(1)?,
      user_id:         row.get(2)?,
      date:            row.get(3)?,
      target_value:    row.get(4)?,
      completed_value: row.get(5)?,
      is_completed:    row.get(6)?,
      completed_at:    row.get(7)?,
      created_at:      row.get(8)?,
    })
  }

  pub fn into_instance(self) -> Result<DailyInstance> {
    Ok(DailyInstance {
      id:              decode_uuid(&self.id)?,
      goal_id:         decode_uuid(&self.goal_id)?,
      user_id:         decode_uuid(&self.user_id)?,
      date:            decode_date(&self.date)?,
      target_value:    self.target_value,
      completed_value: self.completed_value,
      is_completed:    self.is_completed,
      completed_at:    self.completed_at.as_deref().map(decode_dt).transpose()?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub id:            String,
  pub email:         String,
  pub username:      String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      email:         row.get(1)?,
      username:      row.get(2)?,
      password_hash: row.get(3)?,
      created_at:    row.get(4)?,
    })
  }

  pub fn into_credentials(self) -> Result<UserCredentials> {
    Ok(UserCredentials {
      user:          User {
        id:         decode_uuid(&self.id)?,
        email:      self.email,
        username:   self.username,
        created_at: decode_dt(&self.created_at)?,
      },
      password_hash: self.password_hash,
    })
  }
}

//! Error types for `stride-core`.
//!
//! One enum covers both storage backends so the HTTP layer can map
//! every failure to a status code without downcasting.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification used by the transport layer for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Bad or missing input — maps to 400.
  Validation,
  /// Entity absent or not owned by the caller's user — maps to 404.
  NotFound,
  /// Duplicate unique identity — maps to 409.
  Conflict,
  /// Backend I/O failure — maps to 500, never retried by the core.
  Storage,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("title is required")]
  TitleRequired,

  #[error("unknown goal type: {0:?}")]
  UnknownGoalType(String),

  #[error("invalid date: {0}")]
  InvalidDate(String),

  #[error("goal not found: {0}")]
  GoalNotFound(Uuid),

  #[error("daily instance not found: {0}")]
  InstanceNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("user already exists: {0}")]
  UserExists(String),

  #[error("storage error: {0}")]
  Storage(String),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::TitleRequired | Self::UnknownGoalType(_) | Self::InvalidDate(_) => {
        ErrorKind::Validation
      }
      Self::GoalNotFound(_)
      | Self::InstanceNotFound(_)
      | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::UserExists(_) => ErrorKind::Conflict,
      Self::Storage(_) => ErrorKind::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

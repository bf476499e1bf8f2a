//! User — the account envelope the auth collaborator resolves requests
//! against. The core itself only ever consumes the resolved `user_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The stored argon2 PHC string never leaves the
/// store through this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:         Uuid,
  pub email:      String,
  pub username:   String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::GoalStore::create_user`]. `password_hash`
/// is an argon2 PHC string produced by the auth layer; the store treats
/// it as opaque.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub username:      String,
  pub password_hash: String,
}

/// A user together with their stored credential hash — returned only to
/// the auth layer for password verification.
#[derive(Debug, Clone)]
pub struct UserCredentials {
  pub user:          User,
  pub password_hash: String,
}

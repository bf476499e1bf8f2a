//! Account registration and the HTTP Basic-auth extractor.
//!
//! Passwords are stored as argon2 PHC strings. Every protected route
//! resolves the acting user through [`CurrentUser`]; the store layer
//! only ever sees the resolved user id.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, request::Parts},
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;
use serde::Deserialize;

use stride_core::{store::GoalStore, user::{NewUser, User}};

use crate::error::ApiError;

// ─── Password hashing ────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}")))
}

fn verify_password(password: &str, phc: &str) -> Result<(), ApiError> {
  let parsed = PasswordHash::new(phc).map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| ApiError::Unauthorized)
}

// ─── Basic-auth extraction ───────────────────────────────────────────────────

fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds =
    String::from_utf8(decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_string(), password.to_string()))
}

/// The authenticated account: present in a handler's signature means
/// the Basic credentials were verified against the stored argon2 hash.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<Arc<S>> for CurrentUser
where
  S: GoalStore + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;

    let creds = state
      .get_user_by_email(&email)
      .await
      .map_err(ApiError::from)?
      .ok_or(ApiError::Unauthorized)?;

    verify_password(&password, &creds.password_hash)?;
    Ok(CurrentUser(creds.user))
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub username: String,
  pub password: String,
}

/// `POST /api/auth/register` — public. Returns 201 + the new user.
pub async fn register<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  if body.email.trim().is_empty()
    || body.username.trim().is_empty()
    || body.password.is_empty()
  {
    return Err(ApiError::BadRequest(
      "email, username, and password are required".to_string(),
    ));
  }

  let user = store
    .create_user(NewUser {
      email:         body.email,
      username:      body.username,
      password_hash: hash_password(&body.password)?,
    })
    .await?;

  tracing::info!(user_id = %user.id, "registered user");
  Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /api/auth/me`
pub async fn me<S>(
  CurrentUser(user): CurrentUser,
  State(_): State<Arc<S>>,
) -> Json<User>
where
  S: GoalStore + Send + Sync + 'static,
{
  Json(user)
}

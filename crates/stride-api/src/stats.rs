//! Handlers for `/api/stats` and `/api/dashboard`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;

use stride_core::{
  stats::{Dashboard, Window, WindowStats},
  store::GoalStore,
};

use crate::{auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct StatsParams {
  pub window: String,
}

/// `GET /api/stats?window=day|week|month`
pub async fn window_stats<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Query(params): Query<StatsParams>,
) -> Result<Json<WindowStats>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  let window = Window::parse(&params.window).ok_or_else(|| {
    ApiError::BadRequest(format!("unknown window: {:?}", params.window))
  })?;
  Ok(Json(store.stats(user.id, window).await?))
}

/// `GET /api/dashboard` — the composed read: three window aggregates
/// plus per-goal completion state for today.
pub async fn dashboard<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
) -> Result<Json<Dashboard>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  Ok(Json(store.dashboard(user.id).await?))
}

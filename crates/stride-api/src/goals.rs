//! Handlers for `/api/goals` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/api/goals` | Active goals, newest first |
//! | `POST`   | `/api/goals` | Body: [`CreateGoalBody`]; 201 |
//! | `GET`    | `/api/goals/today` | Goals with today's instance, if any |
//! | `GET`    | `/api/goals/{id}` | 404 if not found |
//! | `PUT`    | `/api/goals/{id}` | Partial update |
//! | `DELETE` | `/api/goals/{id}` | Soft delete; 204 |
//! | `PUT`    | `/api/goals/{id}/daily` | `?date=YYYY-MM-DD` (default today) |
//! | `POST`   | `/api/goals/{id}/toggle` | Body: `{"done":true}` |
//! | `GET`    | `/api/goals/{id}/history` | `?start_date&end_date` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use stride_core::{
  Error,
  goal::{Goal, GoalPatch, GoalType, NewGoal},
  instance::{DailyInstance, InstancePatch},
  stats::GoalToday,
  store::GoalStore,
};

use crate::{auth::CurrentUser, error::ApiError};

fn parse_date(s: &str) -> Result<NaiveDate, ApiError> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|_| ApiError::from(Error::InvalidDate(s.to_string())))
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Request body for goal creation. `goal_type` stays a string here so
/// an unrecognized discriminant surfaces as a 400 validation error,
/// not a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CreateGoalBody {
  pub title:        String,
  pub description:  Option<String>,
  pub goal_type:    String,
  pub target_value: Option<f64>,
  pub unit:         Option<String>,
}

/// `POST /api/goals`
pub async fn create<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Json(body): Json<CreateGoalBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  let input = NewGoal {
    title:        body.title,
    description:  body.description,
    goal_type:    GoalType::parse(&body.goal_type)?,
    target_value: body.target_value,
    unit:         body.unit,
  };
  let goal = store.create_goal(user.id, input).await?;
  Ok((StatusCode::CREATED, Json(goal)))
}

/// `GET /api/goals`
pub async fn list<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Goal>>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  Ok(Json(store.list_goals(user.id).await?))
}

/// `GET /api/goals/today`
pub async fn today<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<GoalToday>>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  Ok(Json(store.goals_today(user.id).await?))
}

/// `GET /api/goals/{id}`
pub async fn get_one<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Goal>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  Ok(Json(store.get_goal(id, user.id).await?))
}

/// `PUT /api/goals/{id}`
pub async fn update_one<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<GoalPatch>,
) -> Result<Json<Goal>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  Ok(Json(store.update_goal(id, user.id, patch).await?))
}

/// `DELETE /api/goals/{id}` — soft delete.
pub async fn delete_one<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  store.delete_goal(id, user.id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Daily instances ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DailyParams {
  /// `YYYY-MM-DD`; defaults to today (UTC).
  pub date: Option<String>,
}

/// `PUT /api/goals/{id}/daily?date=YYYY-MM-DD`
///
/// Materialises the instance for the date if needed, then applies the
/// patch.
pub async fn update_daily<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<DailyParams>,
  Json(patch): Json<InstancePatch>,
) -> Result<Json<DailyInstance>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  let date = match &params.date {
    Some(s) => parse_date(s)?,
    None => Utc::now().date_naive(),
  };

  let instance = store.get_or_create_instance(id, user.id, date).await?;
  let updated = store.update_instance(instance.id, user.id, patch).await?;
  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct ToggleBody {
  pub done: bool,
}

/// `POST /api/goals/{id}/toggle` — body: `{"done":true}`. Idempotent
/// per observable state.
pub async fn toggle_today<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ToggleBody>,
) -> Result<Json<DailyInstance>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  Ok(Json(store.set_today(user.id, id, body.done).await?))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub start_date: Option<String>,
  pub end_date:   Option<String>,
}

/// `GET /api/goals/{id}/history?start_date=...&end_date=...`
///
/// Defaults: `end_date` today, `start_date` 30 days before the end.
pub async fn history<S>(
  CurrentUser(user): CurrentUser,
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<DailyInstance>>, ApiError>
where
  S: GoalStore + Send + Sync + 'static,
{
  let end = match &params.end_date {
    Some(s) => parse_date(s)?,
    None => Utc::now().date_naive(),
  };
  let start = match &params.start_date {
    Some(s) => parse_date(s)?,
    None => end - Duration::days(30),
  };

  Ok(Json(store.history(id, user.id, start, end).await?))
}

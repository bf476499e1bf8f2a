//! JSON REST API for Stride.
//!
//! Exposes an axum [`Router`] backed by any
//! [`stride_core::store::GoalStore`]. TLS and transport concerns are
//! the caller's responsibility; user resolution happens here via HTTP
//! Basic auth against the store's user table.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = stride_api::router(Arc::new(store));
//! ```

pub mod auth;
pub mod error;
pub mod goals;
pub mod stats;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use serde::Deserialize;

use stride_core::store::GoalStore;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ──────────────────────────────────────────────────────────────────

async fn health() -> &'static str { "OK" }

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router
/// regardless of its own state type.
pub fn router<S>(store: Arc<S>) -> Router<()>
where
  S: GoalStore + Send + Sync + 'static,
{
  Router::new()
    .route("/api/health", get(health))
    // Auth
    .route("/api/auth/register", post(auth::register::<S>))
    .route("/api/auth/me", get(auth::me::<S>))
    // Goal catalog
    .route("/api/goals", get(goals::list::<S>).post(goals::create::<S>))
    .route("/api/goals/today", get(goals::today::<S>))
    .route(
      "/api/goals/{id}",
      get(goals::get_one::<S>)
        .put(goals::update_one::<S>)
        .delete(goals::delete_one::<S>),
    )
    // Instance ledger
    .route("/api/goals/{id}/daily", put(goals::update_daily::<S>))
    .route("/api/goals/{id}/toggle", post(goals::toggle_today::<S>))
    .route("/api/goals/{id}/history", get(goals::history::<S>))
    // Aggregation
    .route("/api/stats", get(stats::window_stats::<S>))
    .route("/api/dashboard", get(stats::dashboard::<S>))
    .with_state(store)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use serde_json::{Value, json};
  use stride_store_memory::MemoryStore;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  fn store() -> Arc<MemoryStore> { Arc::new(MemoryStore::new()) }

  fn basic(email: &str, password: &str) -> String {
    format!("Basic {}", B64.encode(format!("{email}:{password}")))
  }

  async fn send(
    store: Arc<MemoryStore>,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
      Some(json) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let response = router(store).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
  }

  /// Register `alice` and return her Basic auth header.
  async fn register_alice(store: &Arc<MemoryStore>) -> String {
    let (status, _) = send(
      store.clone(),
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "email": "alice@example.com",
        "username": "alice",
        "password": "secret",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    basic("alice@example.com", "secret")
  }

  async fn create_goal(
    store: &Arc<MemoryStore>,
    auth: &str,
    title: &str,
  ) -> String {
    let (status, body) = send(
      store.clone(),
      "POST",
      "/api/goals",
      Some(auth),
      Some(json!({ "title": title, "goal_type": "boolean" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
  }

  // ── Health & auth ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_public() {
    let (status, _) = send(store(), "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn register_then_me() {
    let s = store();
    let auth = register_alice(&s).await;

    let (status, body) =
      send(s, "GET", "/api/auth/me", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["username"], "alice");
    assert!(body.get("password_hash").is_none());
  }

  #[tokio::test]
  async fn duplicate_registration_returns_409() {
    let s = store();
    register_alice(&s).await;

    let (status, _) = send(
      s,
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "email": "alice@example.com",
        "username": "alice",
        "password": "secret",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn register_requires_all_fields() {
    let (status, _) = send(
      store(),
      "POST",
      "/api/auth/register",
      None,
      Some(json!({ "email": "", "username": "x", "password": "y" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn protected_routes_return_401_without_credentials() {
    let s = store();
    let request = Request::builder()
      .method("GET")
      .uri("/api/goals")
      .body(Body::empty())
      .unwrap();
    let response = router(s).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn wrong_password_is_401() {
    let s = store();
    register_alice(&s).await;
    let bad = basic("alice@example.com", "wrong");
    let (status, _) = send(s, "GET", "/api/goals", Some(&bad), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Goal catalog ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn create_and_list_goals() {
    let s = store();
    let auth = register_alice(&s).await;

    let (status, body) = send(
      s.clone(),
      "POST",
      "/api/goals",
      Some(&auth),
      Some(json!({
        "title": "Drink water",
        "goal_type": "numeric",
        "target_value": 8.0,
        "unit": "glasses",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Drink water");
    assert_eq!(body["goal_type"], "numeric");
    assert_eq!(body["is_active"], true);

    let (status, listed) =
      send(s, "GET", "/api/goals", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn empty_title_is_400() {
    let s = store();
    let auth = register_alice(&s).await;
    let (status, body) = send(
      s,
      "POST",
      "/api/goals",
      Some(&auth),
      Some(json!({ "title": " ", "goal_type": "boolean" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("title"));
  }

  #[tokio::test]
  async fn unknown_goal_type_is_400() {
    let s = store();
    let auth = register_alice(&s).await;
    let (status, body) = send(
      s,
      "POST",
      "/api/goals",
      Some(&auth),
      Some(json!({ "title": "Run", "goal_type": "weekly" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("weekly"));
  }

  #[tokio::test]
  async fn missing_goal_is_404() {
    let s = store();
    let auth = register_alice(&s).await;
    let (status, _) = send(
      s,
      "GET",
      &format!("/api/goals/{}", Uuid::new_v4()),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn update_and_soft_delete_goal() {
    let s = store();
    let auth = register_alice(&s).await;
    let id = create_goal(&s, &auth, "Exercise").await;

    let (status, body) = send(
      s.clone(),
      "PUT",
      &format!("/api/goals/{id}"),
      Some(&auth),
      Some(json!({ "title": "Exercise daily" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Exercise daily");

    let (status, _) = send(
      s.clone(),
      "DELETE",
      &format!("/api/goals/{id}"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Gone from the listing, still fetchable by id.
    let (_, listed) =
      send(s.clone(), "GET", "/api/goals", Some(&auth), None).await;
    assert!(listed.as_array().unwrap().is_empty());

    let (status, body) = send(
      s,
      "GET",
      &format!("/api/goals/{id}"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);
  }

  // ── Instance ledger ───────────────────────────────────────────────────

  #[tokio::test]
  async fn toggle_drives_day_stats() {
    let s = store();
    let auth = register_alice(&s).await;
    let id = create_goal(&s, &auth, "Drink water").await;

    let toggle = |done: bool| {
      let s = s.clone();
      let auth = auth.clone();
      let uri = format!("/api/goals/{id}/toggle");
      async move {
        send(s, "POST", &uri, Some(&auth), Some(json!({ "done": done }))).await
      }
    };
    let day_stats = || {
      let s = s.clone();
      let auth = auth.clone();
      async move {
        send(s, "GET", "/api/stats?window=day", Some(&auth), None).await.1
      }
    };

    let (status, body) = toggle(true).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_completed"], true);
    assert_eq!(day_stats().await["completed"], 1);

    // Idempotent second toggle.
    toggle(true).await;
    assert_eq!(day_stats().await["completed"], 1);

    toggle(false).await;
    assert_eq!(day_stats().await["completed"], 0);
  }

  #[tokio::test]
  async fn daily_update_records_value() {
    let s = store();
    let auth = register_alice(&s).await;
    let id = create_goal(&s, &auth, "Read").await;

    let (status, body) = send(
      s,
      "PUT",
      &format!("/api/goals/{id}/daily"),
      Some(&auth),
      Some(json!({ "completed_value": 25.0, "is_completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed_value"], 25.0);
    assert_eq!(body["is_completed"], true);
    assert!(body["completed_at"].is_string());
  }

  #[tokio::test]
  async fn daily_update_rejects_bad_date() {
    let s = store();
    let auth = register_alice(&s).await;
    let id = create_goal(&s, &auth, "Read").await;

    let (status, _) = send(
      s,
      "PUT",
      &format!("/api/goals/{id}/daily?date=03-14-2025"),
      Some(&auth),
      Some(json!({ "is_completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn history_returns_range() {
    let s = store();
    let auth = register_alice(&s).await;
    let id = create_goal(&s, &auth, "Swim").await;

    send(
      s.clone(),
      "POST",
      &format!("/api/goals/{id}/toggle"),
      Some(&auth),
      Some(json!({ "done": true })),
    )
    .await;

    let (status, body) = send(
      s,
      "GET",
      &format!("/api/goals/{id}/history"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["is_completed"], true);
  }

  #[tokio::test]
  async fn history_rejects_bad_dates() {
    let s = store();
    let auth = register_alice(&s).await;
    let id = create_goal(&s, &auth, "Swim").await;

    let (status, _) = send(
      s.clone(),
      "GET",
      &format!("/api/goals/{id}/history?start_date=last-tuesday"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
      s,
      "GET",
      &format!("/api/goals/{id}/history?end_date=03-14-2025"),
      Some(&auth),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  // ── Aggregation ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn week_stats_shape() {
    let s = store();
    let auth = register_alice(&s).await;
    create_goal(&s, &auth, "Read").await;

    let (status, body) =
      send(s, "GET", "/api/stats?window=week", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["window"], "week");
    assert_eq!(body["completed"], 0);
    assert_eq!(body["total"], 7);
  }

  #[tokio::test]
  async fn unknown_window_is_400() {
    let s = store();
    let auth = register_alice(&s).await;
    let (status, _) =
      send(s, "GET", "/api/stats?window=year", Some(&auth), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn dashboard_composes_everything() {
    let s = store();
    let auth = register_alice(&s).await;
    let water = create_goal(&s, &auth, "Drink water").await;
    create_goal(&s, &auth, "Exercise").await;

    send(
      s.clone(),
      "POST",
      &format!("/api/goals/{water}/toggle"),
      Some(&auth),
      Some(json!({ "done": true })),
    )
    .await;

    let (status, body) =
      send(s, "GET", "/api/dashboard", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["day"]["completed"], 1);
    assert_eq!(body["day"]["total"], 2);
    assert_eq!(body["week"]["total"], 14);
    let today = body["today"].as_array().unwrap();
    assert_eq!(today.len(), 2);
    assert_eq!(
      today.iter().filter(|e| e["completed"] == true).count(),
      1
    );
  }

  #[tokio::test]
  async fn goals_today_includes_instance() {
    let s = store();
    let auth = register_alice(&s).await;
    let id = create_goal(&s, &auth, "Drink water").await;

    send(
      s.clone(),
      "POST",
      &format!("/api/goals/{id}/toggle"),
      Some(&auth),
      Some(json!({ "done": true })),
    )
    .await;

    let (status, body) =
      send(s, "GET", "/api/goals/today", Some(&auth), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["today_instance"]["is_completed"], true);
  }

  // ── Cross-user isolation ──────────────────────────────────────────────

  #[tokio::test]
  async fn users_cannot_see_each_others_goals() {
    let s = store();
    let alice = register_alice(&s).await;
    let id = create_goal(&s, &alice, "Private goal").await;

    let (status, _) = send(
      s.clone(),
      "POST",
      "/api/auth/register",
      None,
      Some(json!({
        "email": "bob@example.com",
        "username": "bob",
        "password": "hunter2",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let bob = basic("bob@example.com", "hunter2");

    let (status, _) = send(
      s.clone(),
      "GET",
      &format!("/api/goals/{id}"),
      Some(&bob),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, listed) = send(s, "GET", "/api/goals", Some(&bob), None).await;
    assert!(listed.as_array().unwrap().is_empty());
  }
}

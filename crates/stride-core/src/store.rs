//! The `GoalStore` trait.
//!
//! Implemented by storage backends (`stride-store-memory`,
//! `stride-store-sqlite`). The HTTP layer depends on this abstraction,
//! not on any concrete backend. Every method returns the shared
//! [`crate::Error`] taxonomy so callers can map failures to transport
//! status codes uniformly across backends.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  Result,
  goal::{Goal, GoalPatch, NewGoal},
  instance::{DailyInstance, InstancePatch},
  stats::{Dashboard, GoalToday, Window, WindowStats},
  user::{NewUser, User, UserCredentials},
};

/// Abstraction over a Stride storage backend.
///
/// Mutations are atomic per call: either the full change lands or none
/// of it does. No method retries; backend failures surface as
/// [`crate::Error::Storage`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GoalStore: Send + Sync {
  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a user. Fails with `UserExists` if the email or username
  /// is already taken.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  /// Look up a user and their stored credential hash by email — the
  /// auth layer's verification path. Returns `None` if unknown.
  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<UserCredentials>>> + Send + 'a;

  /// Retrieve a user by id.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<User>> + Send + '_;

  // ── Goal catalog ──────────────────────────────────────────────────────

  /// Create a goal: fresh id, `is_active = true`,
  /// `created_at = updated_at = now`. Input validation (non-empty
  /// title) happens here in every backend.
  fn create_goal(
    &self,
    user_id: Uuid,
    input: NewGoal,
  ) -> impl Future<Output = Result<Goal>> + Send + '_;

  /// List the user's active goals, `created_at` descending with `id`
  /// ascending as tie-break.
  fn list_goals(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Goal>>> + Send + '_;

  /// Retrieve a goal by id regardless of `is_active` — only listings
  /// filter on the active flag.
  fn get_goal(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Goal>> + Send + '_;

  /// Apply a partial update and stamp `updated_at`.
  fn update_goal(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    patch: GoalPatch,
  ) -> impl Future<Output = Result<Goal>> + Send + '_;

  /// Soft delete: set `is_active = false`. The goal and its instances
  /// remain queryable by id.
  fn delete_goal(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  // ── Instance ledger ───────────────────────────────────────────────────

  /// Return the instance for `(goal_id, date)`, materialising it on
  /// first access with the goal's current `target_value` snapshotted.
  /// This is the single creation path for instances, and the
  /// check-then-insert is atomic.
  fn get_or_create_instance(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<DailyInstance>> + Send + '_;

  /// Apply a partial update to an instance, running the `completed_at`
  /// state machine.
  fn update_instance(
    &self,
    instance_id: Uuid,
    user_id: Uuid,
    patch: InstancePatch,
  ) -> impl Future<Output = Result<DailyInstance>> + Send + '_;

  /// Convenience toggle: ensure today's instance reflects `done`.
  /// Calling twice with the same value changes nothing observable.
  fn set_today(
    &self,
    user_id: Uuid,
    goal_id: Uuid,
    done: bool,
  ) -> impl Future<Output = Result<DailyInstance>> + Send + '_;

  /// Instances for a goal in the inclusive `[start, end]` range, date
  /// descending. An inverted range yields an empty list.
  fn history(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
  ) -> impl Future<Output = Result<Vec<DailyInstance>>> + Send + '_;

  // ── Aggregation (read-only) ───────────────────────────────────────────

  /// Active goals paired with today's instance where one exists. Never
  /// materialises instances.
  fn goals_today(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<GoalToday>>> + Send + '_;

  /// Completion counts for one window.
  fn stats(
    &self,
    user_id: Uuid,
    window: Window,
  ) -> impl Future<Output = Result<WindowStats>> + Send + '_;

  /// The composed dashboard read — one consistent snapshot, no partial
  /// failure.
  fn dashboard(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Dashboard>> + Send + '_;
}

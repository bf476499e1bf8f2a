//! [`MemoryStore`] — the in-process implementation of [`GoalStore`].

use std::{
  collections::HashMap,
  sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chrono::NaiveDate;
use uuid::Uuid;

use stride_core::{
  Error, Result,
  clock::{Clock, SystemClock},
  goal::{Goal, GoalPatch, NewGoal},
  instance::{DailyInstance, InstancePatch},
  stats::{self, Dashboard, GoalToday, TodayEntry, Window, WindowStats},
  store::GoalStore,
  user::{NewUser, User, UserCredentials},
};

// ─── State ───────────────────────────────────────────────────────────────────

struct StoredUser {
  user:          User,
  password_hash: String,
}

#[derive(Default)]
struct State {
  users:     HashMap<Uuid, StoredUser>,
  /// user id → goal id → goal.
  goals:     HashMap<Uuid, HashMap<Uuid, Goal>>,
  /// user id → instance id → instance.
  instances: HashMap<Uuid, HashMap<Uuid, DailyInstance>>,
  /// (goal id, date) → instance id. Enforces at most one instance per
  /// goal-day.
  by_day:    HashMap<(Uuid, NaiveDate), Uuid>,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Stride store held entirely in process memory.
///
/// Cloning is cheap — the inner state is reference-counted.
#[derive(Clone)]
pub struct MemoryStore {
  clock: Arc<dyn Clock>,
  state: Arc<RwLock<State>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::with_clock(Arc::new(SystemClock)) }

  /// Construct with an injected clock — fixed clocks in tests.
  pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
    Self { clock, state: Arc::new(RwLock::new(State::default())) }
  }

  fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
    self
      .state
      .read()
      .map_err(|_| Error::Storage("store lock poisoned".into()))
  }

  fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
    self
      .state
      .write()
      .map_err(|_| Error::Storage("store lock poisoned".into()))
  }
}

impl Default for MemoryStore {
  fn default() -> Self { Self::new() }
}

// ─── Locked helpers ──────────────────────────────────────────────────────────

impl State {
  fn goal(&self, goal_id: Uuid, user_id: Uuid) -> Result<&Goal> {
    self
      .goals
      .get(&user_id)
      .and_then(|goals| goals.get(&goal_id))
      .ok_or(Error::GoalNotFound(goal_id))
  }

  fn active_goals(&self, user_id: Uuid) -> Vec<Goal> {
    let mut out: Vec<Goal> = self
      .goals
      .get(&user_id)
      .map(|goals| goals.values().filter(|g| g.is_active).cloned().collect())
      .unwrap_or_default();
    out.sort_by(|a, b| {
      b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id))
    });
    out
  }

  /// Dates of completed instances belonging to active goals.
  fn completed_dates(&self, user_id: Uuid) -> Vec<NaiveDate> {
    let active = self.goals.get(&user_id);
    self
      .instances
      .get(&user_id)
      .map(|instances| {
        instances
          .values()
          .filter(|i| i.is_completed)
          .filter(|i| {
            active
              .and_then(|goals| goals.get(&i.goal_id))
              .is_some_and(|g| g.is_active)
          })
          .map(|i| i.date)
          .collect()
      })
      .unwrap_or_default()
  }

  fn stats_for(&self, user_id: Uuid, window: Window, today: NaiveDate) -> WindowStats {
    let active = self.active_goals(user_id).len();
    stats::compute(active, self.completed_dates(user_id), window, today)
  }

  fn goals_today_for(&self, user_id: Uuid, today: NaiveDate) -> Vec<GoalToday> {
    self
      .active_goals(user_id)
      .into_iter()
      .map(|goal| {
        let today_instance = self
          .by_day
          .get(&(goal.id, today))
          .and_then(|id| {
            self.instances.get(&user_id).and_then(|m| m.get(id))
          })
          .cloned();
        GoalToday { goal, today_instance }
      })
      .collect()
  }

  /// Atomic check-then-insert under the caller's write guard.
  fn get_or_create_locked(
    &mut self,
    goal_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
    now: chrono::DateTime<chrono::Utc>,
  ) -> Result<DailyInstance> {
    if let Some(id) = self.by_day.get(&(goal_id, date))
      && let Some(existing) =
        self.instances.get(&user_id).and_then(|m| m.get(id))
    {
      return Ok(existing.clone());
    }

    let target_value = self.goal(goal_id, user_id)?.target_value;
    let instance = DailyInstance {
      id: Uuid::new_v4(),
      goal_id,
      user_id,
      date,
      target_value,
      completed_value: None,
      is_completed: false,
      completed_at: None,
      created_at: now,
    };

    self.by_day.insert((goal_id, date), instance.id);
    self
      .instances
      .entry(user_id)
      .or_default()
      .insert(instance.id, instance.clone());
    Ok(instance)
  }
}

// ─── GoalStore impl ──────────────────────────────────────────────────────────

impl GoalStore for MemoryStore {
  // ── Users ─────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = self.clock.now();
    let mut state = self.write()?;

    let taken = state.users.values().any(|stored| {
      stored.user.email == input.email || stored.user.username == input.username
    });
    if taken {
      return Err(Error::UserExists(input.email));
    }

    let user = User {
      id:         Uuid::new_v4(),
      email:      input.email,
      username:   input.username,
      created_at: now,
    };
    state.users.insert(user.id, StoredUser {
      user:          user.clone(),
      password_hash: input.password_hash,
    });
    Ok(user)
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
    let state = self.read()?;
    Ok(state.users.values().find(|s| s.user.email == email).map(|s| {
      UserCredentials {
        user:          s.user.clone(),
        password_hash: s.password_hash.clone(),
      }
    }))
  }

  async fn get_user(&self, id: Uuid) -> Result<User> {
    let state = self.read()?;
    state
      .users
      .get(&id)
      .map(|s| s.user.clone())
      .ok_or(Error::UserNotFound(id))
  }

  // ── Goal catalog ──────────────────────────────────────────────────────

  async fn create_goal(&self, user_id: Uuid, input: NewGoal) -> Result<Goal> {
    input.validate()?;
    let now = self.clock.now();
    let mut state = self.write()?;

    let goal = Goal {
      id:           Uuid::new_v4(),
      user_id,
      title:        input.title,
      description:  input.description,
      goal_type:    input.goal_type,
      target_value: input.target_value,
      unit:         input.unit,
      is_active:    true,
      created_at:   now,
      updated_at:   now,
    };
    state
      .goals
      .entry(user_id)
      .or_default()
      .insert(goal.id, goal.clone());
    Ok(goal)
  }

  async fn list_goals(&self, user_id: Uuid) -> Result<Vec<Goal>> {
    Ok(self.read()?.active_goals(user_id))
  }

  async fn get_goal(&self, goal_id: Uuid, user_id: Uuid) -> Result<Goal> {
    Ok(self.read()?.goal(goal_id, user_id)?.clone())
  }

  async fn update_goal(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    patch: GoalPatch,
  ) -> Result<Goal> {
    let now = self.clock.now();
    let mut state = self.write()?;
    let goal = state
      .goals
      .get_mut(&user_id)
      .and_then(|goals| goals.get_mut(&goal_id))
      .ok_or(Error::GoalNotFound(goal_id))?;
    goal.apply(&patch, now);
    Ok(goal.clone())
  }

  async fn delete_goal(&self, goal_id: Uuid, user_id: Uuid) -> Result<()> {
    let now = self.clock.now();
    let mut state = self.write()?;
    let goal = state
      .goals
      .get_mut(&user_id)
      .and_then(|goals| goals.get_mut(&goal_id))
      .ok_or(Error::GoalNotFound(goal_id))?;
    goal.is_active = false;
    goal.updated_at = now;
    Ok(())
  }

  // ── Instance ledger ───────────────────────────────────────────────────

  async fn get_or_create_instance(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    date: NaiveDate,
  ) -> Result<DailyInstance> {
    let now = self.clock.now();
    let mut state = self.write()?;
    state.get_or_create_locked(goal_id, user_id, date, now)
  }

  async fn update_instance(
    &self,
    instance_id: Uuid,
    user_id: Uuid,
    patch: InstancePatch,
  ) -> Result<DailyInstance> {
    let now = self.clock.now();
    let mut state = self.write()?;
    let instance = state
      .instances
      .get_mut(&user_id)
      .and_then(|instances| instances.get_mut(&instance_id))
      .ok_or(Error::InstanceNotFound(instance_id))?;
    instance.apply(&patch, now);
    Ok(instance.clone())
  }

  async fn set_today(
    &self,
    user_id: Uuid,
    goal_id: Uuid,
    done: bool,
  ) -> Result<DailyInstance> {
    let now = self.clock.now();
    let today = self.clock.today();
    let mut state = self.write()?;

    let id = state.get_or_create_locked(goal_id, user_id, today, now)?.id;
    let instance = state
      .instances
      .get_mut(&user_id)
      .and_then(|instances| instances.get_mut(&id))
      .ok_or(Error::InstanceNotFound(id))?;
    instance.set_completed(done, now);
    Ok(instance.clone())
  }

  async fn history(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<DailyInstance>> {
    let state = self.read()?;
    state.goal(goal_id, user_id)?;

    let mut out: Vec<DailyInstance> = state
      .instances
      .get(&user_id)
      .map(|instances| {
        instances
          .values()
          .filter(|i| i.goal_id == goal_id && i.date >= start && i.date <= end)
          .cloned()
          .collect()
      })
      .unwrap_or_default();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(out)
  }

  // ── Aggregation ───────────────────────────────────────────────────────

  async fn goals_today(&self, user_id: Uuid) -> Result<Vec<GoalToday>> {
    let today = self.clock.today();
    Ok(self.read()?.goals_today_for(user_id, today))
  }

  async fn stats(&self, user_id: Uuid, window: Window) -> Result<WindowStats> {
    let today = self.clock.today();
    Ok(self.read()?.stats_for(user_id, window, today))
  }

  async fn dashboard(&self, user_id: Uuid) -> Result<Dashboard> {
    let today = self.clock.today();
    // One read guard for the whole composite read.
    let state = self.read()?;
    let today_entries = state
      .goals_today_for(user_id, today)
      .into_iter()
      .map(|entry| TodayEntry {
        completed: entry
          .today_instance
          .as_ref()
          .is_some_and(|i| i.is_completed),
        goal:      entry.goal,
      })
      .collect();
    Ok(Dashboard {
      day:   state.stats_for(user_id, Window::Day, today),
      week:  state.stats_for(user_id, Window::Week, today),
      month: state.stats_for(user_id, Window::Month, today),
      today: today_entries,
    })
  }
}

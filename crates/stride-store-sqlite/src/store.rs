//! [`SqliteStore`] — the SQLite implementation of [`GoalStore`].

use std::{path::Path, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::OptionalExtension as _;
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

use crate::{
  encode::{
    RawGoal, RawInstance, RawUser, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

const GOAL_COLS: &str = "id, user_id, title, description, goal_type, \
                         target_value, unit, is_active, created_at, updated_at";
const INST_COLS: &str = "id, goal_id, user_id, date, target_value, \
                         completed_value, is_completed, completed_at, created_at";

// ─── Error plumbing ──────────────────────────────────────────────────────────

/// Wrap a domain error so it survives the trip out of a `call` closure.
fn domain(e: Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

/// Unwrap domain errors smuggled through [`domain`]; everything else is
/// a backend failure.
fn db_err(e: tokio_rusqlite::Error) -> Error {
  match e {
    tokio_rusqlite::Error::Other(inner) => match inner.downcast::<Error>() {
      Ok(core) => *core,
      Err(other) => Error::Storage(other.to_string()),
    },
    other => Error::Storage(other.to_string()),
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Stride store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  clock: Arc<dyn Clock>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(db_err)?;
    Self::init(conn, Arc::new(SystemClock)).await
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    Self::open_in_memory_with_clock(Arc::new(SystemClock)).await
  }

  /// In-memory store with an injected clock.
  pub async fn open_in_memory_with_clock(clock: Arc<dyn Clock>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(db_err)?;
    Self::init(conn, clock).await
  }

  async fn init(conn: tokio_rusqlite::Connection, clock: Arc<dyn Clock>) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(db_err)?;
    Ok(Self { conn, clock })
  }
}

// ─── Connection-side helpers ─────────────────────────────────────────────────
//
// These run inside `call` closures on the connection thread, so a
// multi-statement operation is never interleaved with another caller.

fn goal_row(
  conn: &rusqlite::Connection,
  goal_id: &str,
  user_id: &str,
) -> rusqlite::Result<Option<RawGoal>> {
  conn
    .query_row(
      &format!("SELECT {GOAL_COLS} FROM goals WHERE id = ?1 AND user_id = ?2"),
      rusqlite::params![goal_id, user_id],
      RawGoal::from_row,
    )
    .optional()
}

fn instance_by_id(
  conn: &rusqlite::Connection,
  id: &str,
  user_id: &str,
) -> rusqlite::Result<Option<RawInstance>> {
  conn
    .query_row(
      &format!(
        "SELECT {INST_COLS} FROM daily_instances WHERE id = ?1 AND user_id = ?2"
      ),
      rusqlite::params![id, user_id],
      RawInstance::from_row,
    )
    .optional()
}

fn write_instance_state(
  conn: &rusqlite::Connection,
  instance: &DailyInstance,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE daily_instances
     SET completed_value = ?1, is_completed = ?2, completed_at = ?3
     WHERE id = ?4",
    rusqlite::params![
      instance.completed_value,
      instance.is_completed,
      instance.completed_at.map(encode_dt),
      encode_uuid(instance.id),
    ],
  )?;
  Ok(())
}

/// The single creation path for instances: return the existing row for
/// `(goal_id, date)` or materialise one with the goal's current target
/// snapshotted. Runs whole on the connection thread, so the
/// check-then-insert cannot race.
fn get_or_create(
  conn: &rusqlite::Connection,
  goal_id: Uuid,
  user_id: Uuid,
  date: NaiveDate,
  now: DateTime<Utc>,
) -> std::result::Result<DailyInstance, tokio_rusqlite::Error> {
  let goal_str = encode_uuid(goal_id);
  let user_str = encode_uuid(user_id);
  let date_str = encode_date(date);

  let existing = conn
    .query_row(
      &format!(
        "SELECT {INST_COLS} FROM daily_instances
         WHERE goal_id = ?1 AND user_id = ?2 AND date = ?3"
      ),
      rusqlite::params![goal_str, user_str, date_str],
      RawInstance::from_row,
    )
    .optional()?;
  if let Some(raw) = existing {
    return raw.into_instance().map_err(domain);
  }

  let goal = goal_row(conn, &goal_str, &user_str)?
    .ok_or_else(|| domain(Error::GoalNotFound(goal_id)))?
    .into_goal()
    .map_err(domain)?;

  let instance = DailyInstance {
    id: Uuid::new_v4(),
    goal_id,
    user_id,
    date,
    target_value: goal.target_value,
    completed_value: None,
    is_completed: false,
    completed_at: None,
    created_at: now,
  };

  conn.execute(
    &format!(
      "INSERT INTO daily_instances ({INST_COLS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ),
    rusqlite::params![
      encode_uuid(instance.id),
      goal_str,
      user_str,
      date_str,
      instance.target_value,
      instance.completed_value,
      instance.is_completed,
      Option::<String>::None,
      encode_dt(instance.created_at),
    ],
  )?;

  Ok(instance)
}

/// Active goals with today's instance, newest goal first.
fn goals_with_today(
  conn: &rusqlite::Connection,
  user_id: &str,
  today: &str,
) -> std::result::Result<Vec<GoalToday>, tokio_rusqlite::Error> {
  let mut stmt = conn.prepare(
    "SELECT g.id, g.user_id, g.title, g.description, g.goal_type,
            g.target_value, g.unit, g.is_active, g.created_at, g.updated_at,
            i.id, i.goal_id, i.user_id, i.date, i.target_value,
            i.completed_value, i.is_completed, i.completed_at, i.created_at
     FROM goals g
     LEFT JOIN daily_instances i ON i.goal_id = g.id AND i.date = ?2
     WHERE g.user_id = ?1 AND g.is_active = 1
     ORDER BY g.created_at DESC, g.id ASC",
  )?;

  let rows = stmt.query_map(rusqlite::params![user_id, today], |row| {
    let goal = RawGoal::from_row(row)?;
    // The joined instance is fully NULL when today has no row yet.
    let instance_id: Option<String> = row.get(10)?;
    let instance = match instance_id {
      Some(id) => Some(RawInstance {
        id,
        goal_id:         row.get(11)?,
        user_id:         row.get(12)?,
        date:            row.get(13)?,
        target_value:    row.get(14)?,
        completed_value: row.get(15)?,
        is_completed:    row.get(16)?,
        completed_at:    row.get(17)?,
        created_at:      row.get(18)?,
      }),
      None => None,
    };
    Ok((goal, instance))
  })?;

  let mut out = Vec::new();
  for row in rows {
    let (raw_goal, raw_instance) = row?;
    out.push(GoalToday {
      goal:           raw_goal.into_goal().map_err(domain)?,
      today_instance: raw_instance
        .map(RawInstance::into_instance)
        .transpose()
        .map_err(domain)?,
    });
  }
  Ok(out)
}

/// `(active goal count, dates of completed instances of active goals)`
/// — the stats engine's inputs, gathered in one pass.
fn stats_inputs(
  conn: &rusqlite::Connection,
  user_id: &str,
) -> std::result::Result<(usize, Vec<NaiveDate>), tokio_rusqlite::Error> {
  let count: i64 = conn.query_row(
    "SELECT COUNT(*) FROM goals WHERE user_id = ?1 AND is_active = 1",
    rusqlite::params![user_id],
    |row| row.get(0),
  )?;

  let mut stmt = conn.prepare(
    "SELECT i.date
     FROM daily_instances i
     JOIN goals g ON g.id = i.goal_id
     WHERE i.user_id = ?1 AND i.is_completed = 1 AND g.is_active = 1",
  )?;
  let rows = stmt
    .query_map(rusqlite::params![user_id], |row| row.get::<_, String>(0))?;

  let mut dates = Vec::new();
  for row in rows {
    dates.push(crate::encode::decode_date(&row?).map_err(domain)?);
  }
  Ok((count as usize, dates))
}

// ─── GoalStore impl ──────────────────────────────────────────────────────────

impl GoalStore for SqliteStore {
  // ── Users ─────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      id:         Uuid::new_v4(),
      email:      input.email,
      username:   input.username,
      created_at: self.clock.now(),
    };

    let row = (
      encode_uuid(user.id),
      user.email.clone(),
      user.username.clone(),
      input.password_hash,
      encode_dt(user.created_at),
    );
    let outcome = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (id, email, username, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![row.0, row.1, row.2, row.3, row.4],
        )?;
        Ok(())
      })
      .await;

    match outcome {
      Ok(()) => Ok(user),
      Err(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        Err(Error::UserExists(user.email))
      }
      Err(e) => Err(db_err(e)),
    }
  }

  async fn get_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
    let email = email.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, email, username, password_hash, created_at
               FROM users WHERE email = ?1",
              rusqlite::params![email],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw.map(RawUser::into_credentials).transpose()
  }

  async fn get_user(&self, id: Uuid) -> Result<User> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, email, username, password_hash, created_at
               FROM users WHERE id = ?1",
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(db_err)?;

    raw
      .ok_or(Error::UserNotFound(id))?
      .into_credentials()
      .map(|c| c.user)
  }

  // ── Goal catalog ──────────────────────────────────────────────────────

  async fn create_goal(&self, user_id: Uuid, input: NewGoal) -> Result<Goal> {
    input.validate()?;
    let now = self.clock.now();

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

    let row = (
      encode_uuid(goal.id),
      encode_uuid(goal.user_id),
      goal.title.clone(),
      goal.description.clone(),
      goal.goal_type.as_str(),
      goal.target_value,
      goal.unit.clone(),
      encode_dt(goal.created_at),
    );
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO goals ({GOAL_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)"
          ),
          rusqlite::params![row.0, row.1, row.2, row.3, row.4, row.5, row.6, row.7],
        )?;
        Ok(())
      })
      .await
      .map_err(db_err)?;

    Ok(goal)
  }

  async fn list_goals(&self, user_id: Uuid) -> Result<Vec<Goal>> {
    let user_str = encode_uuid(user_id);
    let raws: Vec<RawGoal> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {GOAL_COLS} FROM goals
           WHERE user_id = ?1 AND is_active = 1
           ORDER BY created_at DESC, id ASC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawGoal::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawGoal::into_goal).collect()
  }

  async fn get_goal(&self, goal_id: Uuid, user_id: Uuid) -> Result<Goal> {
    let goal_str = encode_uuid(goal_id);
    let user_str = encode_uuid(user_id);
    let raw = self
      .conn
      .call(move |conn| Ok(goal_row(conn, &goal_str, &user_str)?))
      .await
      .map_err(db_err)?;

    raw.ok_or(Error::GoalNotFound(goal_id))?.into_goal()
  }

  async fn update_goal(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    patch: GoalPatch,
  ) -> Result<Goal> {
    let now = self.clock.now();
    let goal_str = encode_uuid(goal_id);
    let user_str = encode_uuid(user_id);

    self
      .conn
      .call(move |conn| {
        let mut goal = goal_row(conn, &goal_str, &user_str)?
          .ok_or_else(|| domain(Error::GoalNotFound(goal_id)))?
          .into_goal()
          .map_err(domain)?;
        goal.apply(&patch, now);

        conn.execute(
          "UPDATE goals
           SET title = ?1, description = ?2, target_value = ?3, unit = ?4,
               is_active = ?5, updated_at = ?6
           WHERE id = ?7 AND user_id = ?8",
          rusqlite::params![
            goal.title,
            goal.description,
            goal.target_value,
            goal.unit,
            goal.is_active,
            encode_dt(goal.updated_at),
            goal_str,
            user_str,
          ],
        )?;
        Ok(goal)
      })
      .await
      .map_err(db_err)
  }

  async fn delete_goal(&self, goal_id: Uuid, user_id: Uuid) -> Result<()> {
    let now = encode_dt(self.clock.now());
    let goal_str = encode_uuid(goal_id);
    let user_str = encode_uuid(user_id);

    let affected = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE goals SET is_active = 0, updated_at = ?1
           WHERE id = ?2 AND user_id = ?3",
          rusqlite::params![now, goal_str, user_str],
        )?)
      })
      .await
      .map_err(db_err)?;

    if affected == 0 {
      return Err(Error::GoalNotFound(goal_id));
    }
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
    self
      .conn
      .call(move |conn| get_or_create(conn, goal_id, user_id, date, now))
      .await
      .map_err(db_err)
  }

  async fn update_instance(
    &self,
    instance_id: Uuid,
    user_id: Uuid,
    patch: InstancePatch,
  ) -> Result<DailyInstance> {
    let now = self.clock.now();
    let id_str = encode_uuid(instance_id);
    let user_str = encode_uuid(user_id);

    self
      .conn
      .call(move |conn| {
        let mut instance = instance_by_id(conn, &id_str, &user_str)?
          .ok_or_else(|| domain(Error::InstanceNotFound(instance_id)))?
          .into_instance()
          .map_err(domain)?;
        instance.apply(&patch, now);
        write_instance_state(conn, &instance)?;
        Ok(instance)
      })
      .await
      .map_err(db_err)
  }

  async fn set_today(
    &self,
    user_id: Uuid,
    goal_id: Uuid,
    done: bool,
  ) -> Result<DailyInstance> {
    let now = self.clock.now();
    let today = self.clock.today();

    self
      .conn
      .call(move |conn| {
        let mut instance = get_or_create(conn, goal_id, user_id, today, now)?;
        instance.set_completed(done, now);
        write_instance_state(conn, &instance)?;
        Ok(instance)
      })
      .await
      .map_err(db_err)
  }

  async fn history(
    &self,
    goal_id: Uuid,
    user_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<DailyInstance>> {
    let goal_str = encode_uuid(goal_id);
    let user_str = encode_uuid(user_id);
    let start_str = encode_date(start);
    let end_str = encode_date(end);

    let raws: Vec<RawInstance> = self
      .conn
      .call(move |conn| {
        let exists: bool = conn
          .query_row(
            "SELECT 1 FROM goals WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![goal_str, user_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Err(domain(Error::GoalNotFound(goal_id)));
        }

        let mut stmt = conn.prepare(&format!(
          "SELECT {INST_COLS} FROM daily_instances
           WHERE goal_id = ?1 AND user_id = ?2 AND date >= ?3 AND date <= ?4
           ORDER BY date DESC"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![goal_str, user_str, start_str, end_str],
            RawInstance::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(db_err)?;

    raws.into_iter().map(RawInstance::into_instance).collect()
  }

  // ── Aggregation ───────────────────────────────────────────────────────

  async fn goals_today(&self, user_id: Uuid) -> Result<Vec<GoalToday>> {
    let user_str = encode_uuid(user_id);
    let today_str = encode_date(self.clock.today());

    self
      .conn
      .call(move |conn| goals_with_today(conn, &user_str, &today_str))
      .await
      .map_err(db_err)
  }

  async fn stats(&self, user_id: Uuid, window: Window) -> Result<WindowStats> {
    let today = self.clock.today();
    let user_str = encode_uuid(user_id);

    let (active, dates) = self
      .conn
      .call(move |conn| stats_inputs(conn, &user_str))
      .await
      .map_err(db_err)?;

    Ok(stats::compute(active, dates, window, today))
  }

  async fn dashboard(&self, user_id: Uuid) -> Result<Dashboard> {
    let today = self.clock.today();
    let user_str = encode_uuid(user_id);
    let today_str = encode_date(today);

    // One closure — one consistent snapshot of the composite read.
    let (entries, (active, dates)) = self
      .conn
      .call(move |conn| {
        let entries = goals_with_today(conn, &user_str, &today_str)?;
        let inputs = stats_inputs(conn, &user_str)?;
        Ok((entries, inputs))
      })
      .await
      .map_err(db_err)?;

    let today_entries = entries
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
      day:   stats::compute(active, dates.iter().copied(), Window::Day, today),
      week:  stats::compute(active, dates.iter().copied(), Window::Week, today),
      month: stats::compute(active, dates.iter().copied(), Window::Month, today),
      today: today_entries,
    })
  }
}

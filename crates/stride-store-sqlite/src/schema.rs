//! SQL schema for the Stride SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`.
//! Future migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string; opaque to the store
    created_at    TEXT NOT NULL
);

-- Goals are soft-deleted only: is_active flips to 0, the row stays.
CREATE TABLE IF NOT EXISTS goals (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    title        TEXT NOT NULL,
    description  TEXT,
    goal_type    TEXT NOT NULL,   -- 'boolean' | 'numeric' | 'duration'
    target_value REAL,
    unit         TEXT,
    is_active    INTEGER NOT NULL DEFAULT 1,
    created_at   TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    updated_at   TEXT NOT NULL
);

-- One row per (goal, calendar day); materialised lazily on first
-- access. Rows are never deleted.
CREATE TABLE IF NOT EXISTS daily_instances (
    id              TEXT PRIMARY KEY,
    goal_id         TEXT NOT NULL REFERENCES goals(id),
    user_id         TEXT NOT NULL,
    date            TEXT NOT NULL,   -- YYYY-MM-DD, no time component
    target_value    REAL,            -- snapshot from the goal at creation
    completed_value REAL,
    is_completed    INTEGER NOT NULL DEFAULT 0,
    completed_at    TEXT,
    created_at      TEXT NOT NULL,
    UNIQUE (goal_id, date)
);

CREATE INDEX IF NOT EXISTS goals_user_idx        ON goals(user_id);
CREATE INDEX IF NOT EXISTS instances_goal_idx    ON daily_instances(goal_id);
CREATE INDEX IF NOT EXISTS instances_user_day_idx ON daily_instances(user_id, date);

PRAGMA user_version = 1;
";

//! SQLite backend for the Stride goal store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every store operation is
//! a single `call` closure; the connection serialises closures, so
//! multi-statement mutations (notably the get-or-create
//! check-then-insert) never interleave.

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;

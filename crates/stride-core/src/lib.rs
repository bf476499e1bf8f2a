//! Domain model for the Stride goal tracker: goals, daily instances,
//! the stats engine, and the [`store::GoalStore`] abstraction the
//! backends implement.
//!
//! No HTTP or database code lives here. The transport and storage
//! crates both depend on this one and meet only through its types.

// Backend impls write `async fn` against the `impl Future` signatures in
// `store::GoalStore`; keep the advisory lint quiet about that.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod goal;
pub mod instance;
pub mod stats;
pub mod store;
pub mod user;

pub use error::{Error, Result};

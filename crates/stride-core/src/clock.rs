//! Clock abstraction — "now" is injected so the completion state
//! machine and window arithmetic are testable at fixed instants.

use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current instant. Stores hold an `Arc<dyn Clock>`.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// The current calendar day, UTC.
  fn today(&self) -> NaiveDate { self.now().date_naive() }
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock pinned to a single instant — test use only.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { self.0 }
}

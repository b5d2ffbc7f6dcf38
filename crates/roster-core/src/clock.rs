//! Injected wall clock.

use chrono::{DateTime, Utc};

/// Source of "now" for anything that stamps records or measures a run.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

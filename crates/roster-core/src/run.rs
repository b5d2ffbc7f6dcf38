//! Reconciliation run summaries and the persisted run log.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Aggregate outcome of one reconciliation pass.
///
/// After a successful run `fetched == inserted + updated + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSummary {
  pub fetched:         u64,
  pub inserted:        u64,
  pub updated:         u64,
  pub skipped:         u64,
  pub elapsed_seconds: f64,
}

impl SyncSummary {
  /// Records the run has already accounted for.
  pub fn processed(&self) -> u64 { self.inserted + self.updated + self.skipped }
}

impl fmt::Display for SyncSummary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "fetched={} inserted={} updated={} skipped={} elapsed={:.2}s",
      self.fetched, self.inserted, self.updated, self.skipped, self.elapsed_seconds
    )
  }
}

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Succeeded,
  Failed,
}

impl RunStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Succeeded => "succeeded",
      Self::Failed => "failed",
    }
  }
}

impl FromStr for RunStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "succeeded" => Ok(Self::Succeeded),
      "failed" => Ok(Self::Failed),
      other => Err(Error::UnknownRunStatus(other.to_owned())),
    }
  }
}

/// One row of the run log. Failed runs carry the counts reached before the
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRun {
  pub run_id:        Uuid,
  pub started_at:    DateTime<Utc>,
  pub finished_at:   DateTime<Utc>,
  pub status:        RunStatus,
  pub summary:       SyncSummary,
  pub error_message: Option<String>,
}

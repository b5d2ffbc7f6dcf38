//! Error types for `roster-sync`.

use thiserror::Error;

/// The remote list could not be obtained. Always fatal for a run.
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("directory api returned status {0}")]
  Status(u16),

  #[error("malformed directory response: {0}")]
  Malformed(String),
}

/// A reconciliation run failed.
#[derive(Debug, Error)]
pub enum SyncError {
  #[error("fetch failed: {0}")]
  Fetch(#[source] FetchError),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl SyncError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

//! Error types for `roster-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown person type: {0:?}")]
  UnknownPersonType(String),

  #[error("unknown run status: {0:?}")]
  UnknownRunStatus(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

//! Error type for `roster-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] roster_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("stored count out of range: {0}")]
  CountOutOfRange(i64),

  /// An update targeted a row that does not exist.
  #[error("person not found: {0}")]
  PersonNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

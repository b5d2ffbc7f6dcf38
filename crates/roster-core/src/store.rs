//! The `DirectoryStore` trait.
//!
//! Implemented by storage backends (e.g. `roster-store-sqlite`). The sync
//! engine and the CLI depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  person::{DirectoryPerson, PersonRecord, PersonType},
  run::SyncRun,
};

/// Abstraction over the local directory backend.
///
/// People are never deleted through this trait. All methods return `Send`
/// futures so the trait can be used from a multi-threaded tokio runtime.
pub trait DirectoryStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── People ────────────────────────────────────────────────────────────

  /// Look up a person by natural key. Returns `None` if not found.
  fn find_person<'a>(
    &'a self,
    external_ref_id: &'a str,
    person_type: PersonType,
  ) -> impl Future<Output = Result<Option<DirectoryPerson>, Self::Error>> + Send + 'a;

  /// Insert a new person. `synced_at` becomes `last_synced_at`, `created_at`
  /// and `updated_at`.
  fn create_person(
    &self,
    record: PersonRecord,
    synced_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<DirectoryPerson, Self::Error>> + Send + '_;

  /// Overwrite every mutable attribute of an existing person, including the
  /// raw payload. `person_id` and `created_at` are preserved.
  fn update_person(
    &self,
    person_id: Uuid,
    record: PersonRecord,
    synced_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<DirectoryPerson, Self::Error>> + Send + '_;

  /// List people ordered by last name then first name, optionally filtered
  /// by type.
  fn list_people(
    &self,
    person_type: Option<PersonType>,
  ) -> impl Future<Output = Result<Vec<DirectoryPerson>, Self::Error>> + Send + '_;

  // ── Run log ───────────────────────────────────────────────────────────

  /// Append a run to the run log.
  fn record_run(
    &self,
    run: SyncRun,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The most recent `limit` runs, newest first.
  fn list_runs(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<SyncRun>, Self::Error>> + Send + '_;
}

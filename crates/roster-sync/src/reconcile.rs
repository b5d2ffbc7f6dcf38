//! [`Reconciler`] — one full pass of remote snapshot → local directory.
//!
//! The pass is linear: fetch everything, then for each record normalize,
//! look up by `(external_ref_id, person_type)`, and insert or update. Nothing
//! is ever deleted. A fetch failure aborts before any directory write; a
//! storage failure stops the run at that record.
//!
//! The `sync_runs` log is written for every attempt, including one whose
//! fetch failed; only the directory table is left untouched in that case.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use roster_core::{
  clock::{Clock, SystemClock},
  normalize::normalize,
  run::{RunStatus, SyncRun, SyncSummary},
  store::DirectoryStore,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{DirectorySource, Reporter, SyncError, TracingReporter};

/// What happened to a single fetched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
  Inserted,
  Updated,
  Skipped,
}

/// Reconciles a [`DirectorySource`] into a [`DirectoryStore`].
pub struct Reconciler<S, D> {
  store:    S,
  source:   D,
  clock:    Arc<dyn Clock>,
  reporter: Arc<dyn Reporter>,
}

impl<S, D> Reconciler<S, D>
where
  S: DirectoryStore,
  D: DirectorySource,
{
  /// Uses the system clock and reports progress through `tracing`.
  pub fn new(store: S, source: D) -> Self {
    Self {
      store,
      source,
      clock: Arc::new(SystemClock),
      reporter: Arc::new(TracingReporter),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
    self.reporter = reporter;
    self
  }

  /// Run one reconciliation pass and return its summary.
  ///
  /// Every attempt, failed or not, is appended to the store's run log on a
  /// best-effort basis.
  pub async fn reconcile(&self) -> Result<SyncSummary, SyncError> {
    let started_at  = self.clock.now();
    let mut summary = SyncSummary::default();

    self.reporter.progress("Fetching unified directory list...");
    let records = match self.source.fetch_all().await {
      Ok(records) => records,
      Err(e) => {
        tracing::error!(error = %e, "directory fetch failed; nothing was synced");
        let err = SyncError::Fetch(e);
        self.reporter.progress(&format!("Sync aborted: {err}"));
        self.finish(started_at, summary, Some(&err)).await;
        return Err(err);
      }
    };

    summary.fetched = records.len() as u64;
    self
      .reporter
      .progress(&format!("Fetched {} records, reconciling...", summary.fetched));

    for payload in records {
      match self.apply(payload).await {
        Ok(Outcome::Inserted) => summary.inserted += 1,
        Ok(Outcome::Updated) => summary.updated += 1,
        Ok(Outcome::Skipped) => summary.skipped += 1,
        Err(err) => {
          tracing::error!(
            error = %err,
            processed = summary.processed(),
            fetched = summary.fetched,
            "directory upsert failed; aborting run"
          );
          self.reporter.progress(&format!("Sync aborted: {err}"));
          self.finish(started_at, summary, Some(&err)).await;
          return Err(err);
        }
      }
    }

    let summary = self.finish(started_at, summary, None).await;
    tracing::info!(
      fetched = summary.fetched,
      inserted = summary.inserted,
      updated = summary.updated,
      skipped = summary.skipped,
      elapsed_seconds = summary.elapsed_seconds,
      "directory sync complete"
    );
    self.reporter.progress(&format!("Sync complete: {summary}"));
    Ok(summary)
  }

  /// Normalize and upsert one record.
  async fn apply(&self, payload: Value) -> Result<Outcome, SyncError> {
    let record = match normalize(payload) {
      Ok(record) => record,
      Err(reason) => {
        tracing::debug!(reason = reason.as_str(), "skipping directory record");
        return Ok(Outcome::Skipped);
      }
    };

    let existing = self
      .store
      .find_person(&record.external_ref_id, record.person_type)
      .await
      .map_err(SyncError::store)?;

    let now = self.clock.now();
    match existing {
      Some(person) => {
        self
          .store
          .update_person(person.person_id, record, now)
          .await
          .map_err(SyncError::store)?;
        Ok(Outcome::Updated)
      }
      None => {
        self
          .store
          .create_person(record, now)
          .await
          .map_err(SyncError::store)?;
        Ok(Outcome::Inserted)
      }
    }
  }

  /// Stamp the elapsed time and append the run log entry.
  async fn finish(
    &self,
    started_at: DateTime<Utc>,
    mut summary: SyncSummary,
    error: Option<&SyncError>,
  ) -> SyncSummary {
    let finished_at = self.clock.now();
    summary.elapsed_seconds =
      (finished_at - started_at).num_milliseconds().max(0) as f64 / 1000.0;

    let run = SyncRun {
      run_id: Uuid::new_v4(),
      started_at,
      finished_at,
      status: if error.is_some() { RunStatus::Failed } else { RunStatus::Succeeded },
      summary,
      error_message: error.map(ToString::to_string),
    };
    if let Err(e) = self.store.record_run(run).await {
      tracing::warn!(error = %e, "failed to record sync run");
    }

    summary
  }
}

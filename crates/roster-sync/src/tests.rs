//! Reconciler tests against an in-memory SQLite store and fake sources.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use roster_core::{
  clock::Clock,
  person::{DirectoryPerson, PersonRecord, PersonType},
  run::{RunStatus, SyncRun},
  store::DirectoryStore,
};
use roster_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{DirectorySource, FetchError, Reconciler, Reporter, SyncError};

// ─── Fakes ───────────────────────────────────────────────────────────────────

/// Serves a fixed snapshot.
struct Snapshot(Vec<Value>);

impl DirectorySource for Snapshot {
  async fn fetch_all(&self) -> Result<Vec<Value>, FetchError> { Ok(self.0.clone()) }
}

/// Always fails the way an upstream outage does.
struct Outage;

impl DirectorySource for Outage {
  async fn fetch_all(&self) -> Result<Vec<Value>, FetchError> {
    Err(FetchError::Status(503))
  }
}

/// Advances one second on every read.
struct StepClock(Mutex<DateTime<Utc>>);

impl StepClock {
  fn starting_at(t: DateTime<Utc>) -> Arc<Self> { Arc::new(Self(Mutex::new(t))) }
}

impl Clock for StepClock {
  fn now(&self) -> DateTime<Utc> {
    let mut t = self.0.lock().unwrap();
    *t += Duration::seconds(1);
    *t
  }
}

#[derive(Default)]
struct Collect(Mutex<Vec<String>>);

impl Reporter for Collect {
  fn progress(&self, message: &str) { self.0.lock().unwrap().push(message.to_owned()); }
}

#[derive(Debug, thiserror::Error)]
enum FlakyError {
  #[error("injected write failure for {0}")]
  Injected(String),
  #[error(transparent)]
  Inner(#[from] roster_store_sqlite::Error),
}

/// Delegates to SQLite but refuses to create one particular reference id.
#[derive(Clone)]
struct FlakyStore {
  inner:       SqliteStore,
  fail_ref_id: String,
}

impl DirectoryStore for FlakyStore {
  type Error = FlakyError;

  async fn find_person(
    &self,
    external_ref_id: &str,
    person_type: PersonType,
  ) -> Result<Option<DirectoryPerson>, FlakyError> {
    Ok(self.inner.find_person(external_ref_id, person_type).await?)
  }

  async fn create_person(
    &self,
    record: PersonRecord,
    synced_at: DateTime<Utc>,
  ) -> Result<DirectoryPerson, FlakyError> {
    if record.external_ref_id == self.fail_ref_id {
      return Err(FlakyError::Injected(record.external_ref_id));
    }
    Ok(self.inner.create_person(record, synced_at).await?)
  }

  async fn update_person(
    &self,
    person_id: Uuid,
    record: PersonRecord,
    synced_at: DateTime<Utc>,
  ) -> Result<DirectoryPerson, FlakyError> {
    Ok(self.inner.update_person(person_id, record, synced_at).await?)
  }

  async fn list_people(
    &self,
    person_type: Option<PersonType>,
  ) -> Result<Vec<DirectoryPerson>, FlakyError> {
    Ok(self.inner.list_people(person_type).await?)
  }

  async fn record_run(&self, run: SyncRun) -> Result<(), FlakyError> {
    Ok(self.inner.record_run(run).await?)
  }

  async fn list_runs(&self, limit: usize) -> Result<Vec<SyncRun>, FlakyError> {
    Ok(self.inner.list_runs(limit).await?)
  }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn epoch() -> DateTime<Utc> { Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap() }

fn ana() -> Value {
  json!({ "student_number": "2021001", "first_name": "Ana", "last_name": "Cruz" })
}

fn mixed_snapshot() -> Vec<Value> {
  vec![
    ana(),
    json!({
      "employee_id": "E1",
      "first_name": "Jane",
      "middle_name": "",
      "last_name": "Doe",
      "email": "  JANE@X.EDU  ",
      "department": "Pathology",
    }),
    json!({ "employee_id": "E9", "last_name": "Nofirst" }),
    json!({ "first_name": "No", "last_name": "Id" }),
    json!({ "id": 77, "first_name": "Gen", "last_name": "Eric", "course": "BSMT" }),
  ]
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_sync_inserts_student() {
  let s = store().await;

  let summary = Reconciler::new(s.clone(), Snapshot(vec![ana()]))
    .with_clock(StepClock::starting_at(epoch()))
    .reconcile()
    .await
    .unwrap();

  assert_eq!(
    (summary.fetched, summary.inserted, summary.updated, summary.skipped),
    (1, 1, 0, 0)
  );

  let people = s.list_people(None).await.unwrap();
  assert_eq!(people.len(), 1);
  assert_eq!(people[0].person_type, PersonType::Student);
  assert_eq!(people[0].external_ref_id, "2021001");
  assert_eq!(people[0].raw_payload, ana());
}

#[tokio::test]
async fn second_sync_updates_and_advances_last_synced_at() {
  let s     = store().await;
  let clock = StepClock::starting_at(epoch());

  Reconciler::new(s.clone(), Snapshot(vec![ana()]))
    .with_clock(clock.clone())
    .reconcile()
    .await
    .unwrap();
  let before = s
    .find_person("2021001", PersonType::Student)
    .await
    .unwrap()
    .unwrap();

  let summary = Reconciler::new(s.clone(), Snapshot(vec![ana()]))
    .with_clock(clock)
    .reconcile()
    .await
    .unwrap();
  assert_eq!(
    (summary.fetched, summary.inserted, summary.updated, summary.skipped),
    (1, 0, 1, 0)
  );

  let after = s
    .find_person("2021001", PersonType::Student)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(after.person_id, before.person_id);
  assert_eq!(after.external_ref_id, "2021001");
  assert_eq!(after.person_type, PersonType::Student);
  assert!(after.last_synced_at > before.last_synced_at);
  assert_eq!(after.created_at, before.created_at);
}

#[tokio::test]
async fn record_without_first_name_is_skipped() {
  let s = store().await;

  let summary = Reconciler::new(
    s.clone(),
    Snapshot(vec![json!({ "employee_id": "E9", "last_name": "Reyes" })]),
  )
  .reconcile()
  .await
  .unwrap();

  assert_eq!(
    (summary.fetched, summary.inserted, summary.updated, summary.skipped),
    (1, 0, 0, 1)
  );
  assert!(s.find_person("E9", PersonType::Employee).await.unwrap().is_none());
  assert!(s.list_people(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn skipped_record_leaves_existing_row_untouched() {
  let s     = store().await;
  let clock = StepClock::starting_at(epoch());

  Reconciler::new(
    s.clone(),
    Snapshot(vec![json!({ "employee_id": "E9", "first_name": "Ben", "last_name": "Reyes" })]),
  )
  .with_clock(clock.clone())
  .reconcile()
  .await
  .unwrap();
  let before = s
    .find_person("E9", PersonType::Employee)
    .await
    .unwrap()
    .unwrap();

  let summary = Reconciler::new(
    s.clone(),
    Snapshot(vec![json!({ "employee_id": "E9", "last_name": "Changed" })]),
  )
  .with_clock(clock)
  .reconcile()
  .await
  .unwrap();
  assert_eq!(
    (summary.fetched, summary.inserted, summary.updated, summary.skipped),
    (1, 0, 0, 1)
  );

  let after = s
    .find_person("E9", PersonType::Employee)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(after, before);
  assert_eq!(after.last_name, "Reyes");
  assert_eq!(after.last_synced_at, before.last_synced_at);
  assert_eq!(after.raw_payload, before.raw_payload);
  assert_eq!(s.list_people(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn mixed_snapshot_counts_add_up() {
  let s = store().await;

  let summary = Reconciler::new(s.clone(), Snapshot(mixed_snapshot()))
    .reconcile()
    .await
    .unwrap();

  assert_eq!(summary.fetched, 5);
  assert_eq!(summary.inserted, 3);
  assert_eq!(summary.skipped, 2);
  assert_eq!(summary.fetched, summary.inserted + summary.updated + summary.skipped);

  let jane = s
    .find_person("E1", PersonType::Employee)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(jane.email.as_deref(), Some("jane@x.edu"));
  assert_eq!(jane.middle_name, None);
  assert_eq!(jane.department_or_course.as_deref(), Some("Pathology"));

  let generic = s
    .find_person("77", PersonType::Employee)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(generic.department_or_course.as_deref(), Some("BSMT"));
}

#[tokio::test]
async fn rerun_is_idempotent() {
  let s = store().await;

  let first = Reconciler::new(s.clone(), Snapshot(mixed_snapshot()))
    .reconcile()
    .await
    .unwrap();
  let second = Reconciler::new(s.clone(), Snapshot(mixed_snapshot()))
    .reconcile()
    .await
    .unwrap();

  assert_eq!(second.inserted, 0);
  assert_eq!(second.updated, second.fetched - second.skipped);
  assert_eq!(second.updated, first.inserted);
  assert_eq!(s.list_people(None).await.unwrap().len() as u64, first.inserted);
}

#[tokio::test]
async fn update_replaces_changed_fields() {
  let s = store().await;

  Reconciler::new(s.clone(), Snapshot(vec![json!({
    "employee_id": "E1", "first_name": "Jane", "middle_name": "Q",
    "last_name": "Doe", "email": "jane@old.edu",
  })]))
  .reconcile()
  .await
  .unwrap();

  let changed = json!({
    "employee_id": "E1", "first_name": "Jane", "last_name": "Doe-Santos",
    "email": "Jane@New.edu", "home_address": "4 Mabini St.",
  });
  Reconciler::new(s.clone(), Snapshot(vec![changed.clone()]))
    .reconcile()
    .await
    .unwrap();

  let jane = s
    .find_person("E1", PersonType::Employee)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(jane.last_name, "Doe-Santos");
  assert_eq!(jane.middle_name, None);
  assert_eq!(jane.email.as_deref(), Some("jane@new.edu"));
  assert_eq!(jane.home_address.as_deref(), Some("4 Mabini St."));
  assert_eq!(jane.raw_payload, changed);
}

#[tokio::test]
async fn absent_records_are_not_deleted() {
  let s = store().await;

  Reconciler::new(s.clone(), Snapshot(mixed_snapshot()))
    .reconcile()
    .await
    .unwrap();
  let summary = Reconciler::new(s.clone(), Snapshot(vec![ana()]))
    .reconcile()
    .await
    .unwrap();

  assert_eq!(summary.updated, 1);
  assert_eq!(s.list_people(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn fetch_failure_touches_nothing_and_logs_failed_run() {
  let s        = store().await;
  let reporter = Arc::new(Collect::default());

  let err = Reconciler::new(s.clone(), Outage)
    .with_reporter(reporter.clone())
    .reconcile()
    .await
    .unwrap_err();
  assert!(matches!(err, SyncError::Fetch(FetchError::Status(503))));

  assert!(s.list_people(None).await.unwrap().is_empty());

  let runs = s.list_runs(5).await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].status, RunStatus::Failed);
  assert_eq!(runs[0].summary.fetched, 0);
  assert!(runs[0].error_message.as_deref().unwrap().contains("503"));

  let lines = reporter.0.lock().unwrap();
  assert!(lines.iter().any(|l| l.starts_with("Sync aborted")), "{lines:?}");
}

#[tokio::test]
async fn storage_failure_aborts_the_run() {
  let inner = store().await;
  let flaky = FlakyStore { inner: inner.clone(), fail_ref_id: "E1".into() };

  let err = Reconciler::new(flaky, Snapshot(mixed_snapshot()))
    .reconcile()
    .await
    .unwrap_err();
  assert!(matches!(err, SyncError::Store(_)));
  assert!(err.to_string().contains("E1"));

  // Ana came before E1 and stays; nothing after E1 was attempted.
  let people = inner.list_people(None).await.unwrap();
  assert_eq!(people.len(), 1);
  assert_eq!(people[0].external_ref_id, "2021001");

  let runs = inner.list_runs(5).await.unwrap();
  assert_eq!(runs[0].status, RunStatus::Failed);
  assert_eq!(runs[0].summary.inserted, 1);
}

#[tokio::test]
async fn successful_run_is_logged_with_elapsed_time() {
  let s        = store().await;
  let reporter = Arc::new(Collect::default());

  let summary = Reconciler::new(s.clone(), Snapshot(vec![ana()]))
    .with_clock(StepClock::starting_at(epoch()))
    .with_reporter(reporter.clone())
    .reconcile()
    .await
    .unwrap();

  // start, one upsert, finish: two seconds on the stepping clock.
  assert_eq!(summary.elapsed_seconds, 2.0);

  let runs = s.list_runs(5).await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].status, RunStatus::Succeeded);
  assert_eq!(runs[0].summary, summary);
  assert_eq!(runs[0].error_message, None);

  let lines = reporter.0.lock().unwrap();
  assert_eq!(lines.len(), 3, "{lines:?}");
  assert!(lines[2].contains("inserted=1"));
}

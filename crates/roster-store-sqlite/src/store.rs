//! [`SqliteStore`] — the SQLite implementation of [`DirectoryStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use roster_core::{
  person::{DirectoryPerson, PersonRecord, PersonType},
  run::SyncRun,
  store::DirectoryStore,
};

use crate::{
  encode::{
    encode_count, encode_dt, encode_person_type, encode_uuid, RawPerson, RawRun,
    PERSON_COLUMNS,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A directory store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    tracing::debug!(path = %path.as_ref().display(), "opening sqlite store");
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_person(&self, person_id: Uuid) -> Result<Option<DirectoryPerson>> {
    let id_str = encode_uuid(person_id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {PERSON_COLUMNS} FROM directory_people WHERE person_id = ?1"),
            rusqlite::params![id_str],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }
}

/// Column values shared by INSERT and UPDATE, in schema order starting at
/// `external_ref_id`.
struct PersonColumns {
  external_ref_id:      String,
  person_type:          String,
  first_name:           String,
  middle_name:          Option<String>,
  last_name:            String,
  gender:               Option<String>,
  birth_date:           Option<String>,
  home_address:         Option<String>,
  email:                Option<String>,
  department_or_course: Option<String>,
  raw_payload:          String,
}

impl PersonColumns {
  fn from_record(record: &PersonRecord) -> Result<Self> {
    Ok(Self {
      external_ref_id:      record.external_ref_id.clone(),
      person_type:          encode_person_type(record.person_type).to_owned(),
      first_name:           record.first_name.clone(),
      middle_name:          record.middle_name.clone(),
      last_name:            record.last_name.clone(),
      gender:               record.gender.clone(),
      birth_date:           record.birth_date.clone(),
      home_address:         record.home_address.clone(),
      email:                record.email.clone(),
      department_or_course: record.department_or_course.clone(),
      raw_payload:          serde_json::to_string(&record.raw_payload)?,
    })
  }
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn find_person(
    &self,
    external_ref_id: &str,
    person_type:     PersonType,
  ) -> Result<Option<DirectoryPerson>> {
    let ref_id   = external_ref_id.to_owned();
    let type_str = encode_person_type(person_type).to_owned();

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {PERSON_COLUMNS} FROM directory_people
               WHERE external_ref_id = ?1 AND lower(person_type) = ?2"
            ),
            rusqlite::params![ref_id, type_str],
            RawPerson::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn create_person(
    &self,
    record:    PersonRecord,
    synced_at: DateTime<Utc>,
  ) -> Result<DirectoryPerson> {
    let cols   = PersonColumns::from_record(&record)?;
    let person = DirectoryPerson {
      person_id:            Uuid::new_v4(),
      external_ref_id:      record.external_ref_id,
      person_type:          record.person_type,
      first_name:           record.first_name,
      middle_name:          record.middle_name,
      last_name:            record.last_name,
      gender:               record.gender,
      birth_date:           record.birth_date,
      home_address:         record.home_address,
      email:                record.email,
      department_or_course: record.department_or_course,
      raw_payload:          record.raw_payload,
      last_synced_at:       synced_at,
      created_at:           synced_at,
      updated_at:           synced_at,
    };

    let id_str = encode_uuid(person.person_id);
    let at_str = encode_dt(synced_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO directory_people ({PERSON_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13, ?13)"
          ),
          rusqlite::params![
            id_str,
            cols.external_ref_id,
            cols.person_type,
            cols.first_name,
            cols.middle_name,
            cols.last_name,
            cols.gender,
            cols.birth_date,
            cols.home_address,
            cols.email,
            cols.department_or_course,
            cols.raw_payload,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn update_person(
    &self,
    person_id: Uuid,
    record:    PersonRecord,
    synced_at: DateTime<Utc>,
  ) -> Result<DirectoryPerson> {
    let cols   = PersonColumns::from_record(&record)?;
    let id_str = encode_uuid(person_id);
    let at_str = encode_dt(synced_at);

    let changed = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "UPDATE directory_people SET
             external_ref_id      = ?2,
             person_type          = ?3,
             first_name           = ?4,
             middle_name          = ?5,
             last_name            = ?6,
             gender               = ?7,
             birth_date           = ?8,
             home_address         = ?9,
             email                = ?10,
             department_or_course = ?11,
             raw_payload          = ?12,
             last_synced_at       = ?13,
             updated_at           = ?13
           WHERE person_id = ?1",
          rusqlite::params![
            id_str,
            cols.external_ref_id,
            cols.person_type,
            cols.first_name,
            cols.middle_name,
            cols.last_name,
            cols.gender,
            cols.birth_date,
            cols.home_address,
            cols.email,
            cols.department_or_course,
            cols.raw_payload,
            at_str,
          ],
        )?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Err(Error::PersonNotFound(person_id));
    }

    self
      .get_person(person_id)
      .await?
      .ok_or(Error::PersonNotFound(person_id))
  }

  async fn list_people(&self, person_type: Option<PersonType>) -> Result<Vec<DirectoryPerson>> {
    let type_str = person_type.map(encode_person_type).map(str::to_owned);

    let raws: Vec<RawPerson> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(t) = type_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {PERSON_COLUMNS} FROM directory_people
             WHERE lower(person_type) = ?1
             ORDER BY last_name, first_name"
          ))?;
          stmt
            .query_map(rusqlite::params![t], RawPerson::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {PERSON_COLUMNS} FROM directory_people
             ORDER BY last_name, first_name"
          ))?;
          stmt
            .query_map([], RawPerson::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  // ── Run log ───────────────────────────────────────────────────────────────

  async fn record_run(&self, run: SyncRun) -> Result<()> {
    let id_str       = encode_uuid(run.run_id);
    let started_str  = encode_dt(run.started_at);
    let finished_str = encode_dt(run.finished_at);
    let status_str   = run.status.as_str().to_owned();
    let summary      = run.summary;
    let error        = run.error_message;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sync_runs (
             run_id, started_at, finished_at, status,
             fetched, inserted, updated, skipped, elapsed_seconds, error_message
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            started_str,
            finished_str,
            status_str,
            encode_count(summary.fetched),
            encode_count(summary.inserted),
            encode_count(summary.updated),
            encode_count(summary.skipped),
            summary.elapsed_seconds,
            error,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_runs(&self, limit: usize) -> Result<Vec<SyncRun>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawRun> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT run_id, started_at, finished_at, status,
                  fetched, inserted, updated, skipped, elapsed_seconds, error_message
           FROM sync_runs
           ORDER BY started_at DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| {
            Ok(RawRun {
              run_id:          row.get(0)?,
              started_at:      row.get(1)?,
              finished_at:     row.get(2)?,
              status:          row.get(3)?,
              fetched:         row.get(4)?,
              inserted:        row.get(5)?,
              updated:         row.get(6)?,
              skipped:         row.get(7)?,
              elapsed_seconds: row.get(8)?,
              error_message:   row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRun::into_run).collect()
  }
}

//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, UUIDs as hyphenated
//! lowercase strings, raw payloads as compact JSON.

use chrono::{DateTime, Utc};
use roster_core::{
  person::{DirectoryPerson, PersonType},
  run::{RunStatus, SyncRun, SyncSummary},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── PersonType ──────────────────────────────────────────────────────────────

pub fn encode_person_type(t: PersonType) -> &'static str { t.as_str() }

pub fn decode_person_type(s: &str) -> Result<PersonType> { Ok(s.parse()?) }

// ─── Counters ────────────────────────────────────────────────────────────────

// SQLite integers are signed; counts never approach the boundary.
pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::CountOutOfRange(n))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPerson`]'s field order.
pub const PERSON_COLUMNS: &str = "person_id, external_ref_id, person_type, first_name, \
   middle_name, last_name, gender, birth_date, home_address, email, \
   department_or_course, raw_payload, last_synced_at, created_at, updated_at";

/// Raw strings read directly from a `directory_people` row.
pub struct RawPerson {
  pub person_id:            String,
  pub external_ref_id:      String,
  pub person_type:          String,
  pub first_name:           String,
  pub middle_name:          Option<String>,
  pub last_name:            String,
  pub gender:               Option<String>,
  pub birth_date:           Option<String>,
  pub home_address:         Option<String>,
  pub email:                Option<String>,
  pub department_or_course: Option<String>,
  pub raw_payload:          String,
  pub last_synced_at:       String,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:            row.get(0)?,
      external_ref_id:      row.get(1)?,
      person_type:          row.get(2)?,
      first_name:           row.get(3)?,
      middle_name:          row.get(4)?,
      last_name:            row.get(5)?,
      gender:               row.get(6)?,
      birth_date:           row.get(7)?,
      home_address:         row.get(8)?,
      email:                row.get(9)?,
      department_or_course: row.get(10)?,
      raw_payload:          row.get(11)?,
      last_synced_at:       row.get(12)?,
      created_at:           row.get(13)?,
      updated_at:           row.get(14)?,
    })
  }

  pub fn into_person(self) -> Result<DirectoryPerson> {
    Ok(DirectoryPerson {
      person_id:            decode_uuid(&self.person_id)?,
      external_ref_id:      self.external_ref_id,
      person_type:          decode_person_type(&self.person_type)?,
      first_name:           self.first_name,
      middle_name:          self.middle_name,
      last_name:            self.last_name,
      gender:               self.gender,
      birth_date:           self.birth_date,
      home_address:         self.home_address,
      email:                self.email,
      department_or_course: self.department_or_course,
      raw_payload:          serde_json::from_str(&self.raw_payload)?,
      last_synced_at:       decode_dt(&self.last_synced_at)?,
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from a `sync_runs` row.
pub struct RawRun {
  pub run_id:          String,
  pub started_at:      String,
  pub finished_at:     String,
  pub status:          String,
  pub fetched:         i64,
  pub inserted:        i64,
  pub updated:         i64,
  pub skipped:         i64,
  pub elapsed_seconds: f64,
  pub error_message:   Option<String>,
}

impl RawRun {
  pub fn into_run(self) -> Result<SyncRun> {
    let status: RunStatus = self.status.parse()?;
    Ok(SyncRun {
      run_id: decode_uuid(&self.run_id)?,
      started_at: decode_dt(&self.started_at)?,
      finished_at: decode_dt(&self.finished_at)?,
      status,
      summary: SyncSummary {
        fetched:         decode_count(self.fetched)?,
        inserted:        decode_count(self.inserted)?,
        updated:         decode_count(self.updated)?,
        skipped:         decode_count(self.skipped)?,
        elapsed_seconds: self.elapsed_seconds,
      },
      error_message: self.error_message,
    })
  }
}

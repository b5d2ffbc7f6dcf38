//! Directory people — the local mirror of the external person directory.
//!
//! A person is identified by the pair `(external_ref_id, person_type)`. The
//! surrogate `person_id` exists only so rows can be addressed after lookup.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Type ────────────────────────────────────────────────────────────────────

/// Which half of the external directory a person came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonType {
  Student,
  Employee,
}

impl PersonType {
  /// The lower-case discriminant written to storage.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Student => "student",
      Self::Employee => "employee",
    }
  }
}

impl fmt::Display for PersonType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PersonType {
  type Err = Error;

  /// Case-insensitive; surrounding whitespace is ignored.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "student" => Ok(Self::Student),
      "employee" => Ok(Self::Employee),
      _ => Err(Error::UnknownPersonType(s.to_owned())),
    }
  }
}

// ─── PersonRecord ────────────────────────────────────────────────────────────

/// The normalized projection of one remote directory record.
///
/// Produced by [`crate::normalize::normalize`]; every value that reaches this
/// struct is trimmed and non-empty, and `email` is lower-case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
  pub external_ref_id:      String,
  pub person_type:          PersonType,
  pub first_name:           String,
  pub middle_name:          Option<String>,
  pub last_name:            String,
  pub gender:               Option<String>,
  pub birth_date:           Option<String>,
  pub home_address:         Option<String>,
  pub email:                Option<String>,
  pub department_or_course: Option<String>,
  /// The remote record exactly as fetched.
  pub raw_payload:          serde_json::Value,
}

// ─── DirectoryPerson ─────────────────────────────────────────────────────────

/// A persisted directory row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryPerson {
  pub person_id:            Uuid,
  pub external_ref_id:      String,
  pub person_type:          PersonType,
  pub first_name:           String,
  pub middle_name:          Option<String>,
  pub last_name:            String,
  pub gender:               Option<String>,
  pub birth_date:           Option<String>,
  pub home_address:         Option<String>,
  pub email:                Option<String>,
  pub department_or_course: Option<String>,
  pub raw_payload:          serde_json::Value,
  /// Time of the most recent reconciliation that wrote this row.
  pub last_synced_at:       DateTime<Utc>,
  pub created_at:           DateTime<Utc>,
  pub updated_at:           DateTime<Utc>,
}

impl DirectoryPerson {
  /// "First Middle Last", skipping an absent middle name.
  pub fn display_name(&self) -> String {
    match &self.middle_name {
      Some(middle) => format!("{} {} {}", self.first_name, middle, self.last_name),
      None => format!("{} {}", self.first_name, self.last_name),
    }
  }
}

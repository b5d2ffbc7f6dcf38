//! Remote record → [`PersonRecord`] normalization.
//!
//! The upstream directory mixes student and employee shapes in one list, and
//! the same logical field can appear under different keys. Each logical field
//! is resolved through an ordered key chain: the first key whose value is
//! present and non-null wins, even if that value turns out to be blank.

use serde_json::{Map, Value};

use crate::person::{PersonRecord, PersonType};

// ─── Key chains ──────────────────────────────────────────────────────────────

pub const STUDENT_NUMBER: &[&str] = &["student_number"];
pub const EMPLOYEE_ID: &[&str] = &["employee_id"];
pub const GENERIC_ID: &[&str] = &["id"];
pub const FIRST_NAME: &[&str] = &["first_name"];
pub const MIDDLE_NAME: &[&str] = &["middle_name"];
pub const LAST_NAME: &[&str] = &["last_name"];
pub const EMAIL: &[&str] = &["email"];
pub const DEPARTMENT_OR_COURSE: &[&str] =
  &["department", "course", "department_or_course"];
pub const GENDER: &[&str] = &["gender"];
pub const BIRTH_DATE: &[&str] = &["birth_date", "birthdate"];
pub const HOME_ADDRESS: &[&str] = &["home_address", "address"];

/// Reference id chain: student number, then employee id, then generic id.
pub const REFERENCE_ID: &[&[&str]] = &[STUDENT_NUMBER, EMPLOYEE_ID, GENERIC_ID];

// ─── Skip reasons ────────────────────────────────────────────────────────────

/// Why a remote record did not pass the validity gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
  NotAnObject,
  MissingReferenceId,
  MissingFirstName,
  MissingLastName,
}

impl SkipReason {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::NotAnObject => "not_an_object",
      Self::MissingReferenceId => "missing_reference_id",
      Self::MissingFirstName => "missing_first_name",
      Self::MissingLastName => "missing_last_name",
    }
  }
}

// ─── Lookups ─────────────────────────────────────────────────────────────────

/// The first value under `keys` that is present and not `null`.
fn first_present<'a>(
  record: &'a Map<String, Value>,
  keys: &[&str],
) -> Option<&'a Value> {
  keys
    .iter()
    .filter_map(|k| record.get(*k))
    .find(|v| !v.is_null())
}

/// Read a scalar as text. Arrays and objects have no text form here.
fn scalar_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

/// Trim, mapping an empty result to `None`.
fn clean(text: Option<String>) -> Option<String> {
  text
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

/// Resolve one logical text field through its key chain.
fn resolve_text(record: &Map<String, Value>, keys: &[&str]) -> Option<String> {
  clean(first_present(record, keys).and_then(scalar_text))
}

/// Student if a student-number key carries a non-null value, employee
/// otherwise.
pub fn infer_type(record: &Map<String, Value>) -> PersonType {
  if first_present(record, STUDENT_NUMBER).is_some() {
    PersonType::Student
  } else {
    PersonType::Employee
  }
}

fn resolve_reference_id(record: &Map<String, Value>) -> Option<String> {
  let chained: Vec<&str> = REFERENCE_ID.iter().flat_map(|c| c.iter().copied()).collect();
  resolve_text(record, &chained)
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Normalize one fetched record, consuming it into the stored raw payload.
///
/// Returns the reason instead of a record when the validity gate rejects it.
pub fn normalize(payload: Value) -> Result<PersonRecord, SkipReason> {
  let Value::Object(record) = &payload else {
    return Err(SkipReason::NotAnObject);
  };

  let person_type = infer_type(record);
  let external_ref_id = resolve_reference_id(record);
  let first_name = resolve_text(record, FIRST_NAME);
  let middle_name = resolve_text(record, MIDDLE_NAME);
  let last_name = resolve_text(record, LAST_NAME);
  let email = resolve_text(record, EMAIL).map(|e| e.to_lowercase());
  let department_or_course = resolve_text(record, DEPARTMENT_OR_COURSE);
  let gender = resolve_text(record, GENDER);
  let birth_date = resolve_text(record, BIRTH_DATE);
  let home_address = resolve_text(record, HOME_ADDRESS);

  let external_ref_id = external_ref_id.ok_or(SkipReason::MissingReferenceId)?;
  let first_name = first_name.ok_or(SkipReason::MissingFirstName)?;
  let last_name = last_name.ok_or(SkipReason::MissingLastName)?;

  Ok(PersonRecord {
    external_ref_id,
    person_type,
    first_name,
    middle_name,
    last_name,
    gender,
    birth_date,
    home_address,
    email,
    department_or_course,
    raw_payload: payload,
  })
}

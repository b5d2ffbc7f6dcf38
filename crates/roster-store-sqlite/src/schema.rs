//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are created and overwritten by the reconciler, never deleted by it.
CREATE TABLE IF NOT EXISTS directory_people (
    person_id            TEXT PRIMARY KEY,
    external_ref_id      TEXT NOT NULL,
    person_type          TEXT NOT NULL,   -- 'student' | 'employee', lower-case
    first_name           TEXT NOT NULL,
    middle_name          TEXT,
    last_name            TEXT NOT NULL,
    gender               TEXT,
    birth_date           TEXT,
    home_address         TEXT,
    email                TEXT,
    department_or_course TEXT,
    raw_payload          TEXT NOT NULL,   -- remote record, compact JSON
    last_synced_at       TEXT NOT NULL,   -- ISO 8601 UTC
    created_at           TEXT NOT NULL,
    updated_at           TEXT NOT NULL,
    UNIQUE (external_ref_id, person_type),
    CHECK  (external_ref_id != '' AND first_name != '' AND last_name != '')
);

CREATE TABLE IF NOT EXISTS sync_runs (
    run_id          TEXT PRIMARY KEY,
    started_at      TEXT NOT NULL,
    finished_at     TEXT NOT NULL,
    status          TEXT NOT NULL,   -- 'succeeded' | 'failed'
    fetched         INTEGER NOT NULL,
    inserted        INTEGER NOT NULL,
    updated         INTEGER NOT NULL,
    skipped         INTEGER NOT NULL,
    elapsed_seconds REAL NOT NULL,
    error_message   TEXT
);

CREATE INDEX IF NOT EXISTS directory_people_name_idx ON directory_people(last_name, first_name);
CREATE INDEX IF NOT EXISTS sync_runs_started_idx     ON sync_runs(started_at);

PRAGMA user_version = 1;
";

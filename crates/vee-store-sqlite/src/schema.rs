//! SQL schema for the VEE SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! layout so later migrations can be gated on it.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (center, license/permit type, issuing authority).
CREATE TABLE IF NOT EXISTS tracker_entries (
    record_id            TEXT PRIMARY KEY,
    center_id            TEXT NOT NULL,
    license_permit_type  TEXT NOT NULL,
    issuing_authority    TEXT NOT NULL,
    jurisdiction         TEXT,
    license_number       TEXT,
    expiration_date      TEXT,            -- YYYY-MM-DD or NULL
    renewal_window_start TEXT,            -- YYYY-MM-DD or NULL
    status               TEXT,
    raw                  TEXT NOT NULL DEFAULT '{}',
    created_at           TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    updated_at           TEXT NOT NULL,   -- RFC 3339 UTC; store-assigned
    UNIQUE (center_id, license_permit_type, issuing_authority)
);

CREATE INDEX IF NOT EXISTS tracker_entries_status_idx ON tracker_entries(status);

PRAGMA user_version = 1;
";

/// Columns an existing `tracker_entries` table must have, in any order.
pub const TRACKER_COLUMNS: [&str; 12] = [
  "record_id",
  "center_id",
  "license_permit_type",
  "issuing_authority",
  "jurisdiction",
  "license_number",
  "expiration_date",
  "renewal_window_start",
  "status",
  "raw",
  "created_at",
  "updated_at",
];

/// Column list shared by every record SELECT; matches [`crate::encode::RawRecord`].
pub const RECORD_COLUMNS: &str = "record_id, center_id, license_permit_type, \
   issuing_authority, jurisdiction, license_number, expiration_date, \
   renewal_window_start, status, raw, created_at, updated_at";

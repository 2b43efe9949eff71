//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`,
//! and UUIDs as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use vee_core::{
  normalize::parse_iso_date,
  record::{NaturalKey, TrackerRecord, TrackerUpsert},
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

/// Calendar dates may have been written by other tools; anything that does
/// not read as an ISO date is treated as absent rather than failing the read.
pub fn decode_date_lenient(column: &str, s: Option<&str>) -> Option<NaiveDate> {
  let s = s?.trim();
  if s.is_empty() {
    return None;
  }
  let parsed = parse_iso_date(s);
  if parsed.is_none() {
    tracing::warn!(column, value = s, "ignoring unparseable stored date");
  }
  parsed
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// An upsert with every column already rendered to text, ready to move onto
/// the database thread.
pub struct EncodedUpsert {
  pub center_id:            String,
  pub license_permit_type:  String,
  pub issuing_authority:    String,
  pub jurisdiction:         Option<String>,
  pub license_number:       Option<String>,
  pub expiration_date:      Option<String>,
  pub renewal_window_start: Option<String>,
  pub status:               Option<String>,
  pub raw:                  String,
}

impl From<TrackerUpsert> for EncodedUpsert {
  fn from(u: TrackerUpsert) -> Self {
    Self {
      center_id:            u.key.center_id,
      license_permit_type:  u.key.license_permit_type,
      issuing_authority:    u.key.issuing_authority,
      jurisdiction:         u.jurisdiction,
      license_number:       u.license_number,
      expiration_date:      u.expiration_date.map(encode_date),
      renewal_window_start: u.renewal_window_start.map(encode_date),
      status:               u.status,
      raw:                  u.raw,
    }
  }
}

/// Raw strings read directly from a `tracker_entries` row, in
/// [`crate::schema::RECORD_COLUMNS`] order.
pub struct RawRecord {
  pub record_id:            String,
  pub center_id:            String,
  pub license_permit_type:  String,
  pub issuing_authority:    String,
  pub jurisdiction:         Option<String>,
  pub license_number:       Option<String>,
  pub expiration_date:      Option<String>,
  pub renewal_window_start: Option<String>,
  pub status:               Option<String>,
  pub raw:                  Option<String>,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:            row.get(0)?,
      center_id:            row.get(1)?,
      license_permit_type:  row.get(2)?,
      issuing_authority:    row.get(3)?,
      jurisdiction:         row.get(4)?,
      license_number:       row.get(5)?,
      expiration_date:      row.get(6)?,
      renewal_window_start: row.get(7)?,
      status:               row.get(8)?,
      raw:                  row.get(9)?,
      created_at:           row.get(10)?,
      updated_at:           row.get(11)?,
    })
  }

  pub fn into_record(self) -> Result<TrackerRecord> {
    Ok(TrackerRecord {
      record_id:            decode_uuid(&self.record_id)?,
      key:                  NaturalKey {
        center_id:           self.center_id,
        license_permit_type: self.license_permit_type,
        issuing_authority:   self.issuing_authority,
      },
      jurisdiction:         self.jurisdiction,
      license_number:       self.license_number,
      expiration_date:      decode_date_lenient(
        "expiration_date",
        self.expiration_date.as_deref(),
      ),
      renewal_window_start: decode_date_lenient(
        "renewal_window_start",
        self.renewal_window_start.as_deref(),
      ),
      status:               self.status,
      raw:                  self.raw.unwrap_or_else(|| "{}".to_owned()),
      created_at:           decode_dt(&self.created_at)?,
      updated_at:           decode_dt(&self.updated_at)?,
    })
  }
}

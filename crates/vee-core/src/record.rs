//! The tracker record — one license or permit obligation held by one center
//! from one issuing authority.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::status::RenewalStatus;

// ─── Identity ────────────────────────────────────────────────────────────────

/// The immutable identity of a record. Globally unique in storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey {
  pub center_id:           String,
  pub license_permit_type: String,
  pub issuing_authority:   String,
}

impl NaturalKey {
  pub fn new(
    center_id: impl Into<String>,
    license_permit_type: impl Into<String>,
    issuing_authority: impl Into<String>,
  ) -> Self {
    Self {
      center_id:           center_id.into(),
      license_permit_type: license_permit_type.into(),
      issuing_authority:   issuing_authority.into(),
    }
  }
}

impl fmt::Display for NaturalKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} / {} / {}",
      self.center_id, self.license_permit_type, self.issuing_authority
    )
  }
}

// ─── Persisted record ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerRecord {
  pub record_id:            Uuid,
  #[serde(flatten)]
  pub key:                  NaturalKey,
  pub jurisdiction:         Option<String>,
  pub license_number:       Option<String>,
  pub expiration_date:      Option<NaiveDate>,
  pub renewal_window_start: Option<NaiveDate>,
  /// One of the renewal status labels once evaluated; before that, whatever
  /// the source spreadsheet carried (e.g. "Pending"), or nothing.
  pub status:               Option<String>,
  /// Compact JSON of the non-absent normalized fields from the latest import.
  pub raw:                  String,
  /// Store-assigned; fixed at first insert.
  pub created_at:           DateTime<Utc>,
  /// Store-assigned; refreshed on every write to the record.
  pub updated_at:           DateTime<Utc>,
}

// ─── Write inputs ────────────────────────────────────────────────────────────

/// Input to [`crate::store::TrackerStore::apply_import`]: the full set of
/// descriptive values one import row carries for a natural key.
///
/// Timestamps are not accepted from callers; the store assigns them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerUpsert {
  pub key:                  NaturalKey,
  pub jurisdiction:         Option<String>,
  pub license_number:       Option<String>,
  pub expiration_date:      Option<NaiveDate>,
  pub renewal_window_start: Option<NaiveDate>,
  pub status:               Option<String>,
  pub raw:                  String,
}

/// What an upsert did for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
  Inserted,
  Updated,
}

/// A status transition computed by the evaluator.
///
/// `from` is the stored status the evaluator read; the store only applies the
/// change while the record still holds that value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
  pub key:  NaturalKey,
  pub from: Option<String>,
  pub to:   RenewalStatus,
}

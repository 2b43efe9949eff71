//! The `TrackerStore` trait.
//!
//! Implemented by storage backends (e.g. `vee-store-sqlite`). The importer and
//! the evaluator in `vee-tracker` depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::record::{NaturalKey, StatusChange, TrackerRecord, TrackerUpsert, UpsertOutcome};

/// Abstraction over a tracker store backend.
///
/// Both batch writes are all-or-nothing: a failure part-way leaves no trace of
/// the batch. At most one record exists per [`NaturalKey`].
pub trait TrackerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert or update one record per upsert, in order, as a single unit.
  ///
  /// A key seen for the first time is inserted with
  /// `created_at = updated_at = now`; an existing key has every descriptive
  /// field, `raw` and `updated_at` overwritten, absent values included.
  /// Returns one outcome per input, in input order.
  fn apply_import(
    &self,
    batch: Vec<TrackerUpsert>,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<UpsertOutcome>, Self::Error>> + Send + '_;

  /// Write status transitions as a single unit, touching only `status` and
  /// `updated_at`.
  ///
  /// Fails (and writes nothing) if any record no longer holds the
  /// `from` status the change was computed against.
  fn apply_status_changes(
    &self,
    changes: Vec<StatusChange>,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Fetch one record by natural key. Returns `None` if not found.
  fn get_record(
    &self,
    key: NaturalKey,
  ) -> impl Future<Output = Result<Option<TrackerRecord>, Self::Error>> + Send + '_;

  /// All records ordered by natural key, optionally restricted to those whose
  /// stored status equals `status`.
  fn list_records(
    &self,
    status: Option<String>,
  ) -> impl Future<Output = Result<Vec<TrackerRecord>, Self::Error>> + Send + '_;
}

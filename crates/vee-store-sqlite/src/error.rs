//! Error type for `vee-store-sqlite`.

use thiserror::Error;
use vee_core::record::NaturalKey;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// An existing `tracker_entries` table has a different column set.
  #[error("tracker_entries has unexpected columns: {found:?}")]
  SchemaMismatch { found: Vec<String> },

  /// A status change was computed against a value that is no longer stored.
  #[error("status of {0} changed during evaluation")]
  StaleStatus(NaturalKey),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

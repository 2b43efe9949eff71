//! [`SqliteStore`] — the SQLite implementation of [`TrackerStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use vee_core::{
  record::{NaturalKey, StatusChange, TrackerRecord, TrackerUpsert, UpsertOutcome},
  store::TrackerStore,
};

use crate::{
  encode::{EncodedUpsert, RawRecord, encode_dt, encode_uuid},
  schema::{RECORD_COLUMNS, SCHEMA, TRACKER_COLUMNS},
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A tracker store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
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
    let existing: Vec<String> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("PRAGMA table_info(tracker_entries)")?;
        let names = stmt
          .query_map([], |row| row.get::<_, String>(1))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
      })
      .await?;

    // A table left behind by an older layout is reported, never dropped.
    if !existing.is_empty() {
      let matches = existing.len() == TRACKER_COLUMNS.len()
        && TRACKER_COLUMNS.iter().all(|c| existing.iter().any(|e| e == c));
      if !matches {
        return Err(Error::SchemaMismatch { found: existing });
      }
    }

    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run arbitrary SQL against the connection; lets tests plant rows that the
  /// public API would never write.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TrackerStore impl ───────────────────────────────────────────────────────

impl TrackerStore for SqliteStore {
  type Error = Error;

  async fn apply_import(
    &self,
    batch: Vec<TrackerUpsert>,
    now: DateTime<Utc>,
  ) -> Result<Vec<UpsertOutcome>> {
    let rows: Vec<EncodedUpsert> = batch.into_iter().map(EncodedUpsert::from).collect();
    let now_str = encode_dt(now);

    let outcomes = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut outcomes = Vec::with_capacity(rows.len());

        for row in &rows {
          let existing: Option<String> = tx
            .query_row(
              "SELECT record_id FROM tracker_entries
               WHERE center_id = ?1 AND license_permit_type = ?2 AND issuing_authority = ?3",
              rusqlite::params![
                row.center_id,
                row.license_permit_type,
                row.issuing_authority,
              ],
              |r| r.get(0),
            )
            .optional()?;

          match existing {
            Some(record_id) => {
              tx.execute(
                "UPDATE tracker_entries
                 SET jurisdiction = ?1,
                     license_number = ?2,
                     expiration_date = ?3,
                     renewal_window_start = ?4,
                     status = ?5,
                     raw = ?6,
                     updated_at = ?7
                 WHERE record_id = ?8",
                rusqlite::params![
                  row.jurisdiction,
                  row.license_number,
                  row.expiration_date,
                  row.renewal_window_start,
                  row.status,
                  row.raw,
                  now_str,
                  record_id,
                ],
              )?;
              outcomes.push(UpsertOutcome::Updated);
            }
            None => {
              tx.execute(
                "INSERT INTO tracker_entries (
                   record_id, center_id, license_permit_type, issuing_authority,
                   jurisdiction, license_number, expiration_date,
                   renewal_window_start, status, raw, created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                rusqlite::params![
                  encode_uuid(Uuid::new_v4()),
                  row.center_id,
                  row.license_permit_type,
                  row.issuing_authority,
                  row.jurisdiction,
                  row.license_number,
                  row.expiration_date,
                  row.renewal_window_start,
                  row.status,
                  row.raw,
                  now_str,
                ],
              )?;
              outcomes.push(UpsertOutcome::Inserted);
            }
          }
        }

        tx.commit()?;
        Ok(outcomes)
      })
      .await?;

    Ok(outcomes)
  }

  async fn apply_status_changes(
    &self,
    changes: Vec<StatusChange>,
    now: DateTime<Utc>,
  ) -> Result<()> {
    let now_str = encode_dt(now);

    // The closure hands back the first stale key instead of committing; the
    // dropped transaction rolls everything back.
    let stale: Option<NaturalKey> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        for change in changes {
          let updated = tx.execute(
            "UPDATE tracker_entries
             SET status = ?1, updated_at = ?2
             WHERE center_id = ?3 AND license_permit_type = ?4
               AND issuing_authority = ?5 AND status IS ?6",
            rusqlite::params![
              change.to.as_str(),
              now_str,
              change.key.center_id,
              change.key.license_permit_type,
              change.key.issuing_authority,
              change.from,
            ],
          )?;
          if updated == 0 {
            return Ok(Some(change.key));
          }
        }

        tx.commit()?;
        Ok(None)
      })
      .await?;

    match stale {
      Some(key) => Err(Error::StaleStatus(key)),
      None => Ok(()),
    }
  }

  async fn get_record(&self, key: NaturalKey) -> Result<Option<TrackerRecord>> {
    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {RECORD_COLUMNS} FROM tracker_entries
                 WHERE center_id = ?1 AND license_permit_type = ?2 AND issuing_authority = ?3"
              ),
              rusqlite::params![
                key.center_id,
                key.license_permit_type,
                key.issuing_authority,
              ],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn list_records(&self, status: Option<String>) -> Result<Vec<TrackerRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RECORD_COLUMNS} FROM tracker_entries
           WHERE ?1 IS NULL OR status = ?1
           ORDER BY center_id, license_permit_type, issuing_authority"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }
}

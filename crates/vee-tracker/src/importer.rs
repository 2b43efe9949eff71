//! The tracker upsert engine.

use std::{path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::Instrument as _;
use uuid::Uuid;
use vee_core::{
  clock::Clock,
  normalize::{Normalizer, RawRow, RowOutcome},
  record::UpsertOutcome,
  store::TrackerStore,
};

use crate::{
  Error, Result,
  source::{SourceOptions, read_rows},
};

/// Counts for one import run. `processed = inserted + updated + skipped`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
  pub processed: usize,
  pub inserted:  usize,
  pub updated:   usize,
  pub skipped:   usize,
}

/// Normalizes source rows and merges them into a [`TrackerStore`], one record
/// per natural key.
pub struct TrackerImporter<S, C> {
  store:      Arc<S>,
  clock:      C,
  normalizer: Normalizer,
}

impl<S, C> TrackerImporter<S, C>
where
  S: TrackerStore,
  C: Clock,
{
  /// An importer using the standard field schema.
  pub fn new(store: Arc<S>, clock: C) -> Self {
    Self { store, clock, normalizer: Normalizer::default() }
  }

  pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
    self.normalizer = normalizer;
    self
  }

  /// Read `path` and import its rows.
  ///
  /// A missing or unreadable file fails the run before anything is written.
  pub async fn import_file(
    &self,
    path: &Path,
    options: &SourceOptions,
  ) -> Result<ImportSummary> {
    let owned_path = path.to_path_buf();
    let owned_options = options.clone();
    let rows =
      read_blocking(path, move || read_rows(&owned_path, &owned_options)).await?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "read tracker source");
    self.import_rows(&rows).await
  }

  /// Import already-read rows as a single all-or-nothing batch.
  ///
  /// Blank rows are ignored entirely. Rows failing the required-field gate
  /// are counted as skipped and never reach the store.
  pub async fn import_rows(&self, rows: &[RawRow]) -> Result<ImportSummary> {
    let run_id = Uuid::new_v4();
    async move {
      let mut summary = ImportSummary::default();
      let mut batch = Vec::new();

      for (index, raw) in rows.iter().enumerate() {
        if raw.is_blank() {
          continue;
        }
        summary.processed += 1;

        let normalized = self.normalizer.normalize_row(raw);
        match self.normalizer.to_upsert(&normalized)? {
          RowOutcome::Accepted(upsert) => batch.push(upsert),
          RowOutcome::Rejected { missing } => {
            summary.skipped += 1;
            tracing::debug!(
              row = index + 1,
              missing = ?missing,
              "skipping row without required fields"
            );
          }
        }
      }

      if !batch.is_empty() {
        let outcomes = self
          .store
          .apply_import(batch, self.clock.now())
          .await
          .map_err(Error::store)?;
        for outcome in outcomes {
          match outcome {
            UpsertOutcome::Inserted => summary.inserted += 1,
            UpsertOutcome::Updated => summary.updated += 1,
          }
        }
      }

      tracing::info!(
        processed = summary.processed,
        inserted = summary.inserted,
        updated = summary.updated,
        skipped = summary.skipped,
        "tracker import complete"
      );
      Ok::<_, Error>(summary)
    }
    .instrument(tracing::info_span!("tracker_import", %run_id))
    .await
  }
}

/// Run a source reader on the blocking pool. A reader that panics surfaces as
/// [`Error::ReaderTask`], not as a file problem.
pub(crate) async fn read_blocking<F>(path: &Path, read: F) -> Result<Vec<RawRow>>
where
  F: FnOnce() -> Result<Vec<RawRow>> + Send + 'static,
{
  tokio::task::spawn_blocking(read).await.map_err(|e| {
    tracing::error!(path = %path.display(), error = %e, "tracker reader task failed");
    Error::ReaderTask(e)
  })?
}

//! The renewal status evaluator.

use std::sync::Arc;

use vee_core::{
  clock::Clock,
  record::StatusChange,
  status::{StatusCensus, classify},
  store::TrackerStore,
};

use crate::{Error, Result};

/// Recomputes every record's status and persists only the ones that changed.
pub struct RenewalEvaluator<S, C> {
  store: Arc<S>,
  clock: C,
}

impl<S, C> RenewalEvaluator<S, C>
where
  S: TrackerStore,
  C: Clock,
{
  pub fn new(store: Arc<S>, clock: C) -> Self { Self { store, clock } }

  /// Classify every stored record as of the clock's `today`.
  ///
  /// Records whose stored status already matches are left untouched, so their
  /// `updated_at` does not move. The changed records are written as one unit.
  pub async fn evaluate(&self) -> Result<StatusCensus> {
    let today = self.clock.today();
    let records = self.store.list_records(None).await.map_err(Error::store)?;

    let mut census = StatusCensus::default();
    let mut changes = Vec::new();
    for record in records {
      let status = classify(today, record.expiration_date, record.renewal_window_start);
      census.record(status);
      if record.status.as_deref() != Some(status.as_str()) {
        changes.push(StatusChange { key: record.key, from: record.status, to: status });
      }
    }

    let changed = changes.len();
    if !changes.is_empty() {
      self
        .store
        .apply_status_changes(changes, self.clock.now())
        .await
        .map_err(Error::store)?;
    }

    tracing::info!(
      %today,
      changed,
      expired = census.expired,
      in_renewal_window = census.in_renewal_window,
      due_soon = census.due_soon,
      upcoming = census.upcoming,
      active = census.active,
      "renewal evaluation complete"
    );
    Ok(census)
  }
}

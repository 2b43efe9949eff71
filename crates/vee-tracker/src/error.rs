//! Error type for `vee-tracker`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("tracker file not found: {}", .0.display())]
  SourceNotFound(PathBuf),

  #[error("cannot read {} as a spreadsheet: {reason}", .path.display())]
  SourceUnreadable { path: PathBuf, reason: String },

  #[error("tracker reader task failed: {0}")]
  ReaderTask(#[source] tokio::task::JoinError),

  #[error("core error: {0}")]
  Core(#[from] vee_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
    Self::SourceUnreadable { path: path.into(), reason: reason.to_string() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

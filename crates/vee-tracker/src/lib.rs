//! Tracker import and renewal evaluation.
//!
//! [`TrackerImporter`] reads a spreadsheet export, normalizes each row and
//! upserts the accepted ones into a [`vee_core::store::TrackerStore`].
//! [`RenewalEvaluator`] recomputes every record's renewal status and persists
//! the ones that changed. Both take a [`vee_core::clock::Clock`] so runs can
//! be pinned to a fixed date.

pub mod error;
pub mod evaluator;
pub mod importer;
pub mod source;

pub use error::{Error, Result};
pub use evaluator::RenewalEvaluator;
pub use importer::{ImportSummary, TrackerImporter};
pub use source::SourceOptions;

//! Core types and trait definitions for the VEE license tracker.
//!
//! This crate is deliberately free of file and database dependencies. It
//! holds the canonical record model, the column mapper and value normalizer,
//! the renewal status classifier, and the [`store::TrackerStore`] abstraction
//! that storage backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod fields;
pub mod normalize;
pub mod record;
pub mod status;
pub mod store;

pub use error::{Error, Result};

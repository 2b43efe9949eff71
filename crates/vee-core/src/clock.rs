//! Time source for the importer and the evaluator.
//!
//! Neither component reads the wall clock directly; they ask a [`Clock`] so
//! tests can pin "now" and "today".

use chrono::{DateTime, Local, NaiveDate, Utc};

pub trait Clock: Send + Sync {
  /// The current instant, used for `created_at` / `updated_at`.
  fn now(&self) -> DateTime<Utc>;

  /// The evaluation date used by the status classifier.
  fn today(&self) -> NaiveDate;
}

/// Reads the system clock. `today` is the local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }

  fn today(&self) -> NaiveDate { Local::now().date_naive() }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
  now:   DateTime<Utc>,
  today: NaiveDate,
}

impl FixedClock {
  /// Freeze at `now`, evaluating as of `today`.
  pub fn new(now: DateTime<Utc>, today: NaiveDate) -> Self { Self { now, today } }

  /// Freeze at `now`; `today` is its UTC calendar date.
  pub fn at(now: DateTime<Utc>) -> Self {
    Self { now, today: now.date_naive() }
  }

  /// Freeze at midnight UTC of `today`.
  pub fn on(today: NaiveDate) -> Self {
    Self { now: today.and_time(chrono::NaiveTime::MIN).and_utc(), today }
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> { self.now }

  fn today(&self) -> NaiveDate { self.today }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
  fn now(&self) -> DateTime<Utc> { (**self).now() }

  fn today(&self) -> NaiveDate { (**self).today() }
}

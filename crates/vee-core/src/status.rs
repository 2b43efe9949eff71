//! Renewal status classification.
//!
//! Every record is assigned exactly one [`RenewalStatus`] relative to an
//! evaluation date. Rules are checked in precedence order and the first match
//! wins:
//!
//! 1. `expired`: expiration date strictly before today.
//! 2. `in_renewal_window`: `renewal_window_start <= today < expiration_date`.
//! 3. `due_soon`: expiration within 0..=30 days.
//! 4. `upcoming`: expiration within 0..=90 days.
//! 5. `active`: everything else, including no expiration date at all.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Expiration within this many days is `due_soon`.
pub const DUE_SOON_DAYS: i64 = 30;

/// Expiration within this many days is `upcoming`.
pub const UPCOMING_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalStatus {
  Expired,
  InRenewalWindow,
  DueSoon,
  Upcoming,
  Active,
}

impl RenewalStatus {
  /// All statuses in precedence order.
  pub const ALL: [Self; 5] = [
    Self::Expired,
    Self::InRenewalWindow,
    Self::DueSoon,
    Self::Upcoming,
    Self::Active,
  ];

  /// The label stored in the `status` column.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Expired => "expired",
      Self::InRenewalWindow => "in_renewal_window",
      Self::DueSoon => "due_soon",
      Self::Upcoming => "upcoming",
      Self::Active => "active",
    }
  }
}

impl fmt::Display for RenewalStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RenewalStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|status| status.as_str() == s)
      .ok_or_else(|| Error::UnknownStatus(s.to_owned()))
  }
}

/// Classify a record as of `today`.
pub fn classify(
  today: NaiveDate,
  expiration_date: Option<NaiveDate>,
  renewal_window_start: Option<NaiveDate>,
) -> RenewalStatus {
  let Some(expiration) = expiration_date else {
    return RenewalStatus::Active;
  };

  if expiration < today {
    return RenewalStatus::Expired;
  }

  if let Some(window_start) = renewal_window_start
    && window_start <= today
    && today < expiration
  {
    return RenewalStatus::InRenewalWindow;
  }

  let days_out = (expiration - today).num_days();
  if (0..=DUE_SOON_DAYS).contains(&days_out) {
    RenewalStatus::DueSoon
  } else if (0..=UPCOMING_DAYS).contains(&days_out) {
    RenewalStatus::Upcoming
  } else {
    RenewalStatus::Active
  }
}

// ─── Census ──────────────────────────────────────────────────────────────────

/// Per-status counts from one evaluation pass. All five keys are always
/// present when serialized, even at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCensus {
  pub expired:           usize,
  pub in_renewal_window: usize,
  pub due_soon:          usize,
  pub upcoming:          usize,
  pub active:            usize,
}

impl StatusCensus {
  pub fn record(&mut self, status: RenewalStatus) { *self.slot(status) += 1; }

  pub fn get(&self, status: RenewalStatus) -> usize {
    match status {
      RenewalStatus::Expired => self.expired,
      RenewalStatus::InRenewalWindow => self.in_renewal_window,
      RenewalStatus::DueSoon => self.due_soon,
      RenewalStatus::Upcoming => self.upcoming,
      RenewalStatus::Active => self.active,
    }
  }

  pub fn total(&self) -> usize {
    RenewalStatus::ALL.into_iter().map(|s| self.get(s)).sum()
  }

  fn slot(&mut self, status: RenewalStatus) -> &mut usize {
    match status {
      RenewalStatus::Expired => &mut self.expired,
      RenewalStatus::InRenewalWindow => &mut self.in_renewal_window,
      RenewalStatus::DueSoon => &mut self.due_soon,
      RenewalStatus::Upcoming => &mut self.upcoming,
      RenewalStatus::Active => &mut self.active,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn today() -> NaiveDate { date(2025, 6, 15) }

  #[test]
  fn past_expiration_is_expired() {
    assert_eq!(
      classify(today(), Some(date(2025, 6, 1)), None),
      RenewalStatus::Expired
    );
  }

  #[test]
  fn expired_wins_over_open_renewal_window() {
    assert_eq!(
      classify(today(), Some(date(2025, 6, 14)), Some(date(2025, 5, 1))),
      RenewalStatus::Expired
    );
  }

  #[test]
  fn expiring_today_is_not_yet_expired() {
    // Strict `<`: today itself is not expired. The renewal window is
    // half-open, so with a window started it falls to due_soon (0 days).
    assert_eq!(classify(today(), Some(today()), None), RenewalStatus::DueSoon);
    assert_eq!(
      classify(today(), Some(today()), Some(date(2025, 5, 1))),
      RenewalStatus::DueSoon
    );
  }

  #[test]
  fn open_renewal_window() {
    assert_eq!(
      classify(today(), Some(date(2025, 9, 1)), Some(date(2025, 6, 1))),
      RenewalStatus::InRenewalWindow
    );
  }

  #[test]
  fn renewal_window_starting_today_is_open() {
    assert_eq!(
      classify(today(), Some(date(2025, 12, 1)), Some(today())),
      RenewalStatus::InRenewalWindow
    );
  }

  #[test]
  fn future_renewal_window_does_not_match() {
    assert_eq!(
      classify(today(), Some(date(2025, 7, 1)), Some(date(2025, 6, 20))),
      RenewalStatus::DueSoon
    );
  }

  #[test]
  fn due_soon_and_upcoming_boundaries() {
    assert_eq!(
      classify(today(), Some(date(2025, 7, 1)), None),
      RenewalStatus::DueSoon
    );
    assert_eq!(
      classify(today(), Some(date(2025, 7, 15)), None),
      RenewalStatus::DueSoon,
      "30 days out"
    );
    assert_eq!(
      classify(today(), Some(date(2025, 7, 16)), None),
      RenewalStatus::Upcoming,
      "31 days out"
    );
    assert_eq!(
      classify(today(), Some(date(2025, 8, 1)), None),
      RenewalStatus::Upcoming
    );
    assert_eq!(
      classify(today(), Some(date(2025, 9, 13)), None),
      RenewalStatus::Upcoming,
      "90 days out"
    );
    assert_eq!(
      classify(today(), Some(date(2025, 9, 14)), None),
      RenewalStatus::Active,
      "91 days out"
    );
  }

  #[test]
  fn no_expiration_is_active() {
    assert_eq!(classify(today(), None, None), RenewalStatus::Active);
    assert_eq!(
      classify(today(), None, Some(date(2025, 1, 1))),
      RenewalStatus::Active
    );
  }

  #[test]
  fn labels_round_trip_through_from_str() {
    for status in RenewalStatus::ALL {
      assert_eq!(status.as_str().parse::<RenewalStatus>().unwrap(), status);
    }
    assert!("Pending".parse::<RenewalStatus>().is_err());
  }

  #[test]
  fn census_always_serializes_every_status() {
    let mut census = StatusCensus::default();
    census.record(RenewalStatus::DueSoon);
    census.record(RenewalStatus::DueSoon);
    let json = serde_json::to_value(census).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "expired": 0,
        "in_renewal_window": 0,
        "due_soon": 2,
        "upcoming": 0,
        "active": 0,
      })
    );
    assert_eq!(census.total(), 2);
  }
}

//! Column mapping and value normalization.
//!
//! Turns one raw spreadsheet row (arbitrary headers, loosely typed cells)
//! into a [`NormalizedRow`] keyed by canonical field names, and decides
//! whether the row is complete enough to become a [`TrackerUpsert`]. Nothing
//! here performs I/O, and no individual cell can fail a row: values that
//! cannot be understood become absent.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime};

use crate::{
  Result,
  fields::{CanonicalField, FieldSchema, canonicalize_header},
  record::{NaturalKey, TrackerUpsert},
};

// ─── Input ───────────────────────────────────────────────────────────────────

/// A single scalar cell as read from a source file.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
  Empty,
  Text(String),
  Int(i64),
  Float(f64),
  Bool(bool),
  Date(NaiveDate),
  DateTime(NaiveDateTime),
}

impl CellValue {
  /// Empty cells and whitespace-only text.
  pub fn is_blank(&self) -> bool {
    match self {
      Self::Empty => true,
      Self::Text(s) => s.trim().is_empty(),
      Self::Float(f) => f.is_nan(),
      _ => false,
    }
  }
}

impl From<&str> for CellValue {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

/// One source row: `(header label, cell)` pairs in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
  cells: Vec<(String, CellValue)>,
}

impl RawRow {
  pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, label: impl Into<String>, value: CellValue) {
    self.cells.push((label.into(), value));
  }

  pub fn cells(&self) -> &[(String, CellValue)] { &self.cells }

  /// True when every cell is blank.
  pub fn is_blank(&self) -> bool {
    self.cells.iter().all(|(_, value)| value.is_blank())
  }
}

impl<L: Into<String>> FromIterator<(L, CellValue)> for RawRow {
  fn from_iter<I: IntoIterator<Item = (L, CellValue)>>(iter: I) -> Self {
    Self {
      cells: iter.into_iter().map(|(l, v)| (l.into(), v)).collect(),
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// A row keyed by canonical field name. `None` is the absent marker; an empty
/// string is never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
  values: BTreeMap<String, Option<String>>,
}

impl NormalizedRow {
  pub fn get(&self, field: CanonicalField) -> Option<&str> {
    self.column(field.name())
  }

  /// Look up any column, canonical or carried-through, by normalized name.
  pub fn column(&self, name: &str) -> Option<&str> {
    self.values.get(name).and_then(|v| v.as_deref())
  }

  pub fn columns(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
    self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
  }

  /// Required fields that are absent in this row.
  pub fn missing(&self, required: &[CanonicalField]) -> Vec<CanonicalField> {
    required
      .iter()
      .copied()
      .filter(|field| self.get(*field).is_none())
      .collect()
  }

  /// Sorted compact JSON of every present value. Absent fields are left out,
  /// so a snapshot never mentions values this row does not carry.
  pub fn raw_snapshot(&self) -> Result<String> {
    let present: BTreeMap<&str, &str> = self
      .values
      .iter()
      .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
      .collect();
    Ok(serde_json::to_string(&present)?)
  }
}

/// Whether a normalized row may be upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
  Accepted(TrackerUpsert),
  Rejected { missing: Vec<CanonicalField> },
}

// ─── Normalizer ──────────────────────────────────────────────────────────────

/// Applies a shared [`FieldSchema`] to raw rows.
#[derive(Debug, Clone)]
pub struct Normalizer {
  schema: Arc<FieldSchema>,
}

impl Default for Normalizer {
  fn default() -> Self { Self::new(FieldSchema::standard()) }
}

impl Normalizer {
  pub fn new(schema: Arc<FieldSchema>) -> Self { Self { schema } }

  pub fn schema(&self) -> &FieldSchema { &self.schema }

  /// Map headers and clean every cell.
  ///
  /// All canonical fields are present in the result (absent when no column
  /// maps to them). When several columns map to the same name the rightmost
  /// one wins.
  pub fn normalize_row(&self, row: &RawRow) -> NormalizedRow {
    let mut values: BTreeMap<String, Option<String>> = CanonicalField::ALL
      .iter()
      .map(|f| (f.name().to_owned(), None))
      .collect();

    for (index, (label, cell)) in row.cells().iter().enumerate() {
      let canonical = canonicalize_header(label);
      let (name, value) = match self.schema.resolve(&canonical) {
        Some(field) => (field.name().to_owned(), normalize_field(field, cell)),
        None if canonical.is_empty() => (format!("unnamed_{index}"), normalize_scalar(cell)),
        None => (canonical, normalize_scalar(cell)),
      };
      values.insert(name, value);
    }

    NormalizedRow { values }
  }

  /// Apply the required-field gate and build the upsert payload.
  pub fn to_upsert(&self, row: &NormalizedRow) -> Result<RowOutcome> {
    let missing = row.missing(self.schema.required());
    if !missing.is_empty() {
      return Ok(RowOutcome::Rejected { missing });
    }

    let text = |field| row.get(field).map(str::to_owned);
    let date = |field| row.get(field).and_then(parse_iso_date);

    // The gate always covers the key fields, so these are present.
    let (Some(center_id), Some(license_permit_type), Some(issuing_authority)) = (
      text(CanonicalField::CenterId),
      text(CanonicalField::LicensePermitType),
      text(CanonicalField::IssuingAuthority),
    ) else {
      return Ok(RowOutcome::Rejected { missing: CanonicalField::KEY.to_vec() });
    };

    Ok(RowOutcome::Accepted(TrackerUpsert {
      key:                  NaturalKey {
        center_id,
        license_permit_type,
        issuing_authority,
      },
      jurisdiction:         text(CanonicalField::Jurisdiction),
      license_number:       text(CanonicalField::LicenseNumber),
      expiration_date:      date(CanonicalField::ExpirationDate),
      renewal_window_start: date(CanonicalField::RenewalWindowStart),
      status:               text(CanonicalField::Status),
      raw:                  row.raw_snapshot()?,
    }))
  }
}

// ─── Cell cleaning ───────────────────────────────────────────────────────────

fn normalize_field(field: CanonicalField, cell: &CellValue) -> Option<String> {
  if field.is_date() {
    parse_date(cell).map(|d| d.format(ISO_DATE).to_string())
  } else {
    normalize_scalar(cell)
  }
}

/// Render a non-date cell as trimmed text. Whole floats lose their fraction
/// so identifiers like `1001.0` come through as `1001`.
pub fn normalize_scalar(cell: &CellValue) -> Option<String> {
  match cell {
    CellValue::Empty => None,
    CellValue::Text(s) => {
      let trimmed = s.trim();
      (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
    CellValue::Int(i) => Some(i.to_string()),
    CellValue::Float(f) if f.is_nan() => None,
    CellValue::Float(f) => Some(float_text(*f)),
    CellValue::Bool(b) => Some(b.to_string()),
    CellValue::Date(d) => Some(d.format(ISO_DATE).to_string()),
    CellValue::DateTime(dt) => Some(dt.to_string()),
  }
}

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

fn float_text(f: f64) -> String {
  if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT {
    format!("{}", f as i64)
  } else {
    f.to_string()
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

const ISO_DATE: &str = "%Y-%m-%d";

/// Accepted calendar-date layouts, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%Y/%m/%d"];

const FALLBACK_DATE_FORMATS: &[&str] =
  &["%m/%d/%y", "%B %d, %Y", "%B %d %Y", "%d %B %Y", "%d-%b-%Y"];

const FALLBACK_DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M:%S%.f",
  "%m/%d/%Y %H:%M:%S",
  "%m/%d/%Y %H:%M",
];

/// Day zero of the 1900 Excel date system, as every modern reader counts it.
fn excel_epoch() -> Option<NaiveDate> { NaiveDate::from_ymd_opt(1899, 12, 30) }

/// Serial for 9999-12-31.
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

/// Parse any cell into a calendar date; `None` when it is not a date.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
  match cell {
    CellValue::Date(d) => Some(*d),
    CellValue::DateTime(dt) => Some(dt.date()),
    CellValue::Text(s) => parse_date_text(s),
    CellValue::Int(i) => excel_serial_date(*i as f64),
    CellValue::Float(f) => excel_serial_date(*f),
    CellValue::Empty | CellValue::Bool(_) => None,
  }
}

/// Parse text against [`DATE_FORMATS`], then a set of best-effort layouts.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
  let text = text.trim();
  if text.is_empty() {
    return None;
  }

  // `%Y` accepts any digit count, so "3/15/27" would otherwise land in year
  // 27; such dates are left to the two-digit-year fallback.
  let plausible = |d: &NaiveDate| d.year() >= 1000;

  DATE_FORMATS
    .iter()
    .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok().filter(plausible))
    .or_else(|| {
      FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok().filter(plausible))
    })
    .or_else(|| {
      FALLBACK_DATETIME_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(text, fmt).ok().map(|dt| dt.date())
      })
    })
    .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

/// Strict-ish reader for values that were written as ISO dates, tolerating a
/// trailing time component. Used for the normalized row and for stored rows.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
  let text = text.trim();
  NaiveDate::parse_from_str(text, ISO_DATE)
    .ok()
    .or_else(|| {
      ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
    })
    .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
}

fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
  if !serial.is_finite() || !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
    return None;
  }
  excel_epoch()?.checked_add_signed(Duration::days(serial.floor() as i64))
}

//! Canonical field names and the header alias table.
//!
//! Spreadsheet exports spell the same column many ways ("Center ID",
//! "Center Code", "Centre"). Each raw header is first canonicalized with
//! [`canonicalize_header`] and then looked up in a [`FieldSchema`], which maps
//! known spellings onto one [`CanonicalField`].

use std::{
  collections::HashMap,
  fmt,
  sync::{Arc, LazyLock},
};

use serde::{Deserialize, Serialize};

// ─── Canonical fields ────────────────────────────────────────────────────────

/// The columns the tracker understands. Everything else in a source row is
/// carried through under its canonicalized header and otherwise ignored.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
  CenterId,
  LicensePermitType,
  IssuingAuthority,
  Jurisdiction,
  LicenseNumber,
  ExpirationDate,
  RenewalWindowStart,
  Status,
}

impl CanonicalField {
  pub const ALL: [Self; 8] = [
    Self::CenterId,
    Self::LicensePermitType,
    Self::IssuingAuthority,
    Self::Jurisdiction,
    Self::LicenseNumber,
    Self::ExpirationDate,
    Self::RenewalWindowStart,
    Self::Status,
  ];

  /// The three fields forming a record's natural key.
  pub const KEY: [Self; 3] =
    [Self::CenterId, Self::LicensePermitType, Self::IssuingAuthority];

  /// The column name used in normalized rows and in storage.
  pub fn name(self) -> &'static str {
    match self {
      Self::CenterId => "center_id",
      Self::LicensePermitType => "license_permit_type",
      Self::IssuingAuthority => "issuing_authority",
      Self::Jurisdiction => "jurisdiction",
      Self::LicenseNumber => "license_number",
      Self::ExpirationDate => "expiration_date",
      Self::RenewalWindowStart => "renewal_window_start",
      Self::Status => "status",
    }
  }

  /// Date-valued fields are parsed into ISO calendar dates.
  pub fn is_date(self) -> bool {
    matches!(self, Self::ExpirationDate | Self::RenewalWindowStart)
  }
}

impl fmt::Display for CanonicalField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

// ─── Alias table ─────────────────────────────────────────────────────────────

/// Accepted (already canonicalized) header spellings per field.
pub const ALIASES: &[(CanonicalField, &[&str])] = &[
  (CanonicalField::CenterId, &[
    "center",
    "center_id",
    "center_code",
    "centre",
    "centre_id",
    "location_id",
  ]),
  (CanonicalField::LicensePermitType, &[
    "license_permit_type",
    "license_type",
    "license_permit",
    "permit_type",
  ]),
  (CanonicalField::IssuingAuthority, &[
    "issuing_authority",
    "authority",
    "agency_name",
    "issuing_agency",
    "agency",
  ]),
  (CanonicalField::Jurisdiction, &["jurisdiction", "state", "county_state"]),
  (CanonicalField::LicenseNumber, &[
    "license_number",
    "license_permit_number",
    "license_no",
    "permit_number",
    "license",
  ]),
  (CanonicalField::ExpirationDate, &[
    "expiration_date",
    "expiration",
    "expires",
    "expiry_date",
    "exp_date",
  ]),
  (CanonicalField::RenewalWindowStart, &[
    "renewal_window_start",
    "renewal_start",
    "renewal_window",
  ]),
  (CanonicalField::Status, &["status", "license_status"]),
];

/// Rows missing any of these after normalization are skipped. The list is a
/// superset of the natural key so every accepted row can be evaluated.
pub const REQUIRED: &[CanonicalField] = &[
  CanonicalField::CenterId,
  CanonicalField::LicensePermitType,
  CanonicalField::IssuingAuthority,
  CanonicalField::Jurisdiction,
  CanonicalField::ExpirationDate,
];

// ─── Schema ──────────────────────────────────────────────────────────────────

/// Immutable header lookup plus the required-field policy.
///
/// Build one at startup and share it; nothing mutates a schema once built.
#[derive(Debug, Clone)]
pub struct FieldSchema {
  aliases:  HashMap<String, CanonicalField>,
  required: Vec<CanonicalField>,
}

static STANDARD: LazyLock<Arc<FieldSchema>> =
  LazyLock::new(|| Arc::new(FieldSchema::new(ALIASES, REQUIRED)));

impl FieldSchema {
  /// Build a schema from an alias table and a required-field list.
  ///
  /// Every canonical field name is implicitly an alias of itself, and the
  /// natural-key fields are always required.
  pub fn new(
    aliases: &[(CanonicalField, &[&str])],
    required: &[CanonicalField],
  ) -> Self {
    let mut lookup: HashMap<String, CanonicalField> = CanonicalField::ALL
      .iter()
      .map(|f| (f.name().to_owned(), *f))
      .collect();
    for (field, spellings) in aliases {
      for spelling in *spellings {
        lookup.insert(canonicalize_header(spelling), *field);
      }
    }

    let mut required_fields: Vec<CanonicalField> = CanonicalField::KEY.to_vec();
    for field in required {
      if !required_fields.contains(field) {
        required_fields.push(*field);
      }
    }

    Self { aliases: lookup, required: required_fields }
  }

  /// The process-wide default schema built from [`ALIASES`] and [`REQUIRED`].
  pub fn standard() -> Arc<Self> { Arc::clone(&STANDARD) }

  /// Resolve an already-canonicalized header. Matching is case-sensitive.
  pub fn resolve(&self, canonical_header: &str) -> Option<CanonicalField> {
    self.aliases.get(canonical_header).copied()
  }

  pub fn required(&self) -> &[CanonicalField] { &self.required }
}

/// Lower-case and trim `label`, collapse every run of non-alphanumeric
/// characters to one underscore, and strip leading/trailing underscores.
///
/// `"License/Permit Type"` becomes `"license_permit_type"`.
pub fn canonicalize_header(label: &str) -> String {
  let mut out = String::with_capacity(label.len());
  let mut pending_sep = false;
  for ch in label.trim().to_lowercase().chars() {
    if ch.is_ascii_alphanumeric() {
      if pending_sep && !out.is_empty() {
        out.push('_');
      }
      pending_sep = false;
      out.push(ch);
    } else {
      pending_sep = true;
    }
  }
  out
}

//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use vee_core::{
  record::{NaturalKey, StatusChange, TrackerUpsert, UpsertOutcome},
  status::RenewalStatus,
  store::TrackerStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 6, 15, hour, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn key(center: &str) -> NaturalKey {
  NaturalKey::new(center, "Health Permit", "County")
}

fn upsert(center: &str) -> TrackerUpsert {
  TrackerUpsert {
    key:                  key(center),
    jurisdiction:         Some("CA".into()),
    license_number:       Some("1111".into()),
    expiration_date:      Some(date(2025, 12, 31)),
    renewal_window_start: Some(date(2025, 10, 1)),
    status:               Some("Active".into()),
    raw:                  r#"{"center_id":"x","status":"Active"}"#.into(),
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_store_is_empty() {
  let s = store().await;
  assert!(s.list_records(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn reopening_a_file_store_keeps_records() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("tracker.db");

  let s = SqliteStore::open(&path).await.unwrap();
  s.apply_import(vec![upsert("C-1")], at(9)).await.unwrap();
  drop(s);

  let s = SqliteStore::open(&path).await.unwrap();
  assert_eq!(s.list_records(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn mismatched_existing_table_is_reported() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("legacy.db");
  {
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn
      .execute_batch(
        "CREATE TABLE tracker_entries (id INTEGER PRIMARY KEY, center_id TEXT);",
      )
      .unwrap();
  }

  let err = SqliteStore::open(&path).await.err().expect("open should fail");
  match err {
    Error::SchemaMismatch { found } => {
      assert_eq!(found, vec!["id".to_owned(), "center_id".to_owned()]);
    }
    other => panic!("unexpected error: {other}"),
  }
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_sighting_inserts_with_matching_timestamps() {
  let s = store().await;
  let outcomes = s.apply_import(vec![upsert("C-1")], at(9)).await.unwrap();
  assert_eq!(outcomes, vec![UpsertOutcome::Inserted]);

  let record = s.get_record(key("C-1")).await.unwrap().unwrap();
  assert_eq!(record.created_at, at(9));
  assert_eq!(record.updated_at, at(9));
  assert_eq!(record.jurisdiction.as_deref(), Some("CA"));
  assert_eq!(record.expiration_date, Some(date(2025, 12, 31)));
  assert_eq!(record.status.as_deref(), Some("Active"));
}

#[tokio::test]
async fn second_sighting_updates_in_place() {
  let s = store().await;
  s.apply_import(vec![upsert("C-1")], at(9)).await.unwrap();
  let first = s.get_record(key("C-1")).await.unwrap().unwrap();

  let mut changed = upsert("C-1");
  changed.license_number = Some("2222".into());
  changed.status = Some("Expired".into());
  changed.raw = r#"{"center_id":"x","status":"Expired"}"#.into();
  let outcomes = s.apply_import(vec![changed], at(10)).await.unwrap();
  assert_eq!(outcomes, vec![UpsertOutcome::Updated]);

  let second = s.get_record(key("C-1")).await.unwrap().unwrap();
  assert_eq!(second.record_id, first.record_id);
  assert_eq!(second.created_at, at(9));
  assert_eq!(second.updated_at, at(10));
  assert_eq!(second.license_number.as_deref(), Some("2222"));
  assert_eq!(second.status.as_deref(), Some("Expired"));
  assert!(!second.raw.contains("Active"));
}

#[tokio::test]
async fn update_overwrites_present_values_with_absent() {
  let s = store().await;
  s.apply_import(vec![upsert("C-1")], at(9)).await.unwrap();

  let mut sparse = upsert("C-1");
  sparse.license_number = None;
  sparse.renewal_window_start = None;
  sparse.status = None;
  s.apply_import(vec![sparse], at(10)).await.unwrap();

  let record = s.get_record(key("C-1")).await.unwrap().unwrap();
  assert_eq!(record.license_number, None);
  assert_eq!(record.renewal_window_start, None);
  assert_eq!(record.status, None);
}

#[tokio::test]
async fn repeated_key_within_one_batch_converges_to_one_row() {
  let s = store().await;
  let mut later = upsert("C-1");
  later.license_number = Some("9999".into());

  let outcomes = s
    .apply_import(vec![upsert("C-1"), later, upsert("C-2")], at(9))
    .await
    .unwrap();
  assert_eq!(outcomes, vec![
    UpsertOutcome::Inserted,
    UpsertOutcome::Updated,
    UpsertOutcome::Inserted,
  ]);

  let records = s.list_records(None).await.unwrap();
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].license_number.as_deref(), Some("9999"));
}

#[tokio::test]
async fn key_components_are_distinct_identities() {
  let s = store().await;
  let mut other_authority = upsert("C-1");
  other_authority.key.issuing_authority = "State".into();
  s.apply_import(vec![upsert("C-1"), other_authority], at(9))
    .await
    .unwrap();
  assert_eq!(s.list_records(None).await.unwrap().len(), 2);
}

// ─── Status changes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn status_change_touches_only_status_and_updated_at() {
  let s = store().await;
  s.apply_import(vec![upsert("C-1")], at(9)).await.unwrap();
  let before = s.get_record(key("C-1")).await.unwrap().unwrap();

  s.apply_status_changes(
    vec![StatusChange {
      key:  key("C-1"),
      from: Some("Active".into()),
      to:   RenewalStatus::Upcoming,
    }],
    at(11),
  )
  .await
  .unwrap();

  let after = s.get_record(key("C-1")).await.unwrap().unwrap();
  assert_eq!(after.status.as_deref(), Some("upcoming"));
  assert_eq!(after.updated_at, at(11));
  assert_eq!(after.created_at, before.created_at);
  assert_eq!(after.raw, before.raw);
  assert_eq!(after.license_number, before.license_number);
  assert_eq!(after.expiration_date, before.expiration_date);
}

#[tokio::test]
async fn status_change_from_absent_status() {
  let s = store().await;
  let mut no_status = upsert("C-1");
  no_status.status = None;
  s.apply_import(vec![no_status], at(9)).await.unwrap();

  s.apply_status_changes(
    vec![StatusChange { key: key("C-1"), from: None, to: RenewalStatus::Active }],
    at(10),
  )
  .await
  .unwrap();

  let record = s.get_record(key("C-1")).await.unwrap().unwrap();
  assert_eq!(record.status.as_deref(), Some("active"));
}

#[tokio::test]
async fn failed_import_batch_leaves_no_rows_behind() {
  let s = store().await;
  s.apply_import(vec![upsert("C-0")], at(9)).await.unwrap();
  s.execute_raw(
    "CREATE TRIGGER reject_bad BEFORE INSERT ON tracker_entries
     WHEN NEW.center_id = 'C-BAD'
     BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
  )
  .await
  .unwrap();

  let mut changed = upsert("C-0");
  changed.license_number = Some("2222".into());
  let result = s
    .apply_import(vec![changed, upsert("C-1"), upsert("C-2"), upsert("C-BAD")], at(10))
    .await;
  assert!(result.is_err());

  let records = s.list_records(None).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].license_number.as_deref(), Some("1111"));
  assert_eq!(records[0].updated_at, at(9));
}

#[tokio::test]
async fn stale_status_change_rolls_back_whole_batch() {
  let s = store().await;
  s.apply_import(vec![upsert("C-1"), upsert("C-2")], at(9))
    .await
    .unwrap();

  let err = s
    .apply_status_changes(
      vec![
        StatusChange {
          key:  key("C-1"),
          from: Some("Active".into()),
          to:   RenewalStatus::Expired,
        },
        StatusChange {
          key:  key("C-2"),
          from: Some("Pending".into()),
          to:   RenewalStatus::Expired,
        },
      ],
      at(10),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::StaleStatus(k) if k == key("C-2")));

  let first = s.get_record(key("C-1")).await.unwrap().unwrap();
  assert_eq!(first.status.as_deref(), Some("Active"));
  assert_eq!(first.updated_at, at(9));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_record_missing_returns_none() {
  let s = store().await;
  assert!(s.get_record(key("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn list_is_ordered_and_filterable() {
  let s = store().await;
  let mut pending = upsert("C-1");
  pending.status = Some("Pending".into());
  s.apply_import(vec![upsert("C-3"), pending, upsert("C-2")], at(9))
    .await
    .unwrap();

  let all = s.list_records(None).await.unwrap();
  let centers: Vec<_> = all.iter().map(|r| r.key.center_id.as_str()).collect();
  assert_eq!(centers, ["C-1", "C-2", "C-3"]);

  let pending = s.list_records(Some("Pending".into())).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].key, key("C-1"));
}

#[tokio::test]
async fn unparseable_stored_dates_read_as_absent() {
  let s = store().await;
  s.execute_raw(
    "INSERT INTO tracker_entries (
       record_id, center_id, license_permit_type, issuing_authority,
       expiration_date, renewal_window_start, status, raw, created_at, updated_at
     ) VALUES (
       '3f1c9a4e-8b1d-4f0e-9a57-2c1d5e6f7a80', 'C-9', 'Fire Permit', 'City',
       'next spring', '2025-13-01', 'Pending', '{}',
       '2025-06-15T09:00:00+00:00', '2025-06-15T09:00:00+00:00'
     );",
  )
  .await
  .unwrap();

  let record = s
    .get_record(NaturalKey::new("C-9", "Fire Permit", "City"))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(record.expiration_date, None);
  assert_eq!(record.renewal_window_start, None);
  assert_eq!(record.status.as_deref(), Some("Pending"));
}

//! Integration tests for `LakeStore` against a temporary directory.

use chrono::NaiveDate;
use gambit_core::{
  batch::{Batch, DIM_DATE},
  dimension::DateDim,
  store::{BlobStore, SnapshotStore},
  table::Table,
};

use crate::{Error, LakeStore};

fn lake() -> (tempfile::TempDir, LakeStore) {
  let dir = tempfile::tempdir().expect("temp dir");
  let store = LakeStore::new(dir.path());
  (dir, store)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

// ─── Blobs ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn blob_round_trip_creates_directories() {
  let (dir, s) = lake();
  let key = Batch::new(2024, 1).unwrap().bronze_key();

  s.put_blob(&key, b"[{\"url\":\"x\"}]".to_vec()).await.unwrap();

  assert!(dir.path().join(&key).is_file());
  let back = s.get_blob(&key).await.unwrap();
  assert_eq!(back.as_deref(), Some(&b"[{\"url\":\"x\"}]"[..]));
}

#[tokio::test]
async fn missing_blob_is_none() {
  let (_dir, s) = lake();
  assert!(s.get_blob("bronze/1999-01-games.json").await.unwrap().is_none());
}

#[tokio::test]
async fn put_blob_overwrites() {
  let (_dir, s) = lake();
  s.put_blob("bronze/a.json", b"first".to_vec()).await.unwrap();
  s.put_blob("bronze/a.json", b"second".to_vec()).await.unwrap();
  assert_eq!(
    s.get_blob("bronze/a.json").await.unwrap().as_deref(),
    Some(&b"second"[..])
  );
}

#[tokio::test]
async fn keys_cannot_escape_the_root() {
  let (_dir, s) = lake();
  for key in ["", "../outside.json", "/etc/passwd", "gold/../../x"] {
    let err = s.put_blob(key, vec![]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidKey(_)), "{key:?}");
  }
}

// ─── Snapshots ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_snapshot_is_none() {
  let (_dir, s) = lake();
  assert!(s.read_table(DIM_DATE).await.unwrap().is_none());
}

#[tokio::test]
async fn dimension_snapshot_round_trip() {
  let (dir, s) = lake();
  let rows = vec![
    DateDim::from_date(date(2024, 2, 29)),
    DateDim::from_date(date(2023, 12, 31)),
  ];

  s.write_table(DIM_DATE, Table::from_rows(&rows)).await.unwrap();
  assert!(dir.path().join(DIM_DATE).is_file());
  assert!(!dir.path().join("gold/dim_date.parquet.tmp").exists());

  let back: Vec<DateDim> = s
    .read_table(DIM_DATE)
    .await
    .unwrap()
    .expect("snapshot exists")
    .to_rows()
    .unwrap();
  assert_eq!(back, rows);
}

#[tokio::test]
async fn write_table_replaces_previous_snapshot() {
  let (_dir, s) = lake();
  let first = vec![DateDim::from_date(date(2024, 1, 1))];
  let second = vec![
    DateDim::from_date(date(2024, 1, 2)),
    DateDim::from_date(date(2024, 1, 3)),
  ];

  s.write_table(DIM_DATE, Table::from_rows(&first)).await.unwrap();
  s.write_table(DIM_DATE, Table::from_rows(&second)).await.unwrap();

  let back = s.read_table(DIM_DATE).await.unwrap().unwrap();
  assert_eq!(back.len(), 2);
  assert_eq!(back.to_rows::<DateDim>().unwrap(), second);
}

#[tokio::test]
async fn empty_snapshot_keeps_schema() {
  let (_dir, s) = lake();
  s.write_table(DIM_DATE, Table::from_rows::<DateDim>(&[]))
    .await
    .unwrap();

  let back = s.read_table(DIM_DATE).await.unwrap().unwrap();
  assert!(back.is_empty());
  assert!(back.to_rows::<DateDim>().unwrap().is_empty());
}

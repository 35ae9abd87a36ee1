//! Integration tests for `SqliteWarehouse` against an in-memory database.

use chrono::{NaiveDate, Utc};
use gambit_core::{
  dimension::{Dimension, ResultDim, TimeControlDim},
  store::Warehouse,
  table::{DataType, Field, Table, Value},
};

use crate::{Error, SqliteWarehouse};

async fn warehouse() -> SqliteWarehouse {
  SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse")
}

fn time_controls(labels: &[&str]) -> Table {
  let rows: Vec<TimeControlDim> = labels
    .iter()
    .map(|l| TimeControlDim {
      time_control: (*l).to_string(),
      time_class:   "blitz".to_string(),
    })
    .collect();
  Table::from_rows(&rows)
}

// ─── Replace semantics ───────────────────────────────────────────────────────

#[tokio::test]
async fn replace_table_loads_all_rows() {
  let w = warehouse().await;
  let loaded = w
    .replace_table(ResultDim::TABLE, Table::from_rows(&ResultDim::seed()))
    .await
    .unwrap();

  assert_eq!(loaded, ResultDim::seed().len());
  assert_eq!(w.row_count(ResultDim::TABLE).await.unwrap(), loaded);
}

#[tokio::test]
async fn second_load_replaces_instead_of_appending() {
  let w = warehouse().await;
  let name = TimeControlDim::TABLE;

  w.replace_table(name, time_controls(&["3+2", "5 min", "1+0"]))
    .await
    .unwrap();
  w.replace_table(name, time_controls(&["10 min"]))
    .await
    .unwrap();

  assert_eq!(w.row_count(name).await.unwrap(), 1);
}

#[tokio::test]
async fn empty_table_is_created_with_no_rows() {
  let w = warehouse().await;
  let loaded = w
    .replace_table("dim_openings", Table::new(vec![Field::required(
      "pgn_eco_url",
      DataType::Utf8,
    )]))
    .await
    .unwrap();
  assert_eq!(loaded, 0);
  assert_eq!(w.row_count("dim_openings").await.unwrap(), 0);
}

#[tokio::test]
async fn nulls_dates_and_timestamps_are_loaded() {
  let w = warehouse().await;
  let mut t = Table::new(vec![
    Field::required("game_url", DataType::Utf8),
    Field::nullable("game_date", DataType::Date),
    Field::nullable("start_time", DataType::Timestamp),
    Field::required("rated", DataType::Boolean),
  ]);
  let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
  t.push_row(vec![
    "u1".into(),
    Value::Date(day),
    Value::Timestamp(day.and_hms_opt(10, 0, 0).unwrap()),
    Value::Boolean(true),
  ])
  .unwrap();
  t.push_row(vec!["u2".into(), Value::Null, Value::Null, Value::Boolean(false)])
    .unwrap();

  assert_eq!(w.replace_table("fact_games", t).await.unwrap(), 2);

  type Row = (String, Option<String>, Option<String>, i64);
  let rows: Vec<Row> = w
    .conn
    .call(|conn| {
      let mut stmt = conn.prepare(
        "SELECT game_url, game_date, start_time, rated FROM fact_games ORDER BY game_url",
      )?;
      let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?
        .collect::<rusqlite::Result<Vec<Row>>>()?;
      Ok(rows)
    })
    .await
    .unwrap();

  assert_eq!(rows, vec![
    (
      "u1".to_string(),
      Some("2024-01-05".to_string()),
      Some("2024-01-05 10:00:00.000000".to_string()),
      1,
    ),
    ("u2".to_string(), None, None, 0),
  ]);
}

#[tokio::test]
async fn load_log_table_cannot_be_replaced() {
  let w = warehouse().await;
  for name in ["", "load_log", "LOAD_LOG"] {
    let err = w.replace_table(name, time_controls(&[])).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTableName(_)), "{name:?}");
  }
}

// ─── Load log ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn last_loaded_at_is_none_before_first_load() {
  let w = warehouse().await;
  assert!(w.last_loaded_at("fact_games").await.unwrap().is_none());
}

#[tokio::test]
async fn last_loaded_at_tracks_each_replace() {
  let w = warehouse().await;
  let before = Utc::now().naive_utc();

  w.replace_table(TimeControlDim::TABLE, time_controls(&["3+2"]))
    .await
    .unwrap();
  let first = w
    .last_loaded_at(TimeControlDim::TABLE)
    .await
    .unwrap()
    .expect("logged");
  assert!(first >= before);

  w.replace_table(TimeControlDim::TABLE, time_controls(&["5 min"]))
    .await
    .unwrap();
  let second = w
    .last_loaded_at(TimeControlDim::TABLE)
    .await
    .unwrap()
    .expect("logged");
  assert!(second >= first);

  // Other tables are unaffected.
  assert!(w.last_loaded_at(ResultDim::TABLE).await.unwrap().is_none());
}

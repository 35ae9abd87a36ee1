//! Encoding between [`Table`] values and SQLite column storage.
//!
//! Dates are stored as `YYYY-MM-DD` text and timestamps as
//! `YYYY-MM-DD HH:MM:SS.ffffff` text, so they sort lexicographically and
//! SQLite's date functions accept them. Booleans are stored as 0/1.
//!
//! [`Table`]: gambit_core::table::Table

use chrono::{NaiveDate, NaiveDateTime};
use gambit_core::table::{DataType, Field, Value};
use rusqlite::types::Value as SqlValue;

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

fn sql_type(data_type: DataType) -> &'static str {
  match data_type {
    DataType::Utf8 => "TEXT",
    DataType::Int64 => "INTEGER",
    DataType::Boolean => "BOOLEAN",
    DataType::Date => "DATE",
    DataType::Timestamp => "TIMESTAMP",
  }
}

pub fn create_table_sql(name: &str, fields: &[Field]) -> String {
  let columns = fields
    .iter()
    .map(|f| {
      let null = if f.nullable { "" } else { " NOT NULL" };
      format!("{} {}{null}", quote_ident(&f.name), sql_type(f.data_type))
    })
    .collect::<Vec<_>>()
    .join(", ");
  format!("CREATE TABLE {} ({columns})", quote_ident(name))
}

pub fn insert_sql(name: &str, fields: &[Field]) -> String {
  let columns = fields
    .iter()
    .map(|f| quote_ident(&f.name))
    .collect::<Vec<_>>()
    .join(", ");
  let placeholders = (1..=fields.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  format!(
    "INSERT INTO {} ({columns}) VALUES ({placeholders})",
    quote_ident(name)
  )
}

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn encode_timestamp(ts: NaiveDateTime) -> String {
  ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn decode_timestamp(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Utf8(s) => SqlValue::Text(s.clone()),
    Value::Int64(n) => SqlValue::Integer(*n),
    Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
    Value::Date(d) => SqlValue::Text(encode_date(*d)),
    Value::Timestamp(ts) => SqlValue::Text(encode_timestamp(*ts)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identifiers_are_quoted() {
    assert_eq!(quote_ident("dim_date"), "\"dim_date\"");
    assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
  }

  #[test]
  fn ddl_reflects_nullability() {
    let fields = vec![
      Field::required("game_url", DataType::Utf8),
      Field::nullable("game_date", DataType::Date),
    ];
    assert_eq!(
      create_table_sql("fact_games", &fields),
      "CREATE TABLE \"fact_games\" (\"game_url\" TEXT NOT NULL, \"game_date\" DATE)"
    );
    assert_eq!(
      insert_sql("fact_games", &fields),
      "INSERT INTO \"fact_games\" (\"game_url\", \"game_date\") VALUES (?1, ?2)"
    );
  }

  #[test]
  fn timestamps_round_trip_through_text() {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 10)
      .unwrap()
      .and_hms_micro_opt(0, 3, 0, 42)
      .unwrap();
    let text = encode_timestamp(ts);
    assert_eq!(text, "2024-03-10 00:03:00.000042");
    assert_eq!(decode_timestamp(&text).unwrap(), ts);
    assert!(decode_timestamp("yesterday").is_err());
  }

  #[test]
  fn booleans_and_dates_encode_as_sqlite_natives() {
    assert_eq!(encode_value(&Value::Boolean(true)), SqlValue::Integer(1));
    assert_eq!(
      encode_value(&Value::Date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())),
      SqlValue::Text("2024-01-05".into())
    );
    assert_eq!(encode_value(&Value::Null), SqlValue::Null);
  }
}

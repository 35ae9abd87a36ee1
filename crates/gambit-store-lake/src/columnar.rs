//! Conversion between [`Table`] and Arrow record batches.
//!
//! | Logical        | Arrow                          |
//! |----------------|--------------------------------|
//! | `Utf8`         | `Utf8`                         |
//! | `Int64`        | `Int64`                        |
//! | `Boolean`      | `Boolean`                      |
//! | `Date`         | `Date32` (days since epoch)    |
//! | `Timestamp`    | `Timestamp(Microsecond, None)` |

use std::sync::Arc;

use arrow::{
  array::{
    Array, ArrayRef, BooleanArray, Date32Array, Int64Array, StringArray,
    TimestampMicrosecondArray,
  },
  datatypes::{DataType as ArrowType, Field as ArrowField, Schema, SchemaRef, TimeUnit},
  record_batch::RecordBatch,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use gambit_core::table::{DataType, Field, Table, Value};

use crate::{Error, Result};

fn epoch() -> NaiveDate { DateTime::<Utc>::UNIX_EPOCH.date_naive() }

// ─── Schema ──────────────────────────────────────────────────────────────────

fn arrow_type(data_type: DataType) -> ArrowType {
  match data_type {
    DataType::Utf8 => ArrowType::Utf8,
    DataType::Int64 => ArrowType::Int64,
    DataType::Boolean => ArrowType::Boolean,
    DataType::Date => ArrowType::Date32,
    DataType::Timestamp => ArrowType::Timestamp(TimeUnit::Microsecond, None),
  }
}

fn logical_type(field: &ArrowField) -> Result<DataType> {
  match field.data_type() {
    ArrowType::Utf8 => Ok(DataType::Utf8),
    ArrowType::Int64 => Ok(DataType::Int64),
    ArrowType::Boolean => Ok(DataType::Boolean),
    ArrowType::Date32 => Ok(DataType::Date),
    ArrowType::Timestamp(TimeUnit::Microsecond, None) => Ok(DataType::Timestamp),
    other => Err(Error::UnsupportedColumn {
      column:    field.name().clone(),
      data_type: other.to_string(),
    }),
  }
}

pub fn schema_of(fields: &[Field]) -> SchemaRef {
  Arc::new(Schema::new(
    fields
      .iter()
      .map(|f| ArrowField::new(&f.name, arrow_type(f.data_type), f.nullable))
      .collect::<Vec<_>>(),
  ))
}

// ─── Table → RecordBatch ─────────────────────────────────────────────────────

/// Collect column `idx` of `table`, projecting each non-null value with
/// `extract`. A value of the wrong variant is a type mismatch.
fn column<T>(
  table: &Table,
  idx: usize,
  extract: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<Option<T>>> {
  let field = &table.fields()[idx];
  table
    .rows()
    .iter()
    .map(|row| match &row[idx] {
      Value::Null => Ok(None),
      value => extract(value).map(Some).ok_or_else(|| {
        Error::Core(gambit_core::Error::TypeMismatch {
          column:   field.name.clone(),
          expected: field.data_type,
          found:    value.data_type().unwrap_or(field.data_type),
        })
      }),
    })
    .collect()
}

pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
  let schema = schema_of(table.fields());

  let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.fields().len());
  for (idx, field) in table.fields().iter().enumerate() {
    let array: ArrayRef = match field.data_type {
      DataType::Utf8 => Arc::new(StringArray::from(column(table, idx, |v| match v {
        Value::Utf8(s) => Some(s.clone()),
        _ => None,
      })?)),
      DataType::Int64 => Arc::new(Int64Array::from(column(table, idx, |v| match v {
        Value::Int64(n) => Some(*n),
        _ => None,
      })?)),
      DataType::Boolean => Arc::new(BooleanArray::from(column(table, idx, |v| {
        match v {
          Value::Boolean(b) => Some(*b),
          _ => None,
        }
      })?)),
      DataType::Date => Arc::new(Date32Array::from(column(table, idx, |v| match v {
        Value::Date(d) => i32::try_from((*d - epoch()).num_days()).ok(),
        _ => None,
      })?)),
      DataType::Timestamp => {
        Arc::new(TimestampMicrosecondArray::from(column(table, idx, |v| {
          match v {
            Value::Timestamp(ts) => Some(ts.and_utc().timestamp_micros()),
            _ => None,
          }
        })?))
      }
    };
    columns.push(array);
  }

  Ok(RecordBatch::try_new(schema, columns)?)
}

// ─── RecordBatch → Table ─────────────────────────────────────────────────────

fn downcast<'a, A: Array + 'static>(name: &str, array: &'a ArrayRef) -> Result<&'a A> {
  array
    .as_any()
    .downcast_ref::<A>()
    .ok_or_else(|| Error::UnsupportedColumn {
      column:    name.to_string(),
      data_type: array.data_type().to_string(),
    })
}

fn decode_column(field: &Field, array: &ArrayRef) -> Result<Vec<Value>> {
  let name = field.name.as_str();
  match field.data_type {
    DataType::Utf8 => Ok(
      downcast::<StringArray>(name, array)?
        .iter()
        .map(|v| v.map(str::to_string).into())
        .collect(),
    ),
    DataType::Int64 => Ok(
      downcast::<Int64Array>(name, array)?
        .iter()
        .map(Value::from)
        .collect(),
    ),
    DataType::Boolean => Ok(
      downcast::<BooleanArray>(name, array)?
        .iter()
        .map(Value::from)
        .collect(),
    ),
    DataType::Date => downcast::<Date32Array>(name, array)?
      .iter()
      .map(|v| match v {
        None => Ok(Value::Null),
        Some(days) => epoch()
          .checked_add_signed(Duration::days(i64::from(days)))
          .map(Value::Date)
          .ok_or_else(|| Error::OutOfRange(name.to_string())),
      })
      .collect(),
    DataType::Timestamp => downcast::<TimestampMicrosecondArray>(name, array)?
      .iter()
      .map(|v| match v {
        None => Ok(Value::Null),
        Some(micros) => DateTime::from_timestamp_micros(micros)
          .map(|dt| Value::Timestamp(dt.naive_utc()))
          .ok_or_else(|| Error::OutOfRange(name.to_string())),
      })
      .collect(),
  }
}

/// Rebuild a [`Table`] from the batches of one file. `schema` is used when
/// the file holds no batches at all.
pub fn from_record_batches(schema: &Schema, batches: &[RecordBatch]) -> Result<Table> {
  let fields = schema
    .fields()
    .iter()
    .map(|f| {
      Ok(Field {
        name:      f.name().clone(),
        data_type: logical_type(f)?,
        nullable:  f.is_nullable(),
      })
    })
    .collect::<Result<Vec<_>>>()?;

  let mut table = Table::new(fields.clone());
  for batch in batches {
    let columns = fields
      .iter()
      .zip(batch.columns())
      .map(|(field, array)| decode_column(field, array))
      .collect::<Result<Vec<_>>>()?;

    for row in 0..batch.num_rows() {
      table.push_row(columns.iter().map(|c| c[row].clone()).collect())?;
    }
  }
  Ok(table)
}

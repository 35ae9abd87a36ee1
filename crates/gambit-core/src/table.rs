//! Engine-independent tabular data.
//!
//! The lake and warehouse sinks never see domain types; they exchange
//! [`Table`]s. Each row type implements [`Tabular`] to describe its columns
//! and to convert itself to and from a row of [`Value`]s. Columns are read
//! back by name, so a snapshot written with a different column order still
//! decodes.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ─── Schema ──────────────────────────────────────────────────────────────────

/// The logical type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
  Utf8,
  Int64,
  Boolean,
  Date,
  /// Wall-clock timestamp without a time zone, microsecond precision.
  Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
  pub name:      String,
  pub data_type: DataType,
  pub nullable:  bool,
}

impl Field {
  pub fn required(name: &str, data_type: DataType) -> Self {
    Self {
      name: name.to_string(),
      data_type,
      nullable: false,
    }
  }

  pub fn nullable(name: &str, data_type: DataType) -> Self {
    Self {
      name: name.to_string(),
      data_type,
      nullable: true,
    }
  }
}

// ─── Values ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Utf8(String),
  Int64(i64),
  Boolean(bool),
  Date(NaiveDate),
  Timestamp(NaiveDateTime),
}

impl Value {
  /// `None` for [`Value::Null`], which fits any nullable column.
  pub fn data_type(&self) -> Option<DataType> {
    match self {
      Self::Null => None,
      Self::Utf8(_) => Some(DataType::Utf8),
      Self::Int64(_) => Some(DataType::Int64),
      Self::Boolean(_) => Some(DataType::Boolean),
      Self::Date(_) => Some(DataType::Date),
      Self::Timestamp(_) => Some(DataType::Timestamp),
    }
  }

  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }
}

impl From<String> for Value {
  fn from(v: String) -> Self { Self::Utf8(v) }
}

impl From<&str> for Value {
  fn from(v: &str) -> Self { Self::Utf8(v.to_string()) }
}

impl From<i64> for Value {
  fn from(v: i64) -> Self { Self::Int64(v) }
}

impl From<bool> for Value {
  fn from(v: bool) -> Self { Self::Boolean(v) }
}

impl From<NaiveDate> for Value {
  fn from(v: NaiveDate) -> Self { Self::Date(v) }
}

impl From<NaiveDateTime> for Value {
  fn from(v: NaiveDateTime) -> Self { Self::Timestamp(v) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(v: Option<T>) -> Self { v.map_or(Self::Null, Into::into) }
}

// ─── Table ───────────────────────────────────────────────────────────────────

/// A schema plus row-major data. Every row has one value per field.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
  fields: Vec<Field>,
  rows:   Vec<Vec<Value>>,
}

impl Table {
  pub fn new(fields: Vec<Field>) -> Self {
    Self {
      fields,
      rows: Vec::new(),
    }
  }

  /// Append a row after checking arity, types, and nullability.
  pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
    if row.len() != self.fields.len() {
      return Err(Error::RowArity {
        expected: self.fields.len(),
        found:    row.len(),
      });
    }
    for (field, value) in self.fields.iter().zip(&row) {
      match value.data_type() {
        None if !field.nullable => {
          return Err(Error::UnexpectedNull(field.name.clone()));
        }
        Some(found) if found != field.data_type => {
          return Err(Error::TypeMismatch {
            column: field.name.clone(),
            expected: field.data_type,
            found,
          });
        }
        _ => {}
      }
    }
    self.rows.push(row);
    Ok(())
  }

  pub fn fields(&self) -> &[Field] { &self.fields }

  pub fn rows(&self) -> &[Vec<Value>] { &self.rows }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }

  pub fn column_index(&self, name: &str) -> Option<usize> {
    self.fields.iter().position(|f| f.name == name)
  }

  /// Build a table from typed rows.
  pub fn from_rows<T: Tabular>(rows: &[T]) -> Self {
    Self {
      fields: T::fields(),
      rows:   rows.iter().map(Tabular::to_row).collect(),
    }
  }

  /// Decode every row into `T`, matching columns by name.
  pub fn to_rows<T: Tabular>(&self) -> Result<Vec<T>> {
    for field in T::fields() {
      if self.column_index(&field.name).is_none() {
        return Err(Error::MissingColumn(field.name));
      }
    }
    self
      .rows
      .iter()
      .map(|values| {
        T::from_row(&RowReader {
          fields: &self.fields,
          values,
        })
      })
      .collect()
  }
}

// ─── Row conversion ──────────────────────────────────────────────────────────

/// A row type that can be stored as a [`Table`].
pub trait Tabular: Sized {
  /// Column definitions, in write order.
  fn fields() -> Vec<Field>;

  /// Values in the same order as [`Tabular::fields`].
  fn to_row(&self) -> Vec<Value>;

  fn from_row(row: &RowReader<'_>) -> Result<Self>;
}

/// Typed by-name access to one row of a [`Table`].
pub struct RowReader<'a> {
  fields: &'a [Field],
  values: &'a [Value],
}

macro_rules! typed_getters {
  ($req:ident, $opt:ident, $variant:ident, $ty:ty) => {
    pub fn $req(&self, name: &str) -> Result<$ty> {
      self
        .$opt(name)?
        .ok_or_else(|| Error::UnexpectedNull(name.to_string()))
    }

    pub fn $opt(&self, name: &str) -> Result<Option<$ty>> {
      match self.get(name)? {
        Value::Null => Ok(None),
        Value::$variant(v) => Ok(Some(v.clone())),
        other => Err(Error::TypeMismatch {
          column:   name.to_string(),
          expected: DataType::$variant,
          found:    other.data_type().unwrap_or(DataType::$variant),
        }),
      }
    }
  };
}

impl RowReader<'_> {
  fn get(&self, name: &str) -> Result<&Value> {
    self
      .fields
      .iter()
      .position(|f| f.name == name)
      .and_then(|i| self.values.get(i))
      .ok_or_else(|| Error::MissingColumn(name.to_string()))
  }

  typed_getters!(utf8, opt_utf8, Utf8, String);
  typed_getters!(int64, opt_int64, Int64, i64);
  typed_getters!(boolean, opt_boolean, Boolean, bool);
  typed_getters!(date, opt_date, Date, NaiveDate);
  typed_getters!(timestamp, opt_timestamp, Timestamp, NaiveDateTime);
}

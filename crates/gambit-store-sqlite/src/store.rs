//! [`SqliteWarehouse`]: the SQLite implementation of [`Warehouse`].

use std::path::Path;

use chrono::{NaiveDateTime, Utc};
use gambit_core::{store::Warehouse, table::Table};
use tracing::info;

use crate::{
  Error, Result,
  encode::{
    create_table_sql, decode_timestamp, encode_timestamp, encode_value, insert_sql,
    quote_ident,
  },
  schema::{LOAD_LOG, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A relational warehouse backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteWarehouse {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory warehouse, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// When `table` was last replaced, or `None` if it never was.
  pub async fn last_loaded_at(&self, table: &str) -> Result<Option<NaiveDateTime>> {
    let name = table.to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT MAX(loaded_at) FROM load_log WHERE table_name = ?1",
          rusqlite::params![name],
          |r| r.get(0),
        )?)
      })
      .await?;
    raw.as_deref().map(decode_timestamp).transpose()
  }

  /// Current row count of a loaded table.
  pub async fn row_count(&self, table: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = Error;

  async fn replace_table(&self, name: &str, table: Table) -> Result<usize> {
    if name.is_empty() || name.eq_ignore_ascii_case(LOAD_LOG) {
      return Err(Error::InvalidTableName(name.to_string()));
    }

    let drop_sql   = format!("DROP TABLE IF EXISTS {}", quote_ident(name));
    let create_sql = create_table_sql(name, table.fields());
    let insert_sql = insert_sql(name, table.fields());
    let table_name = name.to_owned();
    let loaded_at  = encode_timestamp(Utc::now().naive_utc());

    let count = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(&drop_sql, [])?;
        tx.execute(&create_sql, [])?;
        {
          let mut stmt = tx.prepare(&insert_sql)?;
          for row in table.rows() {
            stmt.execute(rusqlite::params_from_iter(row.iter().map(encode_value)))?;
          }
        }
        tx.execute(
          "INSERT INTO load_log (table_name, row_count, loaded_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![table_name, table.len() as i64, loaded_at],
        )?;
        tx.commit()?;
        Ok(table.len())
      })
      .await?;

    info!(table = name, rows = count, "replaced warehouse table");
    Ok(count)
  }
}

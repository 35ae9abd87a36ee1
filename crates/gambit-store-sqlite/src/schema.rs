//! Bookkeeping schema for the gambit warehouse.
//!
//! Loaded tables are created on demand from their [`Table`] schema; only the
//! load log is fixed.
//!
//! [`Table`]: gambit_core::table::Table

/// Name of the load-log table; never a valid load target.
pub const LOAD_LOG: &str = "load_log";

/// Idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per replace_table call, appended in the same transaction as the
-- load itself.
CREATE TABLE IF NOT EXISTS load_log (
    load_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    table_name  TEXT    NOT NULL,
    row_count   INTEGER NOT NULL,
    loaded_at   TEXT    NOT NULL    -- 'YYYY-MM-DD HH:MM:SS.ffffff', UTC
);

CREATE INDEX IF NOT EXISTS load_log_table_idx ON load_log(table_name, loaded_at);

PRAGMA user_version = 1;
";

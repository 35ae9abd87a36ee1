//! [`LakeStore`]: the filesystem implementation of [`BlobStore`] and
//! [`SnapshotStore`].

use std::{
  fs::{self, File},
  io,
  path::{Component, Path, PathBuf},
};

use gambit_core::{
  store::{BlobStore, SnapshotStore},
  table::Table,
};
use parquet::{
  arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder},
  basic::{Compression, ZstdLevel},
  file::properties::WriterProperties,
};
use tracing::debug;

use crate::{
  Error, Result,
  columnar::{from_record_batches, to_record_batch},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A data lake rooted at a local directory. Keys are relative paths such as
/// `bronze/2024-01-games.json`.
///
/// Cloning is cheap; the store holds only its root path.
#[derive(Debug, Clone)]
pub struct LakeStore {
  root: PathBuf,
}

impl LakeStore {
  /// A store rooted at `root`. The directory is created on first write.
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve `key` below the root, rejecting absolute paths and `..`.
  pub fn path_for(&self, key: &str) -> Result<PathBuf> {
    let rel = Path::new(key);
    let well_formed = !key.is_empty()
      && rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !well_formed {
      return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(self.root.join(rel))
  }
}

// ─── Blocking helpers ────────────────────────────────────────────────────────

/// Write through a sibling temp file and rename, so readers never observe a
/// partially written object.
fn write_replacing(path: &Path, write: impl FnOnce(File) -> Result<()>) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent)?;
  }
  let mut tmp = path.as_os_str().to_owned();
  tmp.push(".tmp");
  let tmp = PathBuf::from(tmp);

  let outcome = File::create(&tmp)
    .map_err(Error::from)
    .and_then(write)
    .and_then(|()| fs::rename(&tmp, path).map_err(Error::from));
  if outcome.is_err() {
    let _ = fs::remove_file(&tmp);
  }
  outcome
}

fn open_existing(path: &Path) -> Result<Option<File>> {
  match File::open(path) {
    Ok(file) => Ok(Some(file)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e.into()),
  }
}

fn write_parquet(path: &Path, table: &Table) -> Result<()> {
  let batch = to_record_batch(table)?;
  let props = WriterProperties::builder()
    .set_compression(Compression::ZSTD(ZstdLevel::default()))
    .build();

  write_replacing(path, |file| {
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
  })
}

fn read_parquet(path: &Path) -> Result<Option<Table>> {
  let Some(file) = open_existing(path)? else {
    return Ok(None);
  };
  let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
  let schema = builder.schema().clone();
  let batches = builder
    .build()?
    .collect::<std::result::Result<Vec<_>, _>>()?;
  from_record_batches(&schema, &batches).map(Some)
}

// ─── BlobStore impl ──────────────────────────────────────────────────────────

impl BlobStore for LakeStore {
  type Error = Error;

  async fn put_blob(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
    let path = self.path_for(key)?;
    let len = bytes.len();
    tokio::task::spawn_blocking(move || {
      write_replacing(&path, |mut file| {
        io::Write::write_all(&mut file, &bytes)?;
        Ok(())
      })
    })
    .await??;
    debug!(key, bytes = len, "wrote blob");
    Ok(())
  }

  async fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>> {
    let path = self.path_for(key)?;
    let bytes = tokio::task::spawn_blocking(move || match fs::read(&path) {
      Ok(bytes) => Ok(Some(bytes)),
      Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::from(e)),
    })
    .await??;
    Ok(bytes)
  }
}

// ─── SnapshotStore impl ──────────────────────────────────────────────────────

impl SnapshotStore for LakeStore {
  type Error = Error;

  async fn read_table(&self, key: &str) -> Result<Option<Table>> {
    let path = self.path_for(key)?;
    let table = tokio::task::spawn_blocking(move || read_parquet(&path)).await??;
    if let Some(t) = &table {
      debug!(key, rows = t.len(), "read snapshot");
    }
    Ok(table)
  }

  async fn write_table(&self, key: &str, table: Table) -> Result<()> {
    let path = self.path_for(key)?;
    let rows = table.len();
    tokio::task::spawn_blocking(move || write_parquet(&path, &table)).await??;
    debug!(key, rows, "wrote snapshot");
    Ok(())
  }
}

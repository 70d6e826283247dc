//! Storage collaborator for the ledger slot.
//!
//! A store only reads and writes one named string slot; encoding lives in
//! `ledger`. Writes are full overwrites.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use thiserror::Error;
#[cfg(test)]
use tokio::sync::Mutex;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum StorageError {
  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait LedgerStore: Send + Sync {
  /// Raw slot contents, `None` when nothing was ever saved.
  async fn load(&self) -> Result<Option<String>>;
  async fn save(&self, raw: &str) -> Result<()>;
}

/// Slot kept as `<dir>/<slot>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
  path: PathBuf,
}

impl FileStore {
  pub fn new(dir: impl AsRef<Path>, slot: &str) -> Self {
    Self { path: dir.as_ref().join(format!("{}.json", slot)) }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[async_trait]
impl LedgerStore for FileStore {
  #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
  async fn load(&self) -> Result<Option<String>> {
    match tokio::fs::read_to_string(&self.path).await {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(level = "debug", skip(self, raw), fields(path = %self.path.display(), bytes = raw.len()))]
  async fn save(&self, raw: &str) -> Result<()> {
    if let Some(dir) = self.path.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }
    // Write next to the slot then rename, so a crash never leaves half a file.
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, raw).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    debug!(target: "conjuga_backend", "Ledger slot written");
    Ok(())
  }
}

/// In-process slot.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
  slot: Mutex<Option<String>>,
  saves: AtomicUsize,
}

#[cfg(test)]
impl MemoryStore {
  pub fn with_slot(raw: impl Into<String>) -> Self {
    Self { slot: Mutex::new(Some(raw.into())), saves: AtomicUsize::new(0) }
  }

  pub async fn snapshot(&self) -> Option<String> {
    self.slot.lock().await.clone()
  }

  pub fn save_count(&self) -> usize {
    self.saves.load(Ordering::Relaxed)
  }
}

#[cfg(test)]
#[async_trait]
impl LedgerStore for MemoryStore {
  async fn load(&self) -> Result<Option<String>> {
    Ok(self.slot.lock().await.clone())
  }

  async fn save(&self, raw: &str) -> Result<()> {
    *self.slot.lock().await = Some(raw.to_string());
    self.saves.fetch_add(1, Ordering::Relaxed);
    Ok(())
  }
}

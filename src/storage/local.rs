//! Local filesystem store implementation.
//!
//! One JSON file per source under a root directory:
//!
//! ```text
//! {root}/
//! ├── linkedin.json
//! ├── indeed.json
//! └── simplify.json
//! ```
//!
//! Writes are atomic (temp file, then rename) so a crashed run never
//! leaves a half-written snapshot behind.

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::storage::{RecordStore, StoredRecord};

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStore {
    root_dir: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// File key for a source, with path separators stripped out.
    fn source_key(source: &str) -> String {
        let safe: String = source
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{}.json", safe)
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Load all stored records for a source.
    pub async fn load_records(&self, source: &str) -> Result<Vec<StoredRecord>> {
        let key = Self::source_key(source);
        Ok(self.read_json(&key).await?.unwrap_or_default())
    }
}

#[async_trait]
impl RecordStore for LocalStore {
    async fn load_ids(&self, source: &str) -> Result<HashSet<String>> {
        let records = self.load_records(source).await?;
        Ok(records.into_iter().map(|r| r.id).collect())
    }

    async fn upsert(&self, source: &str, records: &[StoredRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let key = Self::source_key(source);
        let mut existing = self.load_records(source).await?;

        for record in records {
            match existing.iter_mut().find(|r| r.id == record.id) {
                Some(stored) => {
                    // Update in place; scraped_at keeps the original
                    // first-seen timestamp so pruning stays stable.
                    let scraped_at = stored.scraped_at;
                    *stored = record.clone();
                    stored.scraped_at = scraped_at;
                }
                None => existing.push(record.clone()),
            }
        }

        self.write_json(&key, &existing).await?;
        Ok(records.len())
    }

    async fn prune(&self, source: &str, max_size: usize) -> Result<usize> {
        let key = Self::source_key(source);
        let mut records = self.load_records(source).await?;
        if records.len() <= max_size {
            return Ok(0);
        }

        // Newest first, then drop the tail.
        records.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
        let removed = records.len() - max_size;
        records.truncate(max_size);

        self.write_json(&key, &records).await?;
        log::info!("Pruned {} records from {} (max {})", removed, source, max_size);
        Ok(removed)
    }
}

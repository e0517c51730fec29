//! Persistence abstractions for the seen-record store.
//!
//! The pipeline consumes a narrow contract: a membership snapshot
//! taken once before a run, an idempotent upsert, and size-bounded
//! pruning. The snapshot is a performance optimization, not the
//! correctness mechanism; two concurrent runs may both see "not seen"
//! for the same id and both upsert, and idempotence resolves that.

pub mod local;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::CanonicalRecord;

// Re-export for convenience
pub use local::LocalStore;

/// A record as persisted per source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Content-addressable id (the dedup key)
    pub id: String,
    /// Hash pre-image, for debuggability
    pub normalized_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub posted_date: String,
    /// Scrapers that reported this record, comma-joined
    pub source: String,
    pub description: String,
    /// When the pipeline first saw this record (prune key)
    pub scraped_at: DateTime<Utc>,
    /// Last time an upsert touched this record
    pub last_updated: DateTime<Utc>,
}

impl StoredRecord {
    /// Build a stored record from a canonical record.
    pub fn from_record(record: &CanonicalRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id.clone(),
            normalized_id: record.normalized_id.clone(),
            title: record.title.clone(),
            company: record.company.clone(),
            location: record.location.clone(),
            url: record.url.clone(),
            posted_date: record.posted_date.clone(),
            source: record.sources.iter().cloned().collect::<Vec<_>>().join(","),
            description: record.description.clone(),
            scraped_at: record.first_seen,
            last_updated: now,
        }
    }
}

/// Trait for seen-record storage backends.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load the full id set for a source (the pre-run snapshot).
    async fn load_ids(&self, source: &str) -> Result<HashSet<String>>;

    /// Upsert records for a source; re-upserting an id updates fields
    /// but never creates a duplicate. Returns the number of records
    /// written.
    async fn upsert(&self, source: &str, records: &[StoredRecord]) -> Result<usize>;

    /// Delete the oldest records beyond `max_size`, keyed by
    /// `scraped_at`. Returns the number of records removed.
    async fn prune(&self, source: &str, max_size: usize) -> Result<usize>;
}

/// Pre-run existence snapshot.
///
/// Taken once before filtering starts; never queried live per record,
/// so a duplicate later in the same batch cannot shadow an earlier
/// insert from the same run.
#[derive(Debug, Default)]
pub struct SeenCache {
    ids: HashSet<String>,
}

impl SeenCache {
    /// Snapshot the id set for a source. A store failure degrades to
    /// an empty snapshot with a warning: everything then looks new and
    /// upsert idempotence absorbs the re-inserts.
    pub async fn snapshot(store: &dyn RecordStore, source: &str) -> Self {
        match store.load_ids(source).await {
            Ok(ids) => Self { ids },
            Err(e) => {
                log::warn!(
                    "Failed to load seen snapshot for {}: {}. Treating all records as new.",
                    source,
                    e
                );
                Self::default()
            }
        }
    }

    /// Membership test against the snapshot.
    pub fn exists(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

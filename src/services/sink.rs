// src/services/sink.rs

//! Notification sink abstraction.
//!
//! The pipeline only knows how to hand messages to a destination; the
//! actual transport (webhook, chat platform, stdout) lives behind this
//! trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BucketKey, CanonicalRecord};

/// A single notification to deliver to a destination.
#[derive(Debug, Clone)]
pub enum Message<'a> {
    /// Bucket header: record count plus role/category, sent once per
    /// non-empty bucket before its batches.
    Header { bucket: BucketKey, count: usize },
    /// One ordered batch of record summaries.
    Batch {
        bucket: BucketKey,
        records: &'a [CanonicalRecord],
    },
}

/// Trait for notification destinations.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one message to the named destination.
    async fn send(&self, destination: &str, message: Message<'_>) -> Result<()>;
}

/// Sink that logs messages instead of delivering them (dry runs).
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn send(&self, destination: &str, message: Message<'_>) -> Result<()> {
        match message {
            Message::Header { bucket, count } => {
                log::info!("[dry-run] {} <- header: {} records for {}", destination, count, bucket);
            }
            Message::Batch { bucket, records } => {
                log::info!(
                    "[dry-run] {} <- batch of {} for {}",
                    destination,
                    records.len(),
                    bucket
                );
                for record in records {
                    log::info!("[dry-run]   {}", record.format("[{company}] {title} ({id})"));
                }
            }
        }
        Ok(())
    }
}

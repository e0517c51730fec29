// src/pipeline/dispatch.rs

//! Batched, rate-limited fan-out to notification destinations.
//!
//! Every non-empty bucket gets a header send, then its records are
//! split into ordered batches and the batches are interleaved
//! round-robin across buckets (batch 0 of bucket A, batch 0 of bucket
//! B, ..., then batch 1 of bucket A, ...). Interleaving bounds the
//! worst-case latency of any single bucket under the shared rate
//! budget. The fixed delay before every send is the rate-limit
//! mechanism; nothing may skip it.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::models::{BucketKey, CanonicalRecord, DispatchConfig};
use crate::services::{Message, NotificationSink};

/// Summary of a dispatch invocation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Header messages delivered
    pub header_sends: usize,
    /// Batch messages delivered
    pub batch_sends: usize,
    /// Sends that failed (logged and skipped, never retried)
    pub failed_sends: usize,
    /// Buckets skipped because no destination was configured
    pub skipped_buckets: usize,
}

/// Fan a bucket map out to the sink.
///
/// Send failures are logged and the schedule continues; a bucket with
/// no configured destination is skipped entirely rather than falling
/// back to a default destination.
pub async fn dispatch(
    buckets: &BTreeMap<BucketKey, Vec<CanonicalRecord>>,
    config: &DispatchConfig,
    sink: &dyn NotificationSink,
) -> DispatchOutcome {
    let delay = Duration::from_millis(config.inter_send_delay_ms);
    let mut outcome = DispatchOutcome::default();

    // Resolve destinations up front; unresolvable buckets drop out of
    // the schedule before any send happens.
    let mut queues: Vec<BucketQueue<'_>> = Vec::new();
    for (key, records) in buckets {
        if records.is_empty() {
            continue;
        }
        let Some(destination) = config.destinations.get(&key.to_string()) else {
            log::warn!("No destination configured for bucket {}, skipping", key);
            outcome.skipped_buckets += 1;
            continue;
        };
        queues.push(BucketQueue {
            key: *key,
            destination,
            batches: records.chunks(config.batch_size.max(1)).collect(),
        });
    }

    // Headers first, one per bucket.
    for queue in &queues {
        let total: usize = queue.batches.iter().map(|b| b.len()).sum();
        tokio::time::sleep(delay).await;
        let message = Message::Header {
            bucket: queue.key,
            count: total,
        };
        match sink.send(queue.destination, message).await {
            Ok(()) => outcome.header_sends += 1,
            Err(e) => {
                outcome.failed_sends += 1;
                log::warn!("Header send failed for bucket {}: {}", queue.key, e);
            }
        }
    }

    // Round-robin across buckets until every queue is drained.
    while queues.iter().any(|q| !q.batches.is_empty()) {
        for queue in &mut queues {
            let Some(batch) = queue.batches.pop_front() else {
                continue;
            };
            tokio::time::sleep(delay).await;
            let message = Message::Batch {
                bucket: queue.key,
                records: batch,
            };
            match sink.send(queue.destination, message).await {
                Ok(()) => outcome.batch_sends += 1,
                Err(e) => {
                    outcome.failed_sends += 1;
                    log::warn!(
                        "Batch send failed for bucket {} ({} records): {}",
                        queue.key,
                        batch.len(),
                        e
                    );
                }
            }
        }
    }

    outcome
}

/// One bucket's ordered batch queue within the round-robin schedule.
struct BucketQueue<'a> {
    key: BucketKey,
    destination: &'a str,
    batches: VecDeque<&'a [CanonicalRecord]>,
}

// src/pipeline/run.rs

//! Pipeline orchestration.
//!
//! One run ingests a batch of raw postings from a single source:
//! normalize, dedup within the batch, filter by relevance and recency,
//! drop already-seen ids against the pre-run snapshot, classify,
//! route, dispatch, persist, prune. Persistence failures never block
//! notification delivery; they are logged and the seen snapshot is
//! simply not advanced.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{CanonicalRecord, Config, Period, RawPosting, Role};
use crate::pipeline::classify::Classifier;
use crate::pipeline::dispatch::{DispatchOutcome, dispatch};
use crate::pipeline::normalize::normalize;
use crate::pipeline::recency::is_recent;
use crate::pipeline::relevance::RelevanceEngine;
use crate::pipeline::route::route;
use crate::services::NotificationSink;
use crate::storage::{RecordStore, SeenCache, StoredRecord};

/// Per-run parameters supplied by the caller.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Source identifier for this batch (e.g. "linkedin")
    pub source: String,
    /// Role scope for relevance filtering; `None` skips the role gate
    pub role: Option<Role>,
    /// Recency window
    pub period: Period,
    /// Role assigned to records with no explicit role and no marker
    pub default_role: Role,
}

/// Per-stage counters for one pipeline run.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    /// Raw postings received
    pub received: usize,
    /// Records after in-batch dedup
    pub unique: usize,
    /// Records that passed the relevance rule table
    pub relevant: usize,
    /// Records that passed the recency filter
    pub recent: usize,
    /// Records not present in the pre-run seen snapshot
    pub new: usize,
    /// Non-empty buckets routed
    pub buckets: usize,
    /// Dispatch counters
    pub dispatch: DispatchOutcome,
    /// Records persisted
    pub persisted: usize,
    /// Records pruned from the store
    pub pruned: usize,
}

impl RunReport {
    fn log_summary(&self, source: &str) {
        log::info!(
            "Run summary for {}: {} received, {} unique, {} relevant, {} recent, {} new, \
             {} buckets, {} sends ({} failed), {} persisted, {} pruned",
            source,
            self.received,
            self.unique,
            self.relevant,
            self.recent,
            self.new,
            self.buckets,
            self.dispatch.header_sends + self.dispatch.batch_sends,
            self.dispatch.failed_sends,
            self.persisted,
            self.pruned
        );
    }
}

/// Run the full ingestion pipeline for one batch of postings.
pub async fn run_pipeline(
    config: &Config,
    postings: Vec<RawPosting>,
    options: &RunOptions,
    store: &dyn RecordStore,
    sink: &dyn NotificationSink,
) -> Result<RunReport> {
    run_pipeline_at(config, postings, options, store, sink, Utc::now()).await
}

/// Pipeline body with an injectable clock.
pub(crate) async fn run_pipeline_at(
    config: &Config,
    postings: Vec<RawPosting>,
    options: &RunOptions,
    store: &dyn RecordStore,
    sink: &dyn NotificationSink,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let engine = RelevanceEngine::new(&config.rules)?;
    let classifier = Classifier::new(&config.classify);

    let mut report = RunReport {
        received: postings.len(),
        ..RunReport::default()
    };

    // Existence snapshot, taken once before the run starts.
    let seen = SeenCache::snapshot(store, &options.source).await;
    log::info!(
        "Ingesting {} postings from {} ({} ids in seen snapshot)",
        postings.len(),
        options.source,
        seen.len()
    );

    // Normalize and collapse in-batch duplicates; the first occurrence
    // wins and later ones only contribute their source.
    let mut records: Vec<CanonicalRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for posting in &postings {
        let record = normalize(posting, now);
        match index.get(&record.id) {
            Some(&i) => {
                records[i].sources.extend(record.sources);
            }
            None => {
                index.insert(record.id.clone(), records.len());
                records.push(record);
            }
        }
    }
    report.unique = records.len();

    // Relevance, then recency, then the seen snapshot.
    let records: Vec<_> = records
        .into_iter()
        .filter(|r| engine.is_relevant(r, options.role))
        .collect();
    report.relevant = records.len();

    let records: Vec<_> = records
        .into_iter()
        .filter(|r| is_recent(r.posted_at, options.period, now))
        .collect();
    report.recent = records.len();

    let mut records: Vec<_> = records
        .into_iter()
        .filter(|r| !seen.exists(&r.id))
        .collect();
    report.new = records.len();

    if records.is_empty() {
        log::info!("No new postings from {}", options.source);
        report.log_summary(&options.source);
        return Ok(report);
    }

    for record in &mut records {
        record.category = classifier.classify(record);
    }

    let buckets = route(records, options.default_role, &engine);
    report.buckets = buckets.len();

    report.dispatch = dispatch(&buckets, &config.dispatch, sink).await;

    // Persist everything that was routed, then prune. Store failures
    // are non-fatal: notifications already went out, and the ids stay
    // out of the snapshot so the next run retries the upsert.
    let stored: Vec<StoredRecord> = buckets
        .values()
        .flatten()
        .map(|r| StoredRecord::from_record(r, now))
        .collect();
    match store.upsert(&options.source, &stored).await {
        Ok(count) => report.persisted = count,
        Err(e) => log::warn!("Failed to persist {} records: {}", stored.len(), e),
    }
    match store.prune(&options.source, config.cache.max_size).await {
        Ok(count) => report.pruned = count,
        Err(e) => log::warn!("Failed to prune store for {}: {}", options.source, e),
    }

    report.log_summary(&options.source);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{BucketKey, Category};
    use crate::services::Message;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory store for pipeline tests.
    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<String, Vec<StoredRecord>>>,
        fail_upserts: bool,
    }

    #[async_trait]
    impl RecordStore for MemoryStore {
        async fn load_ids(&self, source: &str) -> Result<HashSet<String>> {
            let map = self.records.lock().unwrap();
            Ok(map
                .get(source)
                .map(|v| v.iter().map(|r| r.id.clone()).collect())
                .unwrap_or_default())
        }

        async fn upsert(&self, source: &str, records: &[StoredRecord]) -> Result<usize> {
            if self.fail_upserts {
                return Err(AppError::store("disk full"));
            }
            let mut map = self.records.lock().unwrap();
            let existing = map.entry(source.to_string()).or_default();
            for record in records {
                match existing.iter_mut().find(|r| r.id == record.id) {
                    Some(stored) => *stored = record.clone(),
                    None => existing.push(record.clone()),
                }
            }
            Ok(records.len())
        }

        async fn prune(&self, source: &str, max_size: usize) -> Result<usize> {
            let mut map = self.records.lock().unwrap();
            let Some(existing) = map.get_mut(source) else {
                return Ok(0);
            };
            if existing.len() <= max_size {
                return Ok(0);
            }
            existing.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at));
            let removed = existing.len() - max_size;
            existing.truncate(max_size);
            Ok(removed)
        }
    }

    /// Sink that records `(destination, label)` pairs.
    #[derive(Default)]
    struct RecordingSink {
        calls: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(&self, destination: &str, message: Message<'_>) -> Result<()> {
            let label = match message {
                Message::Header { bucket, count } => format!("header {} {}", bucket, count),
                Message::Batch { bucket, records } => {
                    format!("batch {} {}", bucket, records.len())
                }
            };
            self.calls
                .lock()
                .unwrap()
                .push((destination.to_string(), label));
            Ok(())
        }
    }

    fn posting(title: &str, company: &str, location: &str, posted: &str) -> RawPosting {
        RawPosting {
            title: title.to_string(),
            company: Some(company.to_string()),
            location: Some(location.to_string()),
            url: Some(format!("https://example.com/{}", title.replace(' ', "-"))),
            posted_date: Some(posted.to_string()),
            description: None,
            source: "linkedin".to_string(),
            role: None,
            category: None,
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.dispatch.inter_send_delay_ms = 0;
        config.dispatch.destinations.insert(
            "intern::software_engineering".to_string(),
            "https://example.com/hooks/swe-intern".to_string(),
        );
        config.dispatch.destinations.insert(
            "new_grad::data_science_engineer".to_string(),
            "https://example.com/hooks/ds-newgrad".to_string(),
        );
        config
    }

    fn options() -> RunOptions {
        RunOptions {
            source: "linkedin".to_string(),
            role: Some(Role::Both),
            period: Period::Day,
            default_role: Role::Both,
        }
    }

    fn aug_25() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 25, 15, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let postings = vec![
            posting("Software Engineer Intern", "Acme", "NY", "1d"),
            posting("Senior Software Engineer", "Acme", "NY", "1d"),
            posting("Data Scientist New Grad", "Beta", "SF", "Aug 24"),
        ];
        let store = MemoryStore::default();
        let sink = RecordingSink::default();

        let report = run_pipeline_at(&config(), postings, &options(), &store, &sink, aug_25())
            .await
            .unwrap();

        assert_eq!(report.received, 3);
        assert_eq!(report.unique, 3);
        // "Senior Software Engineer" rejected on the excluded term.
        assert_eq!(report.relevant, 2);
        assert_eq!(report.recent, 2);
        assert_eq!(report.new, 2);
        assert_eq!(report.buckets, 2);
        assert_eq!(report.dispatch.header_sends, 2);
        assert_eq!(report.dispatch.batch_sends, 2);
        assert_eq!(report.persisted, 2);

        let calls = sink.calls();
        let intern_key = BucketKey::new(Role::Intern, Category::SoftwareEngineering);
        let new_grad_key = BucketKey::new(Role::NewGrad, Category::DataScienceEngineer);
        assert!(
            calls
                .iter()
                .any(|(_, l)| *l == format!("header {} 1", intern_key))
        );
        assert!(
            calls
                .iter()
                .any(|(_, l)| *l == format!("header {} 1", new_grad_key))
        );
        assert!(
            calls
                .iter()
                .any(|(_, l)| *l == format!("batch {} 1", intern_key))
        );
        assert!(
            calls
                .iter()
                .any(|(_, l)| *l == format!("batch {} 1", new_grad_key))
        );
    }

    #[tokio::test]
    async fn test_second_run_sends_nothing_new() {
        let store = MemoryStore::default();
        let sink = RecordingSink::default();
        let postings = vec![posting("Software Engineer Intern", "Acme", "NY", "1d")];

        run_pipeline_at(
            &config(),
            postings.clone(),
            &options(),
            &store,
            &sink,
            aug_25(),
        )
        .await
        .unwrap();

        let report = run_pipeline_at(&config(), postings, &options(), &store, &sink, aug_25())
            .await
            .unwrap();
        assert_eq!(report.new, 0);
        assert_eq!(report.dispatch.header_sends, 0);
        // One header and one batch from the first run only.
        assert_eq!(sink.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_in_batch_duplicates_merge_sources() {
        let store = MemoryStore::default();
        let sink = RecordingSink::default();
        let mut duplicate = posting("Software Engineer Intern", "Acme", "NY", "1d");
        duplicate.source = "indeed".to_string();
        let postings = vec![
            posting("Software Engineer Intern", "Acme", "NY", "1d"),
            duplicate,
        ];

        let report = run_pipeline_at(&config(), postings, &options(), &store, &sink, aug_25())
            .await
            .unwrap();
        assert_eq!(report.received, 2);
        assert_eq!(report.unique, 1);

        let map = store.records.lock().unwrap();
        let stored = &map["linkedin"][0];
        assert_eq!(stored.source, "indeed,linkedin");
    }

    #[tokio::test]
    async fn test_store_failure_does_not_block_notifications() {
        let store = MemoryStore {
            fail_upserts: true,
            ..MemoryStore::default()
        };
        let sink = RecordingSink::default();
        let postings = vec![posting("Software Engineer Intern", "Acme", "NY", "1d")];

        let report = run_pipeline_at(&config(), postings, &options(), &store, &sink, aug_25())
            .await
            .unwrap();
        assert_eq!(report.dispatch.header_sends, 1);
        assert_eq!(report.dispatch.batch_sends, 1);
        assert_eq!(report.persisted, 0);
    }

    #[tokio::test]
    async fn test_unparseable_dates_are_included() {
        let store = MemoryStore::default();
        let sink = RecordingSink::default();
        let postings = vec![posting("Software Engineer Intern", "Acme", "NY", "whenever")];

        let report = run_pipeline_at(&config(), postings, &options(), &store, &sink, aug_25())
            .await
            .unwrap();
        assert_eq!(report.recent, 1);
        assert_eq!(report.new, 1);
    }

    #[tokio::test]
    async fn test_stale_postings_are_excluded() {
        let store = MemoryStore::default();
        let sink = RecordingSink::default();
        let postings = vec![posting("Software Engineer Intern", "Acme", "NY", "45 days ago")];

        let mut opts = options();
        opts.period = Period::Month;
        let report = run_pipeline_at(&config(), postings, &opts, &store, &sink, aug_25())
            .await
            .unwrap();
        assert_eq!(report.relevant, 1);
        assert_eq!(report.recent, 0);
    }
}

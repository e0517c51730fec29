// src/services/webhook.rs

//! Webhook notification sink.
//!
//! Posts JSON payloads to the destination URLs configured per bucket.
//! Message formatting for any specific chat platform happens on the
//! receiving end; this sink only speaks the pipeline's own payload
//! shape.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{CanonicalRecord, DispatchConfig};
use crate::services::{Message, NotificationSink};
use crate::utils::create_async_client;

/// Sink that delivers messages as JSON webhook POSTs.
pub struct WebhookSink {
    client: reqwest::Client,
}

impl WebhookSink {
    /// Build a sink with a client configured from dispatch settings.
    pub fn new(config: &DispatchConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

/// Wire payload for one notification.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Payload {
    Header {
        role: String,
        category: String,
        count: usize,
    },
    Batch {
        role: String,
        category: String,
        records: Vec<RecordSummary>,
    },
}

/// Record summary fields carried in a batch payload.
#[derive(Debug, Serialize)]
struct RecordSummary {
    title: String,
    url: String,
    company: String,
    location: String,
    posted_date: String,
    source: String,
    id: String,
}

impl RecordSummary {
    fn from_record(record: &CanonicalRecord) -> Self {
        Self {
            title: record.title.clone(),
            url: record.url.clone(),
            company: record.company.clone(),
            location: record.location.clone(),
            posted_date: record.posted_date.clone(),
            source: record
                .sources
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(","),
            id: record.id_prefix().to_string(),
        }
    }
}

impl From<Message<'_>> for Payload {
    fn from(message: Message<'_>) -> Self {
        match message {
            Message::Header { bucket, count } => Payload::Header {
                role: bucket.role.to_string(),
                category: bucket.category.to_string(),
                count,
            },
            Message::Batch { bucket, records } => Payload::Batch {
                role: bucket.role.to_string(),
                category: bucket.category.to_string(),
                records: records.iter().map(RecordSummary::from_record).collect(),
            },
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, destination: &str, message: Message<'_>) -> Result<()> {
        let payload = Payload::from(message);
        self.client
            .post(destination)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketKey, Category, RawPosting, Role};
    use crate::pipeline::normalize;
    use chrono::Utc;

    #[test]
    fn test_header_payload_shape() {
        let message = Message::Header {
            bucket: BucketKey::new(Role::Intern, Category::SoftwareEngineering),
            count: 7,
        };
        let json = serde_json::to_value(Payload::from(message)).unwrap();
        assert_eq!(json["type"], "header");
        assert_eq!(json["role"], "intern");
        assert_eq!(json["category"], "software_engineering");
        assert_eq!(json["count"], 7);
    }

    #[test]
    fn test_batch_payload_carries_summaries() {
        let raw = RawPosting {
            title: "Software Engineer Intern".to_string(),
            company: Some("Acme".to_string()),
            location: Some("NY".to_string()),
            url: Some("https://example.com/jobs/1".to_string()),
            posted_date: Some("1d".to_string()),
            description: None,
            source: "linkedin".to_string(),
            role: None,
            category: None,
        };
        let record = normalize(&raw, Utc::now());
        let records = vec![record.clone()];
        let message = Message::Batch {
            bucket: BucketKey::new(Role::NewGrad, Category::DataAnalysis),
            records: &records,
        };

        let json = serde_json::to_value(Payload::from(message)).unwrap();
        assert_eq!(json["type"], "batch");
        assert_eq!(json["records"][0]["title"], "Software Engineer Intern");
        assert_eq!(json["records"][0]["company"], "Acme");
        assert_eq!(json["records"][0]["source"], "linkedin");
        assert_eq!(json["records"][0]["id"], record.id_prefix());
    }
}

// src/pipeline/normalize.rs

//! Posting normalization and content-addressable identity.
//!
//! `normalize` is pure and deterministic: two postings with the same
//! normalized (title, company, location) tuple collapse to the same id
//! regardless of which scraper produced them. The hash input is string
//! content only; no punctuation stripping or synonym folding is done,
//! so "SWE" and "Software Engineer" never dedupe.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::models::{CanonicalRecord, Category, RawPosting, ResolvedDate};
use crate::pipeline::recency::resolve_posted_date;

/// Compute the content-addressable id for an identity tuple.
///
/// The pre-image is `lc(trim(title)) + "-" + lc(trim(company)) + "-" +
/// lc(trim(location))`; the id is its sha256 hex digest.
pub fn identity_hash(title: &str, company: &str, location: &str) -> (String, String) {
    let normalized_id = format!(
        "{}-{}-{}",
        title.trim().to_lowercase(),
        company.trim().to_lowercase(),
        location.trim().to_lowercase()
    );
    let mut hasher = Sha256::new();
    hasher.update(normalized_id.as_bytes());
    let id = hex::encode(hasher.finalize());
    (id, normalized_id)
}

/// Convert a raw posting into a canonical record.
///
/// Missing company/location are treated as empty strings, not errors.
/// The category defaults to software engineering until the classifier
/// assigns one.
pub fn normalize(raw: &RawPosting, now: DateTime<Utc>) -> CanonicalRecord {
    let company = raw.company.as_deref().unwrap_or("");
    let location = raw.location.as_deref().unwrap_or("");
    let posted_date = raw.posted_date.as_deref().unwrap_or("").trim().to_string();

    let (id, normalized_id) = identity_hash(&raw.title, company, location);

    let posted_at = if posted_date.is_empty() {
        ResolvedDate::Recent
    } else {
        resolve_posted_date(&posted_date, now)
    };

    CanonicalRecord {
        id,
        normalized_id,
        title: raw.title.trim().to_string(),
        company: company.trim().to_string(),
        location: location.trim().to_string(),
        normalized_title: raw.title.trim().to_lowercase(),
        normalized_company: company.trim().to_lowercase(),
        normalized_location: location.trim().to_lowercase(),
        url: raw.url.as_deref().unwrap_or("").trim().to_string(),
        posted_date,
        posted_at,
        description: raw.description.as_deref().unwrap_or("").trim().to_string(),
        category_hint: raw.category.clone(),
        role: raw.role,
        category: Category::default(),
        sources: [raw.source.clone()].into_iter().collect(),
        first_seen: now,
    }
}

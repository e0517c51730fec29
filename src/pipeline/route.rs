// src/pipeline/route.rs

//! Bucket routing.
//!
//! Partitions a batch of classified records into `role::category`
//! buckets. The output is a strict partition: every input record lands
//! in exactly one bucket, none are lost or duplicated.

use std::collections::BTreeMap;

use crate::models::{BucketKey, CanonicalRecord, Role};
use crate::pipeline::relevance::RelevanceEngine;

/// Partition records into buckets keyed by `(role, category)`.
///
/// Effective role: an explicit intern/new-grad record role wins; a
/// `both` or absent role falls back to title markers (intern first,
/// then new-grad); with neither marker the record is assigned the
/// run's default role, itself coerced to intern when it is `both`.
pub fn route(
    records: Vec<CanonicalRecord>,
    default_role: Role,
    engine: &RelevanceEngine,
) -> BTreeMap<BucketKey, Vec<CanonicalRecord>> {
    let fallback = match default_role {
        Role::Both => Role::Intern,
        other => other,
    };

    let mut buckets: BTreeMap<BucketKey, Vec<CanonicalRecord>> = BTreeMap::new();
    for record in records {
        let role = effective_role(&record, fallback, engine);
        let key = BucketKey::new(role, record.category);
        buckets.entry(key).or_default().push(record);
    }
    buckets
}

fn effective_role(record: &CanonicalRecord, fallback: Role, engine: &RelevanceEngine) -> Role {
    match record.role {
        Some(Role::Intern) => Role::Intern,
        Some(Role::NewGrad) => Role::NewGrad,
        Some(Role::Both) | None => {
            if engine.has_intern_marker(&record.normalized_title) {
                Role::Intern
            } else if engine.has_new_grad_marker(&record.normalized_title) {
                Role::NewGrad
            } else {
                fallback
            }
        }
    }
}

// src/models/mod.rs

//! Domain models for the ingestion pipeline.
//!
//! This module contains all data structures used throughout the
//! application, organized by their primary purpose.

mod config;
mod posting;

// Re-export all public types
pub use config::{
    CacheConfig, CategoryAlias, ClassifyConfig, Config, DispatchConfig, RulesConfig,
};
pub use posting::{BucketKey, CanonicalRecord, Category, Period, RawPosting, ResolvedDate, Role};

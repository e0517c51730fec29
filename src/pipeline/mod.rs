//! Ingestion pipeline stages, in data-flow order.
//!
//! raw postings -> `normalize` -> `relevance` -> `recency` ->
//! seen-snapshot check -> `classify` -> `route` -> `dispatch`,
//! orchestrated by `run`.

pub mod classify;
pub mod dispatch;
pub mod normalize;
pub mod recency;
pub mod relevance;
pub mod route;
pub mod run;

pub use classify::Classifier;
pub use dispatch::{DispatchOutcome, dispatch};
pub use normalize::{identity_hash, normalize};
pub use recency::{cutoff, is_recent, resolve_posted_date};
pub use relevance::{RejectReason, RelevanceEngine, Verdict};
pub use route::route;
pub use run::{RunOptions, RunReport, run_pipeline};

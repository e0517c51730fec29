// src/lib.rs

//! jobring — job posting ingestion pipeline.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

//! # Movies ETL Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search engine. It includes definitions for errors, interfaces, and a
//! concrete implementation for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use errors::SearchError;
pub use interfaces::SearchEngineClient;
pub use self::opensearch::{IndexConfig, OpenSearchClient};
pub use types::BulkItemOutcome;

//! OpenSearch implementation of the search engine client.
//!
//! This module provides a concrete implementation of `SearchEngineClient`
//! using OpenSearch as the backend, plus the fixed index configuration.

mod client;
mod index_config;

pub use client::OpenSearchClient;
pub use index_config::IndexConfig;

//! # Movies ETL
//!
//! Main library for the movies catalog search sync service.
//!
//! This crate provides the entry point and configuration for running the
//! incremental Postgres-to-search-index pipeline.

pub mod config;

pub use config::{Dependencies, Settings};

use thiserror::Error;

/// Errors that can occur during service initialization or execution.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    SyncError(#[from] movies_etl_pipeline::SyncError),

    /// Search error.
    #[error("Search error: {0}")]
    SearchError(#[from] movies_etl_repository::SearchError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl EtlError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

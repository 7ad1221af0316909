//! # Movies ETL Pipeline
//!
//! This crate provides the components that keep the film search index
//! eventually consistent with the relational source of truth.
//!
//! ## Architecture
//!
//! The pipeline follows an Extractor-Processor-Loader pattern driven by a
//! per-source watermark checkpoint:
//!
//! 1. **Checkpoint**: persists the last synchronized `modified` watermark per source
//! 2. **Extractor**: reads changed rows past the watermark out of Postgres
//! 3. **Processor**: transforms raw rows into validated search documents
//! 4. **Loader**: bulk-indexes documents, advancing the checkpoint per acknowledgement
//! 5. **Orchestrator**: rotates the sources, wrapping each rotation in a retry policy

pub mod checkpoint;
pub mod errors;
pub mod extractor;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod retry;

pub use errors::SyncError;

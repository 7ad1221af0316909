//! # Movies ETL Shared
//!
//! Shared types and data structures for the movies search ETL system.
//!
//! This crate defines the vocabulary the pipeline crates communicate with:
//! the [`Source`] rotation, the [`Watermark`] change boundary, the raw
//! [`FilmRow`] shape produced by the change extractor, and the validated
//! [`FilmDocument`] shape delivered to the search index.

pub mod source;
pub mod types;

pub use source::Source;
pub use types::{FilmDocument, FilmRow, PersonRef, Watermark};

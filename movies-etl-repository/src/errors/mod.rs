//! Error types for the movies ETL repository.

mod search_error;

pub use search_error::SearchError;

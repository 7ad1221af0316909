//! Error types for the sync pipeline.
//!
//! Every failure is classified along the retry boundary: connectivity-class
//! errors against either external system are transient and handed to the
//! retry policy; query, validation, and checkpoint errors are fatal and
//! terminate the process.

use thiserror::Error;

use crate::checkpoint::CheckpointError;
use movies_etl_repository::SearchError;
use movies_etl_shared::Source;

/// Errors that can occur while running the sync pipeline.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The relational store is unreachable. Transient.
    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    /// A query failed for a non-connectivity reason (malformed query,
    /// missing table, undecodable row). Fatal.
    #[error("Query error: {0}")]
    Query(String),

    /// The search engine is unreachable. Transient.
    #[error("Search engine unavailable: {0}")]
    SearchUnavailable(String),

    /// The search engine rejected a request for a non-connectivity reason.
    #[error("Search engine error: {0}")]
    Search(String),

    /// A row failed document validation.
    #[error("Invalid document {document_id}: field '{field}' is not {expected}")]
    Validation {
        document_id: String,
        field: &'static str,
        expected: &'static str,
    },

    /// Checkpoint storage failed or held no record for a source.
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

impl SyncError {
    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a validation error for one document field.
    pub fn validation(
        document_id: impl Into<String>,
        field: &'static str,
        expected: &'static str,
    ) -> Self {
        Self::Validation {
            document_id: document_id.into(),
            field,
            expected,
        }
    }

    /// Whether this error is a connectivity-class failure expected to
    /// resolve with retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DatabaseUnavailable(_) | Self::SearchUnavailable(_)
        )
    }

    /// Attach the source a query error occurred for, keeping the
    /// transient/fatal classification.
    pub fn for_source(self, source: Source) -> Self {
        match self {
            Self::Query(msg) => Self::Query(format!("source '{}': {}", source, msg)),
            Self::DatabaseUnavailable(msg) => {
                Self::DatabaseUnavailable(format!("source '{}': {}", source, msg))
            }
            other => other,
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::DatabaseUnavailable(err.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

impl From<SearchError> for SyncError {
    fn from(err: SearchError) -> Self {
        if err.is_transient() {
            Self::SearchUnavailable(err.to_string())
        } else {
            Self::Search(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(SyncError::DatabaseUnavailable("refused".into()).is_transient());
        assert!(SyncError::SearchUnavailable("refused".into()).is_transient());
        assert!(!SyncError::query("syntax error").is_transient());
        assert!(!SyncError::validation("1", "rating", "a float").is_transient());
    }

    #[test]
    fn test_search_error_keeps_classification() {
        let transient: SyncError = SearchError::connection("refused").into();
        assert!(transient.is_transient());

        let fatal: SyncError = SearchError::bulk_index("rejected").into();
        assert!(!fatal.is_transient());
    }

    #[test]
    fn test_validation_error_names_field_and_type() {
        let err = SyncError::validation("abc", "imdb_rating", "a float");
        let msg = err.to_string();
        assert!(msg.contains("abc"));
        assert!(msg.contains("imdb_rating"));
        assert!(msg.contains("a float"));
    }

    #[test]
    fn test_for_source_preserves_classification() {
        let err = SyncError::DatabaseUnavailable("refused".into()).for_source(Source::Genre);
        assert!(err.is_transient());
        assert!(err.to_string().contains("genre"));
    }
}

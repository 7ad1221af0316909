//! The `SearchEngineClient` trait.

use async_trait::async_trait;

use crate::errors::SearchError;
use crate::types::BulkItemOutcome;
use movies_etl_shared::FilmDocument;

/// Abstract client for the search engine backing the film index.
///
/// The pipeline only needs three capabilities from the engine: make sure the
/// index exists with the expected analyzer and mapping, push a batch of
/// documents through the bulk endpoint, and answer a liveness probe. The
/// engine's own storage, ranking, and query language stay behind this seam.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Ensure the film index exists with the required settings and mapping.
    ///
    /// Idempotent: returns `true` if the index was created by this call,
    /// `false` if it already existed.
    async fn ensure_index(&self) -> Result<bool, SearchError>;

    /// Index a batch of documents through the bulk endpoint.
    ///
    /// Returns one outcome per document, in submission order. An individual
    /// rejected document is reported through its outcome, not as an `Err`;
    /// `Err` means the batch as a whole did not reach the engine.
    async fn bulk_index(&self, docs: &[FilmDocument]) -> Result<Vec<BulkItemOutcome>, SearchError>;

    /// Check that the search engine is reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}

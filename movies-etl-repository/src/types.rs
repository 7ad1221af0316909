//! Result types reported by search engine operations.

/// Outcome of indexing a single document within a bulk request.
///
/// Outcomes are reported in the same order the documents were submitted;
/// the pipeline relies on that ordering to advance its checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkItemOutcome {
    /// The document id the outcome refers to.
    pub id: String,
    /// HTTP-style status of the item operation.
    pub status: u16,
    /// Error detail for rejected documents.
    pub error: Option<String>,
}

impl BulkItemOutcome {
    /// Whether the document was acknowledged by the index.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

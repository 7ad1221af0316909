//! Bulk delivery to the search index with incremental checkpoint advance.
//!
//! Entries are sent in extraction order through the bulk endpoint in
//! `batch_size` chunks. After every acknowledged document, in order, the
//! checkpoint for the source is advanced to that document's `modified`.
//! Combined with the extractor's ascending ordering this keeps the
//! persisted watermark monotonic: it only ever reflects documents the index
//! has actually acknowledged, even when delivery stops mid-batch.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::checkpoint::CheckpointStore;
use crate::errors::SyncError;
use crate::processor::IndexEntry;
use movies_etl_repository::SearchEngineClient;
use movies_etl_shared::{FilmDocument, Source};

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Number of documents per bulk request.
    pub batch_size: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self { batch_size: 100 }
    }
}

/// Counts reported after a load finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Documents acknowledged by the index.
    pub indexed: usize,
    /// Documents individually rejected by the index.
    pub failed: usize,
}

/// Loader that indexes documents into the search engine.
pub struct SearchLoader {
    client: Arc<dyn SearchEngineClient>,
    config: LoaderConfig,
}

impl SearchLoader {
    /// Create a new search loader with the given client.
    pub fn new(client: Arc<dyn SearchEngineClient>) -> Self {
        Self {
            client,
            config: LoaderConfig::default(),
        }
    }

    /// Create a new search loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchEngineClient>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    /// Ensure the search index exists.
    pub async fn ensure_index(&self) -> Result<bool, SyncError> {
        Ok(self.client.ensure_index().await?)
    }

    /// Deliver entries to the index, advancing the source's checkpoint per
    /// acknowledged document.
    ///
    /// An individually rejected document is counted and logged but does not
    /// abort delivery; its checkpoint position is passed over, which is the
    /// system's only handling of permanently rejected documents. A
    /// connectivity failure aborts the remaining chunks with a transient
    /// error, leaving the checkpoint at the last acknowledged document.
    #[instrument(skip(self, entries, checkpoint), fields(source = %source, count = entries.len()))]
    pub async fn load(
        &self,
        source: Source,
        entries: &[IndexEntry],
        checkpoint: &dyn CheckpointStore,
    ) -> Result<LoadSummary, SyncError> {
        let mut summary = LoadSummary::default();

        // `chunks` panics on 0.
        let batch_size = self.config.batch_size.max(1);
        for chunk in entries.chunks(batch_size) {
            let docs: Vec<FilmDocument> = chunk.iter().map(|e| e.document.clone()).collect();

            let outcomes = self.client.bulk_index(&docs).await?;

            for (entry, outcome) in chunk.iter().zip(outcomes.iter()) {
                if outcome.is_success() {
                    checkpoint.set(source, entry.modified).await?;
                    summary.indexed += 1;
                } else {
                    error!(
                        source = %source,
                        document_id = %entry.document.id,
                        status = outcome.status,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "Document rejected by the index"
                    );
                    summary.failed += 1;
                }
            }

            debug!(
                indexed = summary.indexed,
                failed = summary.failed,
                "Bulk chunk delivered"
            );
        }

        info!(
            indexed = summary.indexed,
            failed = summary.failed,
            "Load completed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MemoryCheckpointStore;
    use async_trait::async_trait;
    use movies_etl_repository::{BulkItemOutcome, SearchError};
    use movies_etl_shared::{PersonRef, Watermark};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn watermark(s: &str) -> Watermark {
        s.parse().unwrap()
    }

    fn entry(id: &str, modified: &str) -> IndexEntry {
        IndexEntry {
            document: FilmDocument {
                id: id.to_string(),
                imdb_rating: 7.0,
                genres: vec!["Drama".to_string()],
                title: format!("Film {}", id),
                description: "A film".to_string(),
                directors_names: vec!["Someone".to_string()],
                actors_names: vec![],
                writers_names: vec![],
                directors: vec![PersonRef {
                    id: "p1".to_string(),
                    name: "Someone".to_string(),
                }],
                actors: vec![],
                writers: vec![],
            },
            modified: watermark(modified),
        }
    }

    /// Mock client scripted with one result per bulk call.
    struct ScriptedClient {
        calls: AtomicUsize,
        script: Vec<Result<Vec<BulkItemOutcome>, SearchError>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<Vec<BulkItemOutcome>, SearchError>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                script,
            }
        }

        fn all_ok(docs: &[FilmDocument]) -> Vec<BulkItemOutcome> {
            docs.iter()
                .map(|d| BulkItemOutcome {
                    id: d.id.clone(),
                    status: 201,
                    error: None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl SearchEngineClient for ScriptedClient {
        async fn ensure_index(&self) -> Result<bool, SearchError> {
            Ok(false)
        }

        async fn bulk_index(
            &self,
            docs: &[FilmDocument],
        ) -> Result<Vec<BulkItemOutcome>, SearchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script.get(call) {
                Some(Ok(outcomes)) => {
                    assert_eq!(outcomes.len(), docs.len());
                    Ok(outcomes.clone())
                }
                Some(Err(e)) => Err(SearchError::connection(e.to_string())),
                None => Ok(Self::all_ok(docs)),
            }
        }

        async fn health_check(&self) -> Result<bool, SearchError> {
            Ok(true)
        }
    }

    #[tokio::test]
    async fn test_checkpoint_tracks_last_acknowledged_document() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let loader = SearchLoader::new(client);
        let checkpoint = MemoryCheckpointStore::new();

        let entries = vec![
            entry("a", "2021-01-01T00:00:00+00:00"),
            entry("b", "2021-01-02T00:00:00+00:00"),
        ];

        let summary = loader
            .load(Source::FilmWork, &entries, &checkpoint)
            .await
            .unwrap();

        assert_eq!(summary, LoadSummary { indexed: 2, failed: 0 });
        assert_eq!(
            checkpoint.get(Source::FilmWork).await.unwrap(),
            watermark("2021-01-02T00:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn test_connection_drop_keeps_checkpoint_at_last_ack() {
        // batch_size 1 so the two entries go out as two bulk calls; the
        // second call fails with a connectivity error.
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(vec![BulkItemOutcome {
                id: "a".to_string(),
                status: 201,
                error: None,
            }]),
            Err(SearchError::connection("connection reset")),
        ]));
        let loader = SearchLoader::with_config(client, LoaderConfig { batch_size: 1 });
        let checkpoint = MemoryCheckpointStore::new();

        let entries = vec![
            entry("a", "2021-01-01T00:00:00+00:00"),
            entry("b", "2021-01-02T00:00:00+00:00"),
        ];

        let err = loader
            .load(Source::FilmWork, &entries, &checkpoint)
            .await
            .unwrap_err();

        assert!(err.is_transient());
        // Only the acknowledged document moved the watermark.
        assert_eq!(
            checkpoint.get(Source::FilmWork).await.unwrap(),
            watermark("2021-01-01T00:00:00+00:00")
        );
    }

    #[tokio::test]
    async fn test_zero_batch_size_still_delivers() {
        let client = Arc::new(ScriptedClient::new(vec![]));
        let loader = SearchLoader::with_config(client, LoaderConfig { batch_size: 0 });
        let checkpoint = MemoryCheckpointStore::new();

        let entries = vec![
            entry("a", "2021-01-01T00:00:00+00:00"),
            entry("b", "2021-01-02T00:00:00+00:00"),
        ];

        let summary = loader
            .load(Source::FilmWork, &entries, &checkpoint)
            .await
            .unwrap();

        assert_eq!(summary, LoadSummary { indexed: 2, failed: 0 });
    }

    #[tokio::test]
    async fn test_rejected_document_is_counted_not_fatal() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(vec![
            BulkItemOutcome {
                id: "a".to_string(),
                status: 201,
                error: None,
            },
            BulkItemOutcome {
                id: "b".to_string(),
                status: 400,
                error: Some("strict_dynamic_mapping_exception".to_string()),
            },
            BulkItemOutcome {
                id: "c".to_string(),
                status: 201,
                error: None,
            },
        ])]));
        let loader = SearchLoader::new(client);
        let checkpoint = MemoryCheckpointStore::new();

        let entries = vec![
            entry("a", "2021-01-01T00:00:00+00:00"),
            entry("b", "2021-01-02T00:00:00+00:00"),
            entry("c", "2021-01-03T00:00:00+00:00"),
        ];

        let summary = loader
            .load(Source::FilmWork, &entries, &checkpoint)
            .await
            .unwrap();

        assert_eq!(summary, LoadSummary { indexed: 2, failed: 1 });
        assert_eq!(
            checkpoint.get(Source::FilmWork).await.unwrap(),
            watermark("2021-01-03T00:00:00+00:00")
        );
    }
}

//! Orchestrator for the sync pipeline.
//!
//! Runs the fixed source rotation: per source, read the checkpoint, extract
//! changes, ensure the index, transform, then load with incremental
//! checkpoint advance. Each rotation is wrapped in the retry policy so
//! transient connectivity failures against either external system back off
//! and try again; fatal errors propagate out and terminate the process.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument};

use crate::checkpoint::{CheckpointError, CheckpointStore};
use crate::errors::SyncError;
use crate::extractor::ChangeExtractor;
use crate::loader::SearchLoader;
use crate::processor::DocumentProcessor;
use crate::retry::{retry_transient, RetryPolicy};
use movies_etl_shared::{Source, Watermark};

/// Configuration for the sync orchestrator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Watermark seeded for a source that has never been synchronized.
    pub start_watermark: Watermark,
    /// Sleep between rotations.
    pub poll_interval: Duration,
    /// Backoff policy for transient failures.
    pub retry: RetryPolicy,
}

impl SyncConfig {
    /// Config with the given start watermark and default interval/backoff.
    pub fn new(start_watermark: Watermark) -> Self {
        Self {
            start_watermark,
            poll_interval: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Top-level sync loop over the fixed source rotation.
///
/// The orchestrator owns the single connection to each external system for
/// the process lifetime; extraction, transformation, and loading for a
/// source happen strictly sequentially, one source at a time.
pub struct SyncOrchestrator {
    extractor: Arc<dyn ChangeExtractor>,
    processor: DocumentProcessor,
    loader: SearchLoader,
    checkpoint: Arc<dyn CheckpointStore>,
    config: SyncConfig,
}

impl SyncOrchestrator {
    /// Create a new orchestrator from its components.
    pub fn new(
        extractor: Arc<dyn ChangeExtractor>,
        processor: DocumentProcessor,
        loader: SearchLoader,
        checkpoint: Arc<dyn CheckpointStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            extractor,
            processor,
            loader,
            checkpoint,
            config,
        }
    }

    /// Run the sync loop until interrupted.
    ///
    /// The interrupt is honored between rotations, never mid-batch, so the
    /// last persisted checkpoint is always intact on exit. The signal
    /// listener is registered once, up front: a signal arriving while a
    /// rotation is in flight is held by the listener and observed at the
    /// next boundary instead of being dropped.
    pub async fn run(&self) -> Result<(), SyncError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await
    }

    /// Run the sync loop until the given shutdown future completes.
    #[instrument(skip(self, shutdown))]
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), SyncError>
    where
        F: Future<Output = ()>,
    {
        info!("Starting sync orchestrator");
        self.seed_checkpoints().await?;

        let mut shutdown = std::pin::pin!(shutdown);

        loop {
            retry_transient(&self.config.retry, || self.run_rotation()).await?;

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Seed the configured start watermark for any source that has never
    /// recorded a checkpoint.
    pub async fn seed_checkpoints(&self) -> Result<(), SyncError> {
        for source in Source::ALL {
            match self.checkpoint.get(source).await {
                Ok(_) => {}
                Err(CheckpointError::NotFound(_)) => {
                    info!(
                        source = %source,
                        watermark = %self.config.start_watermark,
                        "Seeding start watermark"
                    );
                    self.checkpoint
                        .set(source, self.config.start_watermark)
                        .await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Run one full rotation over all sources, in fixed order.
    pub async fn run_rotation(&self) -> Result<(), SyncError> {
        for source in Source::ALL {
            self.sync_source(source).await?;
        }
        Ok(())
    }

    /// Synchronize one source: checkpoint → extract → ensure index →
    /// transform → load & checkpoint.
    #[instrument(skip(self), fields(source = %source))]
    async fn sync_source(&self, source: Source) -> Result<(), SyncError> {
        let watermark = self.checkpoint.get(source).await?;

        let rows = self.extractor.changes_since(source, watermark).await?;
        if rows.is_empty() {
            debug!(watermark = %watermark, "No changes past watermark");
            return Ok(());
        }

        self.loader.ensure_index().await?;

        let entries = self.processor.process_batch(rows)?;
        if entries.is_empty() {
            return Ok(());
        }

        let summary = self
            .loader
            .load(source, &entries, self.checkpoint.as_ref())
            .await?;

        let new_watermark = self.checkpoint.get(source).await?;
        info!(
            indexed = summary.indexed,
            failed = summary.failed,
            watermark = %new_watermark,
            "Source synchronized"
        );
        Ok(())
    }
}

//! Dependency initialization and wiring for the sync service.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::config::Settings;
use crate::EtlError;
use movies_etl_pipeline::checkpoint::FileCheckpointStore;
use movies_etl_pipeline::extractor::PgChangeExtractor;
use movies_etl_pipeline::loader::{LoaderConfig, SearchLoader};
use movies_etl_pipeline::orchestrator::{SyncConfig, SyncOrchestrator};
use movies_etl_pipeline::processor::DocumentProcessor;
use movies_etl_repository::{IndexConfig, OpenSearchClient, SearchEngineClient};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: SyncOrchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from the given settings.
    ///
    /// The Postgres pool is created lazily, so an unreachable database at
    /// boot surfaces as a transient extract failure and goes through the
    /// normal retry loop instead of failing startup.
    pub async fn new(settings: &Settings) -> Result<Self, EtlError> {
        info!(
            search_url = %settings.search_url,
            search_index = %settings.search_index,
            checkpoint_dir = %settings.checkpoint_dir,
            "Initializing dependencies"
        );

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect_lazy(&settings.database_url)
            .map_err(|e| EtlError::config(format!("Invalid DATABASE_URL: {}", e)))?;

        let search_client = OpenSearchClient::new(
            &settings.search_url,
            IndexConfig::new(settings.search_index.clone()),
        )?;

        // Reachability is reported, not required: the retry loop handles a
        // search engine that comes up later.
        match search_client.health_check().await {
            Ok(true) => info!("Search engine connection verified"),
            Ok(false) | Err(_) => {
                warn!("Search engine not reachable yet; the sync loop will retry")
            }
        }

        let checkpoint = FileCheckpointStore::new(&settings.checkpoint_dir)
            .map_err(|e| EtlError::config(format!("Checkpoint directory unusable: {}", e)))?;

        let extractor = PgChangeExtractor::new(pool);
        let processor = DocumentProcessor::new(settings.validation_policy);
        let loader = SearchLoader::with_config(
            Arc::new(search_client),
            LoaderConfig {
                batch_size: settings.batch_size,
            },
        );

        let mut config = SyncConfig::new(settings.start_watermark);
        config.poll_interval = settings.poll_interval;

        let orchestrator = SyncOrchestrator::new(
            Arc::new(extractor),
            processor,
            loader,
            Arc::new(checkpoint),
            config,
        );

        Ok(Self { orchestrator })
    }
}

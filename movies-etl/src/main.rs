//! Entry point for the movies search sync service.

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use movies_etl::{Dependencies, EtlError, Settings};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!(error = %e, "Sync service terminated with a fatal error");
        std::process::exit(1);
    }

    info!("Sync service stopped");
}

async fn run() -> Result<(), EtlError> {
    let settings = Settings::from_env()?;
    let deps = Dependencies::new(&settings).await?;
    deps.orchestrator.run().await?;
    Ok(())
}

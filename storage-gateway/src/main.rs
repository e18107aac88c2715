use anyhow::{Context, Result};
use tracing::{info, warn};

use storage_gateway::{Config, StorageGateway};

const SERVICE_NAME: &str = "storage-gateway";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    shared::init_logging(config.logging.to_log_config(SERVICE_NAME))?;
    config.validate()?;

    info!(
        endpoint = %config.storage.endpoint_url(),
        bucket = %config.storage.bucket_name,
        "Starting storage gateway"
    );

    let gateway = StorageGateway::connect(&config.storage)?;

    // Provisioning failures are fatal: no object operation runs without a ready bucket.
    let outcome = gateway
        .initialize()
        .await
        .context("Object storage provisioning failed")?;
    info!(bucket = %gateway.bucket(), outcome = ?outcome, "Bucket provisioned");

    if !gateway.health_check().await {
        warn!(bucket = %gateway.bucket(), "Bucket not reachable after provisioning");
    }

    info!("Storage gateway ready, press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down storage gateway");
    Ok(())
}

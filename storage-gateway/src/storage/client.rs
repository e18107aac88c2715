//! S3 client factory.

use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{BehaviorVersion, Region},
    Client,
};
use tracing::info;

use crate::config::StorageConfig;
use crate::error::BackendError;

/// Region used for signing and for bucket creation.
pub const BUCKET_REGION: &str = "us-east-1";

/// Build the shared client for `config`. No network call is made here.
pub fn create_handle(config: &StorageConfig) -> Result<Client, BackendError> {
    if config.endpoint.trim().is_empty() {
        return Err(BackendError::unknown("Storage endpoint host is missing"));
    }
    if config.port == 0 {
        return Err(BackendError::unknown("Storage port must be a positive integer"));
    }
    if config.access_key.is_empty() || config.secret_key.is_empty() {
        return Err(BackendError::unknown("Storage credentials are missing"));
    }

    let credentials = Credentials::new(
        &config.access_key,
        &config.secret_key,
        None,
        None,
        "storage-gateway",
    );

    let s3_config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .endpoint_url(config.endpoint_url())
        .region(Region::new(BUCKET_REGION))
        .credentials_provider(credentials)
        .force_path_style(true) // MinIO serves buckets by path
        .build();

    info!(
        endpoint = %config.endpoint_url(),
        bucket = %config.bucket_name,
        "Object storage client created"
    );

    Ok(Client::from_conf(s3_config))
}

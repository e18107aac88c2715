/// Storage gateway service
///
/// Owns the configured bucket, provisions it once at startup and exposes the
/// object operations callers use. The gateway keeps no mutable state of its
/// own, so clones can be handed to concurrent tasks freely.

use std::fmt;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, error, info};

use super::backend::{ObjectBackend, ObjectDescriptor};
use super::client::BUCKET_REGION;
use super::policy::PolicyDocument;
use super::s3::S3Backend;
use crate::config::StorageConfig;
use crate::error::{BackendError, StorageError, StorageResult};

/// Object payload as returned by [`StorageGateway::get_file`].
pub type FileStream = BoxStream<'static, StorageResult<Bytes>>;

/// Result of a successful provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    Created,
    AlreadyExisted,
}

/// Step of the provisioning sequence, reported when it fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    Checking,
    Creating,
    PolicyApplying,
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            ProvisioningStep::Checking => "checking",
            ProvisioningStep::Creating => "creating",
            ProvisioningStep::PolicyApplying => "policy_applying",
        };
        f.write_str(step)
    }
}

#[derive(Clone)]
pub struct StorageGateway {
    backend: Arc<dyn ObjectBackend>,
    bucket: String,
    /// `{scheme}://{host}:{port}`
    public_endpoint: String,
}

impl StorageGateway {
    pub fn new(backend: Arc<dyn ObjectBackend>, config: &StorageConfig) -> Self {
        Self {
            backend,
            bucket: config.bucket_name.clone(),
            public_endpoint: config.endpoint_url(),
        }
    }

    /// Build the S3 handle for `config` and wrap it in a gateway.
    pub fn connect(config: &StorageConfig) -> StorageResult<Self> {
        let backend = S3Backend::from_config(config)?;
        Ok(Self::new(Arc::new(backend), config))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Make sure the bucket exists and carries the public-read policy.
    ///
    /// The policy is applied on every run, whether or not the bucket already
    /// existed. Errors are returned unchanged and should abort startup.
    pub async fn initialize(&self) -> StorageResult<ProvisioningOutcome> {
        match self.provision().await {
            Ok(outcome) => {
                info!(bucket = %self.bucket, outcome = ?outcome, "Object storage ready");
                Ok(outcome)
            }
            Err((step, err)) => {
                error!(
                    bucket = %self.bucket,
                    step = %step,
                    error = %err,
                    "Failed to initialize object storage"
                );
                Err(err.into())
            }
        }
    }

    async fn provision(&self) -> Result<ProvisioningOutcome, (ProvisioningStep, BackendError)> {
        debug!(bucket = %self.bucket, "Checking bucket");
        let exists = self
            .backend
            .bucket_exists(&self.bucket)
            .await
            .map_err(|e| (ProvisioningStep::Checking, e))?;

        let outcome = if exists {
            ProvisioningOutcome::AlreadyExisted
        } else {
            self.backend
                .make_bucket(&self.bucket, BUCKET_REGION)
                .await
                .map_err(|e| (ProvisioningStep::Creating, e))?;
            info!(bucket = %self.bucket, region = BUCKET_REGION, "Bucket created");
            ProvisioningOutcome::Created
        };

        let policy = PolicyDocument::public_read(&self.bucket)
            .to_json()
            .map_err(|e| {
                (
                    ProvisioningStep::PolicyApplying,
                    BackendError::unknown(format!("Failed to serialize bucket policy: {}", e)),
                )
            })?;
        self.backend
            .set_bucket_policy(&self.bucket, &policy)
            .await
            .map_err(|e| (ProvisioningStep::PolicyApplying, e))?;
        debug!(bucket = %self.bucket, "Public read policy applied");

        Ok(outcome)
    }

    /// Store `data` under `object_name` and return its public URL.
    pub async fn upload_file(
        &self,
        data: Bytes,
        size: u64,
        content_type: &str,
        object_name: &str,
    ) -> StorageResult<String> {
        debug!(key = %object_name, size, content_type, "Uploading file");

        self.backend
            .put_object(&self.bucket, object_name, data, size, content_type)
            .await
            .map_err(|e| {
                error!(key = %object_name, error = %e, "Upload failed");
                StorageError::Upload(e)
            })?;

        info!(key = %object_name, size, "File uploaded");
        Ok(self.get_public_url(object_name))
    }

    /// Open the object for reading. The caller drains the returned stream.
    pub async fn get_file(&self, object_name: &str) -> StorageResult<FileStream> {
        debug!(key = %object_name, "Retrieving file");

        let stream = self
            .backend
            .get_object(&self.bucket, object_name)
            .await
            .map_err(|e| {
                error!(key = %object_name, error = %e, "Retrieval failed");
                StorageError::Retrieval(e)
            })?;

        Ok(stream.map_err(StorageError::Retrieval).boxed())
    }

    /// Read the whole object into memory.
    ///
    /// Any error while reading discards what was read so far.
    pub async fn get_file_as_buffer(&self, object_name: &str) -> StorageResult<Bytes> {
        let mut stream = self.get_file(object_name).await?;
        let mut buffer = BytesMut::new();

        while let Some(chunk) = stream.try_next().await.map_err(|e| {
            error!(key = %object_name, error = %e, "Retrieval failed while reading");
            e
        })? {
            buffer.extend_from_slice(&chunk);
        }

        debug!(key = %object_name, size = buffer.len(), "File read into memory");
        Ok(buffer.freeze())
    }

    /// Presigned GET URL with the backend's default expiry.
    pub async fn generate_presigned_url(&self, object_name: &str) -> StorageResult<String> {
        self.backend
            .presigned_get_object(&self.bucket, object_name)
            .await
            .map_err(|e| {
                error!(key = %object_name, error = %e, "URL generation failed");
                StorageError::Presign(e)
            })
    }

    /// Remove the object. Missing objects follow the store's semantics.
    pub async fn delete_file(&self, object_name: &str) -> StorageResult<()> {
        self.backend
            .remove_object(&self.bucket, object_name)
            .await
            .map_err(|e| {
                error!(key = %object_name, error = %e, "Delete failed");
                StorageError::Delete(e)
            })?;

        info!(key = %object_name, "File deleted");
        Ok(())
    }

    /// List objects under `prefix`, fully materialized.
    ///
    /// With `recursive` unset only the first level below `prefix` is listed and
    /// deeper levels show up as prefix entries.
    pub async fn list_objects(
        &self,
        prefix: &str,
        recursive: bool,
    ) -> StorageResult<Vec<ObjectDescriptor>> {
        debug!(prefix = %prefix, recursive, "Listing objects");

        self.backend
            .list_objects(&self.bucket, prefix, recursive)
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| {
                error!(prefix = %prefix, error = %e, "Listing failed");
                StorageError::Listing(e)
            })
    }

    /// Every object in the bucket.
    pub async fn list_all(&self) -> StorageResult<Vec<ObjectDescriptor>> {
        self.list_objects("", true).await
    }

    /// `{scheme}://{host}:{port}/{bucket}/{object_name}`. Does not check that
    /// the object exists or that the bucket is actually public.
    pub fn get_public_url(&self, object_name: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket, object_name)
    }

    /// Whether the bucket is reachable.
    pub async fn health_check(&self) -> bool {
        matches!(self.backend.bucket_exists(&self.bucket).await, Ok(true))
    }
}

/// S3-compatible implementation of `ObjectBackend`
///
/// Works against AWS S3 or compatible services (MinIO, DigitalOcean Spaces,
/// etc.) through the shared `aws_sdk_s3::Client` built by `create_handle`.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{BucketLocationConstraint, CreateBucketConfiguration},
    Client,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::debug;

use super::backend::{DescriptorStream, ObjectBackend, ObjectDescriptor, ObjectStream};
use super::client::{create_handle, BUCKET_REGION};
use crate::config::StorageConfig;
use crate::error::{BackendError, ErrorKind};

/// Expiry applied to presigned URLs (the S3 maximum of seven days).
pub const DEFAULT_PRESIGN_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// `ObjectBackend` over the AWS SDK client.
#[derive(Clone)]
pub struct S3Backend {
    client: Client,
    presign_expiry: Duration,
}

impl S3Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            presign_expiry: DEFAULT_PRESIGN_EXPIRY,
        }
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, BackendError> {
        Ok(Self::new(create_handle(config)?))
    }
}

fn kind_for_code(code: Option<&str>) -> ErrorKind {
    match code {
        Some("NoSuchKey") | Some("NoSuchBucket") | Some("NotFound") => ErrorKind::NotFound,
        Some("AccessDenied") | Some("AllAccessDisabled") => ErrorKind::PolicyDenied,
        Some("RequestTimeout") | Some("SlowDown") | Some("ServiceUnavailable") => {
            ErrorKind::Transport
        }
        _ => ErrorKind::Unknown,
    }
}

/// Text for a service error: the S3 error code and message, never the raw response.
fn service_message<E>(err: &E) -> String
where
    E: ProvideErrorMetadata + std::error::Error,
{
    match (err.code(), err.message()) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        (Some(code), None) => code.to_string(),
        (None, Some(message)) => message.to_string(),
        (None, None) => err.to_string(),
    }
}

/// Map an SDK failure onto a `BackendError`.
fn classify<E, R>(err: SdkError<E, R>) -> BackendError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug + 'static,
{
    match &err {
        SdkError::ServiceError(context) => {
            BackendError::new(kind_for_code(context.err().code()), service_message(context.err()))
        }
        // No response to read: the error chain is the only detail available.
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => {
            BackendError::transport(DisplayErrorContext(&err).to_string())
        }
        _ => BackendError::unknown(DisplayErrorContext(&err).to_string()),
    }
}

fn to_chrono(timestamp: &aws_sdk_s3::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl ObjectBackend for S3Backend {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        debug!(bucket = %bucket, "Checking bucket exists");

        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if let SdkError::ServiceError(context) = &err {
                    if context.err().is_not_found() {
                        return Ok(false);
                    }
                }
                Err(classify(err))
            }
        }
    }

    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the implicit default and S3 rejects it as an explicit constraint.
        if region != BUCKET_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(classify)?;
        Ok(())
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), BackendError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        size: u64,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let content_length = i64::try_from(size)
            .map_err(|_| BackendError::unknown(format!("Object size {} is too large", size)))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream, BackendError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;

        let body = stream::try_unfold(output.body, |mut body| async move {
            match body.next().await {
                Some(Ok(chunk)) => Ok(Some((chunk, body))),
                Some(Err(e)) => Err(BackendError::transport(format!(
                    "Error reading object body: {}",
                    e
                ))),
                None => Ok(None),
            }
        });

        Ok(body.boxed())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> DescriptorStream {
        let client = self.client.clone();
        let bucket = bucket.to_string();
        let prefix = prefix.to_string();
        let delimiter = if recursive { None } else { Some("/".to_string()) };

        // State: Some(token) while pages remain; the first page has no token.
        let pages = stream::try_unfold(Some(None::<String>), move |state| {
            let client = client.clone();
            let bucket = bucket.clone();
            let prefix = prefix.clone();
            let delimiter = delimiter.clone();

            async move {
                let Some(continuation_token) = state else {
                    return Ok::<_, BackendError>(None);
                };

                let output = client
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix)
                    .set_delimiter(delimiter)
                    .set_continuation_token(continuation_token)
                    .send()
                    .await
                    .map_err(classify)?;

                let mut page = Vec::new();
                for common_prefix in output.common_prefixes() {
                    if let Some(p) = common_prefix.prefix() {
                        page.push(ObjectDescriptor::prefix(p));
                    }
                }
                for object in output.contents() {
                    let Some(key) = object.key() else { continue };
                    page.push(ObjectDescriptor {
                        key: key.to_string(),
                        size: object.size().unwrap_or(0).max(0) as u64,
                        etag: object.e_tag().map(|t| t.trim_matches('"').to_string()),
                        last_modified: object.last_modified().and_then(to_chrono),
                        is_prefix: false,
                    });
                }

                let next_state = output
                    .next_continuation_token()
                    .map(|token| Some(token.to_string()));

                Ok(Some((page, next_state)))
            }
        });

        pages
            .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    async fn presigned_get_object(&self, bucket: &str, key: &str) -> Result<String, BackendError> {
        let presigning_config = PresigningConfig::expires_in(self.presign_expiry)
            .map_err(|e| BackendError::unknown(format!("Invalid presign duration: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(classify)?;

        Ok(presigned.uri().to_string())
    }
}

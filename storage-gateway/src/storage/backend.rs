//! Operations the gateway needs from a remote object store.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::Serialize;

use crate::error::BackendError;

/// Object payload, positioned at the first byte.
pub type ObjectStream = BoxStream<'static, Result<Bytes, BackendError>>;

/// Listing results as the store pages them in.
pub type DescriptorStream = BoxStream<'static, Result<ObjectDescriptor, BackendError>>;

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDescriptor {
    pub key: String,
    pub size: u64,
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    /// Set for key-prefix pseudo-directories of a non-recursive listing.
    pub is_prefix: bool,
}

impl ObjectDescriptor {
    pub fn object(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            etag: None,
            last_modified: None,
            is_prefix: false,
        }
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            key: prefix.into(),
            size: 0,
            etag: None,
            last_modified: None,
            is_prefix: true,
        }
    }
}

/// Remote object store operations, one remote request each.
///
/// Implementations must be safe to share across concurrent calls.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError>;

    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError>;

    /// Replace the bucket policy with `policy` (JSON).
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), BackendError>;

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        size: u64,
        content_type: &str,
    ) -> Result<(), BackendError>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream, BackendError>;

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), BackendError>;

    /// Enumerate keys under `prefix`. Non-recursive listings stop at the next
    /// `/` and report the skipped levels as prefix entries.
    fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> DescriptorStream;

    /// Time-limited GET URL using the backend's default expiry.
    async fn presigned_get_object(&self, bucket: &str, key: &str) -> Result<String, BackendError>;
}

//! In-memory `ObjectBackend` used by the gateway tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};

use super::backend::{DescriptorStream, ObjectBackend, ObjectDescriptor, ObjectStream};
use crate::error::BackendError;

const CHUNK_SIZE: usize = 4;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryBackend {
    buckets: Mutex<HashMap<String, BTreeMap<String, StoredObject>>>,
    pub policies: Mutex<HashMap<String, String>>,
    pub created_regions: Mutex<Vec<String>>,
    /// Returned by every `put_object` while set.
    pub put_failure: Mutex<Option<BackendError>>,
    /// Yielded after the first chunk of every download while set.
    pub body_failure: Mutex<Option<BackendError>>,
    /// Yielded after the first listing entry while set.
    pub list_failure: Mutex<Option<BackendError>>,
}

impl MemoryBackend {
    pub fn with_bucket(bucket: &str) -> Self {
        let backend = Self::default();
        backend
            .buckets
            .lock()
            .unwrap()
            .insert(bucket.to_string(), BTreeMap::new());
        backend
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets
            .lock()
            .unwrap()
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    fn no_such_bucket(bucket: &str) -> BackendError {
        BackendError::not_found(format!("NoSuchBucket: {}", bucket))
    }
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, BackendError> {
        Ok(self.buckets.lock().unwrap().contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), BackendError> {
        let mut buckets = self.buckets.lock().unwrap();
        if buckets.contains_key(bucket) {
            return Err(BackendError::unknown(format!(
                "BucketAlreadyOwnedByYou: {}",
                bucket
            )));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        self.created_regions.lock().unwrap().push(region.to_string());
        Ok(())
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), BackendError> {
        if !self.buckets.lock().unwrap().contains_key(bucket) {
            return Err(Self::no_such_bucket(bucket));
        }
        self.policies
            .lock()
            .unwrap()
            .insert(bucket.to_string(), policy.to_string());
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
        if let Some(err) = self.put_failure.lock().unwrap().clone() {
            return Err(err);
        }
        if data.len() as u64 != size {
            return Err(BackendError::unknown(format!(
                "IncompleteBody: expected {} bytes, got {}",
                size,
                data.len()
            )));
        }

        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectStream, BackendError> {
        let object = {
            let buckets = self.buckets.lock().unwrap();
            let objects = buckets.get(bucket).ok_or_else(|| Self::no_such_bucket(bucket))?;
            objects.get(key).cloned().ok_or_else(|| {
                BackendError::not_found(format!("NoSuchKey: The specified key does not exist: {}", key))
            })?
        };

        let mut chunks: Vec<Result<Bytes, BackendError>> = object
            .data
            .chunks(CHUNK_SIZE)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();

        if let Some(err) = self.body_failure.lock().unwrap().clone() {
            chunks.truncate(1);
            chunks.push(Err(err));
        }

        Ok(stream::iter(chunks).boxed())
    }

    async fn remove_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Self::no_such_bucket(bucket))?;
        objects.remove(key);
        Ok(())
    }

    fn list_objects(&self, bucket: &str, prefix: &str, recursive: bool) -> DescriptorStream {
        let buckets = self.buckets.lock().unwrap();
        let Some(objects) = buckets.get(bucket) else {
            return stream::iter(vec![Err(Self::no_such_bucket(bucket))]).boxed();
        };

        let mut prefixes = BTreeSet::new();
        let mut entries: Vec<Result<ObjectDescriptor, BackendError>> = Vec::new();
        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else { break };
            match rest.find('/') {
                Some(idx) if !recursive => {
                    prefixes.insert(format!("{}{}", prefix, &rest[..=idx]));
                }
                _ => entries.push(Ok(ObjectDescriptor::object(
                    key.clone(),
                    object.data.len() as u64,
                ))),
            }
        }
        entries.extend(prefixes.into_iter().map(|p| Ok(ObjectDescriptor::prefix(p))));

        if let Some(err) = self.list_failure.lock().unwrap().clone() {
            entries.truncate(1);
            entries.push(Err(err));
        }

        stream::iter(entries).boxed()
    }

    async fn presigned_get_object(&self, bucket: &str, key: &str) -> Result<String, BackendError> {
        Ok(format!(
            "http://memory/{}/{}?X-Amz-Expires=604800&X-Amz-Signature=test",
            bucket, key
        ))
    }
}

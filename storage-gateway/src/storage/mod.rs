/// Object storage for the gateway
///
/// This module provides:
/// - The client factory building the shared S3 handle
/// - The `ObjectBackend` seam and its S3 implementation
/// - The public-read bucket policy document
/// - `StorageGateway`, the facade callers use

pub mod backend;
pub mod client;
pub mod gateway;
pub mod policy;
pub mod s3;

#[cfg(test)]
pub(crate) mod memory;

pub use backend::{DescriptorStream, ObjectBackend, ObjectDescriptor, ObjectStream};
pub use client::{create_handle, BUCKET_REGION};
pub use gateway::{FileStream, ProvisioningOutcome, ProvisioningStep, StorageGateway};
pub use policy::{Effect, PolicyDocument, PolicyStatement, Principal};
pub use s3::S3Backend;

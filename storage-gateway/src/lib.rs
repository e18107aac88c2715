//! Storage gateway: bucket provisioning and object operations over an
//! S3-compatible store (MinIO, AWS S3, ...).

pub mod config;
pub mod error;
pub mod storage;

pub use config::{Config, LoggingConfig, StorageConfig};
pub use error::{BackendError, ErrorKind, StorageError};
pub use storage::{
    create_handle, ObjectBackend, ObjectDescriptor, ObjectStream, PolicyDocument,
    ProvisioningOutcome, S3Backend, StorageGateway,
};

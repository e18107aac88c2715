//! Error types for the storage gateway

use thiserror::Error;

/// Classification of a failure reported by the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Transport,
    PolicyDenied,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transport => "transport",
            ErrorKind::PolicyDenied => "policy_denied",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// The gateway never retries; this is informational for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Transport)
    }
}

/// Failure from the object store client, or from building it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: ErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn policy_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PolicyDenied, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }
}

/// Errors surfaced by [`StorageGateway`](crate::StorageGateway).
///
/// Provisioning failures pass through unchanged. Object operations map every
/// failure into the variant for that operation; the original message is kept
/// in the display text and the original error stays reachable as the source.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Failed to upload file: {0}")]
    Upload(#[source] BackendError),

    #[error("Failed to retrieve file: {0}")]
    Retrieval(#[source] BackendError),

    #[error("Failed to generate URL: {0}")]
    Presign(#[source] BackendError),

    #[error("Failed to delete file: {0}")]
    Delete(#[source] BackendError),

    #[error("Failed to list objects: {0}")]
    Listing(#[source] BackendError),
}

impl StorageError {
    fn source_error(&self) -> &BackendError {
        match self {
            StorageError::Backend(e)
            | StorageError::Upload(e)
            | StorageError::Retrieval(e)
            | StorageError::Presign(e)
            | StorageError::Delete(e)
            | StorageError::Listing(e) => e,
        }
    }

    /// Kind reported by the object store for the underlying failure.
    pub fn kind(&self) -> ErrorKind {
        self.source_error().kind
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

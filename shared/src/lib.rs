//! Shared utilities for storage gateway services

// Re-export common dependencies
pub use anyhow;
pub use thiserror;
pub use tracing;

pub mod observability;

pub use observability::{init_logging, LogConfig, LogFormat, LogLevel};

/// Configuration module for the Storage Gateway
///
/// Values are read once from the process environment (an optional `.env`
/// file is loaded first) and are immutable afterwards.

use anyhow::{Context, Result};
use shared::{LogConfig, LogFormat, LogLevel};
use std::env;
use std::fmt;

/// Main configuration structure for the Storage Gateway
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            storage: StorageConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()
    }
}

/// Connection parameters for the object store plus the bucket this gateway owns.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub endpoint: String,
    pub port: u16,
    pub use_ssl: bool,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String> {
            lookup(name).with_context(|| format!("{} must be set", name))
        };

        Ok(Self {
            endpoint: required("MINIO_ENDPOINT")?,
            port: required("MINIO_PORT")?
                .trim()
                .parse()
                .context("Invalid MINIO_PORT")?,
            // Only the literal "true" enables TLS.
            use_ssl: lookup("MINIO_USE_SSL").as_deref() == Some("true"),
            access_key: required("MINIO_ACCESS_KEY")?,
            secret_key: required("MINIO_SECRET_KEY")?,
            bucket_name: required("MINIO_BUCKET_NAME")?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            anyhow::bail!("MinIO endpoint cannot be empty");
        }
        if self.port == 0 {
            anyhow::bail!("MinIO port cannot be 0");
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            anyhow::bail!("MinIO credentials cannot be empty");
        }
        if self.bucket_name.trim().is_empty() {
            anyhow::bail!("MinIO bucket name cannot be empty");
        }
        Ok(())
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_ssl {
            "https"
        } else {
            "http"
        }
    }

    /// `{scheme}://{host}:{port}`
    pub fn endpoint_url(&self) -> String {
        format!("{}://{}:{}", self.scheme(), self.endpoint, self.port)
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "info".to_string())
                .parse()
                .context("Invalid LOG_LEVEL")?,
            format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .parse()
                .context("Invalid LOG_FORMAT")?,
        })
    }

    pub fn to_log_config(&self, service_name: &str) -> LogConfig {
        LogConfig {
            level: self.level,
            format: self.format,
            service_name: service_name.to_string(),
            ..Default::default()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
        }
    }
}

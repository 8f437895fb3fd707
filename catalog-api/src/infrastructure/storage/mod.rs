//! Image storage backends.
//!
//! The ingestion pipeline only knows [`ImageStore`]: write bytes under a key
//! and get back the locator clients use to fetch them. The local filesystem
//! and S3 implementations are picked from configuration at startup.

pub mod local;
pub mod s3;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{StorageBackend, StorageConfig};

pub use local::LocalImageStore;
pub use s3::S3ImageStore;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("storage misconfigured: {0}")]
    Misconfigured(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under `key` and returns the locator of the stored object.
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Builds the backend selected by `storage.backend`.
pub async fn build_image_store(config: &StorageConfig) -> Result<Arc<dyn ImageStore>, StorageError> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalImageStore::new(&config.local.upload_dir, &config.local.serve_prefix).await?;
            tracing::info!(dir = %store.root().display(), "Using local image storage");
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let store = S3ImageStore::from_config(&config.s3).await?;
            tracing::info!(base = %store.public_base(), "Using S3 image storage");
            Ok(Arc::new(store))
        }
    }
}

/// Key for a new upload: creation time in milliseconds, a dash, then the
/// client's file name with any directory part removed.
pub fn storage_key(file_name: &str, created_at: DateTime<Utc>) -> String {
    let base = Path::new(file_name.trim())
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.rsplit('\\').next().unwrap_or(name))
        .filter(|name| !name.is_empty() && *name != "..")
        .unwrap_or("upload");

    format!("{}-{}", created_at.timestamp_millis(), base)
}

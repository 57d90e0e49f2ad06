//! Blob storage collaborator: persists exported documents and hands out
//! time-limited download links.
//!
//! `AppState` holds an `Arc<dyn BlobStore>`; `S3BlobStore` is the production
//! backend (MinIO locally, AWS in production).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

pub mod s3;

pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("signing download url failed: {0}")]
    Presign(String),

    #[error("delete failed: {0}")]
    Delete(String),
}

/// Locator of a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    pub bucket: String,
    pub path: String,
    pub size: usize,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes `bytes` at `path`, replacing any object already stored there.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<StoredObject, StorageError>;

    async fn signed_url(&self, bucket: &str, path: &str, ttl: Duration)
        -> Result<String, StorageError>;

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError>;
}

use std::time::Duration;

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::config::Config;
use crate::storage::{BlobStore, StorageError, StoredObject};

pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "agency-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        Self::new(aws_sdk_s3::Client::new(&s3_config))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        mime_type: &str,
    ) -> Result<StoredObject, StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(mime_type)
            .send()
            .await
            .map_err(|e| StorageError::Upload(format!("s3://{bucket}/{path}: {e}")))?;

        info!("Uploaded {size} bytes to s3://{bucket}/{path}");
        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            size,
        })
    }

    async fn signed_url(
        &self,
        bucket: &str,
        path: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let presigning =
            PresigningConfig::expires_in(ttl).map_err(|e| StorageError::Presign(e.to_string()))?;
        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(path)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(format!("s3://{bucket}/{path}: {e}")))?;
        Ok(request.uri().to_string())
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::Delete(format!("s3://{bucket}/{path}: {e}")))?;
        info!("Deleted s3://{bucket}/{path}");
        Ok(())
    }
}

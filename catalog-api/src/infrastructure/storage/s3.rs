use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::{ImageStore, StorageError};
use crate::config::S3StorageConfig;

/// Stores images in an S3 bucket (or an S3-compatible service) and hands out
/// public object URLs.
#[derive(Debug, Clone)]
pub struct S3ImageStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3ImageStore {
    pub fn new(client: Client, bucket: impl Into<String>, public_base: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            public_base: public_base.into(),
        }
    }

    pub async fn from_config(config: &S3StorageConfig) -> Result<Self, StorageError> {
        let region = required(&config.region, "region")?;
        let bucket = required(&config.bucket, "bucket")?;
        let access_key_id = required(&config.access_key_id, "access_key_id")?;
        let secret_access_key = required(&config.secret_access_key, "secret_access_key")?;
        let endpoint = config.endpoint.as_deref().filter(|e| !e.is_empty());

        let credentials = Credentials::new(access_key_id, secret_access_key, None, None, "catalog-config");
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials);
        if let Some(endpoint) = endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(endpoint.is_some())
            .build();

        Ok(Self::new(
            Client::from_conf(s3_config),
            bucket,
            public_base_url(bucket, region, endpoint),
        ))
    }

    pub fn public_base(&self) -> &str {
        &self.public_base
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, StorageError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| StorageError::Misconfigured(format!("missing s3 {name}")))
}

/// Public prefix for objects of `bucket`: virtual-hosted AWS style, or
/// path style under a custom endpoint.
pub fn public_base_url(bucket: &str, region: &str, endpoint: Option<&str>) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com"),
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String, StorageError> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(bucket = %self.bucket, key, size, "Uploaded image to S3");

        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aws_urls_use_virtual_hosted_style() {
        assert_eq!(
            public_base_url("product-images", "eu-west-1", None),
            "https://product-images.s3.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn custom_endpoints_use_path_style() {
        assert_eq!(
            public_base_url("product-images", "us-east-1", Some("http://localhost:9000/")),
            "http://localhost:9000/product-images"
        );
    }

    #[tokio::test]
    async fn from_config_builds_locator_base() {
        let config = S3StorageConfig {
            region: Some("eu-west-1".into()),
            bucket: Some("product-images".into()),
            access_key_id: Some("AKIA".into()),
            secret_access_key: Some("secret".into()),
            endpoint: None,
        };

        let store = S3ImageStore::from_config(&config).await.unwrap();

        assert_eq!(store.public_base(), "https://product-images.s3.eu-west-1.amazonaws.com");
    }

    #[tokio::test]
    async fn from_config_rejects_missing_bucket() {
        let config = S3StorageConfig {
            region: Some("eu-west-1".into()),
            access_key_id: Some("AKIA".into()),
            secret_access_key: Some("secret".into()),
            ..Default::default()
        };

        let result = S3ImageStore::from_config(&config).await;

        assert!(matches!(result, Err(StorageError::Misconfigured(_))));
    }
}

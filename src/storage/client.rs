use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::StorageConfig;
use crate::error::AppError;

/// Route prefix under which documents are proxied when the bucket has no
/// public base URL.
pub const FILES_ROUTE_PREFIX: &str = "/api/files/";

/// Descriptor of a stored object, as returned by a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    /// Public address of the object.
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Trait for blob storage operations (S3-compatible).
///
/// Abstracted as a trait so tests can use a mock without a real S3 instance.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload content to the given key and return its public URL.
    async fn put_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;

    /// Retrieve content by key. Returns `None` if the object doesn't exist.
    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// List every object whose key starts with `prefix`, in store order.
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, AppError>;

    /// Delete the object stored under `key`.
    async fn delete_object(&self, key: &str) -> Result<(), AppError>;
}

/// Build the public URL of `key`.
///
/// With a base URL the key is appended to it; otherwise the URL points at the
/// in-process download proxy. Each path segment is percent-encoded, since keys
/// themselves contain percent-escapes.
pub fn public_object_url(base_url: Option<&str>, key: &str) -> String {
    let path = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    match base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), path),
        None => format!("{FILES_ROUTE_PREFIX}{path}"),
    }
}

/// S3 implementation of StorageClient.
pub struct S3StorageClient {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: Option<String>,
    public_acl: bool,
}

impl S3StorageClient {
    /// Create a new S3 storage client from the storage configuration.
    pub async fn from_config(config: &StorageConfig) -> Result<Self, AppError> {
        if config.s3_bucket.trim().is_empty() {
            return Err(AppError::Config("S3_BUCKET must not be empty".into()));
        }

        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.s3_region {
            config_loader = config_loader.region(aws_config::Region::new(region.clone()));
        }

        // Support custom S3 endpoint (for MinIO, LocalStack, etc.)
        if let Some(endpoint) = &config.s3_endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let sdk_config = config_loader.load().await;
        let client = aws_sdk_s3::Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(config.s3_force_path_style)
                .build(),
        );

        Ok(Self {
            client,
            bucket: config.s3_bucket.clone(),
            public_base_url: config.public_base_url.clone(),
            public_acl: config.s3_public_acl,
        })
    }

    /// Create with explicit values (useful for testing / DI).
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: String,
        public_base_url: Option<String>,
        public_acl: bool,
    ) -> Self {
        Self {
            client,
            bucket,
            public_base_url,
            public_acl,
        }
    }

    fn url_for(&self, key: &str) -> String {
        public_object_url(self.public_base_url.as_deref(), key)
    }
}

#[async_trait]
impl StorageClient for S3StorageClient {
    async fn put_object(
        &self,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(content.into());

        if self.public_acl {
            request = request.acl(aws_sdk_s3::types::ObjectCannedAcl::PublicRead);
        }

        request
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to put object '{}': {}", key, e)))?;

        Ok(self.url_for(key))
    }

    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::Storage(format!("Failed to read body: {}", e)))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    Ok(None)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to get object '{}': {}",
                        key, service_err
                    )))
                }
            }
        }
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, AppError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                AppError::Storage(format!("Failed to list objects under '{}': {}", prefix, e))
            })?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                let uploaded_at = object
                    .last_modified()
                    .and_then(|t| DateTime::<Utc>::from_timestamp(t.secs(), t.subsec_nanos()))
                    .unwrap_or_default();

                objects.push(ObjectSummary {
                    key: key.to_string(),
                    url: self.url_for(key),
                    uploaded_at,
                });
            }
        }

        Ok(objects)
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete object '{}': {}", key, e)))?;

        Ok(())
    }
}

//! # Object Storage Module
//!
//! Uploads project images to a bucket of a Supabase-style storage REST API.
//! Uploads always overwrite an existing object at the same path.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info};

/// Storage backend for uploaded project images
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload `data` to `path` (overwriting), returning the object's public URL
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String>;
}

/// HTTP client for the storage REST API
#[derive(Debug, Clone)]
pub struct HttpObjectStorage {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl HttpObjectStorage {
    pub fn new(base_url: &str, service_key: &str, bucket: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    /// Endpoint objects are written to
    pub fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    /// Publicly readable URL of an object
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, path: &str, data: Bytes, content_type: &str) -> Result<String> {
        let size = data.len();
        debug!(bucket = %self.bucket, path, size, content_type, "Uploading object");

        let response = self
            .client
            .post(self.object_url(path))
            .header(AUTHORIZATION, format!("Bearer {}", self.service_key))
            .header("apikey", &self.service_key)
            .header("x-upsert", "true")
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .context("Failed to reach object storage")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Object storage rejected upload ({status}): {body}");
        }

        info!(bucket = %self.bucket, path, size, "Object uploaded");
        Ok(self.public_url(path))
    }
}

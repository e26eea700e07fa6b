//! # Image Intake Module
//!
//! Moves the project image from the chat platform's file hosting into object
//! storage: resolve the file path, download the bytes, derive the object name
//! and content type from the path, then upload.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::{debug, error, info};

use crate::dialogue::PhotoVariant;
use crate::flow_errors::FlowError;
use crate::storage::ObjectStorage;

pub use crate::dialogue::select_largest_variant;

/// Extension used when the resolved file path has none
pub const DEFAULT_EXTENSION: &str = "jpg";
/// Content type used when the extension is unknown
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// Source of uploaded chat files
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Resolve a file id to a path on the file host
    async fn resolve_path(&self, file_id: &str) -> Result<String>;

    /// Download the content at a resolved path
    async fn download(&self, file_path: &str) -> Result<Bytes>;
}

/// File source backed by the Telegram Bot API file endpoint
#[derive(Clone)]
pub struct TelegramFileSource {
    bot: Bot,
    api_url: String,
    client: reqwest::Client,
}

impl TelegramFileSource {
    pub fn new(bot: Bot, api_url: &str) -> Self {
        Self {
            bot,
            api_url: api_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn download_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, self.bot.token(), file_path)
    }
}

#[async_trait]
impl FileSource for TelegramFileSource {
    async fn resolve_path(&self, file_id: &str) -> Result<String> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .context("Failed to resolve file")?;

        if file.path.is_empty() {
            return Err(anyhow!("File {file_id} has no downloadable path"));
        }
        Ok(file.path)
    }

    async fn download(&self, file_path: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(self.download_url(file_path))
            .send()
            .await
            .context("Failed to download file")?
            .error_for_status()
            .context("File host returned an error")?;

        Ok(response.bytes().await?)
    }
}

/// Trailing extension of a file path, as written
pub fn file_extension(file_path: &str) -> String {
    Path::new(file_path)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Object name for a project image: `{slug}.{extension}`
pub fn upload_filename(slug: &str, file_path: &str) -> String {
    format!("{}.{}", slug, file_extension(file_path))
}

/// Content type of an object name
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

async fn transfer(
    files: &dyn FileSource,
    storage: &dyn ObjectStorage,
    photo: &PhotoVariant,
    slug: &str,
) -> Result<String> {
    let file_path = files.resolve_path(&photo.file_id).await?;
    debug!(file_id = %photo.file_id, file_path = %file_path, "Resolved photo file");

    let data = files.download(&file_path).await?;

    let filename = upload_filename(slug, &file_path);
    let content_type = content_type_for(&filename);
    storage.upload(&filename, data, &content_type).await
}

/// Copy a photo into object storage under the project's slug
pub async fn intake_image(
    files: &dyn FileSource,
    storage: &dyn ObjectStorage,
    photo: &PhotoVariant,
    slug: &str,
) -> Result<String, FlowError> {
    match transfer(files, storage, photo, slug).await {
        Ok(url) => {
            info!(slug, url = %url, "Project image stored");
            Ok(url)
        }
        Err(e) => {
            error!(slug, file_id = %photo.file_id, error = %e, "Image intake failed");
            Err(FlowError::Upload(e.to_string()))
        }
    }
}

//! # Bot Configuration Module
//!
//! Runtime settings read from the process environment (optionally seeded from
//! a `.env` file by `main`).

use std::env;

use anyhow::{Context, Result};

pub const DEFAULT_STORAGE_BUCKET: &str = "project-avatars";
pub const DEFAULT_PROJECT_BASE_URL: &str = "https://showcase.example/p";
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Settings for the bot and its external services
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot API token, also used to build file download URLs
    pub bot_token: String,
    /// Postgres connection string
    pub database_url: String,
    /// Base URL of the object storage API
    pub storage_url: String,
    /// Service key sent to the object storage API
    pub storage_service_key: String,
    /// Bucket project images are uploaded to
    pub storage_bucket: String,
    /// Channel that receives new-project announcements
    pub operator_channel_id: i64,
    /// Prefix of public project pages; the slug is appended
    pub project_base_url: String,
    /// Bot API host used for file downloads
    pub telegram_api_url: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl BotConfig {
    /// Read the configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let operator_channel_id = required("OPERATOR_CHANNEL_ID")?
            .parse()
            .context("OPERATOR_CHANNEL_ID must be a numeric chat id")?;

        Ok(Self {
            bot_token: required("TELEGRAM_BOT_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            storage_url: required("STORAGE_URL")?,
            storage_service_key: required("STORAGE_SERVICE_KEY")?,
            storage_bucket: optional("STORAGE_BUCKET", DEFAULT_STORAGE_BUCKET),
            operator_channel_id,
            project_base_url: optional("PROJECT_BASE_URL", DEFAULT_PROJECT_BASE_URL),
            telegram_api_url: optional("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL),
        })
    }

    /// Public page of a project
    pub fn project_link(&self, slug: &str) -> String {
        format!("{}/{}", self.project_base_url.trim_end_matches('/'), slug)
    }
}

//! # Link Normalizer Module
//!
//! Turns the free-form answers to the Twitter and GitHub prompts into
//! canonical profile URLs.
//!
//! Accepted inputs:
//!
//! - `no` (exact, case-sensitive) skips the platform
//! - a profile URL such as `https://www.twitter.com/handle`
//! - a bare handle such as `handle`

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flow_errors::FlowError;

/// Answer that skips a social link
pub const SKIP_ANSWER: &str = "no";

lazy_static! {
    static ref TWITTER_HANDLE: Regex =
        Regex::new(r"(?i)^(?:https?://)?(?:www\.)?twitter\.com/([a-zA-Z0-9_]+)")
            .expect("Twitter handle pattern should be valid");
    static ref GITHUB_HANDLE: Regex =
        Regex::new(r"(?i)^(?:https?://)?(?:www\.)?github\.com/([a-zA-Z0-9_-]+)")
            .expect("GitHub handle pattern should be valid");
}

/// Social platforms a project can link to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SocialPlatform {
    Twitter,
    Github,
}

impl SocialPlatform {
    /// Title stored alongside the link
    pub fn title(self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::Github => "GitHub",
        }
    }

    fn domain(self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Github => "github",
        }
    }

    fn handle_pattern(self) -> &'static Regex {
        match self {
            SocialPlatform::Twitter => &*TWITTER_HANDLE,
            SocialPlatform::Github => &*GITHUB_HANDLE,
        }
    }

    /// Canonical profile URL for a handle
    pub fn profile_url(self, handle: &str) -> String {
        format!("https://{}.com/{}", self.domain(), handle)
    }
}

/// A titled link stored with a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLink {
    pub title: String,
    pub url: String,
}

/// Extract a handle from a profile URL
pub fn extract_handle(platform: SocialPlatform, url: &str) -> Option<String> {
    platform
        .handle_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Normalize a raw answer into a profile link
///
/// Returns `Ok(None)` when the user skipped the platform and
/// `Err(FlowError::InvalidUrl)` when a URL carries no recognizable handle.
pub fn normalize_link(
    platform: SocialPlatform,
    raw: &str,
) -> Result<Option<ProjectLink>, FlowError> {
    if raw == SKIP_ANSWER {
        debug!(platform = platform.title(), "Social link skipped");
        return Ok(None);
    }

    let handle = if raw.starts_with("http") {
        extract_handle(platform, raw).ok_or(FlowError::InvalidUrl(platform))?
    } else {
        raw.to_string()
    };

    Ok(Some(ProjectLink {
        title: platform.title().to_string(),
        url: platform.profile_url(&handle),
    }))
}

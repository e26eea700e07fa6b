//! # Flow Error Types Module
//!
//! Error types raised while a user walks through the new-project form.
//! Every variant maps to a localization key so the bot can report it to the user.

use crate::dialogue::FormStep;
use crate::links::SocialPlatform;

/// Errors that end a new-project conversation
#[derive(Debug, Clone, PartialEq)]
pub enum FlowError {
    /// A text step received something other than non-empty text
    MissingText(FormStep),
    /// A profile URL did not contain a recognizable handle
    InvalidUrl(SocialPlatform),
    /// The image step received a message without a photo
    MissingPhoto,
    /// Resolving, downloading or uploading the image failed
    Upload(String),
    /// Inserting the project failed or returned no row
    Persistence(String),
}

impl FlowError {
    /// Localization key for the message shown to the user
    pub fn localization_key(&self) -> &'static str {
        match self {
            FlowError::MissingText(_) => "error-missing-text",
            FlowError::InvalidUrl(SocialPlatform::Twitter) => "error-invalid-twitter-url",
            FlowError::InvalidUrl(SocialPlatform::Github) => "error-invalid-github-url",
            FlowError::MissingPhoto => "error-missing-photo",
            FlowError::Upload(_) => "error-upload-failed",
            FlowError::Persistence(_) => "error-persistence-failed",
        }
    }

    /// Whether the error should be surfaced to the dispatcher after notifying the user
    pub fn is_fatal(&self) -> bool {
        matches!(self, FlowError::Persistence(_))
    }
}

impl std::fmt::Display for FlowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowError::MissingText(step) => write!(f, "Missing text for step {step:?}"),
            FlowError::InvalidUrl(platform) => {
                write!(f, "Invalid {} URL", platform.title())
            }
            FlowError::MissingPhoto => write!(f, "Missing photo"),
            FlowError::Upload(msg) => write!(f, "Upload error: {msg}"),
            FlowError::Persistence(msg) => write!(f, "Persistence error: {msg}"),
        }
    }
}

impl std::error::Error for FlowError {}

//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Drives the new-project conversation from incoming messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages

use std::sync::Arc;

use crate::config::BotConfig;
use crate::db::ProjectStore;
use crate::session::SessionStore;
use crate::submission::ProjectSubmitter;

pub mod callback_handler;
pub mod message_handler;
pub mod ui_builder;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

/// Shared dependencies injected into every handler
pub struct AppContext {
    pub config: BotConfig,
    pub projects: Arc<dyn ProjectStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub submitter: ProjectSubmitter,
}

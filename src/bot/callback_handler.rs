//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

// Import localization
use crate::localization::t_lang;

// Import UI builder functions
use super::ui_builder::parse_add_link_callback;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery) -> Result<()> {
    debug!(user_id = %q.from.id, "Received callback query from user");

    let language_code = q.from.language_code.as_deref();

    match q.data.as_deref().and_then(parse_add_link_callback) {
        Some(project_id) => {
            debug!(user_id = %q.from.id, project_id, "Add link requested");
            bot.answer_callback_query(q.id.clone())
                .text(t_lang("add-link-unavailable", language_code))
                .await?;
        }
        None => {
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }

    Ok(())
}

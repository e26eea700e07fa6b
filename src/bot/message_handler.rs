//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, LinkPreviewOptions, MessageId, ParseMode};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::t_lang;

// Import dialogue types
use crate::dialogue::{
    advance, start, DraftProject, FlowInput, PhotoVariant, ProjectDialogue,
    ProjectDialogueState, Transition,
};

// Import session and submission helpers
use crate::flow_errors::FlowError;
use crate::session::begin_conversation;
use crate::submission::finish_flow;

// Import UI builder functions
use super::ui_builder::{
    create_project_keyboard, format_broadcast, format_help, format_project_created,
    format_step_prompt, format_welcome,
};

use super::AppContext;

/// Reduce a Telegram message to the input the dialogue understands
pub fn to_flow_input(msg: &Message) -> FlowInput {
    if let Some(text) = msg.text() {
        FlowInput::Text(text.to_string())
    } else if let Some(photos) = msg.photo() {
        FlowInput::Photo(
            photos
                .iter()
                .map(|photo| PhotoVariant {
                    file_id: photo.file.id.0.clone(),
                    width: photo.width,
                    height: photo.height,
                    file_size: photo.file.size,
                })
                .collect(),
        )
    } else {
        FlowInput::Other
    }
}

fn sender_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

fn sender_identity(msg: &Message) -> (i64, String) {
    match msg.from.as_ref() {
        Some(user) => (user.id.0 as i64, user.full_name()),
        None => (msg.chat.id.0, String::new()),
    }
}

/// End the conversation after a failure
async fn abort_flow(
    dialogue: &ProjectDialogue,
    ctx: &AppContext,
    telegram_id: i64,
    error: &FlowError,
) -> Result<()> {
    let state = finish_flow(ctx.sessions.as_ref(), telegram_id, Err(error)).await;
    dialogue.update(state).await?;
    Ok(())
}

async fn start_new_project(
    bot: &Bot,
    msg: &Message,
    dialogue: ProjectDialogue,
    ctx: &AppContext,
) -> Result<()> {
    let language_code = sender_language(msg);
    let (telegram_id, display_name) = sender_identity(msg);

    // Creates the account on first contact so a broken database is reported
    // before the form; submission resolves the user again from the same row.
    match ctx
        .projects
        .ensure_user(telegram_id, Some(display_name.as_str()))
        .await
    {
        Ok(user) => debug!(user_id = user.id, telegram_id, "Resolved user for new project"),
        Err(e) => {
            error!(telegram_id, error = %e, "Failed to resolve user");
            bot.send_message(msg.chat.id, t_lang("error-user-lookup", language_code))
                .await?;
            return Ok(());
        }
    }

    begin_conversation(ctx.sessions.as_ref(), telegram_id).await;
    info!(telegram_id, "New project conversation started");

    apply_transition(bot, msg, dialogue, ctx, start()).await
}

/// Execute the outcome of one dialogue step
async fn apply_transition(
    bot: &Bot,
    msg: &Message,
    dialogue: ProjectDialogue,
    ctx: &AppContext,
    transition: Transition,
) -> Result<()> {
    let language_code = sender_language(msg);
    let (telegram_id, _) = sender_identity(msg);

    match transition {
        Transition::Prompt { next, step } => {
            debug!(telegram_id, step = ?step, "Prompting for next step");
            bot.send_message(msg.chat.id, format_step_prompt(step, language_code))
                .await?;
            dialogue.update(next).await?;
        }
        Transition::Abort(e) => {
            warn!(telegram_id, error = %e, "New project conversation aborted");
            abort_flow(&dialogue, ctx, telegram_id, &e).await?;
            bot.send_message(msg.chat.id, t_lang(e.localization_key(), language_code))
                .await?;
        }
        Transition::Submit { draft, photo } => {
            submit_project(bot, msg, dialogue, ctx, draft, photo).await?;
        }
        Transition::Ignore => {}
    }

    Ok(())
}

async fn submit_project(
    bot: &Bot,
    msg: &Message,
    dialogue: ProjectDialogue,
    ctx: &AppContext,
    draft: DraftProject,
    photo: PhotoVariant,
) -> Result<()> {
    let language_code = sender_language(msg);
    let (telegram_id, display_name) = sender_identity(msg);
    let chat_id = msg.chat.id;

    let status = bot
        .send_message(chat_id, t_lang("status-creating", language_code))
        .await?;
    dialogue
        .update(ProjectDialogueState::Persisting {
            draft: draft.clone(),
        })
        .await?;

    let user = match ctx
        .projects
        .ensure_user(telegram_id, Some(display_name.as_str()))
        .await
    {
        Ok(user) => user,
        Err(e) => {
            error!(telegram_id, error = %e, "Failed to resolve user before submission");
            let failure = FlowError::Persistence(e.to_string());
            abort_flow(&dialogue, ctx, telegram_id, &failure).await?;
            edit_status(bot, chat_id, status.id, t_lang("error-user-lookup", language_code), None)
                .await;
            return Ok(());
        }
    };

    let outcome = ctx.submitter.submit(telegram_id, &user, draft, &photo).await;
    let state = finish_flow(ctx.sessions.as_ref(), telegram_id, outcome.as_ref()).await;
    dialogue.update(state).await?;

    match outcome {
        Ok(project) => {
            let link = ctx.config.project_link(&project.slug);

            edit_status(
                bot,
                chat_id,
                status.id,
                format_project_created(&project.title, &link, language_code),
                Some(create_project_keyboard(project.project_id, language_code)),
            )
            .await;

            notify_operators(bot, ctx, &display_name, &project.title, &link).await;
            Ok(())
        }
        Err(e) => {
            error!(telegram_id, error = %e, "Project submission failed");
            edit_status(bot, chat_id, status.id, t_lang(e.localization_key(), language_code), None)
                .await;

            if e.is_fatal() {
                return Err(e.into());
            }
            Ok(())
        }
    }
}

/// Replace the status message; failures are logged only
async fn edit_status(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    keyboard: Option<InlineKeyboardMarkup>,
) {
    let request = bot
        .edit_message_text(chat_id, message_id, text)
        .parse_mode(ParseMode::Html);
    let result = match keyboard {
        Some(keyboard) => request.reply_markup(keyboard).await,
        None => request.await,
    };

    if let Err(e) = result {
        error!(chat_id = %chat_id, error = %e, "Failed to edit status message");
    }
}

/// Announce a new project in the operator channel
async fn notify_operators(bot: &Bot, ctx: &AppContext, display_name: &str, title: &str, link: &str) {
    let channel = ChatId(ctx.config.operator_channel_id);
    let result = bot
        .send_message(channel, format_broadcast(display_name, title, link))
        .parse_mode(ParseMode::Html)
        .link_preview_options(LinkPreviewOptions {
            is_disabled: true,
            url: None,
            prefer_small_media: false,
            prefer_large_media: false,
            show_above_text: false,
        })
        .await;

    if let Err(e) = result {
        error!(channel = %channel, error = %e, "Failed to notify operator channel");
    }
}

async fn handle_idle_message(
    bot: &Bot,
    msg: &Message,
    dialogue: ProjectDialogue,
    ctx: &AppContext,
) -> Result<()> {
    let language_code = sender_language(msg);

    let Some(text) = msg.text() else {
        debug!(user_id = %msg.chat.id, "Received unsupported message outside a conversation");
        bot.send_message(msg.chat.id, t_lang("unsupported-message", language_code))
            .await?;
        return Ok(());
    };

    match text.split_whitespace().next().unwrap_or("") {
        "/start" => {
            bot.send_message(msg.chat.id, format_welcome(language_code))
                .await?;
        }
        "/help" => {
            bot.send_message(msg.chat.id, format_help(language_code))
                .await?;
        }
        "/newproject" => {
            start_new_project(bot, msg, dialogue, ctx).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, t_lang("text-hint", language_code))
                .await?;
        }
    }

    Ok(())
}

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: ProjectDialogue,
    ctx: Arc<AppContext>,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();

    if state.is_active() {
        debug!(user_id = %msg.chat.id, state = ?state, "Continuing new project conversation");
        let transition = advance(state, to_flow_input(&msg));
        apply_transition(&bot, &msg, dialogue, &ctx, transition).await
    } else {
        handle_idle_message(&bot, &msg, dialogue, &ctx).await
    }
}

//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

// Import localization
use crate::localization::{t_args_lang, t_lang};

// Import dialogue types
use crate::dialogue::{FormStep, TOTAL_STEPS};

/// Callback data prefix of the "Add a Link" button
pub const ADD_LINK_CALLBACK_PREFIX: &str = "add_link:";

/// Prompt for a form step, prefixed with the `[i/N]` counter
pub fn format_step_prompt(step: FormStep, language_code: Option<&str>) -> String {
    format!(
        "[{}/{}] {}",
        step.number(),
        TOTAL_STEPS,
        t_lang(step.prompt_key(), language_code)
    )
}

/// Success message shown in place of the status message
pub fn format_project_created(name: &str, link: &str, language_code: Option<&str>) -> String {
    let name = html::escape(name);
    t_args_lang(
        "project-created",
        &[("name", name.as_str()), ("link", link)],
        language_code,
    )
}

/// Announcement posted to the operator channel
pub fn format_broadcast(user_display_name: &str, name: &str, link: &str) -> String {
    let user = html::escape(user_display_name);
    let name = html::escape(name);
    t_args_lang(
        "broadcast-new-project",
        &[("user", user.as_str()), ("name", name.as_str()), ("link", link)],
        None,
    )
}

/// Welcome message for /start
pub fn format_welcome(language_code: Option<&str>) -> String {
    [
        t_lang("welcome-title", language_code),
        t_lang("welcome-description", language_code),
        format!(
            "{}\n{}\n{}",
            t_lang("welcome-commands", language_code),
            t_lang("welcome-newproject", language_code),
            t_lang("welcome-help", language_code)
        ),
    ]
    .join("\n\n")
}

/// Help message for /help
pub fn format_help(language_code: Option<&str>) -> String {
    [
        "help-title",
        "help-step1",
        "help-step2",
        "help-step3",
        "help-links",
        "help-commands",
    ]
    .iter()
    .map(|key| t_lang(key, language_code))
    .collect::<Vec<_>>()
    .join("\n\n")
}

/// Create the inline keyboard attached to the success message
pub fn create_project_keyboard(project_id: i64, language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        t_lang("add-link-button", language_code),
        format!("{}{}", ADD_LINK_CALLBACK_PREFIX, project_id),
    )]])
}

/// Parse the project id out of "Add a Link" callback data
pub fn parse_add_link_callback(data: &str) -> Option<i64> {
    data.strip_prefix(ADD_LINK_CALLBACK_PREFIX)?.parse().ok()
}

//! # Showcase Telegram Bot
//!
//! A Telegram bot that walks users through creating a project: name,
//! description, social links and a picture, then publishes the project and
//! announces it to an operator channel.

pub mod bot;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod flow_errors;
pub mod image_intake;
pub mod links;
pub mod localization;
pub mod session;
pub mod slug;
pub mod storage;
pub mod submission;

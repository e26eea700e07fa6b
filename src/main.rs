use anyhow::{Context, Result};
use sqlx::postgres::PgPool;
use std::env;
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use showcase::bot::{self, AppContext};
use showcase::config::BotConfig;
use showcase::db::{init_database_schema, PgProjectStore, ProjectStore};
use showcase::dialogue::ProjectDialogueState;
use showcase::image_intake::TelegramFileSource;
use showcase::localization::init_localization;
use showcase::session::{InMemorySessionStore, SessionStore};
use showcase::storage::HttpObjectStorage;
use showcase::submission::ProjectSubmitter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if env::var("LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting Showcase Telegram Bot");

    init_localization()?;

    let config = BotConfig::from_env()?;

    info!("Connecting to database");
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    init_database_schema(&pool).await?;

    let bot = Bot::new(&config.bot_token);

    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
    let projects: Arc<dyn ProjectStore> = Arc::new(PgProjectStore::new(pool));
    let submitter = ProjectSubmitter::new(
        Arc::new(TelegramFileSource::new(bot.clone(), &config.telegram_api_url)),
        Arc::new(HttpObjectStorage::new(
            &config.storage_url,
            &config.storage_service_key,
            &config.storage_bucket,
        )),
        Arc::clone(&projects),
        Arc::clone(&sessions),
    );

    let context = Arc::new(AppContext {
        config,
        projects,
        sessions,
        submitter,
    });

    info!("Bot initialized, starting dispatcher");

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<ProjectDialogueState>, ProjectDialogueState>()
                .endpoint(bot::message_handler),
        )
        .branch(Update::filter_callback_query().endpoint(bot::callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            InMemStorage::<ProjectDialogueState>::new(),
            context
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

//! Notes Bot - Main Entry Point
//!
//! A Telegram bot that keeps personal text, voice and photo notes in
//! PostgreSQL.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use teloxide::Bot;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use notes_bot::config::{BotSettings, DatabaseConfig, TelegramConfig};
use notes_bot::conversation::ConversationHandler;
use notes_bot::storage::PgNoteStore;
use notes_bot::telegram::{self, TelegramOutbox};

/// Telegram bot for personal notes.
#[derive(Parser, Debug)]
#[command(name = "notes_bot")]
#[command(about = "Keep text, voice and photo notes in a Telegram chat")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Apply database migrations and exit.
    #[arg(long)]
    migrate_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    // Load environment variables
    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    // Load configurations
    let db_config = DatabaseConfig::from_env()
        .context("Failed to load database configuration from environment")?;
    let bot_settings = BotSettings::from_env_with_defaults();

    // Connect to the database
    info!("Connecting to {}", db_config.display_target());
    let store = PgNoteStore::connect(
        db_config
            .connect_options()
            .context("Invalid database configuration")?,
        bot_settings.max_connections,
        bot_settings.acquire_timeout(),
    )
    .await
    .context("Failed to connect to the database")?;

    store
        .migrate()
        .await
        .context("Failed to apply database migrations")?;

    if args.migrate_only {
        store.close().await;
        return Ok(());
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let bot = Bot::new(&tg_config.token);
    telegram::register_commands(&bot).await;

    let handler = Arc::new(ConversationHandler::new(
        store.clone(),
        TelegramOutbox::new(bot.clone()),
        bot_settings.menu_trigger.clone(),
    ));

    info!("Starting notes bot...");
    info!("Menu trigger: {:?}", bot_settings.menu_trigger);

    telegram::run(bot, handler).await;

    // Cleanup
    info!("Shutting down...");
    store.close().await;

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

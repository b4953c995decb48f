//! Configuration module for the notes bot.
//!
//! Handles loading of the bot credentials, database connection
//! parameters and runtime settings from the environment.

mod settings;

pub use settings::{BotSettings, ConfigError, DatabaseConfig, TelegramConfig};

/// Maximum length of a single Telegram text message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 4096;

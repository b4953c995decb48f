//! Outbound Telegram messaging over the Bot API.

use teloxide::RequestError;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile};
use teloxide::utils::command::BotCommands;
use tracing::{debug, info, warn};

use crate::conversation::{Command, DeliveryError, MenuAction, Outbox};

impl From<RequestError> for DeliveryError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Network(e) => Self::Network(e.to_string()),
            other => Self::Api(other.to_string()),
        }
    }
}

/// Builds the action menu: one button per row.
#[must_use]
pub fn action_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(MenuAction::ALL.map(|action| {
        [InlineKeyboardButton::callback(
            action.label(),
            action.callback_data(),
        )]
    }))
}

/// [`Outbox`] that delivers through a teloxide [`Bot`].
#[derive(Debug, Clone)]
pub struct TelegramOutbox {
    bot: Bot,
}

impl TelegramOutbox {
    #[must_use]
    pub const fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

impl Outbox for TelegramOutbox {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        debug!("Sending text to chat {}: \"{}\"", chat_id, truncate_for_log(text, 40));
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    async fn send_menu(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .reply_markup(action_keyboard())
            .await?;
        Ok(())
    }

    async fn send_voice(&self, chat_id: i64, file_id: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_voice(ChatId(chat_id), InputFile::file_id(file_id))
            .await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: i64, file_id: &str) -> Result<(), DeliveryError> {
        self.bot
            .send_photo(ChatId(chat_id), InputFile::file_id(file_id))
            .await?;
        Ok(())
    }
}

/// Publishes the command list so Telegram clients can suggest it.
///
/// Failure is logged; the bot works without it.
pub async fn register_commands(bot: &Bot) {
    match bot.set_my_commands(Command::bot_commands()).await {
        Ok(_) => info!("Registered bot commands"),
        Err(e) => warn!("Failed to register bot commands: {}", e),
    }
}

/// Truncates a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;

    #[test]
    fn test_action_keyboard_layout() {
        let keyboard = action_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), 4);

        let data: Vec<String> = keyboard
            .inline_keyboard
            .iter()
            .map(|row| {
                assert_eq!(row.len(), 1);
                match &row[0].kind {
                    InlineKeyboardButtonKind::CallbackData(data) => data.clone(),
                    other => panic!("unexpected button kind: {other:?}"),
                }
            })
            .collect();
        assert_eq!(data, ["add", "edit", "delete", "list"]);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "Add note");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello", 10), "Hello");
        assert_eq!(truncate_for_log("Hello, World!", 5), "Hello...");
    }
}

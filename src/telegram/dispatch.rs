//! Update dispatching: routes Telegram updates into the conversation
//! handler.
//!
//! Updates of one chat are processed serially, different chats
//! concurrently.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{debug, info, warn};

use super::client::TelegramOutbox;
use super::updates::{inbound_from_callback, inbound_from_command, inbound_from_message};
use crate::conversation::{Command, ConversationHandler, DeliveryError, Outbox};
use crate::storage::{NoteStore, PgNoteStore};

/// The conversation handler wired to PostgreSQL and Telegram.
pub type NotesHandler = ConversationHandler<PgNoteStore, TelegramOutbox>;

/// Polls for updates and feeds them to `handler` until Ctrl+C.
pub async fn run(bot: Bot, handler: Arc<NotesHandler>) {
    let schema = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(on_command),
        )
        .branch(Update::filter_message().endpoint(on_message))
        .branch(
            Update::filter_callback_query()
                .endpoint(on_callback::<PgNoteStore, TelegramOutbox>),
        );

    info!("Listening for updates...");

    Dispatcher::builder(bot, schema)
        .dependencies(dptree::deps![handler])
        .default_handler(|update| async move {
            debug!("Unhandled update: {:?}", update.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "Failed to handle an update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn on_command(
    msg: Message,
    command: Command,
    handler: Arc<NotesHandler>,
) -> Result<(), DeliveryError> {
    debug!("Command {:?} in chat {:?}", command, msg.chat.id);
    match inbound_from_command(&msg, command) {
        Some(inbound) => handler.handle(inbound).await,
        None => Ok(()),
    }
}

async fn on_message(msg: Message, handler: Arc<NotesHandler>) -> Result<(), DeliveryError> {
    match inbound_from_message(&msg) {
        Some(inbound) => handler.handle(inbound).await,
        None => {
            debug!("Ignoring unsupported message {:?} in chat {:?}", msg.id, msg.chat.id);
            Ok(())
        }
    }
}

/// Answers the query, then handles the button press even if answering
/// failed (queries expire while the bot is down).
async fn on_callback<S: NoteStore, O: Outbox>(
    bot: Bot,
    query: CallbackQuery,
    handler: Arc<ConversationHandler<S, O>>,
) -> Result<(), DeliveryError> {
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!("Failed to answer callback query {}: {}", query.id, e);
    }

    match inbound_from_callback(&query) {
        Some(inbound) => handler.handle(inbound).await,
        None => {
            debug!("Ignoring callback data {:?}", query.data);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::conversation::{MenuAction, PendingAction};
    use crate::storage::memory::MemoryNoteStore;

    struct SilentOutbox;

    impl Outbox for SilentOutbox {
        async fn send_text(&self, _: i64, _: &str) -> Result<(), DeliveryError> {
            Ok(())
        }

        async fn send_menu(&self, _: i64, _: &str) -> Result<(), DeliveryError> {
            Ok(())
        }

        async fn send_voice(&self, _: i64, _: &str) -> Result<(), DeliveryError> {
            Ok(())
        }

        async fn send_photo(&self, _: i64, _: &str) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_button_handled_when_answer_fails() {
        // Nothing listens on the discard port, so answering the query fails.
        let bot = Bot::new("123:TEST").set_api_url("http://127.0.0.1:9/".parse().unwrap());
        let handler = Arc::new(ConversationHandler::new(
            MemoryNoteStore::new(),
            SilentOutbox,
            ".",
        ));
        let query: CallbackQuery = serde_json::from_value(json!({
            "id": "cb-1",
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "chat_instance": "ci",
            "data": MenuAction::Add.callback_data()
        }))
        .unwrap();

        on_callback(bot, query, Arc::clone(&handler)).await.unwrap();

        assert_eq!(handler.pending(42).await, PendingAction::Add);
    }
}

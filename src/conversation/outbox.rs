//! Outbound messaging primitives the conversation handler relies on.

use std::future::Future;

use thiserror::Error;

/// Errors that can occur while delivering a message.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API request failed: {0}")]
    Api(String),
}

/// Messages the bot can send into a chat.
///
/// The action menu is rendered by the implementation from
/// [`MenuAction::ALL`](super::MenuAction::ALL).
pub trait Outbox: Send + Sync {
    /// Sends a plain text message.
    fn send_text(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Sends a text message with the action menu attached.
    fn send_menu(
        &self,
        chat_id: i64,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Sends a voice message by its file id.
    fn send_voice(
        &self,
        chat_id: i64,
        file_id: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;

    /// Sends a photo by its file id.
    fn send_photo(
        &self,
        chat_id: i64,
        file_id: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

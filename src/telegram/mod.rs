//! Telegram glue.
//!
//! Maps Bot API updates to conversation events, delivers the handler's
//! replies and runs the update dispatcher.

mod client;
mod dispatch;
mod updates;

pub use client::{TelegramOutbox, action_keyboard, register_commands};
pub use dispatch::{NotesHandler, run};
pub use updates::{content_of, inbound_from_callback, inbound_from_command, inbound_from_message};

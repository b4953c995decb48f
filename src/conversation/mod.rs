//! Conversation module.
//!
//! Turns inbound chat events into note operations. Each user moves
//! through a small state machine:
//!
//! - `idle → add → idle`
//! - `idle → edit → update_content → idle`
//! - `idle → delete → idle`
//!
//! Notes are addressed by their display position, the 1-based rank among
//! the user's notes ordered by id.

mod handler;
mod outbox;
mod state;
mod types;

pub use handler::ConversationHandler;
pub use outbox::{DeliveryError, Outbox};
pub use state::{PendingAction, SessionStore};
pub use types::{Command, Event, Inbound, MenuAction, parse_note_number};

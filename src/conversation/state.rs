//! Per-user conversation state.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::Mutex;

use super::MenuAction;
use crate::storage::NoteId;

/// The conversational step a user is currently in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingAction {
    /// Nothing pending; free text is ignored.
    #[default]
    Idle,

    /// Waiting for the content of a new note.
    Add,

    /// Waiting for the number of the note to edit.
    Edit,

    /// Waiting for the replacement content of the given note.
    UpdateContent {
        /// Note chosen in the edit step.
        note_id: NoteId,
    },

    /// Waiting for the number of the note to delete.
    Delete,
}

impl PendingAction {
    /// Pending action selected by a menu button.
    ///
    /// Listing runs immediately and leaves nothing pending.
    #[must_use]
    pub const fn from_menu(action: MenuAction) -> Self {
        match action {
            MenuAction::Add => Self::Add,
            MenuAction::Edit => Self::Edit,
            MenuAction::Delete => Self::Delete,
            MenuAction::List => Self::Idle,
        }
    }

    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Add => f.write_str("add"),
            Self::Edit => f.write_str("edit"),
            Self::UpdateContent { note_id } => write!(f, "update_content({note_id})"),
            Self::Delete => f.write_str("delete"),
        }
    }
}

/// In-memory pending actions keyed by user id.
///
/// Not persisted; a restart puts every user back to idle.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, PendingAction>>,
}

impl SessionStore {
    /// Creates an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the pending action of a user (idle if none was recorded).
    pub async fn get(&self, user_id: i64) -> PendingAction {
        self.sessions
            .lock()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or_default()
    }

    /// Records the pending action of a user.
    pub async fn set(&self, user_id: i64, action: PendingAction) {
        let mut sessions = self.sessions.lock().await;
        if action.is_idle() {
            sessions.remove(&user_id);
        } else {
            sessions.insert(user_id, action);
        }
    }

    /// Number of users with something pending.
    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

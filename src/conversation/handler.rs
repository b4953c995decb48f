//! Conversation handler implementation.

use chrono::{DateTime, Utc};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

use super::outbox::{DeliveryError, Outbox};
use super::state::{PendingAction, SessionStore};
use super::types::{Command, Event, Inbound, MenuAction, parse_note_number};
use crate::config::MAX_MESSAGE_LENGTH;
use crate::storage::{
    MediaType, Note, NoteContent, NoteId, NoteStore, StorageError, User, position_of,
    resolve_position,
};

const GREETING: &str = "Hi! I am a bot for keeping notes. Choose an action:";
const CHOOSE_ACTION: &str = "Choose an action:";
const PROMPT_ADD: &str = "Send the note text, a voice message or a photo:";
const PROMPT_EDIT: &str = "Enter the number of the note to edit:";
const PROMPT_DELETE: &str = "Enter the number of the note to delete:";
const PROMPT_NEW_CONTENT: &str = "Send the new note text, a voice message or a photo:";
const START_FIRST: &str = "User not found. Please start with the /start command.";
const INVALID_NUMBER: &str = "Invalid note number. Please try again.";
const NOTE_NOT_FOUND: &str = "Note not found.";
const NO_NOTES: &str = "No notes yet.";
const LIST_HEADER: &str = "Your notes:";
const PROCESSING_FAILED: &str = "Error processing request.";
const LIST_FAILED: &str = "Error fetching the note list.";

/// Drives the note-keeping dialogue for every user.
pub struct ConversationHandler<S, O> {
    /// Users and notes.
    store: S,

    /// Outbound messages.
    outbox: O,

    /// Pending action per user.
    sessions: SessionStore,

    /// Message that re-shows the action menu.
    menu_trigger: String,
}

impl<S: NoteStore, O: Outbox> ConversationHandler<S, O> {
    /// Creates a new conversation handler.
    #[must_use]
    pub fn new(store: S, outbox: O, menu_trigger: impl Into<String>) -> Self {
        Self {
            store,
            outbox,
            sessions: SessionStore::new(),
            menu_trigger: menu_trigger.into(),
        }
    }

    /// Handles one inbound event for its sender.
    ///
    /// The sender's pending action is loaded, advanced by the event and
    /// stored again, also when delivering a reply fails.
    ///
    /// # Errors
    ///
    /// Returns an error if a reply could not be delivered. Database
    /// failures are reported to the user and logged instead.
    pub async fn handle(&self, inbound: Inbound) -> Result<(), DeliveryError> {
        let user_id = inbound.user_id();
        let mut session = self.sessions.get(user_id).await;
        let before = session;

        let result = self.dispatch(&inbound, &mut session).await;

        if session != before {
            debug!("User {}: {} -> {}", user_id, before, session);
        }
        self.sessions.set(user_id, session).await;
        result
    }

    /// Pending action currently recorded for a user.
    pub async fn pending(&self, user_id: i64) -> PendingAction {
        self.sessions.get(user_id).await
    }

    async fn dispatch(
        &self,
        inbound: &Inbound,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        let chat_id = inbound.chat_id;
        match &inbound.event {
            Event::Command(Command::Start) => {
                self.handle_start(chat_id, &inbound.sender, session).await
            }
            Event::Command(Command::Help) => self.handle_help(chat_id).await,
            Event::Button(action) => {
                self.handle_button(chat_id, inbound.user_id(), *action, session)
                    .await
            }
            Event::Content(content) => {
                self.handle_content(chat_id, inbound.user_id(), content, session)
                    .await
            }
        }
    }

    async fn handle_start(
        &self,
        chat_id: i64,
        user: &User,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        if let Err(e) = self.store.upsert_user(user).await {
            return self.storage_failure(chat_id, "register user", &e).await;
        }

        *session = PendingAction::Idle;
        self.outbox.send_menu(chat_id, GREETING).await
    }

    async fn handle_help(&self, chat_id: i64) -> Result<(), DeliveryError> {
        self.outbox.send_text(chat_id, &help_text()).await
    }

    async fn handle_button(
        &self,
        chat_id: i64,
        user_id: i64,
        action: MenuAction,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        debug!("User {} pressed '{}'", user_id, action);
        *session = PendingAction::from_menu(action);

        match action {
            MenuAction::Add => self.outbox.send_text(chat_id, PROMPT_ADD).await,
            MenuAction::Edit => self.outbox.send_text(chat_id, PROMPT_EDIT).await,
            MenuAction::Delete => self.outbox.send_text(chat_id, PROMPT_DELETE).await,
            MenuAction::List => self.list_notes(chat_id, user_id).await,
        }
    }

    async fn handle_content(
        &self,
        chat_id: i64,
        user_id: i64,
        content: &NoteContent,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        if content
            .text_column()
            .is_some_and(|text| text.trim() == self.menu_trigger)
        {
            return self.outbox.send_menu(chat_id, CHOOSE_ACTION).await;
        }

        match *session {
            PendingAction::Idle => {
                debug!(
                    "Ignoring {} message from idle user {}",
                    content.media_type(),
                    user_id
                );
                Ok(())
            }
            PendingAction::Add => self.add_note(chat_id, user_id, content, session).await,
            PendingAction::Edit => {
                self.choose_note_to_edit(chat_id, user_id, content, session)
                    .await
            }
            PendingAction::UpdateContent { note_id } => {
                self.update_note(chat_id, user_id, note_id, content, session)
                    .await
            }
            PendingAction::Delete => self.delete_note(chat_id, user_id, content, session).await,
        }
    }

    async fn add_note(
        &self,
        chat_id: i64,
        user_id: i64,
        content: &NoteContent,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        match self.store.user_exists(user_id).await {
            Ok(true) => {}
            Ok(false) => return self.outbox.send_text(chat_id, START_FIRST).await,
            Err(e) => return self.storage_failure(chat_id, "look up user", &e).await,
        }

        let note = match self.store.insert_note(user_id, content, Utc::now()).await {
            Ok(note) => note,
            Err(e) => return self.storage_failure(chat_id, "add note", &e).await,
        };

        info!(
            "User {} added {} note {}",
            user_id,
            note.content.media_type(),
            note.note_id
        );
        *session = PendingAction::Idle;

        let confirmation = match content.media_type() {
            MediaType::Text => "Note added.",
            MediaType::Voice => "Voice note added.",
            MediaType::Photo => "Photo note added.",
        };
        self.outbox.send_text(chat_id, confirmation).await?;
        self.outbox.send_menu(chat_id, CHOOSE_ACTION).await
    }

    async fn choose_note_to_edit(
        &self,
        chat_id: i64,
        user_id: i64,
        content: &NoteContent,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        let Some((_, note_id)) = self.note_at(chat_id, user_id, content).await? else {
            return Ok(());
        };

        *session = PendingAction::UpdateContent { note_id };
        self.outbox.send_text(chat_id, PROMPT_NEW_CONTENT).await
    }

    async fn update_note(
        &self,
        chat_id: i64,
        user_id: i64,
        note_id: NoteId,
        content: &NoteContent,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        let updated = match self.store.update_note(user_id, note_id, content).await {
            Ok(updated) => updated,
            Err(e) => return self.storage_failure(chat_id, "update note", &e).await,
        };

        *session = PendingAction::Idle;

        if !updated {
            warn!("Note {} of user {} disappeared before update", note_id, user_id);
            self.outbox.send_text(chat_id, NOTE_NOT_FOUND).await?;
            return self.outbox.send_menu(chat_id, CHOOSE_ACTION).await;
        }

        info!(
            "User {} replaced note {} with {} content",
            user_id,
            note_id,
            content.media_type()
        );

        // The update is committed; a failed lookup only loses the number.
        let number = match self.store.list_note_ids(user_id).await {
            Ok(ids) => position_of(&ids, note_id).map_or_else(|| "?".to_owned(), |n| n.to_string()),
            Err(e) => {
                warn!("Failed to number note {} of user {}: {}", note_id, user_id, e);
                "?".to_owned()
            }
        };

        let confirmation = match content.media_type() {
            MediaType::Text => format!("Note {number} updated."),
            MediaType::Voice => format!("Voice note {number} updated."),
            MediaType::Photo => format!("Photo note {number} updated."),
        };
        self.outbox.send_text(chat_id, &confirmation).await?;
        self.outbox.send_menu(chat_id, CHOOSE_ACTION).await
    }

    async fn delete_note(
        &self,
        chat_id: i64,
        user_id: i64,
        content: &NoteContent,
        session: &mut PendingAction,
    ) -> Result<(), DeliveryError> {
        let Some((number, note_id)) = self.note_at(chat_id, user_id, content).await? else {
            return Ok(());
        };

        let deleted = match self.store.delete_note(user_id, note_id).await {
            Ok(deleted) => deleted,
            Err(e) => return self.storage_failure(chat_id, "delete note", &e).await,
        };

        *session = PendingAction::Idle;

        if deleted {
            info!("User {} deleted note {} (#{})", user_id, note_id, number);
            self.outbox
                .send_text(chat_id, &format!("Note {number} deleted."))
                .await?;
        } else {
            self.outbox.send_text(chat_id, NOTE_NOT_FOUND).await?;
        }
        self.outbox.send_menu(chat_id, CHOOSE_ACTION).await
    }

    /// Resolves a typed note number to `(number, note_id)`.
    ///
    /// Replies with a corrective or error message and returns `None` when
    /// the input does not name one of the user's notes.
    async fn note_at(
        &self,
        chat_id: i64,
        user_id: i64,
        content: &NoteContent,
    ) -> Result<Option<(usize, NoteId)>, DeliveryError> {
        let Some(number) = content.text_column().and_then(parse_note_number) else {
            self.outbox.send_text(chat_id, INVALID_NUMBER).await?;
            return Ok(None);
        };

        let ids = match self.store.list_note_ids(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                self.storage_failure(chat_id, "number notes", &e).await?;
                return Ok(None);
            }
        };

        match resolve_position(&ids, number) {
            Some(note_id) => Ok(Some((number, note_id))),
            None => {
                debug!(
                    "User {} asked for note #{} but has {}",
                    user_id,
                    number,
                    ids.len()
                );
                self.outbox.send_text(chat_id, INVALID_NUMBER).await?;
                Ok(None)
            }
        }
    }

    async fn list_notes(&self, chat_id: i64, user_id: i64) -> Result<(), DeliveryError> {
        let notes = match self.store.list_notes(user_id).await {
            Ok(notes) => notes,
            Err(e) => {
                error!("Failed to list notes of user {}: {}", user_id, e);
                return self.outbox.send_text(chat_id, LIST_FAILED).await;
            }
        };

        if notes.is_empty() {
            return self.outbox.send_text(chat_id, NO_NOTES).await;
        }

        for chunk in render_listing(&notes, MAX_MESSAGE_LENGTH) {
            self.outbox.send_text(chat_id, &chunk).await?;
        }

        for (index, note) in notes.iter().enumerate() {
            let sent = match &note.content {
                NoteContent::Text { .. } => continue,
                NoteContent::Voice { file_id } => self.outbox.send_voice(chat_id, file_id).await,
                NoteContent::Photo { file_id } => self.outbox.send_photo(chat_id, file_id).await,
            };
            if let Err(e) = sent {
                warn!(
                    "Failed to send media of note #{} to user {}: {}",
                    index + 1,
                    user_id,
                    e
                );
            }
        }

        Ok(())
    }

    async fn storage_failure(
        &self,
        chat_id: i64,
        operation: &str,
        err: &StorageError,
    ) -> Result<(), DeliveryError> {
        error!("Failed to {}: {}", operation, err);
        self.outbox.send_text(chat_id, PROCESSING_FAILED).await
    }
}

impl<S, O> std::fmt::Debug for ConversationHandler<S, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationHandler")
            .field("menu_trigger", &self.menu_trigger)
            .finish_non_exhaustive()
    }
}

/// Help message listing the commands.
fn help_text() -> String {
    format!(
        "I am a bot for keeping notes.\n\n{}\n\nYou can add, edit and delete text, voice and photo notes.",
        Command::descriptions()
    )
}

/// Renders the note listing, split into messages of at most `max_len`
/// characters at line boundaries.
fn render_listing(notes: &[Note], max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::from(LIST_HEADER);
    let mut current_len = current.chars().count();

    for (index, note) in notes.iter().enumerate() {
        let suffix = format!(" (created: {})", format_date(note.created_at));
        let prefix = format!("{}: ", index + 1);
        // The first line shares its message with the header.
        let reserved = if index == 0 { current_len + 1 } else { 0 };
        let room = max_len.saturating_sub(reserved + prefix.len() + suffix.len() + 3);
        let line = format!("{prefix}{}{suffix}", truncate(note.summary(), room));
        let line_len = line.chars().count();

        if current_len > 0 && current_len + 1 + line_len > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(&line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Formats a note timestamp for listings.
fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Truncates a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", chars[..max_len].iter().collect::<String>())
    }
}

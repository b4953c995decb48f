//! The storage interface used by the conversation handler.

use std::future::Future;

use chrono::{DateTime, Utc};

use super::Result;
use super::models::{Note, NoteContent, NoteId, User};

/// Persistence operations for users and their notes.
///
/// Every note operation is scoped by `user_id`, so one user can never
/// read or change another user's notes.
pub trait NoteStore: Send + Sync {
    /// Inserts the user if absent; does nothing if the user already exists.
    fn upsert_user(&self, user: &User) -> impl Future<Output = Result<()>> + Send;

    /// Returns whether a user row exists.
    fn user_exists(&self, user_id: i64) -> impl Future<Output = Result<bool>> + Send;

    /// Inserts a new note and returns it with its assigned id.
    fn insert_note(
        &self,
        user_id: i64,
        content: &NoteContent,
        created_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Note>> + Send;

    /// Returns all notes of a user ordered by `note_id`.
    fn list_notes(&self, user_id: i64) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// Returns the note ids of a user in ascending order.
    fn list_note_ids(&self, user_id: i64) -> impl Future<Output = Result<Vec<NoteId>>> + Send;

    /// Replaces the content of a note. Returns `false` if no such note exists.
    fn update_note(
        &self,
        user_id: i64,
        note_id: NoteId,
        content: &NoteContent,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Deletes a note. Returns `false` if no such note exists.
    fn delete_note(&self, user_id: i64, note_id: NoteId)
    -> impl Future<Output = Result<bool>> + Send;
}

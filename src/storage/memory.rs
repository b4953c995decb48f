//! In-memory [`NoteStore`] used by unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use super::models::{Note, NoteContent, NoteId, User};
use super::store::NoteStore;
use super::{Result, StorageError};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    notes: BTreeMap<NoteId, Note>,
    /// Ids `list_note_ids` reports after the note is gone.
    stale_ids: Vec<(i64, NoteId)>,
    next_id: NoteId,
}

/// Note store that keeps everything in a mutex-guarded map.
#[derive(Debug, Default)]
pub(crate) struct MemoryNoteStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    failing_reads: AtomicBool,
}

impl MemoryNoteStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail as if the database were down.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes only the listing calls fail.
    pub(crate) fn set_failing_reads(&self, failing: bool) {
        self.failing_reads.store(failing, Ordering::SeqCst);
    }

    /// Keeps `note_id` in the id list, as if it was deleted concurrently.
    pub(crate) fn keep_stale_id(&self, user_id: i64, note_id: NoteId) {
        self.tables.lock().unwrap().stale_ids.push((user_id, note_id));
    }

    pub(crate) fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    pub(crate) fn note(&self, note_id: NoteId) -> Option<Note> {
        self.tables.lock().unwrap().notes.get(&note_id).cloned()
    }

    pub(crate) fn note_count(&self) -> usize {
        self.tables.lock().unwrap().notes.len()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }

    fn check_reads(&self) -> Result<()> {
        self.check()?;
        if self.failing_reads.load(Ordering::SeqCst) {
            Err(StorageError::Sqlx(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

impl NoteStore for MemoryNoteStore {
    async fn upsert_user(&self, user: &User) -> Result<()> {
        self.check()?;
        self.tables
            .lock()
            .unwrap()
            .users
            .entry(user.user_id)
            .or_insert_with(|| user.clone());
        Ok(())
    }

    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        self.check()?;
        Ok(self.tables.lock().unwrap().users.contains_key(&user_id))
    }

    async fn insert_note(
        &self,
        user_id: i64,
        content: &NoteContent,
        created_at: DateTime<Utc>,
    ) -> Result<Note> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.contains_key(&user_id) {
            return Err(StorageError::InvalidRow(format!(
                "foreign key violation: user {user_id}"
            )));
        }
        tables.next_id += 1;
        let note = Note {
            note_id: tables.next_id,
            user_id,
            content: content.clone(),
            created_at,
        };
        tables.notes.insert(note.note_id, note.clone());
        Ok(note)
    }

    async fn list_notes(&self, user_id: i64) -> Result<Vec<Note>> {
        self.check_reads()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .notes
            .values()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_note_ids(&self, user_id: i64) -> Result<Vec<NoteId>> {
        let mut ids: Vec<NoteId> = self
            .list_notes(user_id)
            .await?
            .into_iter()
            .map(|n| n.note_id)
            .collect();
        let tables = self.tables.lock().unwrap();
        ids.extend(
            tables
                .stale_ids
                .iter()
                .filter(|(owner, _)| *owner == user_id)
                .map(|(_, id)| *id),
        );
        ids.sort_unstable();
        ids.dedup();
        Ok(ids)
    }

    async fn update_note(&self, user_id: i64, note_id: NoteId, content: &NoteContent) -> Result<bool> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        match tables.notes.get_mut(&note_id) {
            Some(note) if note.user_id == user_id => {
                note.content = content.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_note(&self, user_id: i64, note_id: NoteId) -> Result<bool> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.notes.get(&note_id).is_some_and(|n| n.user_id == user_id) {
            tables.notes.remove(&note_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

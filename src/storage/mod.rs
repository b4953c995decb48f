//! Persistence layer for users and notes.
//!
//! Notes live in PostgreSQL and are always addressed together with
//! their owner's user id. Display positions are computed from the
//! ordered id list at read time and never stored.

mod error;
#[cfg(test)]
pub(crate) mod memory;
mod models;
mod postgres;
mod store;

pub use error::{Result, StorageError};
pub use models::{MediaType, Note, NoteContent, NoteId, User, position_of, resolve_position};
pub use postgres::PgNoteStore;
pub use store::NoteStore;

//! Row models for users and notes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::StorageError;

/// Database identifier of a note.
pub type NoteId = i64;

/// A bot user, identified by their Telegram user id.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    /// Telegram user id.
    pub user_id: i64,
    /// Telegram username, if the account has one.
    pub username: Option<String>,
}

/// Kind of content a note carries, stored in the `media_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Text,
    Voice,
    Photo,
}

impl MediaType {
    /// Column value for this media type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Photo => "photo",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "voice" => Ok(Self::Voice),
            "photo" => Ok(Self::Photo),
            other => Err(StorageError::InvalidRow(format!(
                "unknown media_type '{other}'"
            ))),
        }
    }
}

/// Content of a note: either text or a reference to Telegram-hosted media.
///
/// Media references are Telegram `file_id`s, which can be sent again
/// without downloading the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteContent {
    Text { text: String },
    Voice { file_id: String },
    Photo { file_id: String },
}

impl NoteContent {
    /// Creates text content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates voice content from a Telegram file id.
    #[must_use]
    pub fn voice(file_id: impl Into<String>) -> Self {
        Self::Voice {
            file_id: file_id.into(),
        }
    }

    /// Creates photo content from a Telegram file id.
    #[must_use]
    pub fn photo(file_id: impl Into<String>) -> Self {
        Self::Photo {
            file_id: file_id.into(),
        }
    }

    #[must_use]
    pub const fn media_type(&self) -> MediaType {
        match self {
            Self::Text { .. } => MediaType::Text,
            Self::Voice { .. } => MediaType::Voice,
            Self::Photo { .. } => MediaType::Photo,
        }
    }

    /// Value of the `text` column.
    #[must_use]
    pub fn text_column(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Voice { .. } | Self::Photo { .. } => None,
        }
    }

    /// Value of the `media_url` column.
    #[must_use]
    pub fn media_column(&self) -> Option<&str> {
        match self {
            Self::Text { .. } => None,
            Self::Voice { file_id } | Self::Photo { file_id } => Some(file_id),
        }
    }

    /// Rebuilds content from the three content columns of a row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidRow`] if the columns do not describe
    /// exactly one of text or media.
    pub fn from_columns(
        media_type: &str,
        text: Option<String>,
        media_url: Option<String>,
    ) -> Result<Self, StorageError> {
        match (media_type.parse::<MediaType>()?, text, media_url) {
            (MediaType::Text, Some(text), None) => Ok(Self::Text { text }),
            (MediaType::Voice, None, Some(file_id)) => Ok(Self::Voice { file_id }),
            (MediaType::Photo, None, Some(file_id)) => Ok(Self::Photo { file_id }),
            (kind, text, media) => Err(StorageError::InvalidRow(format!(
                "{kind} note with text={} media={}",
                text.is_some(),
                media.is_some()
            ))),
        }
    }
}

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub note_id: NoteId,
    pub user_id: i64,
    pub content: NoteContent,
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Text shown for this note in a listing: its text, or `Media`.
    #[must_use]
    pub fn summary(&self) -> &str {
        self.content.text_column().unwrap_or("Media")
    }
}

/// Raw `notes` row as returned by `sqlx`.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct NoteRow {
    pub note_id: i64,
    pub user_id: i64,
    pub text: Option<String>,
    pub media_type: String,
    pub media_url: Option<String>,
    pub date: DateTime<Utc>,
}

impl TryFrom<NoteRow> for Note {
    type Error = StorageError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        let content = NoteContent::from_columns(&row.media_type, row.text, row.media_url)
            .map_err(|e| match e {
                StorageError::InvalidRow(msg) => {
                    StorageError::InvalidRow(format!("note {}: {msg}", row.note_id))
                }
                other => other,
            })?;

        Ok(Self {
            note_id: row.note_id,
            user_id: row.user_id,
            content,
            created_at: row.date,
        })
    }
}

/// Maps a 1-based display position to the note id at that rank.
///
/// `ids` must be the user's note ids in ascending order.
#[must_use]
pub fn resolve_position(ids: &[NoteId], position: usize) -> Option<NoteId> {
    position.checked_sub(1).and_then(|i| ids.get(i)).copied()
}

/// Returns the 1-based display position of `note_id` among `ids`.
#[must_use]
pub fn position_of(ids: &[NoteId], note_id: NoteId) -> Option<usize> {
    ids.iter().position(|&id| id == note_id).map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_round_trips_column_values() {
        for kind in [MediaType::Text, MediaType::Voice, MediaType::Photo] {
            assert_eq!(kind.as_str().parse::<MediaType>().unwrap(), kind);
        }
        assert!("video".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_content_columns() {
        let text = NoteContent::text("buy milk");
        assert_eq!(text.text_column(), Some("buy milk"));
        assert_eq!(text.media_column(), None);

        let photo = NoteContent::photo("AgAC-photo");
        assert_eq!(photo.text_column(), None);
        assert_eq!(photo.media_column(), Some("AgAC-photo"));
        assert_eq!(photo.media_type(), MediaType::Photo);
    }

    #[test]
    fn test_from_columns_rejects_mixed_content() {
        assert!(
            NoteContent::from_columns("text", Some("a".into()), Some("file".into())).is_err()
        );
        assert!(NoteContent::from_columns("voice", None, None).is_err());
        assert_eq!(
            NoteContent::from_columns("voice", None, Some("file".into())).unwrap(),
            NoteContent::voice("file")
        );
    }

    #[test]
    fn test_note_summary() {
        let note = Note {
            note_id: 1,
            user_id: 7,
            content: NoteContent::voice("AwAC-voice"),
            created_at: Utc::now(),
        };
        assert_eq!(note.summary(), "Media");
    }

    #[test]
    fn test_resolve_position() {
        let ids = [4, 9, 12];
        assert_eq!(resolve_position(&ids, 0), None);
        assert_eq!(resolve_position(&ids, 1), Some(4));
        assert_eq!(resolve_position(&ids, 3), Some(12));
        assert_eq!(resolve_position(&ids, 4), None);
    }

    #[test]
    fn test_position_of() {
        let ids = [4, 9, 12];
        assert_eq!(position_of(&ids, 9), Some(2));
        assert_eq!(position_of(&ids, 5), None);
    }
}

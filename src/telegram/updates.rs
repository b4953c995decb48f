//! Mapping of Telegram updates to conversation events.

use teloxide::types::{CallbackQuery, Message, User as TgUser};

use crate::conversation::{Command, Event, Inbound, MenuAction};
use crate::storage::{NoteContent, User};

/// Converts a Telegram user into the stored user record.
///
/// Returns `None` if the id does not fit the database column.
fn sender_of(user: &TgUser) -> Option<User> {
    Some(User {
        user_id: i64::try_from(user.id.0).ok()?,
        username: user.username.clone(),
    })
}

/// Extracts note content from a message.
///
/// Text, voice and photo messages qualify; for photos the largest size is
/// used. Slash commands are not content.
#[must_use]
pub fn content_of(msg: &Message) -> Option<NoteContent> {
    if let Some(text) = msg.text() {
        if text.starts_with('/') {
            return None;
        }
        return Some(NoteContent::text(text));
    }
    if let Some(voice) = msg.voice() {
        return Some(NoteContent::voice(voice.file.id.clone()));
    }
    if let Some(sizes) = msg.photo() {
        return sizes
            .iter()
            .max_by_key(|p| u64::from(p.width) * u64::from(p.height))
            .map(|p| NoteContent::photo(p.file.id.clone()));
    }
    None
}

/// Builds an inbound content event from a message.
#[must_use]
pub fn inbound_from_message(msg: &Message) -> Option<Inbound> {
    let sender = sender_of(msg.from()?)?;
    let content = content_of(msg)?;
    Some(Inbound::new(msg.chat.id.0, sender, Event::Content(content)))
}

/// Builds an inbound command event from a message.
#[must_use]
pub fn inbound_from_command(msg: &Message, command: Command) -> Option<Inbound> {
    let sender = sender_of(msg.from()?)?;
    Some(Inbound::new(msg.chat.id.0, sender, Event::Command(command)))
}

/// Builds an inbound button event from a callback query.
///
/// Replies go to the chat holding the menu, or to the private chat with
/// the user if that message is no longer available.
#[must_use]
pub fn inbound_from_callback(query: &CallbackQuery) -> Option<Inbound> {
    let action = MenuAction::parse(query.data.as_deref()?)?;
    let sender = sender_of(&query.from)?;
    let chat_id = query
        .message
        .as_ref()
        .map_or(sender.user_id, |m| m.chat.id.0);
    Some(Inbound::new(chat_id, sender, Event::Button(action)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(extra: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 10,
            "date": 1_714_566_600,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "from": { "id": 42, "is_bot": false, "first_name": "Alice", "username": "alice" },
        });
        value
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message() {
        let msg = message(json!({ "text": "buy milk" }));
        let inbound = inbound_from_message(&msg).unwrap();

        assert_eq!(inbound.chat_id, 42);
        assert_eq!(inbound.sender.user_id, 42);
        assert_eq!(inbound.sender.username.as_deref(), Some("alice"));
        assert_eq!(inbound.event, Event::Content(NoteContent::text("buy milk")));
    }

    #[test]
    fn test_command_message() {
        let msg = message(json!({ "text": "/start" }));
        let inbound = inbound_from_command(&msg, Command::Start).unwrap();
        assert_eq!(inbound.event, Event::Command(Command::Start));
        assert_eq!(inbound.user_id(), 42);
    }

    #[test]
    fn test_commands_are_not_content() {
        let msg = message(json!({ "text": "/unknown" }));
        assert_eq!(inbound_from_message(&msg), None);
    }

    #[test]
    fn test_voice_message() {
        let msg = message(json!({
            "voice": {
                "file_id": "voice-file",
                "file_unique_id": "voice-unique",
                "duration": 3,
                "mime_type": "audio/ogg",
                "file_size": 4096
            }
        }));
        assert_eq!(content_of(&msg), Some(NoteContent::voice("voice-file")));
    }

    #[test]
    fn test_photo_uses_largest_size() {
        let msg = message(json!({
            "photo": [
                { "file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 1000 },
                { "file_id": "large", "file_unique_id": "l", "width": 1280, "height": 960, "file_size": 90000 },
                { "file_id": "medium", "file_unique_id": "m", "width": 320, "height": 240, "file_size": 9000 }
            ]
        }));
        assert_eq!(content_of(&msg), Some(NoteContent::photo("large")));
    }

    #[test]
    fn test_unsupported_message() {
        let msg = message(json!({
            "location": { "latitude": 52.52, "longitude": 13.40 }
        }));
        assert_eq!(content_of(&msg), None);
    }

    #[test]
    fn test_callback_query() {
        let query: CallbackQuery = serde_json::from_value(json!({
            "id": "cb-1",
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "chat_instance": "ci",
            "data": "list"
        }))
        .unwrap();

        let inbound = inbound_from_callback(&query).unwrap();
        assert_eq!(inbound.chat_id, 42);
        assert_eq!(inbound.sender.username, None);
        assert_eq!(inbound.event, Event::Button(MenuAction::List));
    }

    #[test]
    fn test_callback_query_with_foreign_data() {
        let query: CallbackQuery = serde_json::from_value(json!({
            "id": "cb-2",
            "from": { "id": 42, "is_bot": false, "first_name": "Alice" },
            "chat_instance": "ci",
            "data": "something_else"
        }))
        .unwrap();

        assert_eq!(inbound_from_callback(&query), None);
    }
}

//! Inbound event types and menu definitions.

use std::fmt;

use teloxide::utils::command::BotCommands;

use crate::storage::{NoteContent, User};

/// Slash commands understood by the bot.
#[derive(BotCommands, Debug, Clone, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    /// Register and show the action menu.
    #[command(description = "start working with the bot")]
    Start,

    /// Show help information.
    #[command(description = "show information about the bot")]
    Help,
}

/// Actions offered by the inline keyboard menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    /// Add a new note.
    Add,

    /// Edit an existing note by its number.
    Edit,

    /// Delete a note by its number.
    Delete,

    /// List all notes.
    List,
}

impl MenuAction {
    /// All actions in the order they appear in the menu.
    pub const ALL: [Self; 4] = [Self::Add, Self::Edit, Self::Delete, Self::List];

    /// Parses the callback data attached to a menu button.
    ///
    /// Returns `None` for data that does not belong to the menu.
    #[must_use]
    pub fn parse(data: &str) -> Option<Self> {
        match data.trim() {
            "add" => Some(Self::Add),
            "edit" => Some(Self::Edit),
            "delete" => Some(Self::Delete),
            "list" => Some(Self::List),
            _ => None,
        }
    }

    /// Callback data attached to the button.
    #[must_use]
    pub const fn callback_data(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::List => "list",
        }
    }

    /// Button label shown to the user.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Add => "Add note",
            Self::Edit => "Edit note",
            Self::Delete => "Delete note",
            Self::List => "List notes",
        }
    }
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.callback_data())
    }
}

/// What happened in the chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A slash command.
    Command(Command),

    /// A menu button was pressed.
    Button(MenuAction),

    /// A text, voice or photo message.
    Content(NoteContent),
}

/// An inbound event together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    /// Chat to reply to.
    pub chat_id: i64,

    /// The user who triggered the event.
    pub sender: User,

    pub event: Event,
}

impl Inbound {
    #[must_use]
    pub fn new(chat_id: i64, sender: User, event: Event) -> Self {
        Self {
            chat_id,
            sender,
            event,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.sender.user_id
    }
}

/// Parses a 1-based note number typed by the user.
///
/// Only checks the format; whether the number exists is decided against
/// the user's notes.
#[must_use]
pub fn parse_note_number(text: &str) -> Option<usize> {
    text.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_actions() {
        for action in MenuAction::ALL {
            assert_eq!(MenuAction::parse(action.callback_data()), Some(action));
        }
        assert_eq!(MenuAction::parse("update_content"), None);
        assert_eq!(MenuAction::parse(""), None);
    }

    #[test]
    fn test_menu_order() {
        let data: Vec<_> = MenuAction::ALL.iter().map(|a| a.callback_data()).collect();
        assert_eq!(data, ["add", "edit", "delete", "list"]);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/start", "notes_bot").ok(), Some(Command::Start));
        assert_eq!(Command::parse("/help", "notes_bot").ok(), Some(Command::Help));
        assert_eq!(
            Command::parse("/start@notes_bot", "notes_bot").ok(),
            Some(Command::Start)
        );
        assert!(Command::parse("/list", "notes_bot").is_err());
        assert!(Command::parse("start", "notes_bot").is_err());
    }

    #[test]
    fn test_command_descriptions_mention_all_commands() {
        let text = Command::descriptions().to_string();
        assert!(text.contains("/start"));
        assert!(text.contains("/help"));
    }

    #[test]
    fn test_parse_note_number() {
        assert_eq!(parse_note_number("2"), Some(2));
        assert_eq!(parse_note_number("  7 \n"), Some(7));
        assert_eq!(parse_note_number("0"), None);
        assert_eq!(parse_note_number("-1"), None);
        assert_eq!(parse_note_number("two"), None);
        assert_eq!(parse_note_number("1 new text"), None);
    }
}

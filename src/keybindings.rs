//! Customizable keybindings for the editor command surface.
//!
//! Every command is a single key with no modifiers. Keys are matched
//! case-insensitively.

use serde::{Deserialize, Serialize};

use crate::editor::EditMode;

/// A discrete editor command triggered by one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    /// Switch the annotation edit mode
    SetMode(EditMode),
    /// Drop the current path
    ClearPath,
    /// Remove the last path node
    UndoLast,
}

impl EditorCommand {
    /// Human-readable description of this command
    pub fn description(&self) -> String {
        match self {
            EditorCommand::SetMode(mode) => format!("{} mode", mode.name()),
            EditorCommand::ClearPath => "Clear path".to_string(),
            EditorCommand::UndoLast => "Undo last node".to_string(),
        }
    }
}

/// Keybinding configuration for the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    /// Hotkey for colour mode
    #[serde(default = "default_color")]
    pub mode_color: char,
    /// Hotkey for star mode
    #[serde(default = "default_star")]
    pub mode_star: char,
    /// Hotkey for "not" mode
    #[serde(default = "default_not")]
    pub mode_not: char,
    /// Hotkey for clearing the path
    #[serde(default = "default_clear")]
    pub clear_path: char,
    /// Hotkey for undoing the last node
    #[serde(default = "default_undo")]
    pub undo_last: char,
}

fn default_color() -> char {
    'c'
}

fn default_star() -> char {
    's'
}

fn default_not() -> char {
    'n'
}

fn default_clear() -> char {
    'k'
}

fn default_undo() -> char {
    'z'
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            mode_color: default_color(),
            mode_star: default_star(),
            mode_not: default_not(),
            clear_path: default_clear(),
            undo_last: default_undo(),
        }
    }
}

fn same_key(a: char, b: char) -> bool {
    a.eq_ignore_ascii_case(&b)
}

impl KeyBindings {
    /// Create new keybindings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> [(char, EditorCommand); 5] {
        [
            (self.mode_color, EditorCommand::SetMode(EditMode::Color)),
            (self.mode_star, EditorCommand::SetMode(EditMode::Star)),
            (self.mode_not, EditorCommand::SetMode(EditMode::Not)),
            (self.clear_path, EditorCommand::ClearPath),
            (self.undo_last, EditorCommand::UndoLast),
        ]
    }

    /// Get the command that corresponds to a key press, if any.
    pub fn command_for_key(&self, key: char) -> Option<EditorCommand> {
        self.table()
            .into_iter()
            .find(|(bound, _)| same_key(*bound, key))
            .map(|(_, command)| command)
    }

    /// Get the hotkey for a command.
    pub fn key_for_command(&self, command: EditorCommand) -> char {
        match command {
            EditorCommand::SetMode(EditMode::Color) => self.mode_color,
            EditorCommand::SetMode(EditMode::Star) => self.mode_star,
            EditorCommand::SetMode(EditMode::Not) => self.mode_not,
            EditorCommand::ClearPath => self.clear_path,
            EditorCommand::UndoLast => self.undo_last,
        }
    }

    /// Check if a key is already used by any binding other than `exclude`.
    /// Returns a description of what it's used for, if anything.
    pub fn key_conflict(&self, key: char, exclude: Option<EditorCommand>) -> Option<String> {
        self.table()
            .into_iter()
            .find(|(bound, command)| same_key(*bound, key) && Some(*command) != exclude)
            .map(|(_, command)| command.description())
    }

    /// First binding whose key is also bound to another command: the key,
    /// its command and a description of the clashing use.
    pub fn first_duplicate(&self) -> Option<(char, EditorCommand, String)> {
        self.table().into_iter().find_map(|(key, command)| {
            self.key_conflict(key, Some(command))
                .map(|other| (key, command, other))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_map() {
        let keys = KeyBindings::default();
        assert_eq!(
            keys.command_for_key('c'),
            Some(EditorCommand::SetMode(EditMode::Color))
        );
        assert_eq!(
            keys.command_for_key('S'),
            Some(EditorCommand::SetMode(EditMode::Star))
        );
        assert_eq!(
            keys.command_for_key('n'),
            Some(EditorCommand::SetMode(EditMode::Not))
        );
        assert_eq!(keys.command_for_key('k'), Some(EditorCommand::ClearPath));
        assert_eq!(keys.command_for_key('z'), Some(EditorCommand::UndoLast));
        assert_eq!(keys.command_for_key('q'), None);
        assert_eq!(keys.first_duplicate(), None);
    }

    #[test]
    fn test_key_conflict() {
        let keys = KeyBindings::default();
        assert_eq!(keys.key_conflict('z', None), Some("Undo last node".to_string()));
        assert_eq!(keys.key_conflict('z', Some(EditorCommand::UndoLast)), None);
        assert_eq!(keys.key_conflict('x', None), None);
    }

    #[test]
    fn test_duplicate_detection() {
        let keys = KeyBindings {
            undo_last: 'C',
            ..KeyBindings::default()
        };
        let (key, command, other) = keys.first_duplicate().unwrap();
        assert_eq!(key, 'c');
        assert_eq!(command, EditorCommand::SetMode(EditMode::Color));
        assert_eq!(other, EditorCommand::UndoLast.description());
        assert_eq!(keys.key_for_command(EditorCommand::UndoLast), 'C');
    }
}

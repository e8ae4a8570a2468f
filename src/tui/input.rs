//! Keyboard input helpers for the TUI.
//!
//! - `KeyEvent`: a key press with the predicates the pages dispatch on
//! - `TextInput`: single-line field used by the login, query and affordability pages

use crossterm::event::{KeyCode, KeyModifiers};

/// Longest text a field accepts; queries beyond this are cut off.
pub const MAX_INPUT_LEN: usize = 256;

/// Key event representation
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    /// Ctrl+C, which quits from anywhere
    pub fn is_interrupt(&self) -> bool {
        self.code == KeyCode::Char('c') && self.modifiers.contains(KeyModifiers::CONTROL)
    }

    /// `q` or Ctrl+C; callers decide whether `q` is text or quit
    pub fn is_quit(&self) -> bool {
        self.code == KeyCode::Char('q') || self.is_interrupt()
    }

    pub fn is_escape(&self) -> bool {
        self.code == KeyCode::Esc
    }

    pub fn is_enter(&self) -> bool {
        self.code == KeyCode::Enter
    }

    pub fn is_tab(&self) -> bool {
        matches!(self.code, KeyCode::Tab | KeyCode::BackTab)
    }

    pub fn is_up(&self) -> bool {
        self.code == KeyCode::Up
    }

    pub fn is_down(&self) -> bool {
        self.code == KeyCode::Down
    }

    pub fn is_right(&self) -> bool {
        self.code == KeyCode::Right
    }

    /// The character, for plain (non-Ctrl) character keys
    pub fn char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(_) if self.modifiers.contains(KeyModifiers::CONTROL) => None,
            KeyCode::Char(c) => Some(c),
            _ => None,
        }
    }
}

impl From<crossterm::event::KeyEvent> for KeyEvent {
    fn from(key: crossterm::event::KeyEvent) -> Self {
        Self::new(key.code, key.modifiers)
    }
}

/// Append-only text field: typing adds at the end, Backspace removes the
/// last character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextInput {
    content: String,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: &str) -> Self {
        Self {
            content: content.chars().take(MAX_INPUT_LEN).collect(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// One `*` per character, for the password field
    pub fn masked(&self) -> String {
        "*".repeat(self.content.chars().count())
    }

    pub fn clear(&mut self) {
        self.content.clear();
    }

    /// Take the content, leaving the field empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.content)
    }

    /// Apply an editing key. Returns true when the content changed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if let Some(c) = key.char() {
            if self.content.chars().count() >= MAX_INPUT_LEN {
                return false;
            }
            self.content.push(c);
            return true;
        }
        match key.code {
            KeyCode::Backspace => self.content.pop().is_some(),
            KeyCode::Delete => {
                let changed = !self.content.is_empty();
                self.content.clear();
                changed
            }
            _ => false,
        }
    }
}

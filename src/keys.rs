use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::api::CatalogBackend;
use crate::app::{App, Message};

/// A declarative keybinding map that can be composed and extended.
#[derive(Clone)]
pub struct Keymap {
    bindings: Vec<(KeyCode, KeyModifiers, Message)>,
}

impl Keymap {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a key binding with no modifiers.
    pub fn bind(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::NONE, message));
        self
    }

    /// Add a key binding with Ctrl modifier.
    pub fn bind_ctrl(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::CONTROL, message));
        self
    }

    /// Look up a message for a key event.
    /// Later bindings take precedence over earlier ones.
    pub fn get(&self, event: &KeyEvent) -> Option<Message> {
        self.bindings
            .iter()
            .rev()
            .find(|(code, mods, _)| *code == event.code && event.modifiers.contains(*mods))
            .map(|(_, _, msg)| msg.clone())
    }

    /// Find the first key bound to a specific message.
    pub fn find_key(&self, message: &Message) -> Option<(KeyCode, KeyModifiers)> {
        self.bindings
            .iter()
            .find(|(_, _, msg)| msg == message)
            .map(|(code, mods, _)| (*code, *mods))
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a key binding for display in hints.
pub fn format_key(code: KeyCode, mods: KeyModifiers) -> String {
    let key_str = match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::PageUp => "PgUp".to_string(),
        KeyCode::PageDown => "PgDn".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        _ => "?".to_string(),
    };
    if mods.contains(KeyModifiers::CONTROL) {
        format!("C-{key_str}")
    } else {
        key_str
    }
}

/// Keys available while browsing the feed.
pub fn browse_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('q'), Message::Quit)
        .bind_ctrl(KeyCode::Char('c'), Message::Quit)
        .bind(KeyCode::Char('d'), Message::ToggleDebug)
        .bind(KeyCode::Char('j'), Message::SelectNext)
        .bind(KeyCode::Down, Message::SelectNext)
        .bind(KeyCode::Char('k'), Message::SelectPrev)
        .bind(KeyCode::Up, Message::SelectPrev)
        .bind(KeyCode::Char('g'), Message::SelectFirst)
        .bind(KeyCode::Char('G'), Message::SelectLast)
        .bind(KeyCode::PageDown, Message::PageDown)
        .bind(KeyCode::PageUp, Message::PageUp)
        .bind_ctrl(KeyCode::Char('d'), Message::PageDown)
        .bind_ctrl(KeyCode::Char('u'), Message::PageUp)
        .bind(KeyCode::Char('s'), Message::ToggleSort)
        .bind(KeyCode::Char('c'), Message::NextCategory)
        .bind(KeyCode::Char('C'), Message::PrevCategory)
        .bind(KeyCode::Char('/'), Message::StartSearch)
        .bind(KeyCode::Char('r'), Message::Retry)
        .bind(KeyCode::Char('R'), Message::Restart)
}

/// Keys while the search prompt is open. Printable characters are
/// handled separately in [`handle_key`].
pub fn search_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Enter, Message::SubmitSearch)
        .bind(KeyCode::Esc, Message::CancelSearch)
        .bind(KeyCode::Backspace, Message::SearchBackspace)
        .bind_ctrl(KeyCode::Char('c'), Message::Quit)
}

/// Short hint line built from the browse keymap.
pub fn browse_hints() -> String {
    let keymap = browse_keymap();
    [
        (Message::SelectNext, "down"),
        (Message::ToggleSort, "sort"),
        (Message::NextCategory, "category"),
        (Message::StartSearch, "search"),
        (Message::Retry, "retry"),
        (Message::Quit, "quit"),
    ]
    .iter()
    .filter_map(|(msg, label)| {
        keymap
            .find_key(msg)
            .map(|(code, mods)| format!("{}:{}", format_key(code, mods), label))
    })
    .collect::<Vec<_>>()
    .join("  ")
}

pub fn handle_key<C: CatalogBackend>(key: KeyEvent, app: &App<C>) -> Option<Message> {
    if app.search.editing {
        if let Some(msg) = search_keymap().get(&key) {
            return Some(msg);
        }
        return match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Message::SearchChar(c))
            }
            _ => None,
        };
    }

    browse_keymap().get(&key)
}

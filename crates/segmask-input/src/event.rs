#![forbid(unsafe_code)]

//! Host-neutral input events.
//!
//! Hosts convert whatever their platform delivers into these types before
//! calling [`translate`](crate::translate). Key events carry only what the
//! translation rules look at: the key, the held modifiers, and whether the
//! key went down or up.
//!
//! # Design Notes
//!
//! - `KeyEventKind` defaults to `Press` when the host cannot tell
//! - `Modifiers` use bitflags for easy combination
//! - Selection changes are reported in display space; translation maps them
//!   back to value space

use bitflags::bitflags;
#[cfg(feature = "crossterm")]
use crossterm::event as cte;
use segmask_core::SpaceCoord;

/// One input event delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key went down, repeated, or went up.
    Key(KeyEvent),

    /// Text was entered (typing, paste, dictation).
    Text {
        /// The entered text; may hold several graphemes.
        data: String,
        /// Part of an unfinished IME composition.
        composing: bool,
    },

    /// An IME composition finished with `data`.
    CompositionEnd {
        /// The composed text.
        data: String,
    },

    /// The host's selection moved.
    SelectionChange(SelectionSnapshot),
}

/// Host selection in display space.
///
/// `section` is the display section index and `position` the cell boundary
/// inside that section, as laid out by [`segmask_core::view::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSnapshot {
    /// Where the selection started (becomes the selection end).
    pub anchor: SpaceCoord,
    /// Where the selection was extended to (becomes the caret).
    pub focus: SpaceCoord,
}

impl SelectionSnapshot {
    /// A collapsed selection at `at`.
    #[must_use]
    pub const fn collapsed(at: SpaceCoord) -> Self {
        Self { anchor: at, focus: at }
    }
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch.eq_ignore_ascii_case(&c))
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Super/Meta/Cmd modifier is held.
    #[must_use]
    pub const fn super_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SUPER)
    }

    /// Text a terminal host should feed as [`InputEvent::Text`] when the key
    /// itself was not handled: printable characters without Ctrl or Super.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self.code {
            KeyCode::Char(c) if !c.is_control() && !self.ctrl() && !self.super_key() => {
                Some(c.to_string())
            }
            _ => None,
        }
    }

    /// Convert a Crossterm key event. Keys without a counterpart map to `None`.
    #[must_use]
    #[cfg(feature = "crossterm")]
    pub fn from_crossterm(event: cte::KeyEvent) -> Option<Self> {
        map_key_event(event)
    }
}

/// Key codes the translation rules distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Backspace key.
    Backspace,

    /// Tab key.
    Tab,

    /// Shift+Tab (back-tab).
    BackTab,

    /// Delete key.
    Delete,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// Keyboard conventions to follow.
///
/// On macOS, Option moves by section and Command by line, and Command-A
/// selects everything. Elsewhere Ctrl moves by section and Ctrl-A selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Platform {
    /// macOS conventions.
    Mac,
    /// Windows/Linux conventions.
    #[default]
    Other,
}

impl Platform {
    /// The platform this binary was built for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") { Self::Mac } else { Self::Other }
    }

    /// The key that moves by section.
    #[must_use]
    pub const fn section_modifier(self) -> Modifiers {
        match self {
            Self::Mac => Modifiers::ALT,
            Self::Other => Modifiers::CTRL,
        }
    }

    /// The key that moves by line, if any.
    #[must_use]
    pub const fn line_modifier(self) -> Option<Modifiers> {
        match self {
            Self::Mac => Some(Modifiers::SUPER),
            Self::Other => None,
        }
    }

    /// The key held for select-all.
    #[must_use]
    pub const fn command_modifier(self) -> Modifiers {
        match self {
            Self::Mac => Modifiers::SUPER,
            Self::Other => Modifiers::CTRL,
        }
    }
}

#[cfg(feature = "crossterm")]
fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = map_key_code(event.code)?;
    let modifiers = map_modifiers(event.modifiers);
    let kind = map_key_kind(event.kind);
    Some(KeyEvent {
        code,
        modifiers,
        kind,
    })
}

#[cfg(feature = "crossterm")]
fn map_key_kind(kind: cte::KeyEventKind) -> KeyEventKind {
    match kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    }
}

#[cfg(feature = "crossterm")]
fn map_key_code(code: cte::KeyCode) -> Option<KeyCode> {
    match code {
        cte::KeyCode::Backspace => Some(KeyCode::Backspace),
        cte::KeyCode::Enter => Some(KeyCode::Enter),
        cte::KeyCode::Left => Some(KeyCode::Left),
        cte::KeyCode::Right => Some(KeyCode::Right),
        cte::KeyCode::Up => Some(KeyCode::Up),
        cte::KeyCode::Down => Some(KeyCode::Down),
        cte::KeyCode::Home => Some(KeyCode::Home),
        cte::KeyCode::End => Some(KeyCode::End),
        cte::KeyCode::Tab => Some(KeyCode::Tab),
        cte::KeyCode::BackTab => Some(KeyCode::BackTab),
        cte::KeyCode::Delete => Some(KeyCode::Delete),
        cte::KeyCode::Char(c) => Some(KeyCode::Char(c)),
        cte::KeyCode::Esc => Some(KeyCode::Escape),
        _ => None,
    }
}

#[cfg(feature = "crossterm")]
fn map_modifiers(modifiers: cte::KeyModifiers) -> Modifiers {
    let mut mapped = Modifiers::NONE;
    if modifiers.contains(cte::KeyModifiers::SHIFT) {
        mapped |= Modifiers::SHIFT;
    }
    if modifiers.contains(cte::KeyModifiers::ALT) {
        mapped |= Modifiers::ALT;
    }
    if modifiers.contains(cte::KeyModifiers::CONTROL) {
        mapped |= Modifiers::CTRL;
    }
    if modifiers.contains(cte::KeyModifiers::SUPER)
        || modifiers.contains(cte::KeyModifiers::HYPER)
        || modifiers.contains(cte::KeyModifiers::META)
    {
        mapped |= Modifiers::SUPER;
    }
    mapped
}

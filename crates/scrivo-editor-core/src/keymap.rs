//! Key input and the swappable overlay keymap.
//!
//! The text caret never leaves the document. While the caret sits in an
//! image path the slot holds [`Keymap::OverlayActive`], which turns the
//! bare navigation keys into hotkey events for whatever panel is open.

use std::cell::Cell;

use smol_str::SmolStr;

use crate::overlay::{EventBus, HotKey, OverlayEvent};

/// Platform-agnostic key values. Hosts convert native events into these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Character(SmolStr),
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    Unidentified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeydownResult {
    /// Consumed, prevent default.
    Handled,
    /// Let the editor's own bindings see it.
    NotHandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keymap {
    #[default]
    Empty,
    OverlayActive,
}

impl Keymap {
    fn hotkey(&self, combo: &KeyCombo) -> Option<HotKey> {
        if *self != Keymap::OverlayActive || !combo.modifiers.is_none() {
            return None;
        }
        match combo.key {
            Key::ArrowUp => Some(HotKey::ArrowUp),
            Key::ArrowDown => Some(HotKey::ArrowDown),
            Key::Enter => Some(HotKey::Enter),
            _ => None,
        }
    }
}

/// Reconfigurable binding slot in front of the editor's keymap.
#[derive(Debug)]
pub struct KeymapSlot {
    bus: EventBus,
    current: Cell<Keymap>,
}

impl KeymapSlot {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            current: Cell::new(Keymap::Empty),
        }
    }

    pub fn current(&self) -> Keymap {
        self.current.get()
    }

    /// Swap keymaps. Returns whether the slot changed.
    pub fn set(&self, keymap: Keymap) -> bool {
        let previous = self.current.replace(keymap);
        if previous != keymap {
            tracing::trace!(target: "scrivo::overlay", ?previous, ?keymap, "keymap swapped");
        }
        previous != keymap
    }

    pub fn handle(&self, combo: &KeyCombo) -> KeydownResult {
        match self.current().hotkey(combo) {
            Some(hotkey) => {
                self.bus.publish(&OverlayEvent::OverlayHotkey(hotkey));
                KeydownResult::Handled
            }
            None => KeydownResult::NotHandled,
        }
    }
}

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::input::KeyCode;

#[cfg(target_os = "windows")]
use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

/// Source of physical key state.
pub trait KeyPoller {
    /// Whether `key` is held right now.
    fn is_down(&mut self, key: KeyCode) -> bool;
}

/// Keys bound to the four manual timer actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotkeyBindings {
    pub start_split: KeyCode,
    pub reset: KeyCode,
    pub skip: KeyCode,
    pub undo: KeyCode,
}

impl Default for HotkeyBindings {
    fn default() -> Self {
        Self {
            start_split: KeyCode::F9,
            reset: KeyCode::F8,
            skip: KeyCode::F10,
            undo: KeyCode::F11,
        }
    }
}

/// Actions whose key went down since the previous poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HotkeyEdges {
    pub reset: bool,
    pub start_split: bool,
    pub skip: bool,
    pub undo: bool,
}

impl HotkeyEdges {
    pub fn any(&self) -> bool {
        self.reset || self.start_split || self.skip || self.undo
    }
}

/// Turns held-key state into one event per press.
#[derive(Debug, Clone)]
pub struct Hotkeys {
    bindings: HotkeyBindings,
    held: HotkeyEdges,
}

impl Hotkeys {
    pub fn new(bindings: HotkeyBindings) -> Self {
        Self {
            bindings,
            held: HotkeyEdges::default(),
        }
    }

    pub fn poll<K: KeyPoller + ?Sized>(&mut self, keys: &mut K) -> HotkeyEdges {
        let down = HotkeyEdges {
            reset: keys.is_down(self.bindings.reset),
            start_split: keys.is_down(self.bindings.start_split),
            skip: keys.is_down(self.bindings.skip),
            undo: keys.is_down(self.bindings.undo),
        };
        let pressed = HotkeyEdges {
            reset: down.reset && !self.held.reset,
            start_split: down.start_split && !self.held.start_split,
            skip: down.skip && !self.held.skip,
            undo: down.undo && !self.held.undo,
        };
        self.held = down;
        pressed
    }
}

/// Global keyboard and mouse state, regardless of which window has focus.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsyncKeyPoller;

impl KeyPoller for AsyncKeyPoller {
    #[cfg(target_os = "windows")]
    fn is_down(&mut self, key: KeyCode) -> bool {
        // SAFETY: GetAsyncKeyState only reads input state and accepts any key code.
        let state = unsafe { GetAsyncKeyState(i32::from(key.0)) };
        (state as u16) & 0x8000 != 0
    }

    #[cfg(not(target_os = "windows"))]
    fn is_down(&mut self, _key: KeyCode) -> bool {
        false
    }
}

/// Key state set by tests. Clones share the same set of held keys.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    down: Arc<Mutex<HashSet<KeyCode>>>,
}

impl ScriptedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, key: KeyCode) {
        self.down
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key);
    }

    pub fn release(&self, key: KeyCode) {
        self.down
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&key);
    }
}

impl KeyPoller for ScriptedKeys {
    fn is_down(&mut self, key: KeyCode) -> bool {
        self.down
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&key)
    }
}

//! Key names accepted in the settings file and their virtual-key codes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A Windows virtual-key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyCode(pub u16);

impl KeyCode {
    pub const F8: KeyCode = KeyCode(0x77);
    pub const F9: KeyCode = KeyCode(0x78);
    pub const F10: KeyCode = KeyCode(0x79);
    pub const F11: KeyCode = KeyCode(0x7A);

    /// Look up a key by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        KEY_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, code)| KeyCode(*code))
    }

    /// Canonical name, or `None` for codes outside the vocabulary.
    pub fn name(self) -> Option<&'static str> {
        KEY_NAMES
            .iter()
            .find(|(_, code)| *code == self.0)
            .map(|(n, _)| *n)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "VK_{:#04X}", self.0),
        }
    }
}

impl TryFrom<String> for KeyCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        KeyCode::from_name(&value)
            .ok_or_else(|| Error::ConfigParseError(format!("unknown key name '{}'", value)))
    }
}

impl From<KeyCode> for String {
    fn from(key: KeyCode) -> Self {
        key.to_string()
    }
}

// First entry for a code is its canonical name.
#[rustfmt::skip]
const KEY_NAMES: &[(&str, u16)] = &[
    ("A", 0x41), ("B", 0x42), ("C", 0x43), ("D", 0x44), ("E", 0x45), ("F", 0x46),
    ("G", 0x47), ("H", 0x48), ("I", 0x49), ("J", 0x4A), ("K", 0x4B), ("L", 0x4C),
    ("M", 0x4D), ("N", 0x4E), ("O", 0x4F), ("P", 0x50), ("Q", 0x51), ("R", 0x52),
    ("S", 0x53), ("T", 0x54), ("U", 0x55), ("V", 0x56), ("W", 0x57), ("X", 0x58),
    ("Y", 0x59), ("Z", 0x5A),
    ("0", 0x30), ("1", 0x31), ("2", 0x32), ("3", 0x33), ("4", 0x34),
    ("5", 0x35), ("6", 0x36), ("7", 0x37), ("8", 0x38), ("9", 0x39),
    ("F1", 0x70), ("F2", 0x71), ("F3", 0x72), ("F4", 0x73), ("F5", 0x74), ("F6", 0x75),
    ("F7", 0x76), ("F8", 0x77), ("F9", 0x78), ("F10", 0x79), ("F11", 0x7A), ("F12", 0x7B),
    ("SHIFT", 0x10), ("CTRL", 0x11), ("ALT", 0x12),
    ("CAPSLOCK", 0x14), ("TAB", 0x09), ("SPACE", 0x20),
    ("UP", 0x26), ("DOWN", 0x28), ("LEFT", 0x25), ("RIGHT", 0x27),
    ("HOME", 0x24), ("END", 0x23), ("PGUP", 0x21), ("PGDN", 0x22),
    ("INSERT", 0x2D), ("DELETE", 0x2E),
    ("-", 0xBD), ("EQUALS", 0xBB), ("=", 0xBB),
    ("[", 0xDB), ("]", 0xDD), ("\\", 0xDC), (";", 0xBA), ("'", 0xDE),
    (",", 0xBC), (".", 0xBE), ("/", 0xBF), ("`", 0xC0),
    ("NUM0", 0x60), ("NUM1", 0x61), ("NUM2", 0x62), ("NUM3", 0x63), ("NUM4", 0x64),
    ("NUM5", 0x65), ("NUM6", 0x66), ("NUM7", 0x67), ("NUM8", 0x68), ("NUM9", 0x69),
    ("NUMPLUS", 0x6B), ("+", 0x6B), ("NUMMINUS", 0x6D),
    ("ESC", 0x1B), ("BACKSPACE", 0x08), ("ENTER", 0x0D),
    ("PRINTSCREEN", 0x2C), ("PAUSE", 0x13), ("MENU", 0x5D),
    // Numpad Delete and Enter report the same codes as the main keys.
    ("NUMDEL", 0x2E), ("NUMENTER", 0x0D),
    ("MOUSE1", 0x01), ("MOUSE2", 0x02), ("MOUSE3", 0x04), ("MOUSE4", 0x05), ("MOUSE5", 0x06),
];

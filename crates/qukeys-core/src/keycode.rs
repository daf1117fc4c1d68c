use crate::types::KeyCode;
use std::collections::HashMap;

pub const KEY_A: KeyCode = KeyCode(0x04);
pub const KEY_B: KeyCode = KeyCode(0x05);
pub const KEY_C: KeyCode = KeyCode(0x06);
pub const KEY_D: KeyCode = KeyCode(0x07);
pub const KEY_F: KeyCode = KeyCode(0x09);
pub const KEY_J: KeyCode = KeyCode(0x0D);
pub const KEY_K: KeyCode = KeyCode(0x0E);
pub const KEY_S: KeyCode = KeyCode(0x16);
pub const KEY_ENTER: KeyCode = KeyCode(0x28);
pub const KEY_ESC: KeyCode = KeyCode(0x29);
pub const KEY_SPACE: KeyCode = KeyCode(0x2C);
pub const KEY_LEFT_CTRL: KeyCode = KeyCode(0xE0);
pub const KEY_LEFT_SHIFT: KeyCode = KeyCode(0xE1);
pub const KEY_LEFT_ALT: KeyCode = KeyCode(0xE2);
pub const KEY_LEFT_GUI: KeyCode = KeyCode(0xE3);
pub const KEY_RIGHT_CTRL: KeyCode = KeyCode(0xE4);
pub const KEY_RIGHT_SHIFT: KeyCode = KeyCode(0xE5);
pub const KEY_RIGHT_ALT: KeyCode = KeyCode(0xE6);
pub const KEY_RIGHT_GUI: KeyCode = KeyCode(0xE7);

// (canonical name, usage). Aliases go in ALIASES below.
const NAMED_KEYS: &[(&str, u8)] = &[
    ("NoKey", 0x00),
    ("Trans", 0x01),
    ("A", 0x04), ("B", 0x05), ("C", 0x06), ("D", 0x07), ("E", 0x08), ("F", 0x09),
    ("G", 0x0A), ("H", 0x0B), ("I", 0x0C), ("J", 0x0D), ("K", 0x0E), ("L", 0x0F),
    ("M", 0x10), ("N", 0x11), ("O", 0x12), ("P", 0x13), ("Q", 0x14), ("R", 0x15),
    ("S", 0x16), ("T", 0x17), ("U", 0x18), ("V", 0x19), ("W", 0x1A), ("X", 0x1B),
    ("Y", 0x1C), ("Z", 0x1D),
    ("1", 0x1E), ("2", 0x1F), ("3", 0x20), ("4", 0x21), ("5", 0x22),
    ("6", 0x23), ("7", 0x24), ("8", 0x25), ("9", 0x26), ("0", 0x27),
    ("Enter", 0x28),
    ("Esc", 0x29),
    ("Backspace", 0x2A),
    ("Tab", 0x2B),
    ("Space", 0x2C),
    ("Minus", 0x2D),
    ("Equal", 0x2E),
    ("LeftBracket", 0x2F),
    ("RightBracket", 0x30),
    ("Backslash", 0x31),
    ("Semicolon", 0x33),
    ("Quote", 0x34),
    ("Grave", 0x35),
    ("Comma", 0x36),
    ("Period", 0x37),
    ("Slash", 0x38),
    ("CapsLock", 0x39),
    ("F1", 0x3A), ("F2", 0x3B), ("F3", 0x3C), ("F4", 0x3D), ("F5", 0x3E), ("F6", 0x3F),
    ("F7", 0x40), ("F8", 0x41), ("F9", 0x42), ("F10", 0x43), ("F11", 0x44), ("F12", 0x45),
    ("Insert", 0x49),
    ("Home", 0x4A),
    ("PageUp", 0x4B),
    ("Delete", 0x4C),
    ("End", 0x4D),
    ("PageDown", 0x4E),
    ("Right", 0x4F),
    ("Left", 0x50),
    ("Down", 0x51),
    ("Up", 0x52),
    ("LeftCtrl", 0xE0),
    ("LeftShift", 0xE1),
    ("LeftAlt", 0xE2),
    ("LeftGui", 0xE3),
    ("RightCtrl", 0xE4),
    ("RightShift", 0xE5),
    ("RightAlt", 0xE6),
    ("RightGui", 0xE7),
];

const ALIASES: &[(&str, &str)] = &[
    ("___", "Trans"),
    ("XXX", "NoKey"),
    ("Escape", "Esc"),
    ("Return", "Enter"),
    ("Bksp", "Backspace"),
    ("LCtrl", "LeftCtrl"),
    ("LShift", "LeftShift"),
    ("LAlt", "LeftAlt"),
    ("LGui", "LeftGui"),
    ("RCtrl", "RightCtrl"),
    ("RShift", "RightShift"),
    ("RAlt", "RightAlt"),
    ("RGui", "RightGui"),
];

lazy_static::lazy_static! {
    static ref NAME_TO_CODE: HashMap<String, KeyCode> = {
        let mut m = HashMap::new();
        for (name, usage) in NAMED_KEYS {
            m.insert(name.to_ascii_lowercase(), KeyCode(*usage));
        }
        for (alias, name) in ALIASES {
            if let Some(code) = m.get(&name.to_ascii_lowercase()).copied() {
                m.insert(alias.to_ascii_lowercase(), code);
            }
        }
        m
    };

    static ref CODE_TO_NAME: HashMap<u8, &'static str> = {
        NAMED_KEYS.iter().map(|(name, usage)| (*usage, *name)).collect()
    };
}

/// Looks up a key by name (case-insensitive, aliases accepted).
pub fn key_from_name(name: &str) -> Option<KeyCode> {
    NAME_TO_CODE.get(&name.trim().to_ascii_lowercase()).copied()
}

/// Canonical name of a key, if it has one.
pub fn key_name(code: KeyCode) -> Option<&'static str> {
    CODE_TO_NAME.get(&code.0).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(key_from_name("a"), Some(KEY_A));
        assert_eq!(key_from_name("leftshift"), Some(KEY_LEFT_SHIFT));
        assert_eq!(key_from_name(" Enter "), Some(KEY_ENTER));
        assert_eq!(key_from_name("Hyper"), None);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(key_from_name("LShift"), Some(KEY_LEFT_SHIFT));
        assert_eq!(key_from_name("___"), Some(KeyCode::TRANSPARENT));
        assert_eq!(key_from_name("XXX"), Some(KeyCode::NO_KEY));
    }

    #[test]
    fn test_reverse_names() {
        assert_eq!(key_name(KEY_SPACE), Some("Space"));
        assert_eq!(key_name(KEY_RIGHT_GUI), Some("RightGui"));
        assert_eq!(key_name(KeyCode(0xA5)), None);
        assert_eq!(format!("{:?}", KEY_F), "F");
    }
}

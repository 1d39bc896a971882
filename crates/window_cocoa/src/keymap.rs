//! macOS virtual keycodes (`HIToolbox/Events.h`), modifier flags and mouse events to [`Key`] /
//! [`Button`].
//!
//! Keycodes name physical positions on an ANSI keyboard, so they do not follow the active layout.

use window_backend::{Button, Key};

pub fn keycode_to_key(keycode: u16) -> Key {
    match keycode {
        0x00 => Key::A,
        0x0b => Key::B,
        0x08 => Key::C,
        0x02 => Key::D,
        0x0e => Key::E,
        0x03 => Key::F,
        0x05 => Key::G,
        0x04 => Key::H,
        0x22 => Key::I,
        0x26 => Key::J,
        0x28 => Key::K,
        0x25 => Key::L,
        0x2e => Key::M,
        0x2d => Key::N,
        0x1f => Key::O,
        0x23 => Key::P,
        0x0c => Key::Q,
        0x0f => Key::R,
        0x01 => Key::S,
        0x11 => Key::T,
        0x20 => Key::U,
        0x09 => Key::V,
        0x0d => Key::W,
        0x07 => Key::X,
        0x10 => Key::Y,
        0x06 => Key::Z,

        0x1d => Key::Num0,
        0x12 => Key::Num1,
        0x13 => Key::Num2,
        0x14 => Key::Num3,
        0x15 => Key::Num4,
        0x17 => Key::Num5,
        0x16 => Key::Num6,
        0x1a => Key::Num7,
        0x1c => Key::Num8,
        0x19 => Key::Num9,

        0x7a => Key::F1,
        0x78 => Key::F2,
        0x63 => Key::F3,
        0x76 => Key::F4,
        0x60 => Key::F5,
        0x61 => Key::F6,
        0x62 => Key::F7,
        0x64 => Key::F8,
        0x65 => Key::F9,
        0x6d => Key::F10,
        0x67 => Key::F11,
        0x6f => Key::F12,

        0x38 => Key::LeftShift,
        0x3c => Key::RightShift,
        0x3b => Key::LeftControl,
        0x3e => Key::RightControl,
        0x3a => Key::LeftAlt,
        0x3d => Key::RightAlt,
        0x37 => Key::LeftSuper,
        0x36 => Key::RightSuper,

        0x31 => Key::Space,
        0x24 => Key::Enter,
        0x35 => Key::Escape,
        0x33 => Key::Backspace,
        0x75 => Key::Delete,
        0x30 => Key::Tab,
        0x39 => Key::CapsLock,
        // keypad clear sits where numlock is on pc keyboards
        0x47 => Key::NumLock,

        0x7e => Key::Up,
        0x7d => Key::Down,
        0x7b => Key::Left,
        0x7c => Key::Right,

        0x73 => Key::Home,
        0x77 => Key::End,
        0x74 => Key::PageUp,
        0x79 => Key::PageDown,
        // help, on the insert position
        0x72 => Key::Insert,

        0x32 => Key::GraveAccent,
        0x1b => Key::Minus,
        0x18 => Key::Equal,
        0x21 => Key::LeftBracket,
        0x1e => Key::RightBracket,
        0x2a => Key::Backslash,
        0x29 => Key::Semicolon,
        0x27 => Key::Apostrophe,
        0x2b => Key::Comma,
        0x2f => Key::Period,
        0x2c => Key::Slash,

        0x52 => Key::Numpad0,
        0x53 => Key::Numpad1,
        0x54 => Key::Numpad2,
        0x55 => Key::Numpad3,
        0x56 => Key::Numpad4,
        0x57 => Key::Numpad5,
        0x58 => Key::Numpad6,
        0x59 => Key::Numpad7,
        0x5b => Key::Numpad8,
        0x5c => Key::Numpad9,
        0x41 => Key::NumpadDecimal,
        0x4b => Key::NumpadDivide,
        0x43 => Key::NumpadMultiply,
        0x4e => Key::NumpadSubtract,
        0x45 => Key::NumpadAdd,
        0x4c => Key::NumpadEnter,
        0x51 => Key::NumpadEqual,

        _ => Key::Unknown,
    }
}

/// The `modifierFlags` bit that is set while `key` is held. left and right use the device dependent
/// bits from `IOKit/hidsystem/IOLLEvent.h`.
pub fn modifier_mask(key: Key) -> Option<u64> {
    Some(match key {
        Key::LeftControl => 0x0000_0001,
        Key::LeftShift => 0x0000_0002,
        Key::RightShift => 0x0000_0004,
        Key::LeftSuper => 0x0000_0008,
        Key::RightSuper => 0x0000_0010,
        Key::LeftAlt => 0x0000_0020,
        Key::RightAlt => 0x0000_0040,
        Key::RightControl => 0x0000_2000,
        // NSEventModifierFlagCapsLock
        Key::CapsLock => 1 << 16,
        _ => return None,
    })
}

pub const NS_EVENT_LEFT_MOUSE_DOWN: u64 = 1;
pub const NS_EVENT_LEFT_MOUSE_UP: u64 = 2;
pub const NS_EVENT_RIGHT_MOUSE_DOWN: u64 = 3;
pub const NS_EVENT_RIGHT_MOUSE_UP: u64 = 4;
pub const NS_EVENT_KEY_DOWN: u64 = 10;
pub const NS_EVENT_KEY_UP: u64 = 11;
pub const NS_EVENT_FLAGS_CHANGED: u64 = 12;
pub const NS_EVENT_OTHER_MOUSE_DOWN: u64 = 25;
pub const NS_EVENT_OTHER_MOUSE_UP: u64 = 26;

/// Maps a mouse event to its button and whether it is a press. `None` for other event types.
pub fn mouse_event_button(event_type: u64, button_number: i64) -> Option<(Button, bool)> {
    let other = || match button_number {
        2 => Button::Middle,
        3 => Button::Button4,
        4 => Button::Button5,
        _ => Button::Unknown,
    };
    Some(match event_type {
        NS_EVENT_LEFT_MOUSE_DOWN => (Button::Left, true),
        NS_EVENT_LEFT_MOUSE_UP => (Button::Left, false),
        NS_EVENT_RIGHT_MOUSE_DOWN => (Button::Right, true),
        NS_EVENT_RIGHT_MOUSE_UP => (Button::Right, false),
        NS_EVENT_OTHER_MOUSE_DOWN => (other(), true),
        NS_EVENT_OTHER_MOUSE_UP => (other(), false),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_positions() {
        assert_eq!(keycode_to_key(0x00), Key::A);
        assert_eq!(keycode_to_key(0x01), Key::S);
        assert_eq!(keycode_to_key(0x0c), Key::Q);
        assert_eq!(keycode_to_key(0x1d), Key::Num0);
        assert_eq!(keycode_to_key(0x7a), Key::F1);
        assert_eq!(keycode_to_key(0x24), Key::Enter);
        assert_eq!(keycode_to_key(0x4c), Key::NumpadEnter);
        assert_eq!(keycode_to_key(0x7e), Key::Up);
    }

    #[test]
    fn backspace_and_forward_delete_differ() {
        assert_eq!(keycode_to_key(0x33), Key::Backspace);
        assert_eq!(keycode_to_key(0x75), Key::Delete);
    }

    #[test]
    fn unmapped_keycodes_are_unknown() {
        // function key, f13, volume up, out of range
        for keycode in [0x3f, 0x69, 0x48, 0x200] {
            assert_eq!(keycode_to_key(keycode), Key::Unknown, "{keycode:#x}");
        }
    }

    #[test]
    fn every_modifier_key_has_a_distinct_mask() {
        let keys = [
            Key::LeftShift,
            Key::RightShift,
            Key::LeftControl,
            Key::RightControl,
            Key::LeftAlt,
            Key::RightAlt,
            Key::LeftSuper,
            Key::RightSuper,
            Key::CapsLock,
        ];
        let masks: Vec<u64> = keys.iter().map(|key| modifier_mask(*key).unwrap()).collect();
        for (i, mask) in masks.iter().enumerate() {
            assert_eq!(mask.count_ones(), 1);
            assert!(masks[i + 1..].iter().all(|other| other != mask));
        }
        assert_eq!(modifier_mask(Key::A), None);
    }

    #[test]
    fn mouse_events() {
        assert_eq!(mouse_event_button(NS_EVENT_LEFT_MOUSE_DOWN, 0), Some((Button::Left, true)));
        assert_eq!(mouse_event_button(NS_EVENT_RIGHT_MOUSE_UP, 1), Some((Button::Right, false)));
        assert_eq!(mouse_event_button(NS_EVENT_OTHER_MOUSE_DOWN, 2), Some((Button::Middle, true)));
        assert_eq!(mouse_event_button(NS_EVENT_OTHER_MOUSE_UP, 3), Some((Button::Button4, false)));
        assert_eq!(mouse_event_button(NS_EVENT_OTHER_MOUSE_DOWN, 4), Some((Button::Button5, true)));
        assert_eq!(mouse_event_button(NS_EVENT_OTHER_MOUSE_DOWN, 7), Some((Button::Unknown, true)));
        assert_eq!(mouse_event_button(NS_EVENT_KEY_DOWN, 0), None);
    }
}

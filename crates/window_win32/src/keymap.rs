//! Win32 virtual key codes (`winuser.h`) and mouse messages to [`Key`] / [`Button`].
//!
//! A virtual key alone is ambiguous for modifiers and the keypad: `VK_SHIFT` covers both shift
//! keys, `VK_CONTROL` / `VK_MENU` / `VK_RETURN` are told apart by the extended bit of the key
//! message, and with numlock off the keypad reports navigation keys without the extended bit.

use window_backend::{Button, Key};

/// The parts of a `WM_KEYDOWN` / `WM_KEYUP` / `WM_SYSKEY*` message that matter for key mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMessage {
    pub virtual_key: u32,
    pub scancode: u32,
    pub extended: bool,
    /// bit 30, the key was already down before this message
    pub was_down: bool,
}

impl KeyMessage {
    pub fn decode(wparam: usize, lparam: isize) -> Self {
        let lparam = lparam as u32;
        Self {
            virtual_key: (wparam & 0xffff) as u32,
            scancode: (lparam >> 16) & 0xff,
            extended: lparam & (1 << 24) != 0,
            was_down: lparam & (1 << 30) != 0,
        }
    }

    pub fn key(&self) -> Key {
        vk_to_key(self.virtual_key, self.scancode, self.extended)
    }
}

const SCANCODE_RIGHT_SHIFT: u32 = 0x36;

pub fn vk_to_key(virtual_key: u32, scancode: u32, extended: bool) -> Key {
    match virtual_key {
        0x41 => Key::A,
        0x42 => Key::B,
        0x43 => Key::C,
        0x44 => Key::D,
        0x45 => Key::E,
        0x46 => Key::F,
        0x47 => Key::G,
        0x48 => Key::H,
        0x49 => Key::I,
        0x4a => Key::J,
        0x4b => Key::K,
        0x4c => Key::L,
        0x4d => Key::M,
        0x4e => Key::N,
        0x4f => Key::O,
        0x50 => Key::P,
        0x51 => Key::Q,
        0x52 => Key::R,
        0x53 => Key::S,
        0x54 => Key::T,
        0x55 => Key::U,
        0x56 => Key::V,
        0x57 => Key::W,
        0x58 => Key::X,
        0x59 => Key::Y,
        0x5a => Key::Z,

        0x30 => Key::Num0,
        0x31 => Key::Num1,
        0x32 => Key::Num2,
        0x33 => Key::Num3,
        0x34 => Key::Num4,
        0x35 => Key::Num5,
        0x36 => Key::Num6,
        0x37 => Key::Num7,
        0x38 => Key::Num8,
        0x39 => Key::Num9,

        0x70 => Key::F1,
        0x71 => Key::F2,
        0x72 => Key::F3,
        0x73 => Key::F4,
        0x74 => Key::F5,
        0x75 => Key::F6,
        0x76 => Key::F7,
        0x77 => Key::F8,
        0x78 => Key::F9,
        0x79 => Key::F10,
        0x7a => Key::F11,
        0x7b => Key::F12,

        // VK_SHIFT
        0x10 if scancode == SCANCODE_RIGHT_SHIFT => Key::RightShift,
        0x10 => Key::LeftShift,
        0xa0 => Key::LeftShift,
        0xa1 => Key::RightShift,
        // VK_CONTROL
        0x11 if extended => Key::RightControl,
        0x11 => Key::LeftControl,
        0xa2 => Key::LeftControl,
        0xa3 => Key::RightControl,
        // VK_MENU
        0x12 if extended => Key::RightAlt,
        0x12 => Key::LeftAlt,
        0xa4 => Key::LeftAlt,
        0xa5 => Key::RightAlt,
        0x5b => Key::LeftSuper,
        0x5c => Key::RightSuper,

        0x20 => Key::Space,
        0x0d if extended => Key::NumpadEnter,
        0x0d => Key::Enter,
        0x1b => Key::Escape,
        0x08 => Key::Backspace,
        0x09 => Key::Tab,
        0x14 => Key::CapsLock,
        0x91 => Key::ScrollLock,
        0x90 => Key::NumLock,
        0x2c => Key::PrintScreen,
        0x13 => Key::Pause,

        // navigation cluster, or the keypad with numlock off when the extended bit is clear
        0x26 if extended => Key::Up,
        0x26 => Key::Numpad8,
        0x28 if extended => Key::Down,
        0x28 => Key::Numpad2,
        0x25 if extended => Key::Left,
        0x25 => Key::Numpad4,
        0x27 if extended => Key::Right,
        0x27 => Key::Numpad6,
        0x24 if extended => Key::Home,
        0x24 => Key::Numpad7,
        0x23 if extended => Key::End,
        0x23 => Key::Numpad1,
        0x21 if extended => Key::PageUp,
        0x21 => Key::Numpad9,
        0x22 if extended => Key::PageDown,
        0x22 => Key::Numpad3,
        0x2d if extended => Key::Insert,
        0x2d => Key::Numpad0,
        0x2e if extended => Key::Delete,
        0x2e => Key::NumpadDecimal,
        // VK_CLEAR, keypad 5 with numlock off
        0x0c => Key::Numpad5,

        0xc0 => Key::GraveAccent,
        0xbd => Key::Minus,
        0xbb => Key::Equal,
        0xdb => Key::LeftBracket,
        0xdd => Key::RightBracket,
        0xdc => Key::Backslash,
        0xba => Key::Semicolon,
        0xde => Key::Apostrophe,
        0xbc => Key::Comma,
        0xbe => Key::Period,
        0xbf => Key::Slash,

        0x60 => Key::Numpad0,
        0x61 => Key::Numpad1,
        0x62 => Key::Numpad2,
        0x63 => Key::Numpad3,
        0x64 => Key::Numpad4,
        0x65 => Key::Numpad5,
        0x66 => Key::Numpad6,
        0x67 => Key::Numpad7,
        0x68 => Key::Numpad8,
        0x69 => Key::Numpad9,
        0x6a => Key::NumpadMultiply,
        0x6b => Key::NumpadAdd,
        0x6d => Key::NumpadSubtract,
        0x6e => Key::NumpadDecimal,
        0x6f => Key::NumpadDivide,
        // VK_OEM_NEC_EQUAL
        0x92 => Key::NumpadEqual,

        _ => Key::Unknown,
    }
}

pub const WM_LBUTTONDOWN: u32 = 0x0201;
pub const WM_LBUTTONUP: u32 = 0x0202;
pub const WM_RBUTTONDOWN: u32 = 0x0204;
pub const WM_RBUTTONUP: u32 = 0x0205;
pub const WM_MBUTTONDOWN: u32 = 0x0207;
pub const WM_MBUTTONUP: u32 = 0x0208;
pub const WM_XBUTTONDOWN: u32 = 0x020b;
pub const WM_XBUTTONUP: u32 = 0x020c;

/// Maps a mouse button message to its button and whether it is a press. `None` for anything else.
pub fn mouse_message_button(message: u32, wparam: usize) -> Option<(Button, bool)> {
    let x_button = || match (wparam >> 16) & 0xffff {
        1 => Button::Button4,
        2 => Button::Button5,
        _ => Button::Unknown,
    };
    Some(match message {
        WM_LBUTTONDOWN => (Button::Left, true),
        WM_LBUTTONUP => (Button::Left, false),
        WM_RBUTTONDOWN => (Button::Right, true),
        WM_RBUTTONUP => (Button::Right, false),
        WM_MBUTTONDOWN => (Button::Middle, true),
        WM_MBUTTONUP => (Button::Middle, false),
        WM_XBUTTONDOWN => (x_button(), true),
        WM_XBUTTONUP => (x_button(), false),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_digits_and_function_keys() {
        assert_eq!(vk_to_key('A' as u32, 0x1e, false), Key::A);
        assert_eq!(vk_to_key('Z' as u32, 0x2c, false), Key::Z);
        assert_eq!(vk_to_key('0' as u32, 0x0b, false), Key::Num0);
        assert_eq!(vk_to_key(0x70, 0x3b, false), Key::F1);
        assert_eq!(vk_to_key(0x7b, 0x58, false), Key::F12);
    }

    #[test]
    fn modifiers_are_split_left_and_right() {
        assert_eq!(vk_to_key(0x10, 0x2a, false), Key::LeftShift);
        assert_eq!(vk_to_key(0x10, 0x36, false), Key::RightShift);
        assert_eq!(vk_to_key(0x11, 0x1d, false), Key::LeftControl);
        assert_eq!(vk_to_key(0x11, 0x1d, true), Key::RightControl);
        assert_eq!(vk_to_key(0x12, 0x38, false), Key::LeftAlt);
        assert_eq!(vk_to_key(0x12, 0x38, true), Key::RightAlt);
        assert_eq!(vk_to_key(0xa3, 0, false), Key::RightControl);
    }

    #[test]
    fn extended_bit_separates_keypad_from_navigation() {
        assert_eq!(vk_to_key(0x0d, 0x1c, false), Key::Enter);
        assert_eq!(vk_to_key(0x0d, 0x1c, true), Key::NumpadEnter);
        assert_eq!(vk_to_key(0x24, 0x47, true), Key::Home);
        assert_eq!(vk_to_key(0x24, 0x47, false), Key::Numpad7);
        assert_eq!(vk_to_key(0x2e, 0x53, true), Key::Delete);
        assert_eq!(vk_to_key(0x2e, 0x53, false), Key::NumpadDecimal);
        assert_eq!(vk_to_key(0x67, 0x47, false), Key::Numpad7);
    }

    #[test]
    fn unmapped_virtual_keys_are_unknown() {
        for vk in [0x00, 0x05, 0xe5, 0xad, 0xff] {
            assert_eq!(vk_to_key(vk, 0, false), Key::Unknown, "{vk:#x}");
        }
    }

    #[test]
    fn decodes_key_message_bits() {
        // right control, first press
        let message = KeyMessage::decode(0x11, 0x011d_0001);
        assert_eq!(
            message,
            KeyMessage {
                virtual_key: 0x11,
                scancode: 0x1d,
                extended: true,
                was_down: false,
            }
        );
        assert_eq!(message.key(), Key::RightControl);

        // auto repeat of 'a'
        let repeat = KeyMessage::decode('A' as usize, 0x401e_0001);
        assert!(repeat.was_down);
        assert_eq!(repeat.key(), Key::A);

        // key up messages set bit 31, which must not leak into the other fields
        let up = KeyMessage::decode(0x10, 0xc036_0001_u32 as i32 as isize);
        assert_eq!(up.key(), Key::RightShift);
        assert!(!up.extended);
    }

    #[test]
    fn mouse_messages() {
        assert_eq!(mouse_message_button(WM_LBUTTONDOWN, 0), Some((Button::Left, true)));
        assert_eq!(mouse_message_button(WM_RBUTTONUP, 0), Some((Button::Right, false)));
        assert_eq!(mouse_message_button(WM_MBUTTONDOWN, 0), Some((Button::Middle, true)));
        assert_eq!(mouse_message_button(WM_XBUTTONDOWN, 1 << 16), Some((Button::Button4, true)));
        assert_eq!(mouse_message_button(WM_XBUTTONUP, 2 << 16), Some((Button::Button5, false)));
        // WM_MOUSEMOVE
        assert_eq!(mouse_message_button(0x0200, 0), None);
    }
}

//! X11 keysyms (`X11/keysymdef.h`) and core pointer buttons to [`Key`] / [`Button`].
//!
//! Keysyms are looked up at index 0 of the keycode, so letters can arrive as either case and keypad
//! keys arrive as their navigation keysym when numlock is off.

use window_backend::{Button, Key};

pub fn keysym_to_key(keysym: u32) -> Key {
    match keysym {
        // latin 1, both cases
        0x0061 | 0x0041 => Key::A,
        0x0062 | 0x0042 => Key::B,
        0x0063 | 0x0043 => Key::C,
        0x0064 | 0x0044 => Key::D,
        0x0065 | 0x0045 => Key::E,
        0x0066 | 0x0046 => Key::F,
        0x0067 | 0x0047 => Key::G,
        0x0068 | 0x0048 => Key::H,
        0x0069 | 0x0049 => Key::I,
        0x006a | 0x004a => Key::J,
        0x006b | 0x004b => Key::K,
        0x006c | 0x004c => Key::L,
        0x006d | 0x004d => Key::M,
        0x006e | 0x004e => Key::N,
        0x006f | 0x004f => Key::O,
        0x0070 | 0x0050 => Key::P,
        0x0071 | 0x0051 => Key::Q,
        0x0072 | 0x0052 => Key::R,
        0x0073 | 0x0053 => Key::S,
        0x0074 | 0x0054 => Key::T,
        0x0075 | 0x0055 => Key::U,
        0x0076 | 0x0056 => Key::V,
        0x0077 | 0x0057 => Key::W,
        0x0078 | 0x0058 => Key::X,
        0x0079 | 0x0059 => Key::Y,
        0x007a | 0x005a => Key::Z,

        0x0030 => Key::Num0,
        0x0031 => Key::Num1,
        0x0032 => Key::Num2,
        0x0033 => Key::Num3,
        0x0034 => Key::Num4,
        0x0035 => Key::Num5,
        0x0036 => Key::Num6,
        0x0037 => Key::Num7,
        0x0038 => Key::Num8,
        0x0039 => Key::Num9,

        0xffbe => Key::F1,
        0xffbf => Key::F2,
        0xffc0 => Key::F3,
        0xffc1 => Key::F4,
        0xffc2 => Key::F5,
        0xffc3 => Key::F6,
        0xffc4 => Key::F7,
        0xffc5 => Key::F8,
        0xffc6 => Key::F9,
        0xffc7 => Key::F10,
        0xffc8 => Key::F11,
        0xffc9 => Key::F12,

        0xffe1 => Key::LeftShift,
        0xffe2 => Key::RightShift,
        0xffe3 => Key::LeftControl,
        0xffe4 => Key::RightControl,
        0xffe9 => Key::LeftAlt,
        // Alt_R, and AltGr on layouts that have it
        0xffea | 0xfe03 => Key::RightAlt,
        // Super, and Meta on keymaps that still report it
        0xffeb | 0xffe7 => Key::LeftSuper,
        0xffec | 0xffe8 => Key::RightSuper,

        0x0020 => Key::Space,
        0xff0d => Key::Enter,
        0xff1b => Key::Escape,
        0xff08 => Key::Backspace,
        0xffff => Key::Delete,
        // Tab, and ISO_Left_Tab which is what shift+tab reports
        0xff09 | 0xfe20 => Key::Tab,
        0xffe5 => Key::CapsLock,
        0xff14 => Key::ScrollLock,
        0xff7f => Key::NumLock,
        0xff61 => Key::PrintScreen,
        0xff13 => Key::Pause,

        0xff52 => Key::Up,
        0xff54 => Key::Down,
        0xff51 => Key::Left,
        0xff53 => Key::Right,

        0xff50 => Key::Home,
        0xff57 => Key::End,
        0xff55 => Key::PageUp,
        0xff56 => Key::PageDown,
        0xff63 => Key::Insert,

        0x0060 | 0x007e => Key::GraveAccent,
        0x002d | 0x005f => Key::Minus,
        0x003d | 0x002b => Key::Equal,
        0x005b | 0x007b => Key::LeftBracket,
        0x005d | 0x007d => Key::RightBracket,
        0x005c | 0x007c => Key::Backslash,
        0x003b | 0x003a => Key::Semicolon,
        0x0027 | 0x0022 => Key::Apostrophe,
        0x002c | 0x003c => Key::Comma,
        0x002e | 0x003e => Key::Period,
        0x002f | 0x003f => Key::Slash,

        // KP_0 .. KP_9, and the numlock-off keysyms of the same keys
        0xffb0 | 0xff9e => Key::Numpad0,
        0xffb1 | 0xff9c => Key::Numpad1,
        0xffb2 | 0xff99 => Key::Numpad2,
        0xffb3 | 0xff9b => Key::Numpad3,
        0xffb4 | 0xff96 => Key::Numpad4,
        0xffb5 | 0xff9d => Key::Numpad5,
        0xffb6 | 0xff98 => Key::Numpad6,
        0xffb7 | 0xff95 => Key::Numpad7,
        0xffb8 | 0xff97 => Key::Numpad8,
        0xffb9 | 0xff9a => Key::Numpad9,
        0xffae | 0xff9f | 0xffac => Key::NumpadDecimal,
        0xffaf => Key::NumpadDivide,
        0xffaa => Key::NumpadMultiply,
        0xffad => Key::NumpadSubtract,
        0xffab => Key::NumpadAdd,
        0xff8d => Key::NumpadEnter,
        0xffbd => Key::NumpadEqual,

        _ => Key::Unknown,
    }
}

/// core protocol button numbers. 4-7 are the scroll wheel and are not tracked.
pub fn x_button_to_button(button: u32) -> Button {
    match button {
        1 => Button::Left,
        2 => Button::Middle,
        3 => Button::Right,
        8 => Button::Button4,
        9 => Button::Button5,
        _ => Button::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_map_regardless_of_case() {
        assert_eq!(keysym_to_key('a' as u32), Key::A);
        assert_eq!(keysym_to_key('A' as u32), Key::A);
        assert_eq!(keysym_to_key('z' as u32), Key::Z);
        assert_eq!(keysym_to_key('Q' as u32), Key::Q);
    }

    #[test]
    fn shifted_punctuation_maps_to_the_same_key() {
        let pairs = [('-', '_'), ('=', '+'), ('[', '{'), (';', ':'), ('/', '?'), ('`', '~')];
        for (plain, shifted) in pairs {
            assert_eq!(keysym_to_key(plain as u32), keysym_to_key(shifted as u32));
            assert_ne!(keysym_to_key(plain as u32), Key::Unknown);
        }
    }

    #[test]
    fn keypad_with_and_without_numlock() {
        assert_eq!(keysym_to_key(0xffb7), Key::Numpad7);
        // KP_Home
        assert_eq!(keysym_to_key(0xff95), Key::Numpad7);
        assert_eq!(keysym_to_key(0xff8d), Key::NumpadEnter);
        assert_ne!(keysym_to_key(0xff8d), keysym_to_key(0xff0d));
    }

    #[test]
    fn unmapped_keysyms_are_unknown() {
        for keysym in [0, 0x00e9, 0x1008ff13, 0xffca, 0xfe50] {
            assert_eq!(keysym_to_key(keysym), Key::Unknown, "{keysym:#x}");
        }
    }

    #[test]
    fn buttons() {
        assert_eq!(x_button_to_button(1), Button::Left);
        assert_eq!(x_button_to_button(2), Button::Middle);
        assert_eq!(x_button_to_button(3), Button::Right);
        assert_eq!(x_button_to_button(8), Button::Button4);
        assert_eq!(x_button_to_button(9), Button::Button5);
        for wheel in 4..=7 {
            assert_eq!(x_button_to_button(wheel), Button::Unknown);
        }
    }
}

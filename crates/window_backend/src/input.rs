//! Normalized keys and mouse buttons plus the per frame state machine they go through.
//!
//! The backends map native codes (x11 keysyms, win32 virtual keys, macos virtual keycodes) to
//! [`Key`] and [`Button`]. anything they cannot map becomes `Unknown`, which [`InputState`] never
//! tracks.
//!
//! transitions, applied by the backend while draining events:
//!
//! | current  | press     | release  | next poll |
//! |----------|-----------|----------|-----------|
//! | Up       | Pressed   | Released | Up        |
//! | Pressed  | Repeated  | Released | Down      |
//! | Down     | Repeated  | Released | Down      |
//! | Repeated | Repeated  | Released | Repeated  |
//! | Released | Pressed   | Released | Up        |

use std::collections::HashMap;

/// A keyboard key, named after its position on a US layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Unknown,

    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    Num0,
    Num1,
    Num2,
    Num3,
    Num4,
    Num5,
    Num6,
    Num7,
    Num8,
    Num9,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    LeftShift,
    RightShift,
    LeftControl,
    RightControl,
    LeftAlt,
    RightAlt,
    /// windows key, command key on macos
    LeftSuper,
    RightSuper,

    Space,
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    CapsLock,
    ScrollLock,
    NumLock,
    PrintScreen,
    Pause,

    Up,
    Down,
    Left,
    Right,

    Home,
    End,
    PageUp,
    PageDown,
    Insert,

    /// `
    GraveAccent,
    Minus,
    Equal,
    LeftBracket,
    RightBracket,
    Backslash,
    Semicolon,
    Apostrophe,
    Comma,
    Period,
    Slash,

    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    NumpadDecimal,
    NumpadDivide,
    NumpadMultiply,
    NumpadSubtract,
    NumpadAdd,
    NumpadEnter,
    NumpadEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Button {
    Unknown,
    Left,
    Right,
    Middle,
    /// usually "back"
    Button4,
    /// usually "forward"
    Button5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyState {
    /// went down since the last poll
    Pressed,
    Down,
    /// went up since the last poll
    Released,
    #[default]
    Up,
    /// held and the os sent an auto-repeat
    Repeated,
}

impl KeyState {
    pub fn is_down(self) -> bool {
        matches!(self, Self::Pressed | Self::Down | Self::Repeated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ButtonState {
    Pressed,
    Down,
    Released,
    #[default]
    Up,
}

impl ButtonState {
    pub fn is_down(self) -> bool {
        matches!(self, Self::Pressed | Self::Down)
    }
}

/// Key and button states of one window. keys that were never seen are implicitly [`KeyState::Up`].
#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys: HashMap<Key, KeyState>,
    buttons: HashMap<Button, ButtonState>,
}

impl InputState {
    /// demotes this-frame states to steady ones. backends call this before draining new events.
    pub fn begin_poll(&mut self) {
        for state in self.keys.values_mut() {
            *state = match *state {
                KeyState::Pressed => KeyState::Down,
                KeyState::Released => KeyState::Up,
                other => other,
            };
        }
        for state in self.buttons.values_mut() {
            *state = match *state {
                ButtonState::Pressed => ButtonState::Down,
                ButtonState::Released => ButtonState::Up,
                other => other,
            };
        }
    }

    /// a native key down event. an already held key becomes [`KeyState::Repeated`].
    pub fn key_pressed(&mut self, key: Key) {
        if key == Key::Unknown {
            return;
        }
        let state = self.keys.entry(key).or_default();
        *state = match *state {
            KeyState::Up | KeyState::Released => KeyState::Pressed,
            _ => KeyState::Repeated,
        };
    }

    pub fn key_released(&mut self, key: Key) {
        if key == Key::Unknown {
            return;
        }
        self.keys.insert(key, KeyState::Released);
    }

    pub fn button_pressed(&mut self, button: Button) {
        if button == Button::Unknown {
            return;
        }
        self.buttons.insert(button, ButtonState::Pressed);
    }

    pub fn button_released(&mut self, button: Button) {
        if button == Button::Unknown {
            return;
        }
        self.buttons.insert(button, ButtonState::Released);
    }

    pub fn key(&self, key: Key) -> KeyState {
        self.keys.get(&key).copied().unwrap_or_default()
    }

    pub fn button(&self, button: Button) -> ButtonState {
        self.buttons.get(&button).copied().unwrap_or_default()
    }

    /// keys with a tracked state, in no particular order
    pub fn tracked_keys(&self) -> impl Iterator<Item = (Key, KeyState)> + '_ {
        self.keys.iter().map(|(k, s)| (*k, *s))
    }

    /// releases everything currently held, eg: when the window loses focus and the os stops sending
    /// key up events to it.
    pub fn release_all(&mut self) {
        for state in self.keys.values_mut() {
            if state.is_down() {
                *state = KeyState::Released;
            }
        }
        for state in self.buttons.values_mut() {
            if state.is_down() {
                *state = ButtonState::Released;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_then_idle_polls() {
        let mut input = InputState::default();
        assert_eq!(input.key(Key::A), KeyState::Up);
        input.key_pressed(Key::A);
        let mut seen = vec![input.key(Key::A)];
        for _ in 0..3 {
            input.begin_poll();
            seen.push(input.key(Key::A));
        }
        assert_eq!(
            seen,
            [KeyState::Pressed, KeyState::Down, KeyState::Down, KeyState::Down]
        );
    }

    #[test]
    fn release_then_idle_polls() {
        let mut input = InputState::default();
        input.key_pressed(Key::Space);
        input.begin_poll();
        input.key_released(Key::Space);
        let mut seen = vec![input.key(Key::Space)];
        for _ in 0..2 {
            input.begin_poll();
            seen.push(input.key(Key::Space));
        }
        assert_eq!(seen, [KeyState::Released, KeyState::Up, KeyState::Up]);
    }

    #[test]
    fn press_while_down_is_a_repeat() {
        let mut input = InputState::default();
        input.key_pressed(Key::Left);
        input.begin_poll();
        input.key_pressed(Key::Left);
        assert_eq!(input.key(Key::Left), KeyState::Repeated);
        input.begin_poll();
        assert_eq!(input.key(Key::Left), KeyState::Repeated);
        assert!(input.key(Key::Left).is_down());
        input.key_released(Key::Left);
        assert_eq!(input.key(Key::Left), KeyState::Released);
        // a fresh press after release is a press again
        input.key_pressed(Key::Left);
        assert_eq!(input.key(Key::Left), KeyState::Pressed);
    }

    #[test]
    fn unknown_is_never_tracked() {
        let mut input = InputState::default();
        input.key_pressed(Key::Unknown);
        input.key_released(Key::Unknown);
        input.button_pressed(Button::Unknown);
        assert_eq!(input.tracked_keys().count(), 0);
        assert_eq!(input.key(Key::Unknown), KeyState::Up);
        assert_eq!(input.button(Button::Unknown), ButtonState::Up);
    }

    #[test]
    fn buttons() {
        let mut input = InputState::default();
        input.button_pressed(Button::Right);
        assert_eq!(input.button(Button::Right), ButtonState::Pressed);
        input.begin_poll();
        assert_eq!(input.button(Button::Right), ButtonState::Down);
        assert!(input.button(Button::Right).is_down());
        input.button_released(Button::Right);
        input.begin_poll();
        assert_eq!(input.button(Button::Right), ButtonState::Up);
        assert_eq!(input.button(Button::Left), ButtonState::Up);
    }

    #[test]
    fn release_all_on_focus_loss() {
        let mut input = InputState::default();
        input.key_pressed(Key::LeftAlt);
        input.button_pressed(Button::Left);
        input.key_pressed(Key::Q);
        input.key_released(Key::Q);
        input.release_all();
        assert_eq!(input.key(Key::LeftAlt), KeyState::Released);
        assert_eq!(input.button(Button::Left), ButtonState::Released);
        input.begin_poll();
        assert_eq!(input.key(Key::LeftAlt), KeyState::Up);
        assert_eq!(input.key(Key::Q), KeyState::Up);
    }
}

//! `window_backend` is the contract every native gl window backend implements.
//!
//! A backend owns exactly one native window, one gl context made current on the thread that created
//! it, and the os event queue of that window. the frame driver only ever talks to it through
//! [`Window`]:
//! 1. `poll` drains pending os events into [`InputState`] and reports whether the window is still
//!    open.
//! 2. the caller draws with the [`OpenGl`] binding returned by `gl`.
//! 3. `swap` presents the back buffer.
//!
//! Geometry is always in physical pixels with the origin at the top left of the client area. the
//! [`Window::scale`] factor converts logical sizes to physical ones, see [`scale`] for how it is
//! detected.
//!
//! The helpers in here ([`negotiate`], [`Teardown`], [`ThreadAffinity`]) are the parts of window
//! creation that are identical on every os, so backends only contain the native calls.

use std::rc::Rc;

pub use gl_binding;
pub use gl_binding::OpenGl;
pub use keyboard_types::Modifiers;
pub use native_library;
pub use raw_window_handle;

mod input;
mod lifecycle;
mod pixel_format;
pub mod scale;

pub use input::*;
pub use lifecycle::*;
pub use pixel_format::*;

/// The kind of context requested from the os.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlProfile {
    /// 3.2+ core, forward compatible where the os distinguishes it (4.1 on macos).
    /// backends fall back to a legacy context when the os cannot create one.
    #[default]
    Core,
    /// whatever the legacy context creation path gives. usually the newest compatibility profile.
    Compat,
}

/// Intended to provide a common struct which all window backends accept as their configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    /// initial client area size in logical pixels. backends create the window at
    /// [`WindowConfig::physical_size`] for the scale they detect.
    pub width: u32,
    pub height: u32,
    pub profile: GlProfile,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glwin".to_string(),
            width: 800,
            height: 600,
            profile: GlProfile::Core,
        }
    }
}

impl WindowConfig {
    /// The initial client area size in physical pixels on a display with `scale`. never zero, since
    /// no os accepts an empty window.
    pub fn physical_size(&self, scale: f32) -> [u32; 2] {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        [self.width, self.height].map(|logical| ((logical as f32 * scale).round() as u32).max(1))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error(transparent)]
    Library(#[from] native_library::Error),
    #[error("failed to load opengl: {0}")]
    Gl(#[from] gl_binding::LoadError),
    #[error("window must be created and used on the main thread")]
    NotMainThread,
    #[error("cannot connect to the display server: {0}")]
    Display(String),
    #[error("no usable pixel format: {0}")]
    PixelFormat(#[from] PixelFormatError),
    #[error("failed to create native window: {0}")]
    CreateWindow(String),
    #[error("failed to create gl context: {0}")]
    CreateContext(String),
    #[error("failed to make the gl context current")]
    MakeCurrent,
    #[error("window is already closed")]
    Closed,
}

/// Implemented by the native window backends.
///
/// All methods must be called from the thread that created the window. implementations are `!Send`.
pub trait Window {
    /// the gl binding loaded for this window's context. fails once the window is closed.
    fn gl(&self) -> Result<Rc<OpenGl>, WindowError>;
    /// drains pending os events without blocking. returns false once the window was closed by the
    /// user or by [`Window::close`]. callers must stop their frame loop at that point.
    fn poll(&mut self) -> bool;
    /// presents the back buffer. no-op after close.
    fn swap(&mut self);
    /// framebuffer size in physical pixels
    fn backing_size(&self) -> [u32; 2];
    /// pointer position in physical pixels, origin top left, y down.
    fn cursor(&self) -> [f32; 2];
    /// logical to physical pixel multiplier
    fn scale(&self) -> f32;
    fn key_state(&self, key: Key) -> KeyState;
    fn button_state(&self, button: Button) -> ButtonState;
    /// releases the context and the window in reverse order of creation. safe to call more than
    /// once.
    fn close(&mut self);
    /// modifier keys currently held down
    fn modifiers(&self) -> Modifiers {
        let mut modifiers = Modifiers::empty();
        for (keys, modifier) in [
            ([Key::LeftShift, Key::RightShift], Modifiers::SHIFT),
            ([Key::LeftControl, Key::RightControl], Modifiers::CONTROL),
            ([Key::LeftAlt, Key::RightAlt], Modifiers::ALT),
            ([Key::LeftSuper, Key::RightSuper], Modifiers::META),
        ] {
            if keys.iter().any(|key| self.key_state(*key).is_down()) {
                modifiers |= modifier;
            }
        }
        modifiers
    }
}

impl<W: Window + ?Sized> Window for Box<W> {
    fn gl(&self) -> Result<Rc<OpenGl>, WindowError> {
        (**self).gl()
    }
    fn poll(&mut self) -> bool {
        (**self).poll()
    }
    fn swap(&mut self) {
        (**self).swap()
    }
    fn backing_size(&self) -> [u32; 2] {
        (**self).backing_size()
    }
    fn cursor(&self) -> [f32; 2] {
        (**self).cursor()
    }
    fn scale(&self) -> f32 {
        (**self).scale()
    }
    fn key_state(&self, key: Key) -> KeyState {
        (**self).key_state(key)
    }
    fn button_state(&self, button: Button) -> ButtonState {
        (**self).button_state(button)
    }
    fn close(&mut self) {
        (**self).close()
    }
    fn modifiers(&self) -> Modifiers {
        (**self).modifiers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Keys(InputState);

    impl Window for Keys {
        fn gl(&self) -> Result<Rc<OpenGl>, WindowError> {
            Err(WindowError::Closed)
        }
        fn poll(&mut self) -> bool {
            self.0.begin_poll();
            true
        }
        fn swap(&mut self) {}
        fn backing_size(&self) -> [u32; 2] {
            [0, 0]
        }
        fn cursor(&self) -> [f32; 2] {
            [0.0, 0.0]
        }
        fn scale(&self) -> f32 {
            1.0
        }
        fn key_state(&self, key: Key) -> KeyState {
            self.0.key(key)
        }
        fn button_state(&self, button: Button) -> ButtonState {
            self.0.button(button)
        }
        fn close(&mut self) {}
    }

    #[test]
    fn modifiers_follow_held_keys() {
        let mut window = Keys(InputState::default());
        assert_eq!(window.modifiers(), Modifiers::empty());
        window.0.key_pressed(Key::RightShift);
        window.0.key_pressed(Key::LeftControl);
        assert_eq!(window.modifiers(), Modifiers::SHIFT | Modifiers::CONTROL);
        window.poll();
        // still held after demotion to Down
        assert_eq!(window.modifiers(), Modifiers::SHIFT | Modifiers::CONTROL);
        window.0.key_released(Key::RightShift);
        assert_eq!(window.modifiers(), Modifiers::CONTROL);
        let boxed: Box<dyn Window> = Box::new(window);
        assert_eq!(boxed.modifiers(), Modifiers::CONTROL);
    }

    #[test]
    fn physical_size_applies_the_scale() {
        let config = WindowConfig::default();
        assert_eq!(config.physical_size(1.0), [800, 600]);
        assert_eq!(config.physical_size(1.5), [1200, 900]);
        assert_eq!(config.physical_size(1.25), [1000, 750]);
    }

    #[test]
    fn physical_size_is_never_empty() {
        let config = WindowConfig {
            width: 0,
            height: 3,
            ..Default::default()
        };
        assert_eq!(config.physical_size(0.5), [1, 2]);
        // a broken scale falls back to 1
        assert_eq!(config.physical_size(0.0), [1, 3]);
        assert_eq!(config.physical_size(f32::NAN), [1, 3]);
    }

    #[test]
    fn default_config() {
        let config = WindowConfig::default();
        assert_eq!([config.width, config.height], [800, 600]);
        assert_eq!(config.profile, GlProfile::Core);
    }
}

//! `glwin` opens a native window with an OpenGL context and drives a frame loop on it.
//!
//! Nothing links against the windowing system or the gl library. every native call is resolved
//! at runtime through [`native_library`](window_backend::native_library), so the binary starts on
//! machines without development headers and only fails when a window is actually requested.
//!
//! ```no_run
//! use glwin::{GlWindow, GlWindowConfig, Key};
//!
//! let window = GlWindow::new(GlWindowConfig::default())?;
//! window.run(|frame| {
//!     if frame.key_state(Key::Escape).is_down() {
//!         frame.request_close();
//!     }
//!     Ok::<(), glwin::Error>(())
//! })?;
//! # Ok::<(), glwin::Error>(())
//! ```
//!
//! The window and the context belong to the thread that created them. a producer on another thread
//! hands pixels to the render thread through [`SharedPixels`].

pub use gl_binding::{consts, GlCapabilities, GlVersion, OpenGl};
pub use window_backend::{
    Button, ButtonState, GlProfile, Key, KeyState, Modifiers, Window, WindowConfig, WindowError,
};
pub use gl_binding;
pub use window_backend;

mod driver;
mod frame;
mod platform;
mod texture;

pub use driver::*;
pub use frame::*;
pub use platform::*;
pub use texture::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Window(#[from] WindowError),
    #[error("no window backend for this platform")]
    Unsupported,
    #[error("opengl {found} is older than the required {required}")]
    GlTooOld { found: GlVersion, required: GlVersion },
    #[error("expected {expected} bytes of pixel data, got {actual}")]
    PixelLength { expected: usize, actual: usize },
    #[error("cannot upload {pixels:?} pixels to a {texture:?} texture")]
    FormatMismatch {
        texture: TextureFormat,
        pixels: TextureFormat,
    },
    #[error("region {region:?} does not fit a {width}x{height} texture")]
    OutOfBounds {
        /// x, y, width, height
        region: [u32; 4],
        width: u32,
        height: u32,
    },
}

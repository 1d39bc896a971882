//! Xlib + GLX window backend.
//!
//! `libX11.so.6` and `libGL.so.1` are opened at runtime, nothing links against them. the keysym
//! table in [`keymap`] is plain data and builds everywhere, the window itself only on linux.

pub mod keymap;

#[cfg(target_os = "linux")]
mod ffi;
#[cfg(target_os = "linux")]
mod window;

#[cfg(target_os = "linux")]
pub use window::X11Window;

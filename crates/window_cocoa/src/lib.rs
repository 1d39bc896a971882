//! AppKit + NSOpenGL window backend.
//!
//! Nothing links against AppKit. `libobjc` is opened at runtime and every Cocoa call is an
//! `objc_msgSend` through [`native_library`]. the keycode table in [`keymap`] builds everywhere.

pub mod keymap;

#[cfg(target_os = "macos")]
mod ffi;
#[cfg(target_os = "macos")]
mod window;

#[cfg(target_os = "macos")]
pub use window::CocoaWindow;

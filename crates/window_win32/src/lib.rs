//! Win32 + WGL window backend.
//!
//! `user32.dll`, `gdi32.dll`, `opengl32.dll` and `kernel32.dll` are opened at runtime through
//! [`native_library`]. the virtual key table in [`keymap`] builds everywhere, the window only on
//! windows.

pub mod keymap;

#[cfg(target_os = "windows")]
mod ffi;
#[cfg(target_os = "windows")]
mod window;

#[cfg(target_os = "windows")]
pub use window::Win32Window;

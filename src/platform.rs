use window_backend::{Window, WindowConfig};

use crate::Error;

/// Creates the native window of the target os: Xlib + GLX on linux, Win32 + WGL on windows,
/// AppKit + NSOpenGL on macos. the backend is picked at compile time.
///
/// Must be called on the thread that will run the frame loop (the main thread on macos).
pub fn open_window(config: &WindowConfig) -> Result<Box<dyn Window>, Error> {
    tracing::debug!(
        title = %config.title,
        width = config.width,
        height = config.height,
        profile = ?config.profile,
        "opening window"
    );
    open_native(config)
}

#[cfg(target_os = "linux")]
fn open_native(config: &WindowConfig) -> Result<Box<dyn Window>, Error> {
    Ok(Box::new(window_x11::X11Window::new(config)?))
}

#[cfg(target_os = "windows")]
fn open_native(config: &WindowConfig) -> Result<Box<dyn Window>, Error> {
    Ok(Box::new(window_win32::Win32Window::new(config)?))
}

#[cfg(target_os = "macos")]
fn open_native(config: &WindowConfig) -> Result<Box<dyn Window>, Error> {
    Ok(Box::new(window_cocoa::CocoaWindow::new(config)?))
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
fn open_native(_config: &WindowConfig) -> Result<Box<dyn Window>, Error> {
    Err(Error::Unsupported)
}

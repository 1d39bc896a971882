use std::rc::Rc;

use gl_binding::OpenGl;
use native_library::Library;
use raw_window_handle::{
    AppKitDisplayHandle, AppKitWindowHandle, HasRawDisplayHandle, HasRawWindowHandle,
    RawDisplayHandle, RawWindowHandle,
};
use window_backend::{
    negotiate, Button, ButtonState, GlProfile, InputState, Key, KeyState, LifecycleState,
    PixelFormatInfo, PixelFormatRequirement, Teardown, ThreadAffinity, Window, WindowConfig,
    WindowError,
};

use crate::ffi::*;
use crate::keymap::{
    keycode_to_key, modifier_mask, mouse_event_button, NS_EVENT_FLAGS_CHANGED, NS_EVENT_KEY_DOWN,
    NS_EVENT_KEY_UP,
};

/// An NSWindow with an NSOpenGLContext current on the main thread.
pub struct CocoaWindow {
    runtime: Runtime,
    core_foundation: CoreFoundation,
    /// `kCFRunLoopDefaultMode`
    default_mode: Id,
    app: Id,
    window: Id,
    view: Id,
    context: Id,
    gl: Option<Rc<OpenGl>>,
    input: InputState,
    running: bool,
    was_key_window: bool,
    last_backing_size: [u32; 2],
    state: LifecycleState,
    teardown: Teardown,
    _affinity: ThreadAffinity,
}

fn requirement() -> PixelFormatRequirement {
    PixelFormatRequirement {
        min_depth_bits: 24,
        ..Default::default()
    }
}

fn pixel_format_attributes(profile: u32, accelerated: bool) -> Vec<u32> {
    let mut attributes = Vec::with_capacity(12);
    if accelerated {
        attributes.push(NSOpenGLPFAAccelerated);
    }
    attributes.extend([
        NSOpenGLPFADoubleBuffer,
        NSOpenGLPFAColorSize, 24,
        NSOpenGLPFAAlphaSize, 8,
        NSOpenGLPFADepthSize, 24,
        NSOpenGLPFAOpenGLProfile, profile,
        0,
    ]);
    attributes
}

unsafe fn create_pixel_format<'a>(
    runtime: &'a Runtime,
    profile: u32,
    accelerated: bool,
) -> Option<Owned<'a>> {
    let attributes = pixel_format_attributes(profile, accelerated);
    let allocated = runtime.alloc(b"NSOpenGLPixelFormat\0");
    // init on nil is nil
    Owned::new(runtime, runtime.send(allocated, b"initWithAttributes:\0", (attributes.as_ptr(),)))
}

unsafe fn describe_pixel_format(runtime: &Runtime, format: Id) -> PixelFormatInfo {
    let value = |attribute: u32| {
        let mut value = 0i32;
        runtime.send::<_, ()>(
            format,
            b"getValues:forAttribute:forVirtualScreen:\0",
            (&mut value as *mut i32, attribute, 0i32),
        );
        value.clamp(0, u8::MAX as i32) as u8
    };
    PixelFormatInfo {
        double_buffer: value(NSOpenGLPFADoubleBuffer) != 0,
        // NSOpenGL formats are always rgba
        rgba: true,
        color_bits: value(NSOpenGLPFAColorSize),
        alpha_bits: value(NSOpenGLPFAAlphaSize),
        depth_bits: value(NSOpenGLPFADepthSize),
        stencil_bits: value(NSOpenGLPFAStencilSize),
    }
}

/// Negotiates a pixel format: the requested profile with hardware acceleration first, then without
/// acceleration, then the legacy profile.
unsafe fn choose_pixel_format(
    runtime: &Runtime,
    profile: GlProfile,
) -> Result<(Owned<'_>, u32), WindowError> {
    let requested = match profile {
        GlProfile::Core => NSOpenGLProfileVersion4_1Core,
        GlProfile::Compat => NSOpenGLProfileVersionLegacy,
    };
    let describe = &|profile: u32, accelerated: bool| {
        let format = create_pixel_format(runtime, profile, accelerated)?;
        let info = describe_pixel_format(runtime, format.get());
        Some(((format, profile), info))
    };
    let best = describe(requested, true);
    // formats created here and rejected are released as they drop
    let ((format, chosen), info) = negotiate(&requirement(), best, move || {
        [
            (requested, false),
            (NSOpenGLProfileVersionLegacy, true),
            (NSOpenGLProfileVersionLegacy, false),
        ]
        .into_iter()
        .filter_map(move |(profile, accelerated)| describe(profile, accelerated))
    })?;
    if chosen != requested {
        tracing::warn!(?profile, "requested gl profile is unavailable, using the legacy profile");
    }
    tracing::debug!(?info, profile = chosen, "chose nsopengl pixel format");
    Ok((format, chosen))
}

impl CocoaWindow {
    pub fn new(config: &WindowConfig) -> Result<Self, WindowError> {
        let affinity = ThreadAffinity::current();
        let runtime = Runtime::load(Library::open(LIBOBJC)?)?;
        // registers the AppKit classes with the runtime
        Library::open(APPKIT)?;
        let core_foundation_library = Library::open(CORE_FOUNDATION)?;
        let core_foundation = CoreFoundation::load(core_foundation_library)?;

        let mut teardown = Teardown::new();
        // SAFETY: every message below matches the AppKit signature of its selector. objects are
        // released in reverse order through `teardown`.
        unsafe {
            let is_main: Bool = runtime.send(runtime.class(b"NSThread\0"), b"isMainThread\0", ());
            if is_main == NO {
                return Err(WindowError::NotMainThread);
            }
            let default_mode =
                *core_foundation_library.function::<*const Id>("kCFRunLoopDefaultMode")?;

            let pool: Id = runtime.send(runtime.alloc(b"NSAutoreleasePool\0"), b"init\0", ());
            teardown.push("autorelease pool", move || runtime.release(pool));

            let app: Id =
                runtime.send(runtime.class(b"NSApplication\0"), b"sharedApplication\0", ());
            if app.is_null() {
                return Err(WindowError::Display("NSApplication is unavailable".to_string()));
            }
            runtime.send::<_, Bool>(
                app,
                b"setActivationPolicy:\0",
                (NSApplicationActivationPolicyRegular,),
            );
            runtime.send::<_, ()>(app, b"finishLaunching\0", ());
            tracing::debug!("nsapplication launched");

            let frame = NSRect {
                origin: NSPoint { x: 100.0, y: 100.0 },
                size: NSSize {
                    width: f64::from(config.width.max(1)),
                    height: f64::from(config.height.max(1)),
                },
            };
            let style = NSWindowStyleMaskTitled
                | NSWindowStyleMaskClosable
                | NSWindowStyleMaskMiniaturizable
                | NSWindowStyleMaskResizable;
            let window: Id = runtime.send(
                runtime.alloc(b"NSWindow\0"),
                b"initWithContentRect:styleMask:backing:defer:\0",
                (frame, style, NSBackingStoreBuffered, NO),
            );
            if window.is_null() {
                return Err(WindowError::CreateWindow("NSWindow init failed".to_string()));
            }
            teardown.push("window", move || {
                runtime.send::<_, ()>(window, b"close\0", ());
                runtime.release(window);
            });
            runtime.send::<_, ()>(window, b"center\0", ());
            runtime.send::<_, ()>(window, b"setAcceptsMouseMovedEvents:\0", (YES,));
            // closing only hides it, `close` releases it
            runtime.send::<_, ()>(window, b"setReleasedWhenClosed:\0", (NO,));
            runtime.send::<_, ()>(window, b"setTitle:\0", (runtime.string(&config.title),));

            let view: Id = runtime.send(window, b"contentView\0", ());
            if view.is_null() {
                return Err(WindowError::CreateWindow("window has no content view".to_string()));
            }
            runtime.send::<_, ()>(view, b"setWantsBestResolutionOpenGLSurface:\0", (YES,));

            let (format, profile) = choose_pixel_format(&runtime, config.profile)?;
            let context: Id = runtime.send(
                runtime.alloc(b"NSOpenGLContext\0"),
                b"initWithFormat:shareContext:\0",
                (format.get(), nil),
            );
            drop(format);
            if context.is_null() {
                return Err(WindowError::CreateContext("NSOpenGLContext init failed".to_string()));
            }
            teardown.push("gl context", move || runtime.release(context));
            runtime.send::<_, ()>(context, b"setView:\0", (view,));
            runtime.send::<_, ()>(context, b"makeCurrentContext\0", ());
            teardown.push("current context", move || {
                let class = runtime.class(b"NSOpenGLContext\0");
                runtime.send::<_, ()>(class, b"clearCurrentContext\0", ());
            });
            let swap_interval = 1i32;
            runtime.send::<_, ()>(
                context,
                b"setValues:forParameter:\0",
                (&swap_interval as *const i32, NSOpenGLContextParameterSwapInterval),
            );

            let gl = OpenGl::load_system(None)?;
            tracing::info!(
                version = %gl.get_string(gl_binding::consts::VERSION),
                renderer = %gl.renderer(),
                profile,
                "created nsopengl context"
            );

            runtime.send::<_, ()>(window, b"makeKeyAndOrderFront:\0", (nil,));
            runtime.send::<_, ()>(app, b"activateIgnoringOtherApps:\0", (YES,));

            let mut created = Self {
                runtime,
                core_foundation,
                default_mode,
                app,
                window,
                view,
                context,
                gl: Some(Rc::new(gl)),
                input: InputState::default(),
                running: true,
                was_key_window: true,
                last_backing_size: [0, 0],
                state: LifecycleState::Running,
                teardown,
                _affinity: affinity,
            };
            created.last_backing_size = created.backing_size();
            Ok(created)
        }
    }

    /// Tracks key, modifier and button events. returns true when the event is consumed, key events
    /// are not forwarded so unhandled keys do not beep.
    unsafe fn track_event(&mut self, event: Id) -> bool {
        let runtime = &self.runtime;
        let event_type: u64 = runtime.send(event, b"type\0", ());
        match event_type {
            NS_EVENT_KEY_DOWN | NS_EVENT_KEY_UP => {
                let keycode: u16 = runtime.send(event, b"keyCode\0", ());
                let key = keycode_to_key(keycode);
                if event_type == NS_EVENT_KEY_DOWN {
                    self.input.key_pressed(key);
                } else {
                    self.input.key_released(key);
                }
                true
            }
            NS_EVENT_FLAGS_CHANGED => {
                let keycode: u16 = runtime.send(event, b"keyCode\0", ());
                let key = keycode_to_key(keycode);
                if let Some(mask) = modifier_mask(key) {
                    let flags: u64 = runtime.send(event, b"modifierFlags\0", ());
                    if flags & mask != 0 {
                        self.input.key_pressed(key);
                    } else {
                        self.input.key_released(key);
                    }
                }
                false
            }
            _ => {
                if mouse_event_button(event_type, 0).is_some() {
                    let number: i64 = runtime.send(event, b"buttonNumber\0", ());
                    if let Some((button, pressed)) = mouse_event_button(event_type, number) {
                        if pressed {
                            self.input.button_pressed(button);
                        } else {
                            self.input.button_released(button);
                        }
                    }
                }
                false
            }
        }
    }
}

impl Window for CocoaWindow {
    fn gl(&self) -> Result<Rc<OpenGl>, WindowError> {
        self.gl.clone().ok_or(WindowError::Closed)
    }

    fn poll(&mut self) -> bool {
        if self.state.is_closed() || !self.running {
            return false;
        }
        self.input.begin_poll();
        let runtime = self.runtime;
        // SAFETY: app, window, view and context stay alive until close, which flips the state above
        unsafe {
            // events and strings autoreleased during this poll
            let pool: Id = runtime.send(runtime.alloc(b"NSAutoreleasePool\0"), b"init\0", ());
            (self.core_foundation.run_loop_run_in_mode)(self.default_mode, 0.0, 1);
            loop {
                let event: Id = runtime.send(
                    self.app,
                    b"nextEventMatchingMask:untilDate:inMode:dequeue:\0",
                    (NSEventMaskAny, nil, self.default_mode, YES),
                );
                if event.is_null() {
                    break;
                }
                if !self.track_event(event) {
                    runtime.send::<_, ()>(self.app, b"sendEvent:\0", (event,));
                }
            }
            runtime.send::<_, ()>(self.app, b"updateWindows\0", ());

            let visible: Bool = runtime.send(self.window, b"isVisible\0", ());
            if visible == NO {
                tracing::debug!("window closed by the user");
                self.running = false;
            }
            let is_key: Bool = runtime.send(self.window, b"isKeyWindow\0", ());
            if self.was_key_window && is_key == NO {
                self.input.release_all();
            }
            self.was_key_window = is_key != NO;

            let backing_size = self.backing_size();
            if backing_size != self.last_backing_size {
                runtime.send::<_, ()>(self.context, b"update\0", ());
                self.last_backing_size = backing_size;
            }
            runtime.release(pool);
        }
        self.running
    }

    fn swap(&mut self) {
        if self.state.is_closed() {
            return;
        }
        // SAFETY: the context is released only by close
        unsafe { self.runtime.send::<_, ()>(self.context, b"flushBuffer\0", ()) }
    }

    fn backing_size(&self) -> [u32; 2] {
        if self.state.is_closed() {
            return [0, 0];
        }
        // SAFETY: the view is owned by the window, alive until close
        let backing: NSRect = unsafe {
            let bounds: NSRect = self.runtime.send_stret(self.view, b"bounds\0", ());
            self.runtime.send_stret(self.view, b"convertRectToBacking:\0", (bounds,))
        };
        [backing.size.width.max(0.0) as u32, backing.size.height.max(0.0) as u32]
    }

    /// appkit puts the origin bottom left, it is flipped against the backing height
    fn cursor(&self) -> [f32; 2] {
        if self.state.is_closed() {
            return [0.0, 0.0];
        }
        // SAFETY: window and view are alive until close
        let backing: NSRect = unsafe {
            let location: NSPoint =
                self.runtime.send(self.window, b"mouseLocationOutsideOfEventStream\0", ());
            let rect = NSRect {
                origin: location,
                size: NSSize::default(),
            };
            self.runtime.send_stret(self.view, b"convertRectToBacking:\0", (rect,))
        };
        let [_, height] = self.backing_size();
        [backing.origin.x as f32, height as f32 - backing.origin.y as f32]
    }

    /// backing sizes and the cursor are already in physical pixels
    fn scale(&self) -> f32 {
        1.0
    }

    fn key_state(&self, key: Key) -> KeyState {
        self.input.key(key)
    }

    fn button_state(&self, button: Button) -> ButtonState {
        self.input.button(button)
    }

    fn close(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.gl = None;
        self.running = false;
        self.state = LifecycleState::Closed;
        self.teardown.run();
        tracing::debug!("cocoa window closed");
    }
}

impl Drop for CocoaWindow {
    fn drop(&mut self) {
        self.close();
    }
}

unsafe impl HasRawWindowHandle for CocoaWindow {
    fn raw_window_handle(&self) -> RawWindowHandle {
        let mut handle = AppKitWindowHandle::empty();
        handle.ns_window = self.window;
        handle.ns_view = self.view;
        RawWindowHandle::AppKit(handle)
    }
}

unsafe impl HasRawDisplayHandle for CocoaWindow {
    fn raw_display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::AppKit(AppKitDisplayHandle::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// AppKit only runs on the main thread, which the test harness does not use unless run with
    /// `--test-threads=1`.
    #[test]
    fn closed_window_stops_polling() {
        let mut window = match CocoaWindow::new(&WindowConfig::default()) {
            Ok(window) => window,
            Err(WindowError::NotMainThread) => {
                eprintln!("not on the main thread, skipping");
                return;
            }
            Err(e) => {
                eprintln!("no usable nsopengl context, skipping: {e}");
                return;
            }
        };
        assert!(window.gl().is_ok());
        assert!(window.poll());
        window.swap();

        window.close();
        assert!(!window.poll());
        assert!(matches!(window.gl(), Err(WindowError::Closed)));
        assert_eq!(window.backing_size(), [0, 0]);
        assert_eq!(window.cursor(), [0.0, 0.0]);
        window.swap();

        window.close();
        assert!(!window.poll());
        assert!(window.teardown.is_empty());
    }
}

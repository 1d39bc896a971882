use std::ffi::{c_int, c_uint, CStr, CString};
use std::ptr;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use gl_binding::OpenGl;
use native_library::Library;
use raw_window_handle::{
    HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle, XlibDisplayHandle,
    XlibWindowHandle,
};
use window_backend::{
    negotiate, scale, Button, ButtonState, GlProfile, InputState, Key, KeyState, LifecycleState,
    PixelFormatInfo, PixelFormatRequirement, Teardown, ThreadAffinity, Window, WindowConfig,
    WindowError,
};

use crate::ffi::*;
use crate::keymap::{keysym_to_key, x_button_to_button};

const EVENT_MASK: std::ffi::c_long = ExposureMask
    | StructureNotifyMask
    | KeyPressMask
    | KeyReleaseMask
    | ButtonPressMask
    | ButtonReleaseMask
    | PointerMotionMask
    | FocusChangeMask;

/// An Xlib window with a GLX context current on the creating thread.
pub struct X11Window {
    xlib: Xlib,
    glx: Glx,
    display: *mut Display,
    screen: c_int,
    window: XWindow,
    visual_id: std::ffi::c_ulong,
    wm_delete_window: Atom,
    gl: Option<Rc<OpenGl>>,
    input: InputState,
    scale: f32,
    running: bool,
    state: LifecycleState,
    teardown: Teardown,
    _affinity: ThreadAffinity,
}

/// A visual owned by xlib plus a context created for it.
struct ChosenContext {
    visual: *mut XVisualInfo,
    context: GLXContext,
}

impl X11Window {
    pub fn new(config: &WindowConfig) -> Result<Self, WindowError> {
        let affinity = ThreadAffinity::current();
        let x11_library = Library::open_any(LIBX11)?;
        let gl_library = Library::open_any(LIBGL)?;
        let xlib = Xlib::load(x11_library)?;
        let xlib_ext = XlibExt::load(x11_library);
        let glx = Glx::load(gl_library)?;
        let glx_ext = GlxExt::load(gl_library);

        let mut teardown = Teardown::new();
        // SAFETY: every pointer handed to xlib / glx below is either returned by them or lives on
        // this stack frame for the duration of the call.
        unsafe {
            let display = (xlib.open_display)(ptr::null());
            if display.is_null() {
                return Err(WindowError::Display(
                    "XOpenDisplay failed. is DISPLAY set?".to_string(),
                ));
            }
            teardown.push("display", move || {
                (xlib.close_display)(display);
            });
            tracing::debug!("connected to x display");

            if let Some(detectable) = xlib_ext.xkb_set_detectable_auto_repeat {
                // held keys then repeat as KeyPress only, without synthetic KeyRelease events
                let mut supported = False;
                detectable(display, True, &mut supported);
                if supported == False {
                    tracing::debug!("detectable auto repeat is not supported by this server");
                }
            }

            let screen = (xlib.default_screen)(display);
            let root = (xlib.root_window)(display, screen);

            let resources = xlib_ext
                .resource_manager_string
                .map(|resource_manager_string| resource_manager_string(display))
                .filter(|resources| !resources.is_null())
                .map(|resources| CStr::from_ptr(resources).to_string_lossy().into_owned());
            let physical = (
                (xlib.display_width)(display, screen),
                (xlib.display_width_mm)(display, screen),
            );
            let (scale, source) =
                scale::detect_scale_from_env(resources.as_deref(), Some(physical));
            tracing::debug!(scale, ?source, "detected display scale");

            let chosen = match create_fb_config_context(
                &xlib,
                &glx,
                &glx_ext,
                display,
                screen,
                config.profile,
            )? {
                Some(chosen) => chosen,
                None => create_legacy_context(&xlib, &glx, display, screen)?,
            };
            let visual = chosen.visual;
            teardown.push("visual info", move || {
                (xlib.free)(visual.cast());
            });
            // registered with the window below
            let context = chosen.context;

            let colormap = (xlib.create_colormap)(display, root, (*visual).visual, AllocNone);
            teardown.push("colormap", move || {
                (xlib.free_colormap)(display, colormap);
            });

            let mut attributes = XSetWindowAttributes {
                colormap,
                event_mask: EVENT_MASK,
                ..Default::default()
            };
            let [width, height] = config.physical_size(scale);
            let window = (xlib.create_window)(
                display,
                root,
                0,
                0,
                width,
                height,
                0,
                (*visual).depth,
                InputOutput,
                (*visual).visual,
                CWBorderPixel | CWColormap | CWEventMask,
                &mut attributes,
            );
            if window == 0 {
                (glx.destroy_context)(display, context);
                return Err(WindowError::CreateWindow("XCreateWindow failed".to_string()));
            }
            push_window_and_context(
                &mut teardown,
                move || {
                    (xlib.destroy_window)(display, window);
                },
                move || {
                    (glx.destroy_context)(display, context);
                },
            );

            let title = CString::new(config.title.replace('\0', "")).unwrap_or_default();
            (xlib.store_name)(display, window, title.as_ptr());
            let mut wm_delete_window =
                (xlib.intern_atom)(display, b"WM_DELETE_WINDOW\0".as_ptr().cast(), False);
            (xlib.set_wm_protocols)(display, window, &mut wm_delete_window, 1);

            if (glx.make_current)(display, window, context) == False {
                return Err(WindowError::MakeCurrent);
            }
            teardown.push("current context", move || {
                (glx.make_current)(display, 0, ptr::null_mut());
            });

            let gl = OpenGl::load_from(gl_library, glx_ext.get_proc_address)?;
            tracing::info!(
                version = %gl.get_string(gl_binding::consts::VERSION),
                renderer = %gl.renderer(),
                "created glx context"
            );

            (xlib.map_window)(display, window);
            (xlib.flush)(display);

            Ok(Self {
                xlib,
                glx,
                display,
                screen,
                window,
                visual_id: (*visual).visualid,
                wm_delete_window,
                gl: Some(Rc::new(gl)),
                input: InputState::default(),
                scale,
                running: true,
                state: LifecycleState::Running,
                teardown,
                _affinity: affinity,
            })
        }
    }
}

/// Registers a created window together with its context, so close destroys the context while the
/// window it was current on still exists: clear current, destroy context, destroy window.
fn push_window_and_context(
    teardown: &mut Teardown,
    destroy_window: impl FnOnce() + 'static,
    destroy_context: impl FnOnce() + 'static,
) {
    teardown.push("window", destroy_window);
    teardown.push("glx context", destroy_context);
}

static CONTEXT_CREATION_FAILED: AtomicBool = AtomicBool::new(false);

unsafe extern "system" fn record_context_error(_: *mut Display, _: *mut std::ffi::c_void) -> c_int {
    CONTEXT_CREATION_FAILED.store(true, Ordering::SeqCst);
    0
}

fn requirement() -> PixelFormatRequirement {
    PixelFormatRequirement {
        min_depth_bits: 24,
        ..Default::default()
    }
}

unsafe fn fb_config_info(
    glx_ext: &GlxExt,
    display: *mut Display,
    config: GLXFBConfig,
) -> Option<PixelFormatInfo> {
    let get_attrib = glx_ext.get_fb_config_attrib?;
    let attrib = |name: c_int| {
        let mut value = 0;
        (get_attrib(display, config, name, &mut value) == 0).then_some(value)
    };
    if attrib(GLX_X_RENDERABLE)? == 0 || attrib(GLX_DRAWABLE_TYPE)? & GLX_WINDOW_BIT == 0 {
        return None;
    }
    let bits = |name| attrib(name).map(|v| v.clamp(0, u8::MAX as c_int) as u8);
    Some(PixelFormatInfo {
        double_buffer: attrib(GLX_DOUBLEBUFFER)? != 0,
        rgba: attrib(GLX_RENDER_TYPE)? & GLX_RGBA_BIT != 0,
        color_bits: bits(GLX_RED_SIZE)?
            .saturating_add(bits(GLX_GREEN_SIZE)?)
            .saturating_add(bits(GLX_BLUE_SIZE)?),
        alpha_bits: bits(GLX_ALPHA_SIZE)?,
        depth_bits: bits(GLX_DEPTH_SIZE)?,
        stencil_bits: bits(GLX_STENCIL_SIZE)?,
    })
}

/// The GLX 1.3 path: negotiate an fbconfig, then ask `glXCreateContextAttribsARB` for a 3.x
/// context. `Ok(None)` means the path is unavailable or the server refused, and the legacy path
/// should be tried.
unsafe fn create_fb_config_context(
    xlib: &Xlib,
    glx: &Glx,
    glx_ext: &GlxExt,
    display: *mut Display,
    screen: c_int,
    profile: GlProfile,
) -> Result<Option<ChosenContext>, WindowError> {
    let (Some(choose_fb_config), Some(get_fb_configs), Some(get_visual), Some(get_proc_address)) = (
        glx_ext.choose_fb_config,
        glx_ext.get_fb_configs,
        glx_ext.get_visual_from_fb_config,
        glx_ext.get_proc_address,
    ) else {
        tracing::warn!("glx 1.3 fbconfigs are unavailable, using legacy visuals");
        return Ok(None);
    };
    let address = get_proc_address(b"glXCreateContextAttribsARB\0".as_ptr().cast());
    if address.is_null() {
        tracing::warn!("GLX_ARB_create_context is unavailable, using a legacy context");
        return Ok(None);
    }
    let create_context_attribs: GlXCreateContextAttribsArb = std::mem::transmute(address);

    let attributes = [
        GLX_X_RENDERABLE, True,
        GLX_DRAWABLE_TYPE, GLX_WINDOW_BIT,
        GLX_RENDER_TYPE, GLX_RGBA_BIT,
        GLX_X_VISUAL_TYPE, GLX_TRUE_COLOR,
        GLX_DOUBLEBUFFER, True,
        GLX_RED_SIZE, 8,
        GLX_GREEN_SIZE, 8,
        GLX_BLUE_SIZE, 8,
        GLX_ALPHA_SIZE, 8,
        GLX_DEPTH_SIZE, 24,
        GLX_NONE,
    ];
    let mut count = 0;
    let best_list = choose_fb_config(display, screen, attributes.as_ptr(), &mut count);
    let best = (!best_list.is_null() && count > 0)
        .then(|| *best_list)
        .and_then(|config| Some((config, fb_config_info(glx_ext, display, config)?)));

    let mut all_count = 0;
    let all_list = get_fb_configs(display, screen, &mut all_count);
    let chosen = negotiate(&requirement(), best, || {
        (0..if all_list.is_null() { 0 } else { all_count.max(0) as usize })
            .map(|i| *all_list.add(i))
            .filter_map(|config| Some((config, fb_config_info(glx_ext, display, config)?)))
            .collect::<Vec<_>>()
    });
    if !best_list.is_null() {
        (xlib.free)(best_list.cast());
    }
    if !all_list.is_null() {
        (xlib.free)(all_list.cast());
    }
    let (fb_config, info) = match chosen {
        Ok(chosen) => chosen,
        Err(err) => {
            tracing::warn!(%err, "no suitable fbconfig, using legacy visuals");
            return Ok(None);
        }
    };

    let visual = get_visual(display, fb_config);
    if visual.is_null() {
        return Ok(None);
    }
    let context_attributes: [c_int; 9] = match profile {
        GlProfile::Core => [
            GLX_CONTEXT_MAJOR_VERSION_ARB, 3,
            GLX_CONTEXT_MINOR_VERSION_ARB, 2,
            GLX_CONTEXT_PROFILE_MASK_ARB, GLX_CONTEXT_CORE_PROFILE_BIT_ARB,
            GLX_CONTEXT_FLAGS_ARB, GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB,
            GLX_NONE,
        ],
        GlProfile::Compat => [
            GLX_CONTEXT_MAJOR_VERSION_ARB, 3,
            GLX_CONTEXT_MINOR_VERSION_ARB, 0,
            GLX_CONTEXT_PROFILE_MASK_ARB, GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
            GLX_NONE, GLX_NONE,
            GLX_NONE,
        ],
    };

    // a refused context is reported as an asynchronous X error, which would otherwise kill
    // the process
    CONTEXT_CREATION_FAILED.store(false, Ordering::SeqCst);
    let previous = (xlib.set_error_handler)(Some(record_context_error));
    let context = create_context_attribs(
        display,
        fb_config,
        ptr::null_mut(),
        True,
        context_attributes.as_ptr(),
    );
    (xlib.sync)(display, False);
    (xlib.set_error_handler)(previous);

    let refused = CONTEXT_CREATION_FAILED.load(Ordering::SeqCst);
    let Some(context) = accept_context(context, refused, |context| {
        (glx.destroy_context)(display, context);
    }) else {
        tracing::warn!(?profile, "glXCreateContextAttribsARB failed, using a legacy context");
        (xlib.free)(visual.cast());
        return Ok(None);
    };
    tracing::debug!(?info, ?profile, "created context from fbconfig");
    Ok(Some(ChosenContext { visual, context }))
}

/// `None` if the server refused the context. a refused context can still be non-null, it is handed
/// to `destroy` then.
fn accept_context(
    context: GLXContext,
    refused: bool,
    destroy: impl FnOnce(GLXContext),
) -> Option<GLXContext> {
    if context.is_null() {
        return None;
    }
    if refused {
        destroy(context);
        return None;
    }
    Some(context)
}

unsafe fn visual_info(
    glx: &Glx,
    display: *mut Display,
    visual: *mut XVisualInfo,
) -> Option<PixelFormatInfo> {
    let attrib = |name: c_int| {
        let mut value = 0;
        ((glx.get_config)(display, visual, name, &mut value) == 0).then_some(value)
    };
    if attrib(GLX_USE_GL)? == 0 {
        return None;
    }
    let bits = |name| attrib(name).map(|v| v.clamp(0, u8::MAX as c_int) as u8);
    Some(PixelFormatInfo {
        double_buffer: attrib(GLX_DOUBLEBUFFER)? != 0,
        rgba: attrib(GLX_RGBA)? != 0,
        color_bits: bits(GLX_RED_SIZE)?
            .saturating_add(bits(GLX_GREEN_SIZE)?)
            .saturating_add(bits(GLX_BLUE_SIZE)?),
        alpha_bits: bits(GLX_ALPHA_SIZE)?,
        depth_bits: bits(GLX_DEPTH_SIZE)?,
        stencil_bits: bits(GLX_STENCIL_SIZE)?,
    })
}

/// The GLX 1.2 path: `glXChooseVisual` with a validation and an `XGetVisualInfo` scan as fallback.
unsafe fn create_legacy_context(
    xlib: &Xlib,
    glx: &Glx,
    display: *mut Display,
    screen: c_int,
) -> Result<ChosenContext, WindowError> {
    let mut attributes = [GLX_RGBA, GLX_DOUBLEBUFFER, GLX_DEPTH_SIZE, 24, GLX_NONE];
    let best_visual = (glx.choose_visual)(display, screen, attributes.as_mut_ptr());
    let best = (!best_visual.is_null())
        .then_some(best_visual)
        .and_then(|visual| Some((*visual, visual_info(glx, display, visual)?)));
    if !best_visual.is_null() {
        (xlib.free)(best_visual.cast());
    }

    let (chosen, info) = negotiate(&requirement(), best, || {
        let mut template: XVisualInfo = std::mem::zeroed();
        template.screen = screen;
        let mut count = 0;
        let list = (xlib.get_visual_info)(display, VisualScreenMask, &mut template, &mut count);
        let mut candidates = Vec::new();
        if !list.is_null() {
            for i in 0..count.max(0) as usize {
                let visual = list.add(i);
                if (*visual).class != TrueColor {
                    continue;
                }
                if let Some(info) = visual_info(glx, display, visual) {
                    candidates.push((*visual, info));
                }
            }
            (xlib.free)(list.cast());
        }
        candidates
    })?;

    // hand out a copy owned by xlib, so the caller can XFree it like every other visual
    let mut template = chosen;
    let mut count = 0;
    let visual = (xlib.get_visual_info)(
        display,
        VisualScreenMask | VisualIDMask,
        &mut template,
        &mut count,
    );
    if visual.is_null() {
        return Err(WindowError::CreateContext(
            "the negotiated visual disappeared".to_string(),
        ));
    }
    let context = (glx.create_context)(display, visual, ptr::null_mut(), True);
    if context.is_null() {
        (xlib.free)(visual.cast());
        return Err(WindowError::CreateContext("glXCreateContext failed".to_string()));
    }
    tracing::debug!(?info, "created legacy glx context");
    Ok(ChosenContext { visual, context })
}

impl Window for X11Window {
    fn gl(&self) -> Result<Rc<OpenGl>, WindowError> {
        self.gl.clone().ok_or(WindowError::Closed)
    }

    fn poll(&mut self) -> bool {
        if self.state.is_closed() || !self.running {
            return false;
        }
        self.input.begin_poll();
        // SAFETY: the display stays open until close, which also flips the state checked above
        unsafe {
            while (self.xlib.pending)(self.display) > 0 {
                let mut event = XEvent::zeroed();
                (self.xlib.next_event)(self.display, &mut event);
                match event.kind() {
                    ClientMessage => {
                        let message = event.client_message;
                        let atom = message.data[0] as Atom;
                        if message.format == 32 && atom == self.wm_delete_window {
                            tracing::debug!("window close requested");
                            self.running = false;
                        }
                    }
                    DestroyNotify => self.running = false,
                    kind @ (KeyPress | KeyRelease) => {
                        let keysym = (self.xlib.lookup_keysym)(&mut event.key, 0);
                        let key = keysym_to_key(u32::try_from(keysym).unwrap_or(0));
                        if kind == KeyPress {
                            self.input.key_pressed(key);
                        } else {
                            self.input.key_released(key);
                        }
                    }
                    ButtonPress => {
                        self.input.button_pressed(x_button_to_button(event.button.button))
                    }
                    ButtonRelease => {
                        self.input.button_released(x_button_to_button(event.button.button))
                    }
                    FocusOut => self.input.release_all(),
                    _ => {}
                }
            }
        }
        self.running
    }

    fn swap(&mut self) {
        if self.state.is_closed() {
            return;
        }
        // SAFETY: window and display are alive until close
        unsafe { (self.glx.swap_buffers)(self.display, self.window) }
    }

    fn backing_size(&self) -> [u32; 2] {
        if self.state.is_closed() {
            return [0, 0];
        }
        let mut root = 0;
        let (mut x, mut y) = (0, 0);
        let (mut width, mut height): (c_uint, c_uint) = (0, 0);
        let (mut border, mut depth): (c_uint, c_uint) = (0, 0);
        // SAFETY: out pointers are locals
        let ok = unsafe {
            (self.xlib.get_geometry)(
                self.display,
                self.window,
                &mut root,
                &mut x,
                &mut y,
                &mut width,
                &mut height,
                &mut border,
                &mut depth,
            )
        };
        if ok == 0 {
            return [0, 0];
        }
        [width, height]
    }

    fn cursor(&self) -> [f32; 2] {
        if self.state.is_closed() {
            return [0.0, 0.0];
        }
        let (mut root, mut child) = (0, 0);
        let (mut root_x, mut root_y, mut x, mut y) = (0, 0, 0, 0);
        let mut mask = 0;
        // SAFETY: out pointers are locals
        let same_screen = unsafe {
            (self.xlib.query_pointer)(
                self.display,
                self.window,
                &mut root,
                &mut child,
                &mut root_x,
                &mut root_y,
                &mut x,
                &mut y,
                &mut mask,
            )
        };
        if same_screen == False {
            return [0.0, 0.0];
        }
        [x as f32, y as f32]
    }

    fn scale(&self) -> f32 {
        self.scale
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
        tracing::debug!("x11 window closed");
    }
}

impl Drop for X11Window {
    fn drop(&mut self) {
        self.close();
    }
}

unsafe impl HasRawWindowHandle for X11Window {
    fn raw_window_handle(&self) -> RawWindowHandle {
        let mut handle = XlibWindowHandle::empty();
        handle.window = self.window;
        handle.visual_id = self.visual_id;
        RawWindowHandle::Xlib(handle)
    }
}

unsafe impl HasRawDisplayHandle for X11Window {
    fn raw_display_handle(&self) -> RawDisplayHandle {
        let mut handle = XlibDisplayHandle::empty();
        handle.display = self.display.cast();
        handle.screen = self.screen;
        RawDisplayHandle::Xlib(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn recording(log: &Log, label: &'static str) -> impl FnOnce() + 'static {
        let log = log.clone();
        move || log.borrow_mut().push(label)
    }

    #[test]
    fn close_destroys_the_context_before_the_window() {
        let log = Log::default();
        let mut teardown = Teardown::new();
        // same acquisition order as X11Window::new
        teardown.push("display", recording(&log, "XCloseDisplay"));
        teardown.push("visual info", recording(&log, "XFree"));
        teardown.push("colormap", recording(&log, "XFreeColormap"));
        push_window_and_context(
            &mut teardown,
            recording(&log, "XDestroyWindow"),
            recording(&log, "glXDestroyContext"),
        );
        teardown.push("current context", recording(&log, "glXMakeCurrent(None)"));
        teardown.run();
        assert_eq!(
            *log.borrow(),
            [
                "glXMakeCurrent(None)",
                "glXDestroyContext",
                "XDestroyWindow",
                "XFreeColormap",
                "XFree",
                "XCloseDisplay",
            ]
        );
    }

    #[test]
    fn refused_context_is_destroyed() {
        let context: GLXContext = 0x10 as GLXContext;
        let mut destroyed = Vec::new();
        assert_eq!(accept_context(context, true, |c| destroyed.push(c)), None);
        assert_eq!(destroyed, [context]);

        destroyed.clear();
        assert_eq!(accept_context(ptr::null_mut(), true, |c| destroyed.push(c)), None);
        assert_eq!(accept_context(ptr::null_mut(), false, |c| destroyed.push(c)), None);
        assert!(destroyed.is_empty());

        assert_eq!(accept_context(context, false, |c| destroyed.push(c)), Some(context));
        assert!(destroyed.is_empty());
    }

    /// needs an x server, eg: `xvfb-run cargo test`
    #[test]
    fn closed_window_stops_polling() {
        if std::env::var_os("DISPLAY").is_none() {
            eprintln!("DISPLAY is not set, skipping");
            return;
        }
        let mut window = match X11Window::new(&WindowConfig::default()) {
            Ok(window) => window,
            Err(e) => {
                eprintln!("no usable glx context, skipping: {e}");
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

//! Xlib and GLX declarations, transcribed from `Xlib.h`, `Xutil.h` and `glx.h` for lp64 / ilp32.

#![allow(non_upper_case_globals, non_snake_case, dead_code)]

use std::ffi::{c_char, c_int, c_long, c_uint, c_ulong, c_void};

use native_library::{function_table, optional_function_table};

pub const LIBX11: &[&str] = &["libX11.so.6", "libX11.so"];
pub const LIBGL: &[&str] = &["libGL.so.1", "libGL.so"];

#[repr(C)]
pub struct Display {
    _opaque: [u8; 0],
}
#[repr(C)]
pub struct Visual {
    _opaque: [u8; 0],
}
pub type XWindow = c_ulong;
pub type Colormap = c_ulong;
pub type Atom = c_ulong;
pub type KeySym = c_ulong;
pub type Bool = c_int;
pub type GLXContext = *mut c_void;
pub type GLXFBConfig = *mut c_void;
pub type XErrorHandler = unsafe extern "system" fn(*mut Display, *mut c_void) -> c_int;

pub const False: Bool = 0;
pub const True: Bool = 1;

// event types
pub const KeyPress: c_int = 2;
pub const KeyRelease: c_int = 3;
pub const ButtonPress: c_int = 4;
pub const ButtonRelease: c_int = 5;
pub const FocusOut: c_int = 10;
pub const DestroyNotify: c_int = 17;
pub const ClientMessage: c_int = 33;

// event masks
pub const KeyPressMask: c_long = 1 << 0;
pub const KeyReleaseMask: c_long = 1 << 1;
pub const ButtonPressMask: c_long = 1 << 2;
pub const ButtonReleaseMask: c_long = 1 << 3;
pub const PointerMotionMask: c_long = 1 << 6;
pub const ExposureMask: c_long = 1 << 15;
pub const StructureNotifyMask: c_long = 1 << 17;
pub const FocusChangeMask: c_long = 1 << 21;

// XCreateWindow
pub const InputOutput: c_uint = 1;
pub const AllocNone: c_int = 0;
pub const CWBorderPixel: c_ulong = 1 << 3;
pub const CWEventMask: c_ulong = 1 << 11;
pub const CWColormap: c_ulong = 1 << 13;

// XGetVisualInfo
pub const VisualIDMask: c_long = 0x1;
pub const VisualScreenMask: c_long = 0x2;
pub const TrueColor: c_int = 4;

// glx attributes
pub const GLX_USE_GL: c_int = 1;
pub const GLX_BUFFER_SIZE: c_int = 2;
pub const GLX_RGBA: c_int = 4;
pub const GLX_DOUBLEBUFFER: c_int = 5;
pub const GLX_RED_SIZE: c_int = 8;
pub const GLX_GREEN_SIZE: c_int = 9;
pub const GLX_BLUE_SIZE: c_int = 10;
pub const GLX_ALPHA_SIZE: c_int = 11;
pub const GLX_DEPTH_SIZE: c_int = 12;
pub const GLX_STENCIL_SIZE: c_int = 13;
pub const GLX_X_VISUAL_TYPE: c_int = 0x22;
pub const GLX_TRUE_COLOR: c_int = 0x8002;
pub const GLX_DRAWABLE_TYPE: c_int = 0x8010;
pub const GLX_RENDER_TYPE: c_int = 0x8011;
pub const GLX_X_RENDERABLE: c_int = 0x8012;
pub const GLX_WINDOW_BIT: c_int = 0x1;
pub const GLX_RGBA_BIT: c_int = 0x1;
pub const GLX_NONE: c_int = 0;

// GLX_ARB_create_context(_profile)
pub const GLX_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
pub const GLX_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
pub const GLX_CONTEXT_FLAGS_ARB: c_int = 0x2094;
pub const GLX_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
pub const GLX_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x1;
pub const GLX_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: c_int = 0x2;
pub const GLX_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: c_int = 0x2;

pub type GlXCreateContextAttribsArb = unsafe extern "system" fn(
    *mut Display,
    GLXFBConfig,
    GLXContext,
    Bool,
    *const c_int,
) -> GLXContext;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XVisualInfo {
    pub visual: *mut Visual,
    pub visualid: c_ulong,
    pub screen: c_int,
    pub depth: c_int,
    pub class: c_int,
    pub red_mask: c_ulong,
    pub green_mask: c_ulong,
    pub blue_mask: c_ulong,
    pub colormap_size: c_int,
    pub bits_per_rgb: c_int,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XSetWindowAttributes {
    pub background_pixmap: c_ulong,
    pub background_pixel: c_ulong,
    pub border_pixmap: c_ulong,
    pub border_pixel: c_ulong,
    pub bit_gravity: c_int,
    pub win_gravity: c_int,
    pub backing_store: c_int,
    pub backing_planes: c_ulong,
    pub backing_pixel: c_ulong,
    pub save_under: Bool,
    pub event_mask: c_long,
    pub do_not_propagate_mask: c_long,
    pub override_redirect: Bool,
    pub colormap: Colormap,
    pub cursor: c_ulong,
}

impl Default for XSetWindowAttributes {
    fn default() -> Self {
        // SAFETY: plain integers, all zero is the documented "unset" value
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XKeyEvent {
    pub type_: c_int,
    pub serial: c_ulong,
    pub send_event: Bool,
    pub display: *mut Display,
    pub window: XWindow,
    pub root: XWindow,
    pub subwindow: XWindow,
    pub time: c_ulong,
    pub x: c_int,
    pub y: c_int,
    pub x_root: c_int,
    pub y_root: c_int,
    pub state: c_uint,
    pub keycode: c_uint,
    pub same_screen: Bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XButtonEvent {
    pub type_: c_int,
    pub serial: c_ulong,
    pub send_event: Bool,
    pub display: *mut Display,
    pub window: XWindow,
    pub root: XWindow,
    pub subwindow: XWindow,
    pub time: c_ulong,
    pub x: c_int,
    pub y: c_int,
    pub x_root: c_int,
    pub y_root: c_int,
    pub state: c_uint,
    pub button: c_uint,
    pub same_screen: Bool,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct XClientMessageEvent {
    pub type_: c_int,
    pub serial: c_ulong,
    pub send_event: Bool,
    pub display: *mut Display,
    pub window: XWindow,
    pub message_type: Atom,
    pub format: c_int,
    pub data: [c_long; 5],
}

#[repr(C)]
#[derive(Clone, Copy)]
pub union XEvent {
    pub type_: c_int,
    pub key: XKeyEvent,
    pub button: XButtonEvent,
    pub client_message: XClientMessageEvent,
    pad: [c_long; 24],
}

impl XEvent {
    pub fn zeroed() -> Self {
        Self { pad: [0; 24] }
    }

    pub fn kind(&self) -> c_int {
        // SAFETY: every event starts with its type
        unsafe { self.type_ }
    }
}

#[cfg(target_pointer_width = "64")]
const _: () = {
    assert!(std::mem::size_of::<XEvent>() == 192);
    assert!(std::mem::size_of::<XKeyEvent>() == 96);
    assert!(std::mem::size_of::<XButtonEvent>() == 96);
    assert!(std::mem::size_of::<XClientMessageEvent>() == 96);
    assert!(std::mem::size_of::<XVisualInfo>() == 64);
    assert!(std::mem::size_of::<XSetWindowAttributes>() == 112);
};
#[cfg(target_pointer_width = "32")]
const _: () = {
    assert!(std::mem::size_of::<XEvent>() == 96);
    assert!(std::mem::size_of::<XKeyEvent>() == 60);
    assert!(std::mem::size_of::<XClientMessageEvent>() == 48);
    assert!(std::mem::size_of::<XVisualInfo>() == 40);
    assert!(std::mem::size_of::<XSetWindowAttributes>() == 60);
};

function_table! {
    pub struct Xlib {
        open_display: "XOpenDisplay" => fn(*const c_char) -> *mut Display,
        close_display: "XCloseDisplay" => fn(*mut Display) -> c_int,
        default_screen: "XDefaultScreen" => fn(*mut Display) -> c_int,
        root_window: "XRootWindow" => fn(*mut Display, c_int) -> XWindow,
        create_colormap: "XCreateColormap" => fn(
            *mut Display, XWindow, *mut Visual, c_int
        ) -> Colormap,
        free_colormap: "XFreeColormap" => fn(*mut Display, Colormap) -> c_int,
        create_window: "XCreateWindow" => fn(
            *mut Display, XWindow, c_int, c_int, c_uint, c_uint, c_uint, c_int, c_uint,
            *mut Visual, c_ulong, *mut XSetWindowAttributes
        ) -> XWindow,
        destroy_window: "XDestroyWindow" => fn(*mut Display, XWindow) -> c_int,
        map_window: "XMapWindow" => fn(*mut Display, XWindow) -> c_int,
        store_name: "XStoreName" => fn(*mut Display, XWindow, *const c_char) -> c_int,
        intern_atom: "XInternAtom" => fn(*mut Display, *const c_char, Bool) -> Atom,
        set_wm_protocols: "XSetWMProtocols" => fn(*mut Display, XWindow, *mut Atom, c_int) -> c_int,
        pending: "XPending" => fn(*mut Display) -> c_int,
        next_event: "XNextEvent" => fn(*mut Display, *mut XEvent) -> c_int,
        get_geometry: "XGetGeometry" => fn(
            *mut Display, XWindow, *mut XWindow, *mut c_int, *mut c_int,
            *mut c_uint, *mut c_uint, *mut c_uint, *mut c_uint
        ) -> c_int,
        query_pointer: "XQueryPointer" => fn(
            *mut Display, XWindow, *mut XWindow, *mut XWindow,
            *mut c_int, *mut c_int, *mut c_int, *mut c_int, *mut c_uint
        ) -> Bool,
        display_width: "XDisplayWidth" => fn(*mut Display, c_int) -> c_int,
        display_width_mm: "XDisplayWidthMM" => fn(*mut Display, c_int) -> c_int,
        lookup_keysym: "XLookupKeysym" => fn(*mut XKeyEvent, c_int) -> KeySym,
        get_visual_info: "XGetVisualInfo" => fn(
            *mut Display, c_long, *mut XVisualInfo, *mut c_int
        ) -> *mut XVisualInfo,
        free: "XFree" => fn(*mut c_void) -> c_int,
        flush: "XFlush" => fn(*mut Display) -> c_int,
        sync: "XSync" => fn(*mut Display, Bool) -> c_int,
        set_error_handler: "XSetErrorHandler" => fn(Option<XErrorHandler>) -> Option<XErrorHandler>,
    }
}

optional_function_table! {
    pub struct XlibExt {
        resource_manager_string: "XResourceManagerString" => fn(*mut Display) -> *const c_char,
        xkb_set_detectable_auto_repeat: "XkbSetDetectableAutoRepeat" => fn(
            *mut Display, Bool, *mut Bool
        ) -> Bool,
    }
}

function_table! {
    pub struct Glx {
        choose_visual: "glXChooseVisual" => fn(*mut Display, c_int, *mut c_int) -> *mut XVisualInfo,
        get_config: "glXGetConfig" => fn(
            *mut Display, *mut XVisualInfo, c_int, *mut c_int
        ) -> c_int,
        create_context: "glXCreateContext" => fn(
            *mut Display, *mut XVisualInfo, GLXContext, Bool
        ) -> GLXContext,
        make_current: "glXMakeCurrent" => fn(*mut Display, XWindow, GLXContext) -> Bool,
        swap_buffers: "glXSwapBuffers" => fn(*mut Display, XWindow),
        destroy_context: "glXDestroyContext" => fn(*mut Display, GLXContext),
    }
}

optional_function_table! {
    pub struct GlxExt {
        choose_fb_config: "glXChooseFBConfig" => fn(
            *mut Display, c_int, *const c_int, *mut c_int
        ) -> *mut GLXFBConfig,
        get_fb_configs: "glXGetFBConfigs" => fn(
            *mut Display, c_int, *mut c_int
        ) -> *mut GLXFBConfig,
        get_fb_config_attrib: "glXGetFBConfigAttrib" => fn(
            *mut Display, GLXFBConfig, c_int, *mut c_int
        ) -> c_int,
        get_visual_from_fb_config: "glXGetVisualFromFBConfig" => fn(
            *mut Display, GLXFBConfig
        ) -> *mut XVisualInfo,
        get_proc_address: "glXGetProcAddressARB" => fn(*const c_char) -> *const c_void,
    }
}

//! user32, gdi32, opengl32 and kernel32 declarations, transcribed from `winuser.h`, `wingdi.h` and
//! `wglext.h`.

#![allow(non_upper_case_globals, non_snake_case, dead_code, clippy::upper_case_acronyms)]

use std::ffi::{c_char, c_int, c_void};

use native_library::function_table;

pub const USER32: &str = "user32.dll";
pub const GDI32: &str = "gdi32.dll";
pub const OPENGL32: &str = "opengl32.dll";
pub const KERNEL32: &str = "kernel32.dll";

pub type HWND = *mut c_void;
pub type HDC = *mut c_void;
pub type HGLRC = *mut c_void;
pub type HINSTANCE = *mut c_void;
pub type HICON = *mut c_void;
pub type HCURSOR = *mut c_void;
pub type HBRUSH = *mut c_void;
pub type HMENU = *mut c_void;
pub type BOOL = c_int;
pub type WPARAM = usize;
pub type LPARAM = isize;
pub type LRESULT = isize;
pub type ATOM = u16;
pub type WNDPROC = unsafe extern "system" fn(HWND, u32, WPARAM, LPARAM) -> LRESULT;

// class styles
pub const CS_VREDRAW: u32 = 0x0001;
pub const CS_HREDRAW: u32 = 0x0002;
pub const CS_OWNDC: u32 = 0x0020;

// window styles
pub const WS_OVERLAPPEDWINDOW: u32 = 0x00cf_0000;
pub const WS_CLIPCHILDREN: u32 = 0x0200_0000;
pub const WS_CLIPSIBLINGS: u32 = 0x0400_0000;
pub const CW_USEDEFAULT: c_int = 0x8000_0000_u32 as c_int;
pub const SW_SHOW: c_int = 5;
pub const IDC_ARROW: usize = 32512;
pub const GWLP_USERDATA: c_int = -21;

// messages
pub const WM_DESTROY: u32 = 0x0002;
pub const WM_KILLFOCUS: u32 = 0x0008;
pub const WM_CLOSE: u32 = 0x0010;
pub const WM_NCCREATE: u32 = 0x0081;
pub const WM_NCDESTROY: u32 = 0x0082;
pub const WM_KEYDOWN: u32 = 0x0100;
pub const WM_KEYUP: u32 = 0x0101;
pub const WM_SYSKEYDOWN: u32 = 0x0104;
pub const WM_SYSKEYUP: u32 = 0x0105;
pub const PM_REMOVE: u32 = 0x0001;

pub const ERROR_CLASS_ALREADY_EXISTS: u32 = 1410;

// pixel formats
pub const PFD_DOUBLEBUFFER: u32 = 0x0000_0001;
pub const PFD_DRAW_TO_WINDOW: u32 = 0x0000_0004;
pub const PFD_SUPPORT_OPENGL: u32 = 0x0000_0020;
pub const PFD_TYPE_RGBA: u8 = 0;
pub const PFD_MAIN_PLANE: u8 = 0;

// WGL_ARB_create_context(_profile)
pub const WGL_CONTEXT_MAJOR_VERSION_ARB: c_int = 0x2091;
pub const WGL_CONTEXT_MINOR_VERSION_ARB: c_int = 0x2092;
pub const WGL_CONTEXT_FLAGS_ARB: c_int = 0x2094;
pub const WGL_CONTEXT_PROFILE_MASK_ARB: c_int = 0x9126;
pub const WGL_CONTEXT_CORE_PROFILE_BIT_ARB: c_int = 0x1;
pub const WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB: c_int = 0x2;
pub const WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB: c_int = 0x2;

pub type WglCreateContextAttribsArb = unsafe extern "system" fn(HDC, HGLRC, *const c_int) -> HGLRC;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct POINT {
    pub x: i32,
    pub y: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RECT {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MSG {
    pub hwnd: HWND,
    pub message: u32,
    pub wParam: WPARAM,
    pub lParam: LPARAM,
    pub time: u32,
    pub pt: POINT,
}

impl Default for MSG {
    fn default() -> Self {
        // SAFETY: a null window and zero integers
        unsafe { std::mem::zeroed() }
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct WNDCLASSEXW {
    pub cbSize: u32,
    pub style: u32,
    pub lpfnWndProc: Option<WNDPROC>,
    pub cbClsExtra: c_int,
    pub cbWndExtra: c_int,
    pub hInstance: HINSTANCE,
    pub hIcon: HICON,
    pub hCursor: HCURSOR,
    pub hbrBackground: HBRUSH,
    pub lpszMenuName: *const u16,
    pub lpszClassName: *const u16,
    pub hIconSm: HICON,
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct CREATESTRUCTW {
    pub lpCreateParams: *mut c_void,
    pub hInstance: HINSTANCE,
    pub hMenu: HMENU,
    pub hwndParent: HWND,
    pub cy: c_int,
    pub cx: c_int,
    pub y: c_int,
    pub x: c_int,
    pub style: i32,
    pub lpszName: *const u16,
    pub lpszClass: *const u16,
    pub dwExStyle: u32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PIXELFORMATDESCRIPTOR {
    pub nSize: u16,
    pub nVersion: u16,
    pub dwFlags: u32,
    pub iPixelType: u8,
    pub cColorBits: u8,
    pub cRedBits: u8,
    pub cRedShift: u8,
    pub cGreenBits: u8,
    pub cGreenShift: u8,
    pub cBlueBits: u8,
    pub cBlueShift: u8,
    pub cAlphaBits: u8,
    pub cAlphaShift: u8,
    pub cAccumBits: u8,
    pub cAccumRedBits: u8,
    pub cAccumGreenBits: u8,
    pub cAccumBlueBits: u8,
    pub cAccumAlphaBits: u8,
    pub cDepthBits: u8,
    pub cStencilBits: u8,
    pub cAuxBuffers: u8,
    pub iLayerType: u8,
    pub bReserved: u8,
    pub dwLayerMask: u32,
    pub dwVisibleMask: u32,
    pub dwDamageMask: u32,
}

pub const PFD_SIZE: u16 = std::mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16;

const _: () = {
    assert!(std::mem::size_of::<PIXELFORMATDESCRIPTOR>() == 40);
    assert!(std::mem::size_of::<POINT>() == 8);
    assert!(std::mem::size_of::<RECT>() == 16);
};
#[cfg(target_pointer_width = "64")]
const _: () = {
    assert!(std::mem::size_of::<MSG>() == 48);
    assert!(std::mem::size_of::<WNDCLASSEXW>() == 80);
    assert!(std::mem::size_of::<CREATESTRUCTW>() == 80);
};
#[cfg(target_pointer_width = "32")]
const _: () = {
    assert!(std::mem::size_of::<MSG>() == 28);
    assert!(std::mem::size_of::<WNDCLASSEXW>() == 48);
    assert!(std::mem::size_of::<CREATESTRUCTW>() == 48);
};

function_table! {
    pub struct User32 {
        register_class: "RegisterClassExW" => fn(*const WNDCLASSEXW) -> ATOM,
        create_window: "CreateWindowExW" => fn(
            u32, *const u16, *const u16, u32, c_int, c_int, c_int, c_int,
            HWND, HMENU, HINSTANCE, *mut c_void
        ) -> HWND,
        def_window_proc: "DefWindowProcW" => fn(HWND, u32, WPARAM, LPARAM) -> LRESULT,
        destroy_window: "DestroyWindow" => fn(HWND) -> BOOL,
        show_window: "ShowWindow" => fn(HWND, c_int) -> BOOL,
        update_window: "UpdateWindow" => fn(HWND) -> BOOL,
        get_client_rect: "GetClientRect" => fn(HWND, *mut RECT) -> BOOL,
        adjust_window_rect: "AdjustWindowRectEx" => fn(*mut RECT, u32, BOOL, u32) -> BOOL,
        peek_message: "PeekMessageW" => fn(*mut MSG, HWND, u32, u32, u32) -> BOOL,
        translate_message: "TranslateMessage" => fn(*const MSG) -> BOOL,
        dispatch_message: "DispatchMessageW" => fn(*const MSG) -> LRESULT,
        get_dc: "GetDC" => fn(HWND) -> HDC,
        release_dc: "ReleaseDC" => fn(HWND, HDC) -> c_int,
        window_from_dc: "WindowFromDC" => fn(HDC) -> HWND,
        get_cursor_pos: "GetCursorPos" => fn(*mut POINT) -> BOOL,
        screen_to_client: "ScreenToClient" => fn(HWND, *mut POINT) -> BOOL,
        load_cursor: "LoadCursorW" => fn(HINSTANCE, *const u16) -> HCURSOR,
    }
}

// GetWindowLongPtrW is a macro over GetWindowLongW in 32 bit user32
#[cfg(target_pointer_width = "64")]
function_table! {
    pub struct UserData {
        get: "GetWindowLongPtrW" => fn(HWND, c_int) -> isize,
        set: "SetWindowLongPtrW" => fn(HWND, c_int, isize) -> isize,
    }
}
#[cfg(target_pointer_width = "32")]
function_table! {
    pub struct UserData {
        get: "GetWindowLongW" => fn(HWND, c_int) -> isize,
        set: "SetWindowLongW" => fn(HWND, c_int, isize) -> isize,
    }
}

function_table! {
    pub struct Gdi32 {
        choose_pixel_format: "ChoosePixelFormat" => fn(HDC, *const PIXELFORMATDESCRIPTOR) -> c_int,
        describe_pixel_format: "DescribePixelFormat" => fn(
            HDC, c_int, u32, *mut PIXELFORMATDESCRIPTOR
        ) -> c_int,
        set_pixel_format: "SetPixelFormat" => fn(HDC, c_int, *const PIXELFORMATDESCRIPTOR) -> BOOL,
        get_pixel_format: "GetPixelFormat" => fn(HDC) -> c_int,
        swap_buffers: "SwapBuffers" => fn(HDC) -> BOOL,
    }
}

function_table! {
    pub struct Wgl {
        create_context: "wglCreateContext" => fn(HDC) -> HGLRC,
        make_current: "wglMakeCurrent" => fn(HDC, HGLRC) -> BOOL,
        delete_context: "wglDeleteContext" => fn(HGLRC) -> BOOL,
        get_proc_address: "wglGetProcAddress" => fn(*const c_char) -> *const c_void,
    }
}

function_table! {
    pub struct Kernel32 {
        get_module_handle: "GetModuleHandleW" => fn(*const u16) -> HINSTANCE,
        get_last_error: "GetLastError" => fn() -> u32,
        set_last_error: "SetLastError" => fn(u32),
        get_current_process_id: "GetCurrentProcessId" => fn() -> u32,
    }
}

pub fn wide(text: &str) -> Vec<u16> {
    text.encode_utf16().filter(|unit| *unit != 0).chain(Some(0)).collect()
}

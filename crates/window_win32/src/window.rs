use std::cell::{Cell, RefCell};
use std::ffi::c_int;
use std::ptr;
use std::rc::Rc;
use std::sync::OnceLock;

use gl_binding::OpenGl;
use native_library::Library;
use raw_window_handle::{
    HasRawDisplayHandle, HasRawWindowHandle, RawDisplayHandle, RawWindowHandle, Win32WindowHandle,
    WindowsDisplayHandle,
};
use window_backend::{
    negotiate, Button, ButtonState, GlProfile, InputState, Key, KeyState, LifecycleState,
    PixelFormatInfo, PixelFormatRequirement, Teardown, ThreadAffinity, Window, WindowConfig,
    WindowError,
};

use crate::ffi::*;
use crate::keymap::{mouse_message_button, KeyMessage};

/// client rects are already in physical pixels. per monitor dpi is not detected.
const SCALE: f32 = 1.0;

const WINDOW_STYLE: u32 = WS_OVERLAPPEDWINDOW | WS_CLIPSIBLINGS | WS_CLIPCHILDREN;

/// A Win32 window with a WGL context current on the creating thread.
pub struct Win32Window {
    user32: User32,
    gdi32: Gdi32,
    hwnd: HWND,
    hdc: HDC,
    instance: HINSTANCE,
    gl: Option<Rc<OpenGl>>,
    state: LifecycleState,
    teardown: Teardown,
    // declared after `teardown`: the window procedure reads it until the window is destroyed
    shared: Box<Shared>,
    _affinity: ThreadAffinity,
}

/// State the window procedure writes to. reached through `GWLP_USERDATA`.
struct Shared {
    running: Cell<bool>,
    input: RefCell<InputState>,
}

impl Shared {
    /// `Some` when the message is fully handled and must not reach `DefWindowProcW`.
    fn handle(&self, message: u32, wparam: WPARAM, lparam: LPARAM) -> Option<LRESULT> {
        match message {
            // teardown stays with `close`, so the default DestroyWindow is skipped
            WM_CLOSE => {
                tracing::debug!("window close requested");
                self.running.set(false);
                Some(0)
            }
            WM_DESTROY => {
                self.running.set(false);
                Some(0)
            }
            WM_KEYDOWN | WM_SYSKEYDOWN => {
                let key_message = KeyMessage::decode(wparam, lparam);
                let key = key_message.key();
                if let Ok(mut input) = self.input.try_borrow_mut() {
                    // held since before focus: report it as repeating right away
                    if key_message.was_down && !input.key(key).is_down() {
                        input.key_pressed(key);
                    }
                    input.key_pressed(key);
                }
                // alt+f4 and the system menu live in DefWindowProcW
                (message == WM_KEYDOWN).then_some(0)
            }
            WM_KEYUP | WM_SYSKEYUP => {
                let key = KeyMessage::decode(wparam, lparam).key();
                if let Ok(mut input) = self.input.try_borrow_mut() {
                    input.key_released(key);
                }
                (message == WM_KEYUP).then_some(0)
            }
            WM_KILLFOCUS => {
                if let Ok(mut input) = self.input.try_borrow_mut() {
                    input.release_all();
                }
                None
            }
            _ => {
                let (button, pressed) = mouse_message_button(message, wparam)?;
                if let Ok(mut input) = self.input.try_borrow_mut() {
                    if pressed {
                        input.button_pressed(button);
                    } else {
                        input.button_released(button);
                    }
                }
                None
            }
        }
    }
}

/// The window class, registered once per process.
struct WindowClass {
    name: Vec<u16>,
    def_window_proc: WNDPROC,
    user_data: UserData,
}

static WINDOW_CLASS: OnceLock<WindowClass> = OnceLock::new();

unsafe extern "system" fn window_proc(
    hwnd: HWND,
    message: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let Some(class) = WINDOW_CLASS.get() else {
        return 0;
    };
    if message == WM_NCCREATE {
        let create = &*(lparam as *const CREATESTRUCTW);
        (class.user_data.set)(hwnd, GWLP_USERDATA, create.lpCreateParams as isize);
    }
    let shared = (class.user_data.get)(hwnd, GWLP_USERDATA) as *const Shared;
    if let Some(shared) = shared.as_ref() {
        if message == WM_NCDESTROY {
            (class.user_data.set)(hwnd, GWLP_USERDATA, 0);
        } else if let Some(result) = shared.handle(message, wparam, lparam) {
            return result;
        }
    }
    (class.def_window_proc)(hwnd, message, wparam, lparam)
}

unsafe fn last_error(kernel32: &Kernel32, operation: &str) -> String {
    match (kernel32.get_last_error)() {
        0 => format!("{operation} failed"),
        code => format!("{operation} failed (error {code})"),
    }
}

unsafe fn register_class(
    user32: &User32,
    kernel32: &Kernel32,
    user_data: UserData,
    instance: HINSTANCE,
) -> Result<&'static WindowClass, WindowError> {
    if let Some(class) = WINDOW_CLASS.get() {
        return Ok(class);
    }
    let name = wide(&format!("glwin_{}", (kernel32.get_current_process_id)()));
    let description = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_OWNDC | CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(window_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: instance,
        hIcon: ptr::null_mut(),
        hCursor: (user32.load_cursor)(ptr::null_mut(), IDC_ARROW as *const u16),
        hbrBackground: ptr::null_mut(),
        lpszMenuName: ptr::null(),
        lpszClassName: name.as_ptr(),
        hIconSm: ptr::null_mut(),
    };
    (kernel32.set_last_error)(0);
    if (user32.register_class)(&description) == 0 {
        let code = (kernel32.get_last_error)();
        if code != ERROR_CLASS_ALREADY_EXISTS {
            return Err(WindowError::CreateWindow(format!(
                "RegisterClassExW failed (error {code})"
            )));
        }
        tracing::debug!("window class was registered by another thread");
    }
    Ok(WINDOW_CLASS.get_or_init(|| WindowClass {
        name,
        def_window_proc: user32.def_window_proc,
        user_data,
    }))
}

fn requirement() -> PixelFormatRequirement {
    PixelFormatRequirement {
        min_depth_bits: 24,
        min_stencil_bits: 8,
        ..Default::default()
    }
}

fn descriptor_info(descriptor: &PIXELFORMATDESCRIPTOR) -> Option<PixelFormatInfo> {
    let required = PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL;
    if descriptor.dwFlags & required != required || descriptor.iLayerType != PFD_MAIN_PLANE {
        return None;
    }
    Some(PixelFormatInfo {
        double_buffer: descriptor.dwFlags & PFD_DOUBLEBUFFER != 0,
        rgba: descriptor.iPixelType == PFD_TYPE_RGBA,
        color_bits: descriptor.cColorBits,
        alpha_bits: descriptor.cAlphaBits,
        depth_bits: descriptor.cDepthBits,
        stencil_bits: descriptor.cStencilBits,
    })
}

/// `ChoosePixelFormat`, validated against the requirement, with a `DescribePixelFormat` scan as
/// fallback. the format is set with its described descriptor.
unsafe fn set_pixel_format(
    gdi32: &Gdi32,
    kernel32: &Kernel32,
    hdc: HDC,
) -> Result<PixelFormatInfo, WindowError> {
    let desired = PIXELFORMATDESCRIPTOR {
        nSize: PFD_SIZE,
        nVersion: 1,
        dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER,
        iPixelType: PFD_TYPE_RGBA,
        cColorBits: 24,
        cAlphaBits: 8,
        cDepthBits: 24,
        cStencilBits: 8,
        iLayerType: PFD_MAIN_PLANE,
        ..Default::default()
    };
    let describe = |index: c_int| {
        let mut descriptor = PIXELFORMATDESCRIPTOR::default();
        let described =
            (gdi32.describe_pixel_format)(hdc, index, PFD_SIZE as u32, &mut descriptor) != 0;
        described.then_some(descriptor)
    };
    let chosen = (gdi32.choose_pixel_format)(hdc, &desired);
    let best = (chosen > 0)
        .then(|| describe(chosen))
        .flatten()
        .and_then(|descriptor| Some(((chosen, descriptor), descriptor_info(&descriptor)?)));

    let ((index, descriptor), info) = negotiate(&requirement(), best, || {
        // with a null descriptor the return value is the highest format index
        let count = (gdi32.describe_pixel_format)(hdc, 1, PFD_SIZE as u32, ptr::null_mut());
        (1..=count.max(0))
            .filter_map(|index| {
                let descriptor = describe(index)?;
                Some(((index, descriptor), descriptor_info(&descriptor)?))
            })
            .collect::<Vec<_>>()
    })?;

    (kernel32.set_last_error)(0);
    if (gdi32.set_pixel_format)(hdc, index, &descriptor) == 0 {
        return Err(WindowError::CreateContext(last_error(
            kernel32,
            &format!("SetPixelFormat({index})"),
        )));
    }
    let current = (gdi32.get_pixel_format)(hdc);
    if current != index {
        return Err(WindowError::CreateContext(format!(
            "GetPixelFormat reports {current} after setting {index}"
        )));
    }
    tracing::debug!(index, ?info, "set pixel format");
    Ok(info)
}

/// Creates a legacy context, then tries to replace it with a 3.x one through
/// `wglCreateContextAttribsARB`. the returned context is current.
unsafe fn create_context(
    wgl: &Wgl,
    kernel32: &Kernel32,
    hdc: HDC,
    profile: GlProfile,
) -> Result<HGLRC, WindowError> {
    (kernel32.set_last_error)(0);
    let legacy = (wgl.create_context)(hdc);
    if legacy.is_null() {
        return Err(WindowError::CreateContext(last_error(kernel32, "wglCreateContext")));
    }
    if (wgl.make_current)(hdc, legacy) == 0 {
        (wgl.delete_context)(legacy);
        return Err(WindowError::MakeCurrent);
    }

    // only answers while a context is current
    let name = b"wglCreateContextAttribsARB\0";
    let Some(address) = gl_binding::usable((wgl.get_proc_address)(name.as_ptr().cast())) else {
        tracing::warn!("WGL_ARB_create_context is unavailable, keeping the legacy context");
        return Ok(legacy);
    };
    let create_context_attribs: WglCreateContextAttribsArb = std::mem::transmute(address);
    let attributes: [c_int; 9] = match profile {
        GlProfile::Core => [
            WGL_CONTEXT_MAJOR_VERSION_ARB, 3,
            WGL_CONTEXT_MINOR_VERSION_ARB, 2,
            WGL_CONTEXT_PROFILE_MASK_ARB, WGL_CONTEXT_CORE_PROFILE_BIT_ARB,
            WGL_CONTEXT_FLAGS_ARB, WGL_CONTEXT_FORWARD_COMPATIBLE_BIT_ARB,
            0,
        ],
        GlProfile::Compat => [
            WGL_CONTEXT_MAJOR_VERSION_ARB, 3,
            WGL_CONTEXT_MINOR_VERSION_ARB, 0,
            WGL_CONTEXT_PROFILE_MASK_ARB, WGL_CONTEXT_COMPATIBILITY_PROFILE_BIT_ARB,
            0, 0,
            0,
        ],
    };
    let upgraded = create_context_attribs(hdc, ptr::null_mut(), attributes.as_ptr());
    if upgraded.is_null() {
        tracing::warn!(?profile, "wglCreateContextAttribsARB failed, keeping the legacy context");
        return Ok(legacy);
    }
    if (wgl.make_current)(hdc, upgraded) == 0 {
        tracing::warn!(?profile, "cannot make the 3.x context current, keeping the legacy context");
        (wgl.delete_context)(upgraded);
        (wgl.make_current)(hdc, legacy);
        return Ok(legacy);
    }
    (wgl.delete_context)(legacy);
    tracing::debug!(?profile, "created context through wglCreateContextAttribsARB");
    Ok(upgraded)
}

impl Win32Window {
    pub fn new(config: &WindowConfig) -> Result<Self, WindowError> {
        let affinity = ThreadAffinity::current();
        let user32_library = Library::open(USER32)?;
        let user32 = User32::load(user32_library)?;
        let user_data = UserData::load(user32_library)?;
        let gdi32 = Gdi32::load(Library::open(GDI32)?)?;
        let opengl32 = Library::open(OPENGL32)?;
        let wgl = Wgl::load(opengl32)?;
        let kernel32 = Kernel32::load(Library::open(KERNEL32)?)?;

        let shared = Box::new(Shared {
            running: Cell::new(true),
            input: RefCell::default(),
        });
        let mut teardown = Teardown::new();
        // SAFETY: handles come from user32 / gdi32 / wgl and are released in reverse order through
        // `teardown`. `shared` outlives the window, see the field order of `Win32Window`.
        unsafe {
            let instance = (kernel32.get_module_handle)(ptr::null());
            let class = register_class(&user32, &kernel32, user_data, instance)?;

            // the requested size is the client area
            let [width, height] = config.physical_size(SCALE);
            let mut frame = RECT {
                left: 0,
                top: 0,
                right: c_int::try_from(width).unwrap_or(c_int::MAX),
                bottom: c_int::try_from(height).unwrap_or(c_int::MAX),
            };
            (user32.adjust_window_rect)(&mut frame, WINDOW_STYLE, 0, 0);

            let title = wide(&config.title);
            (kernel32.set_last_error)(0);
            let hwnd = (user32.create_window)(
                0,
                class.name.as_ptr(),
                title.as_ptr(),
                WINDOW_STYLE,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                frame.right - frame.left,
                frame.bottom - frame.top,
                ptr::null_mut(),
                ptr::null_mut(),
                instance,
                (&*shared as *const Shared).cast_mut().cast(),
            );
            if hwnd.is_null() {
                return Err(WindowError::CreateWindow(last_error(&kernel32, "CreateWindowExW")));
            }
            teardown.push("window", move || {
                // detach first, the procedure must not see `Shared` during or after destruction
                (user_data.set)(hwnd, GWLP_USERDATA, 0);
                (user32.destroy_window)(hwnd);
            });
            tracing::debug!("created win32 window");

            let hdc = (user32.get_dc)(hwnd);
            if hdc.is_null() {
                return Err(WindowError::CreateWindow(last_error(&kernel32, "GetDC")));
            }
            teardown.push("device context", move || {
                (user32.release_dc)(hwnd, hdc);
            });
            if (user32.window_from_dc)(hdc) != hwnd {
                return Err(WindowError::CreateWindow(
                    "the device context does not belong to the window".to_string(),
                ));
            }

            let info = set_pixel_format(&gdi32, &kernel32, hdc)?;
            let context = create_context(&wgl, &kernel32, hdc, config.profile)?;
            teardown.push("wgl context", move || {
                (wgl.delete_context)(context);
            });
            teardown.push("current context", move || {
                (wgl.make_current)(ptr::null_mut(), ptr::null_mut());
            });

            let gl = OpenGl::load_from(opengl32, Some(wgl.get_proc_address))?;
            tracing::info!(
                version = %gl.get_string(gl_binding::consts::VERSION),
                renderer = %gl.renderer(),
                ?info,
                "created wgl context"
            );

            // shown only once the pixel format and context exist
            (user32.show_window)(hwnd, SW_SHOW);
            (user32.update_window)(hwnd);

            Ok(Self {
                user32,
                gdi32,
                hwnd,
                hdc,
                instance,
                gl: Some(Rc::new(gl)),
                state: LifecycleState::Running,
                teardown,
                shared,
                _affinity: affinity,
            })
        }
    }
}

impl Window for Win32Window {
    fn gl(&self) -> Result<Rc<OpenGl>, WindowError> {
        self.gl.clone().ok_or(WindowError::Closed)
    }

    fn poll(&mut self) -> bool {
        if self.state.is_closed() || !self.shared.running.get() {
            return false;
        }
        self.shared.input.borrow_mut().begin_poll();
        let mut message = MSG::default();
        // SAFETY: `message` is a local. dispatching re-enters `window_proc`, which only touches
        // `shared` and holds no borrow across calls.
        unsafe {
            while (self.user32.peek_message)(&mut message, ptr::null_mut(), 0, 0, PM_REMOVE) != 0 {
                (self.user32.translate_message)(&message);
                (self.user32.dispatch_message)(&message);
            }
        }
        self.shared.running.get()
    }

    fn swap(&mut self) {
        if self.state.is_closed() {
            return;
        }
        // SAFETY: the device context is released only by close
        unsafe {
            (self.gdi32.swap_buffers)(self.hdc);
        }
    }

    fn backing_size(&self) -> [u32; 2] {
        if self.state.is_closed() {
            return [0, 0];
        }
        let mut rect = RECT::default();
        // SAFETY: out pointer is a local
        if unsafe { (self.user32.get_client_rect)(self.hwnd, &mut rect) } == 0 {
            return [0, 0];
        }
        [
            (rect.right - rect.left).max(0) as u32,
            (rect.bottom - rect.top).max(0) as u32,
        ]
    }

    fn cursor(&self) -> [f32; 2] {
        if self.state.is_closed() {
            return [0.0, 0.0];
        }
        let mut point = POINT::default();
        // SAFETY: out pointer is a local
        unsafe {
            if (self.user32.get_cursor_pos)(&mut point) == 0 {
                return [0.0, 0.0];
            }
            (self.user32.screen_to_client)(self.hwnd, &mut point);
        }
        [point.x as f32, point.y as f32]
    }

    fn scale(&self) -> f32 {
        SCALE
    }

    fn key_state(&self, key: Key) -> KeyState {
        self.shared.input.borrow().key(key)
    }

    fn button_state(&self, button: Button) -> ButtonState {
        self.shared.input.borrow().button(button)
    }

    fn close(&mut self) {
        if self.state.is_closed() {
            return;
        }
        self.gl = None;
        self.shared.running.set(false);
        self.state = LifecycleState::Closed;
        self.teardown.run();
        tracing::debug!("win32 window closed");
    }
}

impl Drop for Win32Window {
    fn drop(&mut self) {
        self.close();
    }
}

unsafe impl HasRawWindowHandle for Win32Window {
    fn raw_window_handle(&self) -> RawWindowHandle {
        let mut handle = Win32WindowHandle::empty();
        handle.hwnd = self.hwnd;
        handle.hinstance = self.instance;
        RawWindowHandle::Win32(handle)
    }
}

unsafe impl HasRawDisplayHandle for Win32Window {
    fn raw_display_handle(&self) -> RawDisplayHandle {
        RawDisplayHandle::Windows(WindowsDisplayHandle::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_window_stops_polling() {
        let mut window = match Win32Window::new(&WindowConfig::default()) {
            Ok(window) => window,
            Err(e) => {
                eprintln!("no usable wgl context, skipping: {e}");
                return;
            }
        };
        assert!(window.gl().is_ok());
        assert_eq!(window.scale(), SCALE);
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

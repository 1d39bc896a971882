//! Objective-C runtime access, AppKit constants and geometry.
//!
//! Messages go through `objc_msgSend` cast to the exact signature of each call. struct returns
//! larger than two registers use `objc_msgSend_stret` on x86_64, aarch64 has no such entry point.

#![allow(non_upper_case_globals, dead_code)]

use std::ffi::{c_char, c_void};

use native_library::{function_table, optional_function_table, Library};

pub const LIBOBJC: &str = "/usr/lib/libobjc.A.dylib";
pub const APPKIT: &str = "/System/Library/Frameworks/AppKit.framework/AppKit";
pub const CORE_FOUNDATION: &str =
    "/System/Library/Frameworks/CoreFoundation.framework/CoreFoundation";

pub type Id = *mut c_void;
pub type Sel = *const c_void;
pub const nil: Id = std::ptr::null_mut();

#[cfg(target_arch = "aarch64")]
pub type Bool = bool;
#[cfg(target_arch = "aarch64")]
pub const YES: Bool = true;
#[cfg(target_arch = "aarch64")]
pub const NO: Bool = false;
#[cfg(not(target_arch = "aarch64"))]
pub type Bool = i8;
#[cfg(not(target_arch = "aarch64"))]
pub const YES: Bool = 1;
#[cfg(not(target_arch = "aarch64"))]
pub const NO: Bool = 0;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NSPoint {
    pub x: f64,
    pub y: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NSSize {
    pub width: f64,
    pub height: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NSRect {
    pub origin: NSPoint,
    pub size: NSSize,
}

const _: () = assert!(std::mem::size_of::<NSRect>() == 32);

pub const NSApplicationActivationPolicyRegular: i64 = 0;

pub const NSWindowStyleMaskTitled: u64 = 1 << 0;
pub const NSWindowStyleMaskClosable: u64 = 1 << 1;
pub const NSWindowStyleMaskMiniaturizable: u64 = 1 << 2;
pub const NSWindowStyleMaskResizable: u64 = 1 << 3;
pub const NSBackingStoreBuffered: u64 = 2;
pub const NSEventMaskAny: u64 = u64::MAX;

// NSOpenGLPixelFormatAttribute
pub const NSOpenGLPFADoubleBuffer: u32 = 5;
pub const NSOpenGLPFAColorSize: u32 = 8;
pub const NSOpenGLPFAAlphaSize: u32 = 11;
pub const NSOpenGLPFADepthSize: u32 = 12;
pub const NSOpenGLPFAStencilSize: u32 = 13;
pub const NSOpenGLPFAAccelerated: u32 = 73;
pub const NSOpenGLPFAOpenGLProfile: u32 = 99;
pub const NSOpenGLProfileVersionLegacy: u32 = 0x1000;
pub const NSOpenGLProfileVersion4_1Core: u32 = 0x4100;
pub const NSOpenGLContextParameterSwapInterval: i64 = 222;

function_table! {
    pub struct Objc {
        get_class: "objc_getClass" => fn(*const c_char) -> Id,
        register_name: "sel_registerName" => fn(*const c_char) -> Sel,
        msg_send: "objc_msgSend" => fn(),
    }
}

optional_function_table! {
    pub struct ObjcStret {
        msg_send_stret: "objc_msgSend_stret" => fn(),
    }
}

function_table! {
    pub struct CoreFoundation {
        run_loop_run_in_mode: "CFRunLoopRunInMode" => fn(Id, f64, u8) -> i32,
    }
}

/// The argument list of one message. implemented for tuples, so a call reads
/// `runtime.send(object, b"setTitle:\0", (title,))`.
pub trait MessageArguments: Sized {
    /// # Safety
    /// `imp` must be an `objc_msgSend` variant and the argument and return types must match the
    /// method's real signature.
    unsafe fn invoke<R>(self, imp: unsafe extern "system" fn(), receiver: Id, selector: Sel) -> R;
}

macro_rules! message_arguments {
    ($($name:ident: $ty:ident),*) => {
        impl<$($ty),*> MessageArguments for ($($ty,)*) {
            unsafe fn invoke<R>(
                self,
                imp: unsafe extern "system" fn(),
                receiver: Id,
                selector: Sel,
            ) -> R {
                let imp: unsafe extern "C" fn(Id, Sel $(, $ty)*) -> R =
                    std::mem::transmute_copy(&imp);
                let ($($name,)*) = self;
                imp(receiver, selector $(, $name)*)
            }
        }
    };
}

message_arguments!();
message_arguments!(a: A);
message_arguments!(a: A, b: B);
message_arguments!(a: A, b: B, c: C);
message_arguments!(a: A, b: B, c: C, d: D);

/// The objc runtime entry points used by the backend.
#[derive(Clone, Copy)]
pub struct Runtime {
    objc: Objc,
    stret: ObjcStret,
}

impl Runtime {
    pub fn load(library: &Library) -> Result<Self, native_library::Error> {
        Ok(Self {
            objc: Objc::load(library)?,
            stret: ObjcStret::load(library),
        })
    }

    /// `name` must be nul terminated. null if the class is not registered.
    pub unsafe fn class(&self, name: &[u8]) -> Id {
        (self.objc.get_class)(name.as_ptr().cast())
    }

    /// `name` must be nul terminated.
    pub unsafe fn selector(&self, name: &[u8]) -> Sel {
        (self.objc.register_name)(name.as_ptr().cast())
    }

    /// Sends `selector` (nul terminated) to `receiver`.
    ///
    /// # Safety
    /// argument and return types must match the method. structs larger than 16 bytes must be
    /// returned through [`Runtime::send_stret`].
    pub unsafe fn send<A: MessageArguments, R>(&self, receiver: Id, selector: &[u8], args: A) -> R {
        args.invoke(self.objc.msg_send, receiver, self.selector(selector))
    }

    /// [`Runtime::send`] for methods returning a struct in memory, eg: `NSRect`.
    pub unsafe fn send_stret<A: MessageArguments, R>(
        &self,
        receiver: Id,
        selector: &[u8],
        args: A,
    ) -> R {
        let imp = if cfg!(target_arch = "x86_64") {
            self.stret.msg_send_stret.unwrap_or(self.objc.msg_send)
        } else {
            self.objc.msg_send
        };
        args.invoke(imp, receiver, self.selector(selector))
    }

    /// `[class alloc]`, nil if the class is not registered.
    pub unsafe fn alloc(&self, class: &[u8]) -> Id {
        let class = self.class(class);
        if class.is_null() {
            return nil;
        }
        self.send(class, b"alloc\0", ())
    }

    pub unsafe fn release(&self, object: Id) {
        if !object.is_null() {
            self.send::<_, ()>(object, b"release\0", ());
        }
    }

    pub unsafe fn string(&self, text: &str) -> Id {
        let text = std::ffi::CString::new(text.replace('\0', "")).unwrap_or_default();
        self.send(self.class(b"NSString\0"), b"stringWithUTF8String:\0", (text.as_ptr(),))
    }
}

/// An object reference released on drop.
pub struct Owned<'a> {
    runtime: &'a Runtime,
    object: Id,
}

impl<'a> Owned<'a> {
    /// takes over a +1 reference. `None` for nil.
    pub fn new(runtime: &'a Runtime, object: Id) -> Option<Self> {
        (!object.is_null()).then_some(Self { runtime, object })
    }

    pub fn get(&self) -> Id {
        self.object
    }
}

impl Drop for Owned<'_> {
    fn drop(&mut self) {
        // SAFETY: the reference was +1 when it was handed over
        unsafe { self.runtime.release(self.object) }
    }
}

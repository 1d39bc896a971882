//! `gl_binding` exposes the fixed subset of OpenGL that the window layer and its renderers use.
//!
//! The entry points come in two tiers:
//! 1. the GL 1.1 core (clear, viewport, textures, blending, read pixels, strings). these are
//!    exported directly by the system gl library and are required. loading fails if any of them is
//!    missing.
//! 2. buffer objects, vertex arrays, shaders and uniforms. on windows and linux these live behind
//!    the platform extension loader (`wglGetProcAddress` / `glXGetProcAddressARB`), with the plain
//!    library export as a fallback. they are optional: a missing group clears its bit in
//!    [`GlCapabilities`] and calls into it become no-ops returning GL's own "invalid" value
//!    (0 names, -1 locations).
//!
//! All functions operate on the context current on the calling thread, which is why every call is
//! `unsafe` and [`OpenGl`] is neither `Send` nor `Sync`.
//! Failures are never reported through return values of these calls. check `get_error`, or the
//! compile / link status queries after building shaders. The binding never cleans up shader or
//! program objects on its own.

use std::ffi::{c_char, c_void, CStr, CString};
use std::marker::PhantomData;
use std::ptr;

use native_library::Library;

pub mod consts;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// signature of `glXGetProcAddressARB` and `wglGetProcAddress`
pub type ProcAddressFn = unsafe extern "system" fn(*const c_char) -> *const c_void;

#[cfg(target_os = "macos")]
const SYSTEM_GL_LIBRARIES: &[&str] = &["/System/Library/Frameworks/OpenGL.framework/OpenGL"];
#[cfg(target_os = "windows")]
const SYSTEM_GL_LIBRARIES: &[&str] = &["opengl32.dll"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const SYSTEM_GL_LIBRARIES: &[&str] = &["libGL.so.1", "libGL.so"];

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Library(#[from] native_library::Error),
    #[error("required OpenGL entry point {0} is missing")]
    MissingFunction(&'static str),
}

bitflags::bitflags! {
    /// Which optional groups of entry points were resolved when the binding was loaded.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GlCapabilities: u32 {
        /// glActiveTexture (GL 1.3)
        const ACTIVE_TEXTURE = 1;
        /// gen/delete/bind buffers and buffer (sub) data
        const BUFFER_OBJECTS = 1 << 1;
        /// vertex array objects and vertex attribute pointers
        const VERTEX_ARRAYS = 1 << 2;
        /// shader and program objects
        const SHADERS = 1 << 3;
        /// uniform / attribute locations and uniform uploads
        const UNIFORMS = 1 << 4;
    }
}

/// `major.minor` as reported by `glGetString(GL_VERSION)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
}

impl GlVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// parses strings like `"4.6.0 NVIDIA 535.54"`, `"3.0 Mesa 23.1"` or `"OpenGL ES 3.2 ..."`.
    pub fn parse(version: &str) -> Option<Self> {
        let version = version.trim_start();
        let version = version.strip_prefix("OpenGL ES ").unwrap_or(version);
        let number = version.split_whitespace().next()?;
        let mut parts = number.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts
            .next()?
            .chars()
            .take_while(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .ok()?;
        Some(Self { major, minor })
    }
}

impl std::fmt::Display for GlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Filters a loader result. WGL reports failure with a few small sentinel values besides null.
pub fn usable(ptr: *const c_void) -> Option<*const c_void> {
    match ptr as isize {
        -1 | 0..=3 => None,
        _ => Some(ptr),
    }
}

macro_rules! gl_tables {
    (
        required $required:ident {
            $( $rfield:ident : $rsym:literal => fn($($rarg:ty),*) $(-> $rret:ty)?; )*
        }
        optional $optional:ident {
            $( $ofield:ident : $osym:literal => fn($($oarg:ty),*) $(-> $oret:ty)?; )*
        }
    ) => {
        #[derive(Clone, Copy)]
        struct $required {
            $( $rfield: unsafe extern "system" fn($($rarg),*) $(-> $rret)?, )*
        }

        impl $required {
            fn load(direct: &mut dyn FnMut(&str) -> *const c_void) -> Result<Self, LoadError> {
                Ok(Self {
                    $(
                        $rfield: {
                            let ptr = usable(direct($rsym))
                                .ok_or(LoadError::MissingFunction($rsym))?;
                            // SAFETY: signature transcribed from the GL registry.
                            unsafe {
                                std::mem::transmute::<
                                    *const c_void,
                                    unsafe extern "system" fn($($rarg),*) $(-> $rret)?,
                                >(ptr)
                            }
                        },
                    )*
                })
            }
        }

        #[derive(Clone, Copy, Default)]
        struct $optional {
            $( $ofield: Option<unsafe extern "system" fn($($oarg),*) $(-> $oret)?>, )*
        }

        impl $optional {
            fn load(
                extension: &mut dyn FnMut(&str) -> *const c_void,
                direct: &mut dyn FnMut(&str) -> *const c_void,
            ) -> Self {
                Self {
                    $(
                        $ofield: usable(extension($osym))
                            .or_else(|| usable(direct($osym)))
                            // SAFETY: signature transcribed from the GL registry.
                            .map(|ptr| unsafe {
                                std::mem::transmute::<
                                    *const c_void,
                                    unsafe extern "system" fn($($oarg),*) $(-> $oret)?,
                                >(ptr)
                            }),
                    )*
                }
            }
        }
    };
}

gl_tables! {
    required CoreFunctions {
        clear_color: "glClearColor" => fn(f32, f32, f32, f32);
        clear: "glClear" => fn(u32);
        viewport: "glViewport" => fn(i32, i32, i32, i32);
        enable: "glEnable" => fn(u32);
        disable: "glDisable" => fn(u32);
        gen_textures: "glGenTextures" => fn(i32, *mut u32);
        delete_textures: "glDeleteTextures" => fn(i32, *const u32);
        bind_texture: "glBindTexture" => fn(u32, u32);
        tex_image_2d: "glTexImage2D" => fn(u32, i32, i32, i32, i32, i32, u32, u32, *const c_void);
        tex_sub_image_2d: "glTexSubImage2D"
            => fn(u32, i32, i32, i32, i32, i32, u32, u32, *const c_void);
        tex_parameteri: "glTexParameteri" => fn(u32, u32, i32);
        pixel_storei: "glPixelStorei" => fn(u32, i32);
        blend_func: "glBlendFunc" => fn(u32, u32);
        read_pixels: "glReadPixels" => fn(i32, i32, i32, i32, u32, u32, *mut c_void);
        get_string: "glGetString" => fn(u32) -> *const u8;
        get_error: "glGetError" => fn() -> u32;
        draw_arrays: "glDrawArrays" => fn(u32, i32, i32);
        flush: "glFlush" => fn();
    }
    optional ExtFunctions {
        active_texture: "glActiveTexture" => fn(u32);

        gen_buffers: "glGenBuffers" => fn(i32, *mut u32);
        delete_buffers: "glDeleteBuffers" => fn(i32, *const u32);
        bind_buffer: "glBindBuffer" => fn(u32, u32);
        buffer_data: "glBufferData" => fn(u32, isize, *const c_void, u32);
        buffer_sub_data: "glBufferSubData" => fn(u32, isize, isize, *const c_void);

        gen_vertex_arrays: "glGenVertexArrays" => fn(i32, *mut u32);
        delete_vertex_arrays: "glDeleteVertexArrays" => fn(i32, *const u32);
        bind_vertex_array: "glBindVertexArray" => fn(u32);
        vertex_attrib_pointer: "glVertexAttribPointer" => fn(u32, i32, u32, u8, i32, *const c_void);
        enable_vertex_attrib_array: "glEnableVertexAttribArray" => fn(u32);

        create_shader: "glCreateShader" => fn(u32) -> u32;
        shader_source: "glShaderSource" => fn(u32, i32, *const *const c_char, *const i32);
        compile_shader: "glCompileShader" => fn(u32);
        get_shaderiv: "glGetShaderiv" => fn(u32, u32, *mut i32);
        get_shader_info_log: "glGetShaderInfoLog" => fn(u32, i32, *mut i32, *mut c_char);
        delete_shader: "glDeleteShader" => fn(u32);
        create_program: "glCreateProgram" => fn() -> u32;
        attach_shader: "glAttachShader" => fn(u32, u32);
        link_program: "glLinkProgram" => fn(u32);
        get_programiv: "glGetProgramiv" => fn(u32, u32, *mut i32);
        get_program_info_log: "glGetProgramInfoLog" => fn(u32, i32, *mut i32, *mut c_char);
        use_program: "glUseProgram" => fn(u32);
        delete_program: "glDeleteProgram" => fn(u32);

        get_uniform_location: "glGetUniformLocation" => fn(u32, *const c_char) -> i32;
        get_attrib_location: "glGetAttribLocation" => fn(u32, *const c_char) -> i32;
        uniform1i: "glUniform1i" => fn(i32, i32);
        uniform4f: "glUniform4f" => fn(i32, f32, f32, f32, f32);
        uniform_matrix4fv: "glUniformMatrix4fv" => fn(i32, i32, u8, *const f32);
    }
}

impl ExtFunctions {
    fn capabilities(&self) -> GlCapabilities {
        let mut caps = GlCapabilities::empty();
        caps.set(GlCapabilities::ACTIVE_TEXTURE, self.active_texture.is_some());
        caps.set(
            GlCapabilities::BUFFER_OBJECTS,
            self.gen_buffers.is_some()
                && self.delete_buffers.is_some()
                && self.bind_buffer.is_some()
                && self.buffer_data.is_some()
                && self.buffer_sub_data.is_some(),
        );
        caps.set(
            GlCapabilities::VERTEX_ARRAYS,
            self.gen_vertex_arrays.is_some()
                && self.delete_vertex_arrays.is_some()
                && self.bind_vertex_array.is_some()
                && self.vertex_attrib_pointer.is_some()
                && self.enable_vertex_attrib_array.is_some(),
        );
        caps.set(
            GlCapabilities::SHADERS,
            self.create_shader.is_some()
                && self.shader_source.is_some()
                && self.compile_shader.is_some()
                && self.get_shaderiv.is_some()
                && self.get_shader_info_log.is_some()
                && self.delete_shader.is_some()
                && self.create_program.is_some()
                && self.attach_shader.is_some()
                && self.link_program.is_some()
                && self.get_programiv.is_some()
                && self.get_program_info_log.is_some()
                && self.use_program.is_some()
                && self.delete_program.is_some(),
        );
        caps.set(
            GlCapabilities::UNIFORMS,
            self.get_uniform_location.is_some()
                && self.get_attrib_location.is_some()
                && self.uniform1i.is_some()
                && self.uniform4f.is_some()
                && self.uniform_matrix4fv.is_some(),
        );
        caps
    }
}

/// The loaded OpenGL command set for one context.
pub struct OpenGl {
    core: CoreFunctions,
    ext: ExtFunctions,
    capabilities: GlCapabilities,
    // gl calls are only valid on the thread that owns the current context
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for OpenGl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenGl")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl OpenGl {
    /// Builds the binding from two loaders. `direct` resolves plain library exports, `extension`
    /// resolves through the platform extension loader. either may return null for unknown names.
    pub fn load_with<D, E>(mut direct: D, mut extension: E) -> Result<Self, LoadError>
    where
        D: FnMut(&str) -> *const c_void,
        E: FnMut(&str) -> *const c_void,
    {
        let core = CoreFunctions::load(&mut direct)?;
        let ext = ExtFunctions::load(&mut extension, &mut direct);
        let capabilities = ext.capabilities();
        if !capabilities.is_all() {
            tracing::warn!(
                missing = ?(GlCapabilities::all() - capabilities),
                "some optional OpenGL entry points are unavailable"
            );
        }
        Ok(Self {
            core,
            ext,
            capabilities,
            _not_send: PhantomData,
        })
    }

    /// Opens the system gl library and loads from it, using `extension` for the post 1.1 tier if
    /// given. the context that the extension loader answers for must already be current.
    pub fn load_system(extension: Option<ProcAddressFn>) -> Result<Self, LoadError> {
        let library = Library::open_any(SYSTEM_GL_LIBRARIES)?;
        Self::load_from(library, extension)
    }

    pub fn load_from(
        library: &Library,
        extension: Option<ProcAddressFn>,
    ) -> Result<Self, LoadError> {
        let direct = |name: &str| library.address(name).unwrap_or(ptr::null());
        let via_extension = |name: &str| match (extension, CString::new(name)) {
            // SAFETY: the loader takes a nul terminated name and returns an address or null.
            (Some(loader), Ok(name)) => unsafe { loader(name.as_ptr()) },
            _ => ptr::null(),
        };
        let gl = Self::load_with(direct, via_extension)?;
        tracing::debug!(library = library.name(), capabilities = ?gl.capabilities, "loaded opengl");
        Ok(gl)
    }

    pub fn capabilities(&self) -> GlCapabilities {
        self.capabilities
    }

    pub fn supports(&self, capabilities: GlCapabilities) -> bool {
        self.capabilities.contains(capabilities)
    }

    // ---- tier 1 ----

    pub unsafe fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        (self.core.clear_color)(r, g, b, a)
    }

    pub unsafe fn clear(&self, mask: u32) {
        (self.core.clear)(mask)
    }

    pub unsafe fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        (self.core.viewport)(x, y, width, height)
    }

    pub unsafe fn enable(&self, capability: u32) {
        (self.core.enable)(capability)
    }

    pub unsafe fn disable(&self, capability: u32) {
        (self.core.disable)(capability)
    }

    pub unsafe fn gen_textures(&self, textures: &mut [u32]) {
        (self.core.gen_textures)(textures.len() as i32, textures.as_mut_ptr())
    }

    pub unsafe fn gen_texture(&self) -> u32 {
        let mut texture = 0;
        self.gen_textures(std::slice::from_mut(&mut texture));
        texture
    }

    pub unsafe fn delete_textures(&self, textures: &[u32]) {
        (self.core.delete_textures)(textures.len() as i32, textures.as_ptr())
    }

    pub unsafe fn bind_texture(&self, target: u32, texture: u32) {
        (self.core.bind_texture)(target, texture)
    }

    /// `pixels` may be null to only allocate storage.
    #[allow(clippy::too_many_arguments)]
    pub unsafe fn tex_image_2d(
        &self,
        target: u32,
        level: i32,
        internal_format: i32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        pixels: *const c_void,
    ) {
        (self.core.tex_image_2d)(
            target,
            level,
            internal_format,
            width,
            height,
            border,
            format,
            ty,
            pixels,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub unsafe fn tex_sub_image_2d(
        &self,
        target: u32,
        level: i32,
        x_offset: i32,
        y_offset: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: *const c_void,
    ) {
        (self.core.tex_sub_image_2d)(
            target, level, x_offset, y_offset, width, height, format, ty, pixels,
        )
    }

    pub unsafe fn tex_parameteri(&self, target: u32, name: u32, param: i32) {
        (self.core.tex_parameteri)(target, name, param)
    }

    pub unsafe fn pixel_storei(&self, name: u32, param: i32) {
        (self.core.pixel_storei)(name, param)
    }

    pub unsafe fn blend_func(&self, source: u32, destination: u32) {
        (self.core.blend_func)(source, destination)
    }

    #[allow(clippy::too_many_arguments)]
    pub unsafe fn read_pixels(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        format: u32,
        ty: u32,
        pixels: *mut c_void,
    ) {
        (self.core.read_pixels)(x, y, width, height, format, ty, pixels)
    }

    /// `glGetString`. an unknown name, or no current context, gives an empty string.
    pub unsafe fn get_string(&self, name: u32) -> String {
        let ptr = (self.core.get_string)(name);
        if ptr.is_null() {
            return String::new();
        }
        CStr::from_ptr(ptr.cast()).to_string_lossy().into_owned()
    }

    pub unsafe fn version(&self) -> Option<GlVersion> {
        GlVersion::parse(&self.get_string(consts::VERSION))
    }

    pub unsafe fn vendor(&self) -> String {
        self.get_string(consts::VENDOR)
    }

    pub unsafe fn renderer(&self) -> String {
        self.get_string(consts::RENDERER)
    }

    pub unsafe fn get_error(&self) -> u32 {
        (self.core.get_error)()
    }

    pub unsafe fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        (self.core.draw_arrays)(mode, first, count)
    }

    pub unsafe fn flush(&self) {
        (self.core.flush)()
    }

    // ---- tier 2 ----

    pub unsafe fn active_texture(&self, unit: u32) {
        if let Some(f) = self.ext.active_texture {
            f(unit)
        }
    }

    pub unsafe fn gen_buffers(&self, buffers: &mut [u32]) {
        if let Some(f) = self.ext.gen_buffers {
            f(buffers.len() as i32, buffers.as_mut_ptr())
        }
    }

    pub unsafe fn gen_buffer(&self) -> u32 {
        let mut buffer = 0;
        self.gen_buffers(std::slice::from_mut(&mut buffer));
        buffer
    }

    pub unsafe fn delete_buffers(&self, buffers: &[u32]) {
        if let Some(f) = self.ext.delete_buffers {
            f(buffers.len() as i32, buffers.as_ptr())
        }
    }

    pub unsafe fn bind_buffer(&self, target: u32, buffer: u32) {
        if let Some(f) = self.ext.bind_buffer {
            f(target, buffer)
        }
    }

    /// `data` may be null to only allocate `size` bytes.
    pub unsafe fn buffer_data(&self, target: u32, size: usize, data: *const c_void, usage: u32) {
        if let Some(f) = self.ext.buffer_data {
            f(target, size as isize, data, usage)
        }
    }

    pub unsafe fn buffer_data_slice<T: bytemuck::Pod>(&self, target: u32, data: &[T], usage: u32) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.buffer_data(target, bytes.len(), bytes.as_ptr().cast(), usage)
    }

    pub unsafe fn buffer_sub_data(
        &self,
        target: u32,
        offset: usize,
        size: usize,
        data: *const c_void,
    ) {
        if let Some(f) = self.ext.buffer_sub_data {
            f(target, offset as isize, size as isize, data)
        }
    }

    pub unsafe fn buffer_sub_data_slice<T: bytemuck::Pod>(
        &self,
        target: u32,
        offset: usize,
        data: &[T],
    ) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.buffer_sub_data(target, offset, bytes.len(), bytes.as_ptr().cast())
    }

    pub unsafe fn gen_vertex_arrays(&self, arrays: &mut [u32]) {
        if let Some(f) = self.ext.gen_vertex_arrays {
            f(arrays.len() as i32, arrays.as_mut_ptr())
        }
    }

    pub unsafe fn gen_vertex_array(&self) -> u32 {
        let mut array = 0;
        self.gen_vertex_arrays(std::slice::from_mut(&mut array));
        array
    }

    pub unsafe fn delete_vertex_arrays(&self, arrays: &[u32]) {
        if let Some(f) = self.ext.delete_vertex_arrays {
            f(arrays.len() as i32, arrays.as_ptr())
        }
    }

    pub unsafe fn bind_vertex_array(&self, array: u32) {
        if let Some(f) = self.ext.bind_vertex_array {
            f(array)
        }
    }

    /// `offset` is the byte offset into the bound array buffer.
    pub unsafe fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        ty: u32,
        normalized: bool,
        stride: i32,
        offset: usize,
    ) {
        if let Some(f) = self.ext.vertex_attrib_pointer {
            let normalized = if normalized { consts::TRUE } else { consts::FALSE };
            f(index, size, ty, normalized, stride, offset as *const c_void)
        }
    }

    pub unsafe fn enable_vertex_attrib_array(&self, index: u32) {
        if let Some(f) = self.ext.enable_vertex_attrib_array {
            f(index)
        }
    }

    /// 0 when shaders are unsupported or creation failed.
    pub unsafe fn create_shader(&self, kind: u32) -> u32 {
        self.ext.create_shader.map_or(0, |f| f(kind))
    }

    pub unsafe fn shader_source(&self, shader: u32, source: &str) {
        if let Some(f) = self.ext.shader_source {
            let ptr = source.as_ptr().cast::<c_char>();
            let len = source.len() as i32;
            f(shader, 1, &ptr, &len)
        }
    }

    pub unsafe fn compile_shader(&self, shader: u32) {
        if let Some(f) = self.ext.compile_shader {
            f(shader)
        }
    }

    pub unsafe fn get_shader_iv(&self, shader: u32, name: u32) -> i32 {
        let mut value = 0;
        if let Some(f) = self.ext.get_shaderiv {
            f(shader, name, &mut value)
        }
        value
    }

    pub unsafe fn shader_compile_status(&self, shader: u32) -> bool {
        self.get_shader_iv(shader, consts::COMPILE_STATUS) != 0
    }

    pub unsafe fn get_shader_info_log(&self, shader: u32) -> String {
        let Some(f) = self.ext.get_shader_info_log else {
            return String::new();
        };
        let len = self.get_shader_iv(shader, consts::INFO_LOG_LENGTH);
        read_info_log(len, |capacity, written, buf| f(shader, capacity, written, buf))
    }

    pub unsafe fn delete_shader(&self, shader: u32) {
        if let Some(f) = self.ext.delete_shader {
            f(shader)
        }
    }

    pub unsafe fn create_program(&self) -> u32 {
        self.ext.create_program.map_or(0, |f| f())
    }

    pub unsafe fn attach_shader(&self, program: u32, shader: u32) {
        if let Some(f) = self.ext.attach_shader {
            f(program, shader)
        }
    }

    pub unsafe fn link_program(&self, program: u32) {
        if let Some(f) = self.ext.link_program {
            f(program)
        }
    }

    pub unsafe fn get_program_iv(&self, program: u32, name: u32) -> i32 {
        let mut value = 0;
        if let Some(f) = self.ext.get_programiv {
            f(program, name, &mut value)
        }
        value
    }

    pub unsafe fn program_link_status(&self, program: u32) -> bool {
        self.get_program_iv(program, consts::LINK_STATUS) != 0
    }

    pub unsafe fn get_program_info_log(&self, program: u32) -> String {
        let Some(f) = self.ext.get_program_info_log else {
            return String::new();
        };
        let len = self.get_program_iv(program, consts::INFO_LOG_LENGTH);
        read_info_log(len, |capacity, written, buf| f(program, capacity, written, buf))
    }

    pub unsafe fn use_program(&self, program: u32) {
        if let Some(f) = self.ext.use_program {
            f(program)
        }
    }

    pub unsafe fn delete_program(&self, program: u32) {
        if let Some(f) = self.ext.delete_program {
            f(program)
        }
    }

    /// -1 when the uniform does not exist, the name is not a valid C string, or uniforms are
    /// unsupported.
    pub unsafe fn get_uniform_location(&self, program: u32, name: &str) -> i32 {
        match (self.ext.get_uniform_location, CString::new(name)) {
            (Some(f), Ok(name)) => f(program, name.as_ptr()),
            _ => -1,
        }
    }

    pub unsafe fn get_attrib_location(&self, program: u32, name: &str) -> i32 {
        match (self.ext.get_attrib_location, CString::new(name)) {
            (Some(f), Ok(name)) => f(program, name.as_ptr()),
            _ => -1,
        }
    }

    pub unsafe fn uniform_1_i32(&self, location: i32, value: i32) {
        if let Some(f) = self.ext.uniform1i {
            f(location, value)
        }
    }

    pub unsafe fn uniform_4_f32(&self, location: i32, x: f32, y: f32, z: f32, w: f32) {
        if let Some(f) = self.ext.uniform4f {
            f(location, x, y, z, w)
        }
    }

    /// uploads one column-major 4x4 matrix.
    pub unsafe fn uniform_matrix_4_f32(&self, location: i32, transpose: bool, matrix: &[f32; 16]) {
        if let Some(f) = self.ext.uniform_matrix4fv {
            let transpose = if transpose { consts::TRUE } else { consts::FALSE };
            f(location, 1, transpose, matrix.as_ptr())
        }
    }
}

unsafe fn read_info_log(len: i32, read: impl FnOnce(i32, *mut i32, *mut c_char)) -> String {
    if len <= 0 {
        return String::new();
    }
    let mut buf = vec![0u8; len as usize];
    let mut written = 0;
    read(len, &mut written, buf.as_mut_ptr().cast());
    buf.truncate(written.clamp(0, len) as usize);
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn version_strings() {
        assert_eq!(GlVersion::parse("4.6.0 NVIDIA 535.54.03"), Some(GlVersion::new(4, 6)));
        assert_eq!(GlVersion::parse("3.0 Mesa 23.1.4"), Some(GlVersion::new(3, 0)));
        assert_eq!(GlVersion::parse("OpenGL ES 3.2 Mesa"), Some(GlVersion::new(3, 2)));
        assert_eq!(GlVersion::parse("2.1 ATI-4.14.1"), Some(GlVersion::new(2, 1)));
        assert_eq!(GlVersion::parse("4.1INTEL-18.8.4"), Some(GlVersion::new(4, 1)));
        assert_eq!(GlVersion::parse(""), None);
        assert_eq!(GlVersion::parse("garbage"), None);
        assert!(GlVersion::new(3, 0) < GlVersion::new(3, 2));
        assert!(GlVersion::new(2, 9) < GlVersion::new(3, 0));
    }

    #[test]
    fn missing_core_function_fails_the_load() {
        let err = OpenGl::load_with(
            |name| {
                if name == "glClear" {
                    ptr::null()
                } else {
                    testing::direct(name)
                }
            },
            testing::no_extensions,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::MissingFunction("glClear")));
    }

    #[test]
    fn extension_tier_falls_back_to_direct_exports() {
        let gl = OpenGl::load_with(testing::direct, testing::no_extensions).unwrap();
        assert!(gl.capabilities().is_all());
    }

    #[test]
    fn extension_loader_wins_over_direct_exports() {
        let mut asked_direct = Vec::new();
        let gl = OpenGl::load_with(
            |name| {
                asked_direct.push(name.to_owned());
                testing::direct(name)
            },
            testing::direct,
        )
        .unwrap();
        assert!(gl.capabilities().is_all());
        assert!(!asked_direct.iter().any(|name| name == "glCreateShader"));
        assert!(asked_direct.iter().any(|name| name == "glClear"));
    }

    #[test]
    fn wgl_sentinels_are_treated_as_missing() {
        let gl = OpenGl::load_with(testing::core_only, |_| 2 as *const c_void).unwrap();
        assert_eq!(gl.capabilities(), GlCapabilities::empty());
        let gl = OpenGl::load_with(testing::core_only, |_| -1isize as *const c_void).unwrap();
        assert_eq!(gl.capabilities(), GlCapabilities::empty());
    }

    #[test]
    fn absent_groups_degrade_to_invalid_values() {
        let gl = OpenGl::load_with(testing::core_only, testing::no_extensions).unwrap();
        assert!(!gl.supports(GlCapabilities::SHADERS));
        unsafe {
            assert_eq!(gl.create_shader(consts::VERTEX_SHADER), 0);
            assert_eq!(gl.create_program(), 0);
            assert_eq!(gl.get_uniform_location(1, "u_proj"), -1);
            assert_eq!(gl.gen_buffer(), 0);
            assert_eq!(gl.get_shader_info_log(1), "");
            gl.bind_vertex_array(3);
        }
        assert!(testing::take_calls().iter().all(|call| !call.starts_with("glBindVertexArray")));
    }

    #[test]
    fn partial_group_clears_only_that_capability() {
        let gl = OpenGl::load_with(
            |name| {
                if name == "glBufferSubData" {
                    ptr::null()
                } else {
                    testing::direct(name)
                }
            },
            testing::no_extensions,
        )
        .unwrap();
        assert!(!gl.supports(GlCapabilities::BUFFER_OBJECTS));
        assert!(gl.supports(GlCapabilities::SHADERS | GlCapabilities::VERTEX_ARRAYS));
    }

    #[test]
    fn strings_and_version() {
        let gl = testing::stub_gl();
        unsafe {
            assert_eq!(gl.version(), Some(GlVersion::new(3, 3)));
            assert_eq!(gl.vendor(), testing::VENDOR);
            // unknown names give the empty string rather than an error
            assert_eq!(gl.get_string(0xdead), "");
        }
    }

    #[test]
    fn shader_status_and_logs() {
        let gl = testing::stub_gl();
        unsafe {
            let good = gl.create_shader(consts::VERTEX_SHADER);
            gl.shader_source(good, "void main() {}");
            gl.compile_shader(good);
            assert!(gl.shader_compile_status(good));
            assert_eq!(gl.get_shader_info_log(good), "");

            let bad = gl.create_shader(consts::FRAGMENT_SHADER);
            assert_ne!(good, bad);
            gl.shader_source(bad, "#error nope");
            gl.compile_shader(bad);
            assert!(!gl.shader_compile_status(bad));
            assert_eq!(gl.get_shader_info_log(bad), testing::COMPILE_ERROR_LOG);

            let program = gl.create_program();
            gl.attach_shader(program, good);
            gl.link_program(program);
            assert!(gl.program_link_status(program));
            assert_eq!(gl.get_program_info_log(program), "");
        }
    }

    #[test]
    fn typed_uploads_pass_byte_sizes() {
        let gl = testing::stub_gl();
        testing::take_calls();
        unsafe {
            gl.buffer_data_slice(consts::ARRAY_BUFFER, &[0.0f32; 12], consts::DYNAMIC_DRAW);
            gl.buffer_sub_data_slice(consts::ARRAY_BUFFER, 8, &[1u16, 2, 3]);
            gl.uniform_matrix_4_f32(2, false, &[0.0; 16]);
        }
        assert_eq!(
            testing::take_calls(),
            vec![
                format!("glBufferData({}, 48, {})", consts::ARRAY_BUFFER, consts::DYNAMIC_DRAW),
                format!("glBufferSubData({}, 8, 6)", consts::ARRAY_BUFFER),
                "glUniformMatrix4fv(2, 1, 0)".to_owned(),
            ]
        );
    }
}

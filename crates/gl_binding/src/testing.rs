//! A recording stand-in for a real GL driver, for testing code above the binding without a context.
//!
//! Every stub appends `"glName(args)"` to a thread local log that [`take_calls`] drains.
//! object names are handed out from a per thread counter starting at 1. shader sources containing
//! `#error` fail to compile with [`COMPILE_ERROR_LOG`] as their info log.

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::{c_char, c_void, CStr};
use std::ptr;

use crate::{consts, OpenGl};

pub const VERSION: &str = "3.3.0 Stub";
pub const VENDOR: &str = "stub vendor";
pub const RENDERER: &str = "stub renderer";
pub const COMPILE_ERROR_LOG: &str = "0:1(1): error: #error directive";

#[derive(Default)]
struct StubDriver {
    calls: Vec<String>,
    next_name: u32,
    sources: HashMap<u32, String>,
    compiled: HashMap<u32, bool>,
    error: u32,
}

thread_local! {
    static DRIVER: RefCell<StubDriver> = RefCell::new(StubDriver::default());
}

fn record(call: String) {
    DRIVER.with(|d| d.borrow_mut().calls.push(call));
}

fn next_name() -> u32 {
    DRIVER.with(|d| {
        let mut d = d.borrow_mut();
        d.next_name += 1;
        d.next_name
    })
}

/// drains the calls recorded on this thread.
pub fn take_calls() -> Vec<String> {
    DRIVER.with(|d| std::mem::take(&mut d.borrow_mut().calls))
}

/// makes the next `glGetError` on this thread return `error`.
pub fn set_error(error: u32) {
    DRIVER.with(|d| d.borrow_mut().error = error);
}

/// binding with every entry point pointing at the stubs.
pub fn stub_gl() -> OpenGl {
    match OpenGl::load_with(direct, no_extensions) {
        Ok(gl) => gl,
        Err(e) => unreachable!("stub table is complete: {e}"),
    }
}

pub fn no_extensions(_name: &str) -> *const c_void {
    ptr::null()
}

/// resolves only the GL 1.1 core.
pub fn core_only(name: &str) -> *const c_void {
    core_stub(name).unwrap_or(ptr::null())
}

/// resolves every entry point the binding knows about.
pub fn direct(name: &str) -> *const c_void {
    core_stub(name).or_else(|| ext_stub(name)).unwrap_or(ptr::null())
}

fn core_stub(name: &str) -> Option<*const c_void> {
    let f: *const c_void = match name {
        "glClearColor" => clear_color as _,
        "glClear" => clear as _,
        "glViewport" => viewport as _,
        "glEnable" => enable as _,
        "glDisable" => disable as _,
        "glGenTextures" => gen_names as _,
        "glDeleteTextures" => delete_textures as _,
        "glBindTexture" => bind_texture as _,
        "glTexImage2D" => tex_image_2d as _,
        "glTexSubImage2D" => tex_sub_image_2d as _,
        "glTexParameteri" => tex_parameteri as _,
        "glPixelStorei" => pixel_storei as _,
        "glBlendFunc" => blend_func as _,
        "glReadPixels" => read_pixels as _,
        "glGetString" => get_string as _,
        "glGetError" => get_error as _,
        "glDrawArrays" => draw_arrays as _,
        "glFlush" => flush as _,
        _ => return None,
    };
    Some(f)
}

fn ext_stub(name: &str) -> Option<*const c_void> {
    let f: *const c_void = match name {
        "glActiveTexture" => active_texture as _,
        "glGenBuffers" | "glGenVertexArrays" => gen_names as _,
        "glDeleteBuffers" | "glDeleteVertexArrays" => delete_names as _,
        "glBindBuffer" => bind_buffer as _,
        "glBufferData" => buffer_data as _,
        "glBufferSubData" => buffer_sub_data as _,
        "glBindVertexArray" => bind_vertex_array as _,
        "glVertexAttribPointer" => vertex_attrib_pointer as _,
        "glEnableVertexAttribArray" => enable_vertex_attrib_array as _,
        "glCreateShader" => create_shader as _,
        "glShaderSource" => shader_source as _,
        "glCompileShader" => compile_shader as _,
        "glGetShaderiv" => get_shaderiv as _,
        "glGetShaderInfoLog" => get_shader_info_log as _,
        "glDeleteShader" => delete_shader as _,
        "glCreateProgram" => create_program as _,
        "glAttachShader" => attach_shader as _,
        "glLinkProgram" => link_program as _,
        "glGetProgramiv" => get_programiv as _,
        "glGetProgramInfoLog" => get_program_info_log as _,
        "glUseProgram" => use_program as _,
        "glDeleteProgram" => delete_program as _,
        "glGetUniformLocation" => get_uniform_location as _,
        "glGetAttribLocation" => get_attrib_location as _,
        "glUniform1i" => uniform1i as _,
        "glUniform4f" => uniform4f as _,
        "glUniformMatrix4fv" => uniform_matrix4fv as _,
        _ => return None,
    };
    Some(f)
}

unsafe extern "system" fn clear_color(r: f32, g: f32, b: f32, a: f32) {
    record(format!("glClearColor({r}, {g}, {b}, {a})"));
}

unsafe extern "system" fn clear(mask: u32) {
    record(format!("glClear({mask})"));
}

unsafe extern "system" fn viewport(x: i32, y: i32, width: i32, height: i32) {
    record(format!("glViewport({x}, {y}, {width}, {height})"));
}

unsafe extern "system" fn enable(cap: u32) {
    record(format!("glEnable({cap})"));
}

unsafe extern "system" fn disable(cap: u32) {
    record(format!("glDisable({cap})"));
}

unsafe extern "system" fn gen_names(n: i32, names: *mut u32) {
    for i in 0..n.max(0) as usize {
        *names.add(i) = next_name();
    }
}

unsafe extern "system" fn delete_names(n: i32, _names: *const u32) {
    record(format!("glDelete({n})"));
}

unsafe extern "system" fn delete_textures(n: i32, names: *const u32) {
    let names = std::slice::from_raw_parts(names, n.max(0) as usize);
    record(format!("glDeleteTextures({names:?})"));
}

unsafe extern "system" fn bind_texture(target: u32, texture: u32) {
    record(format!("glBindTexture({target}, {texture})"));
}

#[allow(clippy::too_many_arguments)]
unsafe extern "system" fn tex_image_2d(
    _target: u32,
    _level: i32,
    internal_format: i32,
    width: i32,
    height: i32,
    _border: i32,
    format: u32,
    _ty: u32,
    pixels: *const c_void,
) {
    record(format!(
        "glTexImage2D({internal_format}, {width}, {height}, {format}, {})",
        if pixels.is_null() { "null" } else { "data" }
    ));
}

#[allow(clippy::too_many_arguments)]
unsafe extern "system" fn tex_sub_image_2d(
    _target: u32,
    _level: i32,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    format: u32,
    _ty: u32,
    _pixels: *const c_void,
) {
    record(format!("glTexSubImage2D({x}, {y}, {width}, {height}, {format})"));
}

unsafe extern "system" fn tex_parameteri(target: u32, name: u32, param: i32) {
    record(format!("glTexParameteri({target}, {name}, {param})"));
}

unsafe extern "system" fn pixel_storei(name: u32, param: i32) {
    record(format!("glPixelStorei({name}, {param})"));
}

unsafe extern "system" fn blend_func(src: u32, dst: u32) {
    record(format!("glBlendFunc({src}, {dst})"));
}

unsafe extern "system" fn read_pixels(
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    _format: u32,
    _ty: u32,
    pixels: *mut c_void,
) {
    record(format!("glReadPixels({x}, {y}, {width}, {height})"));
    // four bytes of mid grey per rgba pixel
    let len = (width.max(0) * height.max(0) * 4) as usize;
    ptr::write_bytes(pixels.cast::<u8>(), 0x80, len);
}

unsafe extern "system" fn get_string(name: u32) -> *const u8 {
    let s: &'static [u8] = match name {
        consts::VERSION => b"3.3.0 Stub\0",
        consts::VENDOR => b"stub vendor\0",
        consts::RENDERER => b"stub renderer\0",
        consts::SHADING_LANGUAGE_VERSION => b"3.30\0",
        _ => return ptr::null(),
    };
    s.as_ptr()
}

unsafe extern "system" fn get_error() -> u32 {
    DRIVER.with(|d| std::mem::replace(&mut d.borrow_mut().error, consts::NO_ERROR))
}

unsafe extern "system" fn draw_arrays(mode: u32, first: i32, count: i32) {
    record(format!("glDrawArrays({mode}, {first}, {count})"));
}

unsafe extern "system" fn flush() {
    record("glFlush()".to_owned());
}

unsafe extern "system" fn active_texture(unit: u32) {
    record(format!("glActiveTexture({unit})"));
}

unsafe extern "system" fn bind_buffer(target: u32, buffer: u32) {
    record(format!("glBindBuffer({target}, {buffer})"));
}

unsafe extern "system" fn buffer_data(target: u32, size: isize, _data: *const c_void, usage: u32) {
    record(format!("glBufferData({target}, {size}, {usage})"));
}

unsafe extern "system" fn buffer_sub_data(
    target: u32,
    offset: isize,
    size: isize,
    _data: *const c_void,
) {
    record(format!("glBufferSubData({target}, {offset}, {size})"));
}

unsafe extern "system" fn bind_vertex_array(array: u32) {
    record(format!("glBindVertexArray({array})"));
}

unsafe extern "system" fn vertex_attrib_pointer(
    index: u32,
    size: i32,
    ty: u32,
    normalized: u8,
    stride: i32,
    offset: *const c_void,
) {
    record(format!(
        "glVertexAttribPointer({index}, {size}, {ty}, {normalized}, {stride}, {})",
        offset as usize
    ));
}

unsafe extern "system" fn enable_vertex_attrib_array(index: u32) {
    record(format!("glEnableVertexAttribArray({index})"));
}

unsafe extern "system" fn create_shader(kind: u32) -> u32 {
    record(format!("glCreateShader({kind})"));
    next_name()
}

unsafe extern "system" fn shader_source(
    shader: u32,
    count: i32,
    strings: *const *const c_char,
    lengths: *const i32,
) {
    let mut source = String::new();
    for i in 0..count.max(0) as usize {
        let s = *strings.add(i);
        let part = if lengths.is_null() || *lengths.add(i) < 0 {
            CStr::from_ptr(s).to_bytes()
        } else {
            std::slice::from_raw_parts(s.cast::<u8>(), *lengths.add(i) as usize)
        };
        source.push_str(&String::from_utf8_lossy(part));
    }
    DRIVER.with(|d| d.borrow_mut().sources.insert(shader, source));
}

unsafe extern "system" fn compile_shader(shader: u32) {
    record(format!("glCompileShader({shader})"));
    DRIVER.with(|d| {
        let mut d = d.borrow_mut();
        let ok = d.sources.get(&shader).map_or(false, |s| !s.contains("#error"));
        d.compiled.insert(shader, ok);
    });
}

fn compiled(shader: u32) -> bool {
    DRIVER.with(|d| d.borrow().compiled.get(&shader).copied().unwrap_or(false))
}

unsafe extern "system" fn get_shaderiv(shader: u32, name: u32, value: *mut i32) {
    *value = match name {
        consts::COMPILE_STATUS => compiled(shader) as i32,
        consts::INFO_LOG_LENGTH if !compiled(shader) => COMPILE_ERROR_LOG.len() as i32 + 1,
        _ => 0,
    };
}

unsafe extern "system" fn get_shader_info_log(
    shader: u32,
    capacity: i32,
    written: *mut i32,
    log: *mut c_char,
) {
    if compiled(shader) || capacity <= 0 {
        *written = 0;
        return;
    }
    let len = COMPILE_ERROR_LOG.len().min(capacity as usize - 1);
    ptr::copy_nonoverlapping(COMPILE_ERROR_LOG.as_ptr(), log.cast::<u8>(), len);
    *log.add(len) = 0;
    *written = len as i32;
}

unsafe extern "system" fn delete_shader(shader: u32) {
    record(format!("glDeleteShader({shader})"));
}

unsafe extern "system" fn create_program() -> u32 {
    record("glCreateProgram()".to_owned());
    next_name()
}

unsafe extern "system" fn attach_shader(program: u32, shader: u32) {
    record(format!("glAttachShader({program}, {shader})"));
}

unsafe extern "system" fn link_program(program: u32) {
    record(format!("glLinkProgram({program})"));
}

unsafe extern "system" fn get_programiv(_program: u32, name: u32, value: *mut i32) {
    *value = (name == consts::LINK_STATUS) as i32;
}

unsafe extern "system" fn get_program_info_log(
    _program: u32,
    _capacity: i32,
    written: *mut i32,
    _log: *mut c_char,
) {
    *written = 0;
}

unsafe extern "system" fn use_program(program: u32) {
    record(format!("glUseProgram({program})"));
}

unsafe extern "system" fn delete_program(program: u32) {
    record(format!("glDeleteProgram({program})"));
}

unsafe extern "system" fn get_uniform_location(_program: u32, name: *const c_char) -> i32 {
    match CStr::from_ptr(name).to_bytes() {
        b"u_projection" => 0,
        b"u_texture" => 1,
        _ => -1,
    }
}

unsafe extern "system" fn get_attrib_location(_program: u32, name: *const c_char) -> i32 {
    match CStr::from_ptr(name).to_bytes() {
        b"a_pos" => 0,
        b"a_uv" => 1,
        _ => -1,
    }
}

unsafe extern "system" fn uniform1i(location: i32, value: i32) {
    record(format!("glUniform1i({location}, {value})"));
}

unsafe extern "system" fn uniform4f(location: i32, x: f32, y: f32, z: f32, w: f32) {
    record(format!("glUniform4f({location}, {x}, {y}, {z}, {w})"));
}

unsafe extern "system" fn uniform_matrix4fv(
    location: i32,
    count: i32,
    transpose: u8,
    _value: *const f32,
) {
    record(format!("glUniformMatrix4fv({location}, {count}, {transpose})"));
}

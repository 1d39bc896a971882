//! The GL enums used by the binding and its consumers. values come from glow's generated tables.

pub use glow::{
    ALPHA, ARRAY_BUFFER, BLEND, CLAMP_TO_EDGE, COLOR_BUFFER_BIT, COMPILE_STATUS, DYNAMIC_DRAW,
    FLOAT, FRAGMENT_SHADER, INFO_LOG_LENGTH, INVALID_ENUM, INVALID_OPERATION, INVALID_VALUE,
    LINEAR, LINK_STATUS, NEAREST, NO_ERROR, ONE_MINUS_SRC_ALPHA, OUT_OF_MEMORY, PACK_ALIGNMENT, R8,
    RED, RENDERER, RGBA, RGBA8, SHADING_LANGUAGE_VERSION, SRC_ALPHA, STATIC_DRAW, TEXTURE0,
    TEXTURE_2D, TEXTURE_MAG_FILTER, TEXTURE_MIN_FILTER, TEXTURE_WRAP_S, TEXTURE_WRAP_T, TRIANGLES,
    TRIANGLE_STRIP, UNPACK_ALIGNMENT, UNSIGNED_BYTE, VENDOR, VERSION, VERTEX_SHADER,
};

/// `GL_FALSE` / `GL_TRUE` as passed to `GLboolean` parameters.
pub const FALSE: u8 = 0;
pub const TRUE: u8 = 1;

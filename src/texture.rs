use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gl_binding::{consts, OpenGl};

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// four bytes per pixel, premultiplied or straight alpha is up to the shader
    Rgba8,
    /// one byte per pixel, eg: glyph atlases
    R8,
}

impl TextureFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::R8 => 1,
        }
    }

    /// length of a tightly packed `width` x `height` image
    pub fn image_len(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }

    fn internal_format(self) -> i32 {
        match self {
            TextureFormat::Rgba8 => consts::RGBA8 as i32,
            TextureFormat::R8 => consts::R8 as i32,
        }
    }

    fn pixel_format(self) -> u32 {
        match self {
            TextureFormat::Rgba8 => consts::RGBA,
            TextureFormat::R8 => consts::RED,
        }
    }

    /// rows are tightly packed. gl defaults to 4 byte row alignment, which breaks single channel
    /// images whose width is not a multiple of 4.
    fn unpack_alignment(self) -> i32 {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::R8 => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

impl TextureFilter {
    fn gl_enum(self) -> i32 {
        match self {
            TextureFilter::Linear => consts::LINEAR as i32,
            TextureFilter::Nearest => consts::NEAREST as i32,
        }
    }
}

/// A 2D texture owned by the render thread.
///
/// Textures are not deleted on drop, since that needs the gl binding. call [`Texture::delete`]
/// while the context is still alive.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    id: u32,
    format: TextureFormat,
    width: u32,
    height: u32,
}

impl Texture {
    /// Allocates a `width` x `height` texture, uploading `pixels` if given. the texture is left
    /// bound to `TEXTURE_2D`.
    ///
    /// # Safety
    /// the context `gl` was loaded for must be current on this thread.
    pub unsafe fn new(
        gl: &OpenGl,
        format: TextureFormat,
        [width, height]: [u32; 2],
        filter: TextureFilter,
        pixels: Option<&[u8]>,
    ) -> Result<Self, Error> {
        if let Some(pixels) = pixels {
            check_len(format.image_len(width, height), pixels)?;
        }
        let id = gl.gen_texture();
        gl.bind_texture(consts::TEXTURE_2D, id);
        gl.tex_parameteri(consts::TEXTURE_2D, consts::TEXTURE_MIN_FILTER, filter.gl_enum());
        gl.tex_parameteri(consts::TEXTURE_2D, consts::TEXTURE_MAG_FILTER, filter.gl_enum());
        gl.tex_parameteri(consts::TEXTURE_2D, consts::TEXTURE_WRAP_S, consts::CLAMP_TO_EDGE as i32);
        gl.tex_parameteri(consts::TEXTURE_2D, consts::TEXTURE_WRAP_T, consts::CLAMP_TO_EDGE as i32);
        let mut texture = Self {
            id,
            format,
            width: 0,
            height: 0,
        };
        texture.allocate(gl, width, height, pixels);
        tracing::debug!(id, ?format, width, height, "created texture");
        Ok(texture)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// # Safety
    /// the owning context must be current.
    pub unsafe fn bind(&self, gl: &OpenGl) {
        gl.bind_texture(consts::TEXTURE_2D, self.id);
    }

    /// Replaces a `width` x `height` region at `x`, `y` with tightly packed `pixels`.
    ///
    /// # Safety
    /// the owning context must be current.
    pub unsafe fn update(
        &mut self,
        gl: &OpenGl,
        [x, y]: [u32; 2],
        [width, height]: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), Error> {
        let fits = x.checked_add(width).map_or(false, |right| right <= self.width)
            && y.checked_add(height).map_or(false, |bottom| bottom <= self.height);
        if !fits {
            return Err(Error::OutOfBounds {
                region: [x, y, width, height],
                width: self.width,
                height: self.height,
            });
        }
        check_len(self.format.image_len(width, height), pixels)?;
        self.bind(gl);
        gl.pixel_storei(consts::UNPACK_ALIGNMENT, self.format.unpack_alignment());
        gl.tex_sub_image_2d(
            consts::TEXTURE_2D,
            0,
            x as i32,
            y as i32,
            width as i32,
            height as i32,
            self.format.pixel_format(),
            consts::UNSIGNED_BYTE,
            pixels.as_ptr().cast(),
        );
        Ok(())
    }

    /// Uploads `shared` if a producer wrote to it since the last sync, reallocating when its size
    /// changed. returns whether anything was uploaded.
    ///
    /// The lock is held for the duration of the upload, so a producer never races a half read
    /// frame.
    ///
    /// # Safety
    /// the owning context must be current.
    pub unsafe fn sync(&mut self, gl: &OpenGl, shared: &SharedPixels) -> Result<bool, Error> {
        let mut buffer = shared.lock();
        if !buffer.dirty {
            return Ok(false);
        }
        if buffer.format != self.format {
            return Err(Error::FormatMismatch {
                texture: self.format,
                pixels: buffer.format,
            });
        }
        let size = [buffer.width, buffer.height];
        if size == self.size() {
            self.update(gl, [0, 0], size, &buffer.pixels)?;
        } else {
            self.bind(gl);
            self.allocate(gl, buffer.width, buffer.height, Some(&buffer.pixels));
        }
        buffer.dirty = false;
        Ok(true)
    }

    /// # Safety
    /// the owning context must be current.
    pub unsafe fn delete(self, gl: &OpenGl) {
        gl.delete_textures(&[self.id]);
    }

    /// expects the texture to be bound and `pixels` to have the right length
    unsafe fn allocate(&mut self, gl: &OpenGl, width: u32, height: u32, pixels: Option<&[u8]>) {
        gl.pixel_storei(consts::UNPACK_ALIGNMENT, self.format.unpack_alignment());
        gl.tex_image_2d(
            consts::TEXTURE_2D,
            0,
            self.format.internal_format(),
            width as i32,
            height as i32,
            0,
            self.format.pixel_format(),
            consts::UNSIGNED_BYTE,
            pixels.map_or(ptr::null(), |pixels| pixels.as_ptr().cast()),
        );
        self.width = width;
        self.height = height;
    }
}

fn check_len(expected: usize, pixels: &[u8]) -> Result<(), Error> {
    if pixels.len() == expected {
        Ok(())
    } else {
        Err(Error::PixelLength {
            expected,
            actual: pixels.len(),
        })
    }
}

#[derive(Debug)]
struct PixelBuffer {
    format: TextureFormat,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    dirty: bool,
}

/// A pixel buffer that another thread writes and the render thread uploads with [`Texture::sync`].
///
/// Writers and the uploader take the same lock, one at a time. a write is only visible to the
/// uploader once it completed, so the texture never shows a torn frame.
#[derive(Debug, Clone)]
pub struct SharedPixels {
    inner: Arc<Mutex<PixelBuffer>>,
}

impl SharedPixels {
    /// a zeroed image, marked dirty so the first sync uploads it
    pub fn new(format: TextureFormat, [width, height]: [u32; 2]) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PixelBuffer {
                format,
                width,
                height,
                pixels: vec![0; format.image_len(width, height)],
                dirty: true,
            })),
        }
    }

    pub fn format(&self) -> TextureFormat {
        self.lock().format
    }

    pub fn size(&self) -> [u32; 2] {
        let buffer = self.lock();
        [buffer.width, buffer.height]
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().dirty
    }

    /// Runs `write` on the pixels with the lock held and marks the buffer dirty.
    pub fn write<R>(&self, write: impl FnOnce(&mut [u8], [u32; 2]) -> R) -> R {
        let mut buffer = self.lock();
        let size = [buffer.width, buffer.height];
        let result = write(&mut buffer.pixels, size);
        buffer.dirty = true;
        result
    }

    /// Swaps in a whole new image, possibly of a different size.
    pub fn replace(&self, [width, height]: [u32; 2], pixels: Vec<u8>) -> Result<(), Error> {
        let mut buffer = self.lock();
        check_len(buffer.format.image_len(width, height), &pixels)?;
        buffer.width = width;
        buffer.height = height;
        buffer.pixels = pixels;
        buffer.dirty = true;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, PixelBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gl_binding::testing::{self, stub_gl};

    #[test]
    fn image_len_is_tightly_packed() {
        assert_eq!(TextureFormat::Rgba8.image_len(3, 2), 24);
        assert_eq!(TextureFormat::R8.image_len(3, 2), 6);
    }

    #[test]
    fn wrong_pixel_length_is_rejected_before_any_gl_call() {
        let gl = stub_gl();
        testing::take_calls();
        let result = unsafe {
            Texture::new(
                &gl,
                TextureFormat::Rgba8,
                [2, 2],
                TextureFilter::Linear,
                Some(&[0; 15]),
            )
        };
        assert!(matches!(result, Err(Error::PixelLength { expected: 16, actual: 15 })));
        assert!(testing::take_calls().is_empty());
    }

    #[test]
    fn update_outside_the_texture_fails() {
        let gl = stub_gl();
        let mut texture =
            unsafe { Texture::new(&gl, TextureFormat::R8, [4, 4], TextureFilter::Nearest, None) }
                .unwrap();
        let result = unsafe { texture.update(&gl, [3, 0], [2, 1], &[0; 2]) };
        assert!(matches!(result, Err(Error::OutOfBounds { width: 4, height: 4, .. })));
        let result = unsafe { texture.update(&gl, [u32::MAX, 0], [2, 1], &[0; 2]) };
        assert!(matches!(result, Err(Error::OutOfBounds { .. })));
        unsafe { texture.delete(&gl) };
    }

    #[test]
    fn writes_mark_the_buffer_dirty() {
        let shared = SharedPixels::new(TextureFormat::R8, [2, 2]);
        assert!(shared.is_dirty());
        let producer = shared.clone();
        let gl = stub_gl();
        let mut texture =
            unsafe { Texture::new(&gl, TextureFormat::R8, [2, 2], TextureFilter::Linear, None) }
                .unwrap();
        assert!(unsafe { texture.sync(&gl, &shared) }.unwrap());
        assert!(!shared.is_dirty());
        assert!(!unsafe { texture.sync(&gl, &shared) }.unwrap());

        std::thread::spawn(move || {
            producer.write(|pixels, [width, _]| pixels[width as usize] = 255)
        })
        .join()
        .unwrap();
        assert!(shared.is_dirty());
        assert!(unsafe { texture.sync(&gl, &shared) }.unwrap());
    }

    #[test]
    fn replace_checks_the_length() {
        let shared = SharedPixels::new(TextureFormat::Rgba8, [1, 1]);
        assert!(shared.replace([2, 1], vec![0; 4]).is_err());
        shared.replace([2, 1], vec![0; 8]).unwrap();
        assert_eq!(shared.size(), [2, 1]);
        assert_eq!(shared.format(), TextureFormat::Rgba8);
    }

    #[test]
    fn mismatched_format_is_not_uploaded() {
        let gl = stub_gl();
        let mut texture =
            unsafe { Texture::new(&gl, TextureFormat::Rgba8, [1, 1], TextureFilter::Linear, None) }
                .unwrap();
        let shared = SharedPixels::new(TextureFormat::R8, [1, 1]);
        assert!(matches!(
            unsafe { texture.sync(&gl, &shared) },
            Err(Error::FormatMismatch {
                texture: TextureFormat::Rgba8,
                pixels: TextureFormat::R8
            })
        ));
        assert!(shared.is_dirty());
    }
}

use std::rc::Rc;
use std::time::{Duration, Instant};

use gl_binding::{consts, GlVersion, OpenGl};
use window_backend::{Window, WindowConfig};

use crate::{Error, Frame, SharedPixels, Texture, TextureFilter, TextureFormat};

#[derive(Debug, Clone, PartialEq)]
pub struct GlWindowConfig {
    pub window: WindowConfig,
    /// the loop sleeps away whatever is left of this after each swap
    pub frame_interval: Duration,
    /// cleared to before each frame. `None` leaves the previous contents.
    pub clear_color: Option<[f32; 4]>,
    /// creation fails if the context reports an older version. an unparseable version string
    /// passes.
    pub min_gl_version: Option<GlVersion>,
}

impl Default for GlWindowConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            frame_interval: Duration::from_secs(1) / 120,
            clear_color: Some([0.0, 0.0, 0.0, 1.0]),
            min_gl_version: Some(GlVersion::new(3, 0)),
        }
    }
}

/// A platform window plus the loaded gl binding, driven by [`GlWindow::run`].
pub struct GlWindow {
    window: Box<dyn Window>,
    gl: Rc<OpenGl>,
    config: GlWindowConfig,
}

impl std::fmt::Debug for GlWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlWindow")
            .field("gl", &self.gl)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GlWindow {
    /// Opens the native window of this platform and prepares its context for drawing.
    pub fn new(config: GlWindowConfig) -> Result<Self, Error> {
        let window = crate::open_window(&config.window)?;
        Self::from_platform(window, config)
    }

    /// Wraps an already created window. the window is closed if its context is unusable.
    pub fn from_platform(
        mut window: Box<dyn Window>,
        config: GlWindowConfig,
    ) -> Result<Self, Error> {
        match Self::prepare(&*window, &config) {
            Ok(gl) => Ok(Self { window, gl, config }),
            Err(e) => {
                window.close();
                Err(e)
            }
        }
    }

    fn prepare(window: &dyn Window, config: &GlWindowConfig) -> Result<Rc<OpenGl>, Error> {
        let gl = window.gl()?;
        // SAFETY: the backend made its context current on this thread
        unsafe {
            let version = gl.version();
            tracing::info!(
                version = %gl.get_string(consts::VERSION),
                vendor = %gl.vendor(),
                renderer = %gl.renderer(),
                glsl = %gl.get_string(consts::SHADING_LANGUAGE_VERSION),
                "opengl context ready"
            );
            match (version, config.min_gl_version) {
                (Some(found), Some(required)) if found < required => {
                    return Err(Error::GlTooOld { found, required });
                }
                (None, Some(required)) => {
                    tracing::warn!(
                        %required,
                        "the driver did not report a parseable version, continuing"
                    );
                }
                _ => {}
            }
            gl.enable(consts::BLEND);
            gl.blend_func(consts::SRC_ALPHA, consts::ONE_MINUS_SRC_ALPHA);
        }
        Ok(gl)
    }

    pub fn gl(&self) -> &OpenGl {
        &self.gl
    }

    pub fn window(&self) -> &dyn Window {
        &*self.window
    }

    pub fn config(&self) -> &GlWindowConfig {
        &self.config
    }

    pub fn create_texture(
        &self,
        format: TextureFormat,
        size: [u32; 2],
        filter: TextureFilter,
        pixels: Option<&[u8]>,
    ) -> Result<Texture, Error> {
        // SAFETY: the context stays current until the window is closed, which consumes self
        unsafe { Texture::new(&self.gl, format, size, filter, pixels) }
    }

    /// creates a texture matching `shared` and uploads its current contents
    pub fn create_shared_texture(
        &self,
        shared: &SharedPixels,
        filter: TextureFilter,
    ) -> Result<Texture, Error> {
        let mut texture = self.create_texture(shared.format(), shared.size(), filter, None)?;
        // SAFETY: see create_texture
        unsafe { texture.sync(&self.gl, shared)? };
        Ok(texture)
    }

    pub fn update_texture(
        &self,
        texture: &mut Texture,
        offset: [u32; 2],
        size: [u32; 2],
        pixels: &[u8],
    ) -> Result<(), Error> {
        // SAFETY: see create_texture
        unsafe { texture.update(&self.gl, offset, size, pixels) }
    }

    pub fn sync_texture(
        &self,
        texture: &mut Texture,
        shared: &SharedPixels,
    ) -> Result<bool, Error> {
        // SAFETY: see create_texture
        unsafe { texture.sync(&self.gl, shared) }
    }

    pub fn delete_texture(&self, texture: Texture) {
        // SAFETY: see create_texture
        unsafe { texture.delete(&self.gl) }
    }

    /// Calls `step` once per frame until the window is closed, `step` fails or a frame requests
    /// close.
    ///
    /// Each iteration polls events, sets the viewport to the framebuffer and clears it, runs
    /// `step`, swaps and then sleeps for the rest of the frame interval. the window is closed
    /// before this returns, on every path.
    pub fn run<E>(mut self, mut step: impl FnMut(&mut Frame) -> Result<(), E>) -> Result<(), E> {
        let result = self.run_frames(&mut step);
        if result.is_err() {
            tracing::debug!("frame callback failed, closing window");
        }
        self.window.close();
        result
    }

    fn run_frames<E>(
        &mut self,
        step: &mut impl FnMut(&mut Frame) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut index = 0;
        let mut previous: Option<Instant> = None;
        while self.window.poll() {
            let started = Instant::now();
            let [width, height] = self.window.backing_size();
            // SAFETY: poll returned true, so the context is alive and current
            unsafe {
                self.gl.viewport(0, 0, width as i32, height as i32);
                if let Some([r, g, b, a]) = self.config.clear_color {
                    self.gl.clear_color(r, g, b, a);
                    self.gl.clear(consts::COLOR_BUFFER_BIT);
                }
            }
            let delta = previous.map_or(Duration::ZERO, |previous| started - previous);
            let mut frame = Frame::new(&*self.window, &self.gl, index, delta);
            step(&mut frame)?;
            let close_requested = frame.close_requested();
            self.window.swap();
            if close_requested {
                tracing::debug!(frame = index, "close requested");
                break;
            }
            index += 1;
            previous = Some(started);
            if let Some(rest) = self.config.frame_interval.checked_sub(started.elapsed()) {
                if !rest.is_zero() {
                    std::thread::sleep(rest);
                }
            }
        }
        tracing::debug!(frames = index, "frame loop finished");
        Ok(())
    }
}

impl Drop for GlWindow {
    fn drop(&mut self) {
        self.window.close();
    }
}

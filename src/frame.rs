use std::time::Duration;

use gl_binding::OpenGl;
use window_backend::{Button, ButtonState, Key, KeyState, Modifiers, Window};

/// What the frame callback sees of the window during one iteration of
/// [`GlWindow::run`](crate::GlWindow::run).
///
/// Sizes are in physical pixels, the cursor is in logical pixels. the gl context is current and the
/// viewport already covers the whole framebuffer.
pub struct Frame<'a> {
    window: &'a dyn Window,
    gl: &'a OpenGl,
    window_size: [u32; 2],
    cursor_pos: [f32; 2],
    scale: f32,
    index: u64,
    delta: Duration,
    close_requested: bool,
}

impl<'a> Frame<'a> {
    pub(crate) fn new(window: &'a dyn Window, gl: &'a OpenGl, index: u64, delta: Duration) -> Self {
        let scale = window.scale();
        let [x, y] = window.cursor();
        // a zero scale would only come from a broken backend
        let divisor = if scale > 0.0 { scale } else { 1.0 };
        Self {
            window,
            gl,
            window_size: window.backing_size(),
            cursor_pos: [x / divisor, y / divisor],
            scale,
            index,
            delta,
            close_requested: false,
        }
    }

    /// framebuffer size in physical pixels
    pub fn window_size(&self) -> [u32; 2] {
        self.window_size
    }

    /// framebuffer size divided by the scale
    pub fn logical_size(&self) -> [f32; 2] {
        let divisor = if self.scale > 0.0 { self.scale } else { 1.0 };
        [
            self.window_size[0] as f32 / divisor,
            self.window_size[1] as f32 / divisor,
        ]
    }

    /// pointer position in logical pixels, origin top left
    pub fn cursor_pos(&self) -> [f32; 2] {
        self.cursor_pos
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn key_state(&self, key: Key) -> KeyState {
        self.window.key_state(key)
    }

    pub fn button_state(&self, button: Button) -> ButtonState {
        self.window.button_state(button)
    }

    pub fn modifiers(&self) -> Modifiers {
        self.window.modifiers()
    }

    pub fn gl(&self) -> &OpenGl {
        self.gl
    }

    /// counts up from 0 for the first frame
    pub fn index(&self) -> u64 {
        self.index
    }

    /// time since the previous frame started. zero for the first frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Maps logical pixels (origin top left, y down) to clip space. column major, ready for
    /// `uniform_matrix_4_f32` without transposing.
    pub fn projection(&self) -> [f32; 16] {
        let [width, height] = self.logical_size();
        orthographic(width, height)
    }

    /// ends the loop after this frame is presented
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }
}

/// column major orthographic projection of `[0, width] x [0, height]` with y pointing down
pub fn orthographic(width: f32, height: f32) -> [f32; 16] {
    let sx = if width > 0.0 { 2.0 / width } else { 0.0 };
    let sy = if height > 0.0 { -2.0 / height } else { 0.0 };
    #[rustfmt::skip]
    let matrix = [
        sx,   0.0,  0.0, 0.0,
        0.0,  sy,   0.0, 0.0,
        0.0,  0.0, -1.0, 0.0,
        -1.0, 1.0,  0.0, 1.0,
    ];
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn transform(matrix: &[f32; 16], [x, y]: [f32; 2]) -> [f32; 2] {
        [
            matrix[0] * x + matrix[4] * y + matrix[12],
            matrix[1] * x + matrix[5] * y + matrix[13],
        ]
    }

    #[test]
    fn corners_map_to_clip_space() {
        let matrix = orthographic(400.0, 300.0);
        let top_left = transform(&matrix, [0.0, 0.0]);
        assert_relative_eq!(top_left[0], -1.0);
        assert_relative_eq!(top_left[1], 1.0);
        let bottom_right = transform(&matrix, [400.0, 300.0]);
        assert_relative_eq!(bottom_right[0], 1.0);
        assert_relative_eq!(bottom_right[1], -1.0);
        let center = transform(&matrix, [200.0, 150.0]);
        assert_relative_eq!(center[0], 0.0);
        assert_relative_eq!(center[1], 0.0);
    }

    #[test]
    fn translation_is_in_the_last_column() {
        let matrix = orthographic(2.0, 2.0);
        assert_eq!(&matrix[12..16], &[-1.0, 1.0, 0.0, 1.0]);
        assert_relative_eq!(matrix[15], 1.0);
    }

    #[test]
    fn minimized_window_does_not_divide_by_zero() {
        let matrix = orthographic(0.0, 0.0);
        assert!(matrix.iter().all(|v| v.is_finite()));
    }
}

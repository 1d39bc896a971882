//! Opens a window and draws a quad under the cursor, textured with a pattern that a second thread
//! keeps rewriting. escape or closing the window quits. `RUST_LOG=debug` shows window creation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use glwin::consts;
use glwin::{
    Button, Frame, GlWindow, GlWindowConfig, Key, OpenGl, SharedPixels, Texture, TextureFilter,
    TextureFormat, WindowConfig,
};
use tracing_subscriber::{prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt};

const PATTERN_SIZE: [u32; 2] = [64, 64];
const QUAD_SIZE: f32 = 160.0;

const VERTEX_SHADER: &str = r#"#version 150
in vec2 position;
out vec2 uv;
uniform mat4 projection;
uniform vec4 rect;
void main() {
    uv = position;
    gl_Position = projection * vec4(rect.xy + position * rect.zw, 0.0, 1.0);
}
"#;

const FRAGMENT_SHADER: &str = r#"#version 150
in vec2 uv;
out vec4 color;
uniform sampler2D pattern;
void main() {
    color = texture(pattern, uv);
}
"#;

struct App {
    program: u32,
    vao: u32,
    vbo: u32,
    projection: i32,
    rect: i32,
    texture: Option<Texture>,
    pixels: SharedPixels,
}

impl App {
    fn new(window: &GlWindow, pixels: SharedPixels) -> anyhow::Result<Self> {
        let gl = window.gl();
        if !gl.supports(glwin::GlCapabilities::all()) {
            bail!("the context lacks shader or buffer support: {:?}", gl.capabilities());
        }
        let texture = window
            .create_shared_texture(&pixels, TextureFilter::Nearest)
            .context("failed to create the pattern texture")?;
        // SAFETY: the window's context is current on this thread
        unsafe {
            let program = build_program(gl)?;
            let vao = gl.gen_vertex_array();
            gl.bind_vertex_array(vao);
            let vbo = gl.gen_buffer();
            gl.bind_buffer(consts::ARRAY_BUFFER, vbo);
            let corners: [f32; 8] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0];
            gl.buffer_data_slice(consts::ARRAY_BUFFER, &corners, consts::STATIC_DRAW);
            let position = gl.get_attrib_location(program, "position");
            if position >= 0 {
                gl.vertex_attrib_pointer(position as u32, 2, consts::FLOAT, false, 8, 0);
                gl.enable_vertex_attrib_array(position as u32);
            }
            gl.use_program(program);
            gl.uniform_1_i32(gl.get_uniform_location(program, "pattern"), 0);
            Ok(Self {
                program,
                vao,
                vbo,
                projection: gl.get_uniform_location(program, "projection"),
                rect: gl.get_uniform_location(program, "rect"),
                texture: Some(texture),
                pixels,
            })
        }
    }

    fn run(&mut self, frame: &mut Frame) -> anyhow::Result<()> {
        if frame.key_state(Key::Escape).is_down() {
            frame.request_close();
        }
        let Some(texture) = self.texture.as_mut() else {
            return Ok(());
        };
        let gl = frame.gl();
        let [x, y] = frame.cursor_pos();
        let size = if frame.button_state(Button::Left).is_down() {
            QUAD_SIZE * 1.5
        } else {
            QUAD_SIZE
        };
        // SAFETY: frames only run while the context is current
        unsafe {
            texture.sync(gl, &self.pixels)?;
            gl.active_texture(consts::TEXTURE0);
            texture.bind(gl);
            gl.use_program(self.program);
            gl.bind_vertex_array(self.vao);
            gl.uniform_matrix_4_f32(self.projection, false, &frame.projection());
            gl.uniform_4_f32(self.rect, x - size / 2.0, y - size / 2.0, size, size);
            gl.draw_arrays(consts::TRIANGLE_STRIP, 0, 4);
            let error = gl.get_error();
            if error != consts::NO_ERROR {
                bail!("gl error {error:#x} in frame {}", frame.index());
            }
        }
        Ok(())
    }

    fn destroy(&mut self, gl: &OpenGl) {
        // SAFETY: called before the window closes
        unsafe {
            if let Some(texture) = self.texture.take() {
                texture.delete(gl);
            }
            gl.delete_buffers(&[self.vbo]);
            gl.delete_vertex_arrays(&[self.vao]);
            gl.delete_program(self.program);
        }
    }
}

/// compiles and links the quad program, deleting every object it created on failure
unsafe fn build_program(gl: &OpenGl) -> anyhow::Result<u32> {
    let vertex = compile_shader(gl, consts::VERTEX_SHADER, VERTEX_SHADER).context("vertex shader")?;
    let fragment = match compile_shader(gl, consts::FRAGMENT_SHADER, FRAGMENT_SHADER) {
        Ok(fragment) => fragment,
        Err(e) => {
            gl.delete_shader(vertex);
            return Err(e.context("fragment shader"));
        }
    };
    let program = gl.create_program();
    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);
    gl.delete_shader(vertex);
    gl.delete_shader(fragment);
    if !gl.program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        bail!("failed to link program: {log}");
    }
    Ok(program)
}

unsafe fn compile_shader(gl: &OpenGl, kind: u32, source: &str) -> anyhow::Result<u32> {
    let shader = gl.create_shader(kind);
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    if !gl.shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        bail!("failed to compile: {log}");
    }
    Ok(shader)
}

/// rewrites the pattern about 30 times a second until `stop` is set
fn spawn_producer(pixels: SharedPixels, stop: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let mut tick = 0u32;
        while !stop.load(Ordering::Relaxed) {
            pixels.write(|data, [width, _]| {
                for (i, pixel) in data.chunks_exact_mut(4).enumerate() {
                    let x = i as u32 % width;
                    let y = i as u32 / width;
                    let checker = ((x + tick) / 8 + y / 8) % 2 == 0;
                    let shade = if checker { 255 } else { 64 };
                    pixel.copy_from_slice(&[shade, (x * 4) as u8, (y * 4) as u8, 255]);
                }
            });
            tick = tick.wrapping_add(1);
            std::thread::sleep(Duration::from_millis(33));
        }
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let window = GlWindow::new(GlWindowConfig {
        window: WindowConfig {
            title: "glwin demo".to_string(),
            ..Default::default()
        },
        clear_color: Some([0.1, 0.1, 0.12, 1.0]),
        ..Default::default()
    })
    .context("failed to open a window")?;

    let pixels = SharedPixels::new(TextureFormat::Rgba8, PATTERN_SIZE);
    let stop = Arc::new(AtomicBool::new(false));
    let producer = spawn_producer(pixels.clone(), stop.clone());

    let mut app = App::new(&window, pixels)?;
    let result = window.run(|frame| {
        let result = app.run(frame);
        if result.is_err() || frame.close_requested() {
            app.destroy(frame.gl());
        }
        result
    });

    stop.store(true, Ordering::Relaxed);
    if producer.join().is_err() {
        tracing::warn!("pattern producer panicked");
    }
    result
}

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use approx::assert_relative_eq;
use gl_binding::testing::{self, stub_gl};
use glwin::{
    Button, ButtonState, Error, GlVersion, GlWindow, GlWindowConfig, Key, KeyState, Modifiers,
    OpenGl, SharedPixels, TextureFilter, TextureFormat, Window, WindowError,
};
use window_backend::InputState;

type Log = Rc<RefCell<Vec<&'static str>>>;

/// A window whose events are scripted per poll.
struct FakeWindow {
    gl: Option<Rc<OpenGl>>,
    /// `Some(events)` for a poll that returns true, `None` for the user closing the window
    script: VecDeque<Option<Vec<Key>>>,
    input: InputState,
    size: [u32; 2],
    cursor: [f32; 2],
    scale: f32,
    log: Log,
}

impl FakeWindow {
    fn new(log: &Log) -> Self {
        Self {
            gl: Some(Rc::new(stub_gl())),
            script: VecDeque::new(),
            input: InputState::default(),
            size: [800, 600],
            cursor: [0.0, 0.0],
            scale: 1.0,
            log: log.clone(),
        }
    }

    fn frames(mut self, count: usize) -> Self {
        self.script.extend((0..count).map(|_| Some(Vec::new())));
        self
    }

    fn press(mut self, key: Key) -> Self {
        self.script.push_back(Some(vec![key]));
        self
    }
}

impl Window for FakeWindow {
    fn gl(&self) -> Result<Rc<OpenGl>, WindowError> {
        self.gl.clone().ok_or(WindowError::Closed)
    }

    fn poll(&mut self) -> bool {
        if self.gl.is_none() {
            return false;
        }
        self.log.borrow_mut().push("poll");
        self.input.begin_poll();
        match self.script.pop_front().flatten() {
            Some(keys) => {
                for key in keys {
                    self.input.key_pressed(key);
                }
                true
            }
            None => false,
        }
    }

    fn swap(&mut self) {
        if self.gl.is_some() {
            self.log.borrow_mut().push("swap");
        }
    }

    fn backing_size(&self) -> [u32; 2] {
        self.size
    }

    fn cursor(&self) -> [f32; 2] {
        self.cursor
    }

    fn scale(&self) -> f32 {
        self.scale
    }

    fn key_state(&self, key: Key) -> KeyState {
        self.input.key(key)
    }

    fn button_state(&self, button: Button) -> ButtonState {
        self.input.button(button)
    }

    fn close(&mut self) {
        if self.gl.take().is_some() {
            self.log.borrow_mut().push("close");
        }
    }
}

fn config() -> GlWindowConfig {
    GlWindowConfig {
        frame_interval: Duration::ZERO,
        ..Default::default()
    }
}

fn open(window: FakeWindow) -> GlWindow {
    let window = GlWindow::from_platform(Box::new(window), config()).unwrap();
    testing::take_calls();
    window
}

#[test]
fn setup_enables_alpha_blending() {
    let log = Log::default();
    let _window = GlWindow::from_platform(Box::new(FakeWindow::new(&log)), config()).unwrap();
    let calls = testing::take_calls();
    assert!(calls.contains(&format!("glEnable({})", glwin::consts::BLEND)));
    assert!(calls.contains(&format!(
        "glBlendFunc({}, {})",
        glwin::consts::SRC_ALPHA,
        glwin::consts::ONE_MINUS_SRC_ALPHA
    )));
}

#[test]
fn loop_stops_when_poll_returns_false() {
    let log = Log::default();
    let window = open(FakeWindow::new(&log).frames(3));
    let mut frames = 0;
    window
        .run(|_| {
            frames += 1;
            Ok::<_, Error>(())
        })
        .unwrap();
    assert_eq!(frames, 3);
    assert_eq!(
        *log.borrow(),
        ["poll", "swap", "poll", "swap", "poll", "swap", "poll", "close"]
    );
}

#[test]
fn every_frame_resets_the_viewport_and_clears() {
    let log = Log::default();
    let mut fake = FakeWindow::new(&log).frames(1);
    fake.size = [640, 480];
    let mut config = config();
    config.clear_color = Some([0.5, 0.25, 0.0, 1.0]);
    let window = GlWindow::from_platform(Box::new(fake), config).unwrap();
    testing::take_calls();
    window.run(|_| Ok::<_, Error>(())).unwrap();
    assert_eq!(
        testing::take_calls(),
        [
            "glViewport(0, 0, 640, 480)".to_string(),
            "glClearColor(0.5, 0.25, 0, 1)".to_string(),
            format!("glClear({})", glwin::consts::COLOR_BUFFER_BIT),
        ]
    );
}

#[test]
fn no_clear_color_skips_the_clear() {
    let log = Log::default();
    let mut config = config();
    config.clear_color = None;
    let window =
        GlWindow::from_platform(Box::new(FakeWindow::new(&log).frames(1)), config).unwrap();
    testing::take_calls();
    window.run(|_| Ok::<_, Error>(())).unwrap();
    assert_eq!(testing::take_calls(), ["glViewport(0, 0, 800, 600)"]);
}

#[test]
fn callback_error_stops_the_loop_and_still_closes() {
    #[derive(Debug, PartialEq)]
    struct Failed(u64);

    let log = Log::default();
    let window = open(FakeWindow::new(&log).frames(5));
    let result = window.run(|frame| {
        if frame.index() == 1 {
            return Err(Failed(frame.index()));
        }
        Ok(())
    });
    assert_eq!(result, Err(Failed(1)));
    // no swap for the failed frame
    assert_eq!(*log.borrow(), ["poll", "swap", "poll", "close"]);
}

#[test]
fn request_close_presents_the_frame_then_stops() {
    let log = Log::default();
    let window = open(FakeWindow::new(&log).frames(1).press(Key::Escape).frames(3));
    let mut seen = Vec::new();
    window
        .run(|frame| {
            seen.push(frame.key_state(Key::Escape));
            if frame.key_state(Key::Escape).is_down() {
                frame.request_close();
                assert!(frame.close_requested());
            }
            Ok::<_, Error>(())
        })
        .unwrap();
    assert_eq!(seen, [KeyState::Up, KeyState::Pressed]);
    assert_eq!(*log.borrow(), ["poll", "swap", "poll", "swap", "close"]);
}

#[test]
fn cursor_is_logical_and_size_is_physical() {
    let log = Log::default();
    let mut fake = FakeWindow::new(&log).frames(1);
    fake.cursor = [400.0, 200.0];
    fake.scale = 2.0;
    fake.size = [1600, 1200];
    let window = open(fake);
    window
        .run(|frame| {
            let [x, y] = frame.cursor_pos();
            assert_relative_eq!(x, 200.0);
            assert_relative_eq!(y, 100.0);
            assert_eq!(frame.window_size(), [1600, 1200]);
            assert_eq!(frame.logical_size(), [800.0, 600.0]);
            assert_relative_eq!(frame.scale(), 2.0);
            Ok::<_, Error>(())
        })
        .unwrap();
}

#[test]
fn projection_covers_the_logical_size() {
    let log = Log::default();
    let mut fake = FakeWindow::new(&log).frames(1);
    fake.scale = 2.0;
    fake.size = [1600, 1200];
    let window = open(fake);
    window
        .run(|frame| {
            assert_eq!(frame.projection(), glwin::orthographic(800.0, 600.0));
            Ok::<_, Error>(())
        })
        .unwrap();
}

#[test]
fn frames_count_up_and_see_held_modifiers() {
    let log = Log::default();
    let window = open(FakeWindow::new(&log).press(Key::LeftShift).frames(2));
    let mut seen = Vec::new();
    window
        .run(|frame| {
            seen.push((frame.index(), frame.modifiers()));
            Ok::<_, Error>(())
        })
        .unwrap();
    assert_eq!(
        seen,
        [(0, Modifiers::SHIFT), (1, Modifiers::SHIFT), (2, Modifiers::SHIFT)]
    );
}

#[test]
fn first_frame_has_no_delta() {
    let log = Log::default();
    let window = open(FakeWindow::new(&log).frames(2));
    let mut deltas = Vec::new();
    window
        .run(|frame| {
            deltas.push(frame.delta());
            Ok::<_, Error>(())
        })
        .unwrap();
    assert_eq!(deltas[0], Duration::ZERO);
    assert_eq!(deltas.len(), 2);
}

#[test]
fn too_old_context_closes_the_window() {
    let log = Log::default();
    let mut config = config();
    config.min_gl_version = Some(GlVersion::new(4, 6));
    let result = GlWindow::from_platform(Box::new(FakeWindow::new(&log)), config);
    match result {
        Err(Error::GlTooOld { found, required }) => {
            assert_eq!(found, GlVersion::new(3, 3));
            assert_eq!(required, GlVersion::new(4, 6));
        }
        other => panic!("expected GlTooOld, got {other:?}"),
    }
    assert_eq!(*log.borrow(), ["close"]);
}

#[test]
fn closed_window_is_rejected() {
    let log = Log::default();
    let mut fake = FakeWindow::new(&log);
    fake.close();
    let result = GlWindow::from_platform(Box::new(fake), config());
    assert!(matches!(result, Err(Error::Window(WindowError::Closed))));
}

#[test]
fn dropping_without_running_closes() {
    let log = Log::default();
    drop(open(FakeWindow::new(&log)));
    assert_eq!(*log.borrow(), ["close"]);
}

#[test]
fn texture_upload_calls() {
    let log = Log::default();
    let window = open(FakeWindow::new(&log));
    let atlas = window
        .create_texture(TextureFormat::R8, [3, 5], TextureFilter::Nearest, Some(&[0; 15]))
        .unwrap();
    let calls = testing::take_calls();
    assert_eq!(
        calls.last().unwrap(),
        &format!("glTexImage2D({}, 3, 5, {}, data)", glwin::consts::R8, glwin::consts::RED)
    );
    assert!(calls.contains(&format!("glPixelStorei({}, 1)", glwin::consts::UNPACK_ALIGNMENT)));
    assert_eq!(atlas.size(), [3, 5]);

    let mut image = window
        .create_texture(TextureFormat::Rgba8, [4, 4], TextureFilter::Linear, None)
        .unwrap();
    let calls = testing::take_calls();
    assert!(calls.contains(&format!("glPixelStorei({}, 4)", glwin::consts::UNPACK_ALIGNMENT)));
    assert!(calls.last().unwrap().ends_with("null)"));

    window
        .update_texture(&mut image, [1, 1], [2, 2], &[255; 16])
        .unwrap();
    assert_eq!(
        testing::take_calls().last().unwrap(),
        &format!("glTexSubImage2D(1, 1, 2, 2, {})", glwin::consts::RGBA)
    );

    let (atlas_id, image_id) = (atlas.id(), image.id());
    window.delete_texture(atlas);
    window.delete_texture(image);
    assert_eq!(
        testing::take_calls(),
        [
            format!("glDeleteTextures([{atlas_id}])"),
            format!("glDeleteTextures([{image_id}])"),
        ]
    );
}

#[test]
fn shared_pixels_resize_reallocates() {
    let log = Log::default();
    let window = open(FakeWindow::new(&log));
    let shared = SharedPixels::new(TextureFormat::Rgba8, [2, 2]);
    let mut texture = window.create_shared_texture(&shared, TextureFilter::Linear).unwrap();
    testing::take_calls();

    shared.replace([3, 1], vec![7; 12]).unwrap();
    assert!(window.sync_texture(&mut texture, &shared).unwrap());
    assert_eq!(texture.size(), [3, 1]);
    assert_eq!(
        testing::take_calls().last().unwrap(),
        &format!("glTexImage2D({}, 3, 1, {}, data)", glwin::consts::RGBA8, glwin::consts::RGBA)
    );

    // unchanged since the last sync
    assert!(!window.sync_texture(&mut texture, &shared).unwrap());
    assert!(testing::take_calls().is_empty());
}

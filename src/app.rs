//! Window shell and event loop.
//!
//! Maps winit input onto the [`Viewer`] handlers:
//!
//! - left drag orbits, right or middle drag pans, the wheel zooms
//! - `R` resets the view, `F` frames the model
//! - left and right arrows step through the models given on the command line
//! - `Esc` quits
//!
//! The window title follows [`ViewerEvent`]s.

use std::{path::PathBuf, sync::Arc};

use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    context::Context,
    gpu::GpuError,
    viewer::{Viewer, ViewerEvent},
};

const WINDOW_TITLE: &str = "Model Viewer";

/// Command line options.
#[derive(Clone, Debug, PartialEq)]
pub struct Options {
    pub size: (u32, u32),
    pub config: ViewerConfig,
    pub models: Vec<PathBuf>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            size: (1280, 720),
            config: ViewerConfig::default(),
            models: Vec::new(),
        }
    }
}

impl Options {
    /// Accepts `--size=WxH`, `--bias=F` and `--sensitivity=F`; every other
    /// argument is a model path. Malformed values are reported and ignored.
    pub fn parse<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut options = Self::default();
        for arg in args.into_iter().map(Into::into) {
            if let Some(v) = arg.strip_prefix("--size=") {
                match v
                    .split_once('x')
                    .or_else(|| v.split_once('X'))
                    .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
                {
                    Some((w, h)) => options.size = (w.max(1), h.max(1)),
                    None => log::warn!("Ignoring malformed window size '{v}'"),
                }
            } else if let Some(v) = arg.strip_prefix("--bias=") {
                match v.parse::<f32>() {
                    Ok(bias) if (0.0..=1.0).contains(&bias) => options.config.vertical_bias = bias,
                    _ => log::warn!("Ignoring vertical bias '{v}', expected a value in [0, 1]"),
                }
            } else if let Some(v) = arg.strip_prefix("--sensitivity=") {
                match v.parse::<f32>() {
                    Ok(s) if s > 0.0 => options.config.orbit_sensitivity = s,
                    _ => log::warn!("Ignoring orbit sensitivity '{v}'"),
                }
            } else if arg.starts_with("--") {
                log::warn!("Unknown option '{arg}'");
            } else {
                options.models.push(PathBuf::from(arg));
            }
        }
        options
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    None,
    Orbit,
    Pan,
}

pub struct App {
    options: Options,
    current: usize,
    window: Option<Arc<Window>>,
    viewer: Option<Viewer<Context>>,
    cursor: Option<PhysicalPosition<f64>>,
    drag: Drag,
}

impl App {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            current: 0,
            window: None,
            viewer: None,
            cursor: None,
            drag: Drag::None,
        }
    }

    fn load_current(&mut self) {
        let (Some(viewer), Some(path)) = (&mut self.viewer, self.options.models.get(self.current))
        else {
            return;
        };
        // failures are already reported through ViewerEvent::LoadFailed
        let _ = viewer.load(path);
    }

    fn step_model(&mut self, forward: bool) {
        let count = self.options.models.len();
        if count < 2 {
            return;
        }
        self.current = if forward {
            (self.current + 1) % count
        } else {
            (self.current + count - 1) % count
        };
        self.load_current();
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyR => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_reset();
                }
            }
            KeyCode::KeyF => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_frame();
                }
            }
            KeyCode::ArrowRight => self.step_model(true),
            KeyCode::ArrowLeft => self.step_model(false),
            _ => {}
        }
    }

    fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if let (Some(last), Some(viewer)) = (self.cursor, &mut self.viewer) {
            match self.drag {
                Drag::Orbit => {
                    viewer.on_orbit((last.x - position.x) as f32, (position.y - last.y) as f32)
                }
                Drag::Pan => {
                    viewer.on_pan((position.x - last.x) as f32, (position.y - last.y) as f32)
                }
                Drag::None => {}
            }
        }
        self.cursor = Some(position);
    }

    fn redraw(&mut self) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        match viewer.draw() {
            Ok(()) => {}
            // Reconfigure the surface if it's lost or outdated
            Err(GpuError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                viewer.backend_mut().reconfigure();
                viewer.backend().window().request_redraw();
            }
            Err(e) => log::error!("Unable to render {e}"),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let (width, height) = self.options.size;
        let window_attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(PhysicalSize::new(width, height));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create the main window: {e}");
                event_loop.exit();
                return;
            }
        };

        let ctx = match futures::executor::block_on(Context::new(window.clone())) {
            Ok(ctx) => ctx,
            Err(e) => {
                log::error!("App initialization failed. Cannot create the main context: {e:#}");
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();
        let mut viewer = Viewer::new(ctx, self.options.config, size.width, size.height);

        let title_window = window.clone();
        viewer.subscribe(move |event| match event {
            ViewerEvent::ModelLoaded { name, .. } => {
                title_window.set_title(&format!("{WINDOW_TITLE} - {name}"))
            }
            ViewerEvent::LoadFailed { message, .. } => {
                title_window.set_title(&format!("{WINDOW_TITLE} - {message}"))
            }
        });

        if self.options.models.is_empty() {
            log::warn!("No model given; pass one or more .obj/.gltf/.glb paths");
        }
        self.viewer = Some(viewer);
        self.window = Some(window.clone());
        self.load_current();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.on_cursor_moved(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput { state, button, .. } => {
                self.drag = match (button, state) {
                    (MouseButton::Left, ElementState::Pressed) => Drag::Orbit,
                    (MouseButton::Right | MouseButton::Middle, ElementState::Pressed) => Drag::Pan,
                    (_, ElementState::Released) => Drag::None,
                    _ => self.drag,
                };
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32,
                };
                if let Some(viewer) = &mut self.viewer {
                    viewer.on_zoom(amount);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => self.on_key(event_loop, code),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }

        if let (Some(viewer), Some(window)) = (&mut self.viewer, &self.window) {
            if viewer.take_redraw_request() {
                window.request_redraw();
            }
        }
    }
}

/// Open the window and run until it is closed.
pub fn run(options: Options) -> anyhow::Result<()> {
    if let Err(e) = env_logger::try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(options);
    event_loop.run_app(&mut app)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_and_model_paths() {
        let options = Options::parse([
            "--size=800x600",
            "--bias=0.5",
            "--sensitivity=0.2",
            "models/a.obj",
            "models/b.glb",
        ]);
        assert_eq!(options.size, (800, 600));
        assert_eq!(options.config.vertical_bias, 0.5);
        assert_eq!(options.config.orbit_sensitivity, 0.2);
        assert_eq!(
            options.models,
            vec![PathBuf::from("models/a.obj"), PathBuf::from("models/b.glb")]
        );
    }

    #[test]
    fn malformed_values_keep_defaults() {
        let options = Options::parse(["--size=wide", "--bias=2", "--sensitivity=-1", "--nope"]);
        assert_eq!(options, Options::default());
    }
}

//! Window, GL context and frame loop.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Context as _;
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    PossiblyCurrentGlContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::PhysicalKey,
    raw_window_handle::HasWindowHandle,
    window::{CursorGrabMode, Window, WindowId},
};

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::gfx::camera::{CameraController, FlyCamera, InputCommand};
use crate::gfx::resources::RenderContext;
use crate::gfx::scene::{FrameContext, Scene};
use crate::gl_utils::{GlowGpu, UniformValue};

/// Seconds since start and since the previous tick.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
        }
    }

    pub fn tick(&mut self) -> (f32, f32) {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> (f32, f32) {
        let delta = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        (now.saturating_duration_since(self.start).as_secs_f32(), delta)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything that only exists while the window does.
struct GlState {
    window: Window,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    render: RenderContext,
}

impl GlState {
    fn resize(&self, size: PhysicalSize<u32>) {
        let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
        else {
            return;
        };
        self.surface.resize(&self.context, width, height);
        self.render.gpu().viewport(size.width, size.height);
    }

    fn aspect(&self) -> f32 {
        let size = self.window.inner_size();
        size.width.max(1) as f32 / size.height.max(1) as f32
    }
}

fn window_error(err: impl std::fmt::Display) -> Error {
    Error::Window(err.to_string())
}

/// Prefers the config with the most samples.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("glutin offers at least one matching config")
}

fn set_cursor_captured(window: &Window, captured: bool) {
    let grab = if captured {
        window
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Locked))
    } else {
        window.set_cursor_grab(CursorGrabMode::None)
    };
    if let Err(err) = grab {
        log::warn!("cursor grab not supported: {err}");
    }
    window.set_cursor_visible(!captured);
}

pub struct App {
    config: AppConfig,
    scene: Scene,
    uniforms: Vec<(String, UniformValue)>,
    camera: FlyCamera,
    controller: CameraController,
    clock: FrameClock,
    gl: Option<GlState>,
    error: Option<Error>,
}

impl App {
    /// Parses the scene and attaches the configured animations. Nothing
    /// touches the GPU until the window is created.
    pub fn new(config: AppConfig) -> Result<Self> {
        let mut scene = Scene::load(&config.scene, None)?;
        let attached = config.attach_animations(&mut scene);
        log::debug!("attached {attached} of {} animations", config.animations.len());

        Ok(Self {
            uniforms: config.global_uniforms()?,
            camera: FlyCamera::new(config.camera),
            controller: CameraController::default(),
            clock: FrameClock::new(),
            gl: None,
            error: None,
            scene,
            config,
        })
    }

    fn create_gl(&mut self, event_loop: &ActiveEventLoop) -> Result<GlState> {
        let attributes = Window::default_attributes()
            .with_title(&self.config.title)
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let template = ConfigTemplateBuilder::new()
            .with_depth_size(24)
            .with_stencil_size(8);

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes))
            .build(event_loop, template, pick_config)
            .map_err(window_error)?;
        let window = window.ok_or_else(|| window_error("no window was created"))?;
        let raw_handle = window.window_handle().map_err(window_error)?.as_raw();

        let display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(raw_handle));
        let not_current = unsafe { display.create_context(&gl_config, &context_attributes) }
            .map_err(window_error)?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(window_error)?;
        let surface = unsafe { display.create_window_surface(&gl_config, &surface_attributes) }
            .map_err(window_error)?;
        let context = not_current.make_current(&surface).map_err(window_error)?;
        if let Err(err) = surface.set_swap_interval(&context, SwapInterval::Wait(NonZeroU32::MIN)) {
            log::warn!("vsync unavailable: {err}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| display.get_proc_address(symbol))
        };
        log::info!("created OpenGL 3.3 core context ({} samples)", gl_config.num_samples());

        let mut render = RenderContext::new(Rc::new(GlowGpu::new(gl)));
        let size = window.inner_size();
        render.gpu().viewport(size.width, size.height);
        self.scene.allocate_default(&mut render)?;

        set_cursor_captured(&window, self.controller.is_captured());
        window.request_redraw();

        Ok(GlState {
            window,
            surface,
            context,
            render,
        })
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(gl) = self.gl.as_mut() else {
            return Ok(());
        };
        let (time, delta) = self.clock.tick();
        self.controller.update(&mut self.camera, delta);

        let gpu = gl.render.gpu();
        for (capability, enabled) in self.config.render_state.capabilities() {
            gpu.set_capability(capability, enabled);
        }
        gpu.clear(self.config.background);

        let frame = FrameContext {
            view: self.camera.view_matrix(),
            projection: self.camera.projection_matrix(gl.aspect()),
            view_pos: self.camera.position,
            view_facing: self.camera.facing(),
            time,
            delta,
        };
        self.scene.apply_uniforms(&mut gl.render, &self.uniforms);
        self.scene.draw(&mut gl.render, &frame)?;
        gl.render.check_error()?;

        gl.surface.swap_buffers(&gl.context).map_err(window_error)?;
        gl.window.request_redraw();
        Ok(())
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        if event.repeat {
            return;
        }
        let command = self.controller.process_key(code, event.state);
        match (command, &self.gl) {
            (Some(InputCommand::Exit), _) => event_loop.exit(),
            (Some(InputCommand::ReleaseCursor), Some(gl)) => set_cursor_captured(&gl.window, false),
            (Some(InputCommand::CaptureCursor), Some(gl)) => set_cursor_captured(&gl.window, true),
            _ => {}
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: Error) {
        log::error!("{err}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gl.is_some() {
            return;
        }
        match self.create_gl(event_loop) {
            Ok(gl) => self.gl = Some(gl),
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gl) = &self.gl {
                    gl.resize(size);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, event),
            WindowEvent::MouseWheel { delta, .. } => {
                self.controller.process_scroll(&mut self.camera, &delta)
            }
            WindowEvent::Focused(false) => self.controller.reset(),
            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.controller.process_mouse_motion(&mut self.camera, delta);
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let Some(mut gl) = self.gl.take() else {
            return;
        };
        self.scene.release(&mut gl.render);
        let gpu = gl.render.gpu.clone();
        gl.render.shaders.release_all(gpu.as_ref());
        if let Err(err) = gl.context.make_not_current() {
            log::warn!("failed to release GL context: {err}");
        }
    }
}

/// Opens the window and runs until it closes. Returns the first load, GL or
/// draw error that stopped the loop.
pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let scene_path = config.scene.clone();
    let mut app = App::new(config)
        .with_context(|| format!("failed to load scene {}", scene_path.display()))?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    match app.error.take() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use pyre::gpu::GpuRenderer;
use pyre::input::KeyCode;
use pyre::{
    submit, GpuError, InputMapper, ShowConfig, ShowError, Simulation, Sprite, SpriteSet,
    TextureData, TextureSource, TickClock,
};
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::PhysicalKey,
    window::{Window, WindowId},
};

const TITLE_INTERVAL: Duration = Duration::from_millis(500);

pub struct App {
    config: ShowConfig,
    sim: Simulation,
    clock: TickClock,
    input: InputMapper,
    window: Option<Arc<Window>>,
    gpu: Option<GpuRenderer>,
    last_title: Instant,
    /// First fatal error; the event loop exits once it is set.
    error: Option<ShowError>,
}

impl App {
    pub fn new(config: ShowConfig) -> Self {
        let sim = config.simulation();
        let clock = TickClock::new(sim.config().ticks_per_second);
        Self {
            config,
            sim,
            clock,
            input: InputMapper::new(),
            window: None,
            gpu: None,
            last_title: Instant::now(),
            error: None,
        }
    }

    /// The error that stopped the show, if any.
    pub fn take_error(&mut self) -> Option<ShowError> {
        self.error.take()
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: ShowError) {
        error!("{err}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ShowError> {
        let (width, height) = self.config.screen_size();
        let window_attrs = Window::default_attributes()
            .with_title(format!("pyre - {}", self.config.show))
            .with_inner_size(winit::dpi::PhysicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let background = self.config.show.background();
        let mut gpu = pollster::block_on(GpuRenderer::new(window.clone(), background))?;

        let path = self.config.texture_path();
        let (texture, source) = TextureData::load_or_fallback(path, self.config.show.fallback())?;
        if source == TextureSource::Fallback {
            if let Some(dump) = &self.config.dump_fallback {
                texture.save_png(dump)?;
                info!(path = %dump.display(), "wrote fallback sprite");
            }
        }
        let handle = gpu.upload_texture(&texture);
        self.sim
            .set_sprites(SpriteSet::uniform(Sprite::from_texture(handle, &texture)));

        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn redraw(&mut self) -> Result<(), GpuError> {
        for _ in 0..self.clock.advance() {
            self.sim.tick();
        }

        let Some(gpu) = &mut self.gpu else {
            return Ok(());
        };
        let frame = self.sim.build_frame();
        let (active, capacity) = (frame.active, frame.capacity);

        let mut target = match gpu.frame() {
            Ok(target) => target,
            Err(GpuError::Surface(wgpu::SurfaceError::Timeout)) => {
                warn!("surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        submit(&frame, &mut target)?;
        target.finish();

        if self.last_title.elapsed() >= TITLE_INTERVAL {
            self.last_title = Instant::now();
            if let Some(window) = &self.window {
                let paused = if self.clock.is_paused() { " | paused" } else { "" };
                window.set_title(&format!(
                    "pyre - {} | particles {}/{} | {:.1} fps{}",
                    self.config.show,
                    active,
                    capacity,
                    self.clock.fps(),
                    paused
                ));
            }
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.init(event_loop) {
                self.fail(event_loop, e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(*physical_size);
                }
            }
            WindowEvent::KeyboardInput { event: key, .. }
                if key.state == ElementState::Pressed && !key.repeat =>
            {
                if let PhysicalKey::Code(code) = key.physical_key {
                    match KeyCode::from(code) {
                        KeyCode::Escape => event_loop.exit(),
                        KeyCode::P => self.clock.toggle_pause(),
                        _ => {}
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e.into());
                }
                return;
            }
            _ => {}
        }

        if let Some(trigger) = self.input.handle_event(&event) {
            self.sim.trigger(trigger);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

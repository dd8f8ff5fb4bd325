use std::sync::Arc;

use anyhow::{Context, Result};
use drivecheck_core::ClientInfo;
use drivecheck_render::{Renderer, SkiaRenderer};
use drivecheck_store::JsonDirRepository;
use drivecheck_timing::{Clock, MonotonicClock};
use log::{debug, error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::PhysicalKey,
    window::{Fullscreen, Window, WindowId},
};

use crate::keys::{self, Intent};
use crate::shell::{Flow, Shell};

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    shell: Shell<MonotonicClock, JsonDirRepository>,
    windowed: bool,
    title: String,
    refresh_rate: Option<f64>,
    clock: MonotonicClock,

    should_exit: bool,
}

impl App {
    pub fn new(shell: Shell<MonotonicClock, JsonDirRepository>, windowed: bool) -> Result<Self> {
        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            shell,
            windowed,
            title: String::new(),
            refresh_rate: None,
            clock: MonotonicClock::new(),
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            "drivecheck on {}-{}: Enter to begin, Esc to quit",
            std::env::consts::OS,
            std::env::consts::ARCH
        );
        event_loop.run_app(&mut self)?;
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .context("no monitor available")?;

        self.refresh_rate = monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let mut attributes = Window::default_attributes()
            .with_title("Drivecheck")
            .with_resizable(self.windowed);
        attributes = if self.windowed {
            attributes.with_inner_size(PhysicalSize::new(1280, 720))
        } else {
            attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();

        info!(
            "display {}x{} at scale {:.2}{}",
            size.width,
            size.height,
            window.scale_factor(),
            self.refresh_rate
                .map(|hz| format!(", {hz:.1} Hz"))
                .unwrap_or_default()
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);

        let config = self.shell.assessment().config();
        self.renderer = Some(
            SkiaRenderer::new(size.width, size.height)?
                .with_geometry(config.perception.geometry)?
                .with_lane_count(config.illusion.lane_count),
        );

        self.shell.set_client(
            ClientInfo::capture()
                .with_viewport(size.width, size.height)
                .with_refresh_rate(self.refresh_rate),
        );

        if !self.windowed {
            window.set_cursor_visible(false);
        }
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let snapshot = self.shell.assessment().snapshot();
        let scene = self.shell.scene(snapshot.as_ref());
        let stats = renderer.render_frame(&scene, pixels.frame_mut())?;

        let t = self.clock.now();
        pixels.render()?;
        debug!(
            "present {:.3}ms, clear {:.3}ms, draw {:.3}ms, copy {:.3}ms, total {:.3}ms, dirty {}",
            self.clock.elapsed(t),
            stats.clear.as_secs_f64() * 1e3,
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3,
            stats.total.as_secs_f64() * 1e3,
            stats.dirty_count,
        );

        let title = self.shell.title();
        if title != self.title {
            if let Some(window) = &self.window {
                window.set_title(&title);
            }
            self.title = title;
        }
        Ok(())
    }

    fn update(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.shell.tick() {
            error!("frame failed: {e:#}");
            self.cleanup_and_exit(event_loop);
        }
    }

    fn handle_input(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let Some(intent) = keys::map_key(code, self.shell.assessment().stage()) else {
            return;
        };
        if intent == Intent::Quit {
            self.cleanup_and_exit(event_loop);
            return;
        }
        match self.shell.handle(intent) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Exit) => self.cleanup_and_exit(event_loop),
            Err(e) => {
                error!("{intent:?} failed: {e:#}");
                self.cleanup_and_exit(event_loop);
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(new_size.width, new_size.height) {
                warn!("failed to resize surface: {e}");
            }
            if let Err(e) = pixels.resize_buffer(new_size.width, new_size.height) {
                warn!("failed to resize buffer: {e}");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(new_size.width, new_size.height) {
                warn!("failed to resize renderer: {e:#}");
            }
        }
        debug!("display resized to {}x{}", new_size.width, new_size.height);
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            return;
        }
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        // Saves whatever was recorded so far.
        if let Err(e) = self.shell.handle(Intent::Quit) {
            error!("could not save the session: {e:#}");
        }
        if let Some(session) = self.shell.assessment().session() {
            info!(
                "session {} saved to {} with {} trials{}",
                session.id,
                self.shell.repository().dir().display(),
                session.trial_count(),
                if self.shell.is_complete() { "" } else { " (incomplete)" }
            );
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!("failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update(event_loop);
                if let Err(e) = self.render() {
                    error!("render failed: {e:#}");
                    self.cleanup_and_exit(event_loop);
                    return;
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.should_exit {
            event_loop.exit();
        }
    }
}

use crate::cli::{AppConfig, Setup};
use anyhow::{Context, Result, anyhow};
use gazecue_core::{Frame, Key, Stage};
use gazecue_experiment::{
    AssetKind, Catalog, ExperimentConfig, InputMode, KeyOutcome, NoInputMode, ResultExporter,
    Session, TrialGenerator,
};
use gazecue_render::{SkiaRenderer, debug_lines, load_font, load_scaled};
use gazecue_timing::{HighPrecisionTimer, Timer};
use pixels::{Pixels, SurfaceTexture};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::sync::Arc;
use tiny_skia::Pixmap;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Fullscreen, Window, WindowId},
};

const WINDOWED_SIZE: (u32, u32) = (1200, 1200);

const INSTRUCTIONS: &[&str] = &[
    "Keep your eyes on the cross in the middle of the screen.",
    "A face will appear, followed by a letter on the left or right.",
    "",
    "Press SPACE if the letter is an L.",
    "Press H if the letter is a T.",
    "",
    "Answer as quickly and accurately as you can.",
    "",
    "Press SPACE to begin.",
];

const FINISHED: &[&str] = &["The experiment is over.", "", "Thank you for taking part!"];
const EXPORT_FAILED: &[&str] = &[
    "The experiment is over, but the results could not be saved.",
    "",
    "Press R to try again.",
];

/// Hides and confines the pointer while a session runs.
struct WindowCursor<'a>(&'a Window);

impl InputMode for WindowCursor<'_> {
    fn capture(&mut self) {
        self.0.set_cursor_visible(false);
        let grabbed = self
            .0
            .set_cursor_grab(CursorGrabMode::Confined)
            .or_else(|_| self.0.set_cursor_grab(CursorGrabMode::Locked));
        if let Err(e) = grabbed {
            log::debug!("Cursor grab unavailable: {e}");
        }
    }

    fn release(&mut self) {
        self.0.set_cursor_visible(true);
        if let Err(e) = self.0.set_cursor_grab(CursorGrabMode::None) {
            log::debug!("Cursor release failed: {e}");
        }
    }
}

/// Key identity the scheduler understands.
pub fn map_key(key: PhysicalKey) -> Key {
    match key {
        PhysicalKey::Code(KeyCode::Space) => Key::Space,
        PhysicalKey::Code(KeyCode::KeyH) => Key::H,
        _ => Key::Other,
    }
}

pub struct App {
    config: AppConfig,
    trial_debugging: bool,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    images: Vec<Pixmap>,
    session: Session<ResultExporter>,
    stage: Stage,
    clock: HighPrecisionTimer,
    saved: Option<Option<PathBuf>>,
    should_exit: bool,
}

impl App {
    pub fn new(setup: Setup) -> Result<Self> {
        let Setup {
            app: config,
            experiment,
            participant,
        } = setup;

        let (stimulus_size, target_size) = (config.stimulus_size, config.target_size);
        let catalog = Catalog::load(&config.stimuli_dir, &config.targets_dir, |path, kind| {
            match kind {
                AssetKind::Stimulus => load_scaled(path, stimulus_size),
                AssetKind::Target => load_scaled(path, target_size),
            }
        })
        .context("loading stimuli and targets")?;

        let trials = generate(&experiment, &catalog)?;
        let images = catalog.into_images();
        let session = Session::new(
            participant,
            trials,
            &experiment,
            ResultExporter::new(&config.data_dir),
        );

        Ok(Self {
            config,
            trial_debugging: experiment.trial_debugging,
            window: None,
            pixels: None,
            renderer: None,
            images,
            session,
            stage: Stage::default(),
            clock: HighPrecisionTimer::new(),
            saved: None,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        log::info!(
            "Starting on {} ({}) for participant {}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            self.session.participant().id
        );
        event_loop.run_app(&mut self)?;
        self.log_frame_timing();
        Ok(())
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("no monitor available"))?;
        if let Some(mhz) = monitor.refresh_rate_millihertz() {
            log::info!("Refresh rate: {:.1} Hz", f64::from(mhz) / 1000.0);
        }

        let mut attributes = Window::default_attributes()
            .with_title("Gaze cueing")
            .with_resizable(false);
        attributes = if self.config.fullscreen {
            attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
        } else {
            attributes.with_inner_size(PhysicalSize::new(WINDOWED_SIZE.0, WINDOWED_SIZE.1))
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();
        log::info!(
            "Display {}x{} at scale {:.2}",
            size.width,
            size.height,
            window.scale_factor()
        );

        let surface = SurfaceTexture::new(size.width, size.height, window.clone());
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);

        let font = load_font(self.config.font.as_deref())?;
        self.renderer = Some(SkiaRenderer::new(
            size.width,
            size.height,
            self.config.layout,
            font,
        )?);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn overlay(&self) -> Vec<String> {
        if !self.trial_debugging {
            return Vec::new();
        }
        let scheduler = self.session.scheduler();
        debug_lines(
            self.session.participant(),
            scheduler.progress(),
            scheduler.current_trial(),
            scheduler.last_completed(),
        )
    }

    fn redraw(&mut self) -> Result<()> {
        let now = self.now_ms();
        let frame = if self.stage.is_experiment() {
            let frame = self.session.tick(now);
            if self.session.is_finished() {
                self.finish(now);
            }
            frame
        } else {
            Frame::blank()
        };

        let overlay = self.overlay();
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let fb = pixels.frame_mut();
        let stats = match self.stage {
            Stage::Instructions => renderer.render_message(INSTRUCTIONS, &overlay, fb, &mut self.clock)?,
            Stage::Experiment => {
                renderer.render_frame(&frame, &self.images, &overlay, fb, &mut self.clock)?
            }
            Stage::Finished => {
                let lines = if self.saved.is_some() { FINISHED } else { EXPORT_FAILED };
                renderer.render_message(lines, &overlay, fb, &mut self.clock)?
            }
        };
        pixels.render()?;
        log::trace!(
            "frame: clear {:.3} ms, draw {:.3} ms, copy {:.3} ms, total {:.3} ms, {} elements",
            stats.clear.as_secs_f64() * 1e3,
            stats.draw.as_secs_f64() * 1e3,
            stats.copy.as_secs_f64() * 1e3,
            stats.total.as_secs_f64() * 1e3,
            stats.elements
        );

        if let Some(window) = &self.window {
            window.request_redraw();
        }
        Ok(())
    }

    fn handle_key(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let now = self.now_ms();
        if key == PhysicalKey::Code(KeyCode::Escape) {
            self.quit(now, event_loop);
            return;
        }

        match self.stage {
            Stage::Instructions => {
                if map_key(key) == Key::Space {
                    self.stage = self.stage.next().unwrap_or(Stage::Finished);
                    let window = self.window.clone();
                    match window.as_deref() {
                        Some(w) => self.session.start_session(now, &mut WindowCursor(w)),
                        None => self.session.start_session(now, &mut NoInputMode),
                    }
                }
            }
            Stage::Experiment => match self.session.on_key(now, map_key(key)) {
                KeyOutcome::Ignored => log::trace!("Ignored {key:?} at {now} ms"),
                outcome => log::debug!("{outcome:?}"),
            },
            Stage::Finished => {
                if self.saved.is_none() && key == PhysicalKey::Code(KeyCode::KeyR) {
                    let result = self.session.retry_export();
                    self.store_export(result);
                } else {
                    self.quit(now, event_loop);
                }
            }
        }
    }

    /// Ends the session once the last trial is done.
    fn finish(&mut self, now: u64) {
        let result = self.end_session(now, false);
        self.store_export(result);
        self.stage = Stage::Finished;
    }

    fn end_session(
        &mut self,
        now: u64,
        abort: bool,
    ) -> Result<Option<PathBuf>, gazecue_experiment::ExportError> {
        let window = self.window.clone();
        let mut no_window = NoInputMode;
        let mut cursor = window.as_deref().map(WindowCursor);
        let input: &mut dyn InputMode = match cursor.as_mut() {
            Some(c) => c,
            None => &mut no_window,
        };
        if abort {
            self.session.abort(now, input)
        } else {
            self.session.end_session(now, input)
        }
    }

    fn store_export(&mut self, result: Result<Option<PathBuf>, gazecue_experiment::ExportError>) {
        match result {
            Ok(Some(path)) => {
                log::info!("Results saved to {}", path.display());
                self.saved = Some(Some(path));
            }
            Ok(None) => self.saved = Some(None),
            Err(e) => log::error!("Saving results failed: {e}"),
        }
    }

    /// Leaves the app. A running session is aborted and its completed
    /// trials are saved.
    fn quit(&mut self, now: u64, event_loop: &ActiveEventLoop) {
        if self.session.is_started() && !self.session.is_exported() {
            let result = self.end_session(now, true);
            self.store_export(result);
        }
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        self.should_exit = true;
        event_loop.exit();
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) -> Result<()> {
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }
        if let Some(pixels) = &mut self.pixels {
            pixels.resize_surface(size.width, size.height)?;
            pixels.resize_buffer(size.width, size.height)?;
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(size.width, size.height)?;
        }
        log::info!("Display resized to {}x{}", size.width, size.height);
        Ok(())
    }

    fn log_frame_timing(&self) {
        let stats = self.clock.calibration_stats();
        if self.clock.frame_count() == 0 {
            return;
        }
        log::info!(
            "Frame timing over {} frames: mean {:.3} ms, jitter {:.3} ms, min {:.3} ms, max {:.3} ms, {:.1} fps",
            self.clock.frame_count(),
            stats.average_frame_time_ns / 1e6,
            stats.jitter_ns / 1e6,
            stats.min_frame_time_ns / 1e6,
            stats.max_frame_time_ns / 1e6,
            stats.effective_fps
        );
    }
}

fn generate(experiment: &ExperimentConfig, catalog: &Catalog<Pixmap>) -> Result<Vec<gazecue_core::Trial>> {
    let generator = TrialGenerator::new(experiment)?;
    let trials = match experiment.seed {
        Some(seed) => {
            generator.generate(catalog.stimuli(), catalog.targets(), &mut StdRng::seed_from_u64(seed))
        }
        None => generator.generate(catalog.stimuli(), catalog.targets(), &mut rand::rng()),
    };
    Ok(trials)
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                log::error!("Failed to create window and surface: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                let now = self.now_ms();
                self.quit(now, event_loop);
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    log::error!("Render failed: {e:#}");
                    let now = self.now_ms();
                    self.quit(now, event_loop);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() && !event.repeat => {
                self.handle_key(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Err(e) = self.handle_resize(size) {
                    log::error!("Resize failed: {e:#}");
                }
            }
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.window.as_ref().map(|w| w.inner_size()) {
                    if let Err(e) = self.handle_resize(size) {
                        log::error!("Resize failed: {e:#}");
                    }
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

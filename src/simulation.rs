use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::constants::MathConstant;
use crate::error::SimulationError;
use crate::gpu::{GpuBackend, GpuContext};
use crate::input::{ControlAction, Input, KeyboardControls};
use crate::params::{ContinuousParams, ParameterChannel, SimulationParameters};
use crate::render_loop::{FrameOutcome, RenderLoop};
use crate::spawn::Jitter;
use crate::time::FramePacer;
use crate::viewport::{Viewport, ViewportManager};
use crate::visuals::VisualConfig;

const TITLE_REFRESH: Duration = Duration::from_millis(500);

/// A vortex simulation builder.
///
/// Use method chaining to configure, then call `.run()` to open the window.
///
/// ```ignore
/// Simulation::new()
///     .with_particle_count(60_000)
///     .with_constant(MathConstant::Plastic)
///     .with_jitter(Jitter::Seeded(7))
///     .run()?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Simulation {
    parameters: SimulationParameters,
    jitter: Jitter,
    visuals: VisualConfig,
}

impl Simulation {
    /// Create a simulation with the default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of particles.
    pub fn with_particle_count(mut self, count: u32) -> Self {
        self.parameters.structural.particle_count = count;
        self
    }

    /// Set the governing constant.
    pub fn with_constant(mut self, constant: MathConstant) -> Self {
        self.parameters.structural.constant = constant;
        self
    }

    /// Replace every parameter at once.
    pub fn with_parameters(mut self, parameters: SimulationParameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the continuous parameters. Out-of-range values are clamped.
    pub fn with_continuous(mut self, continuous: ContinuousParams) -> Self {
        self.parameters.continuous = continuous.clamped();
        self
    }

    /// Set the jitter strategy used for every field build.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Configure window and rendering settings.
    pub fn with_visuals<F>(mut self, configure: F) -> Self
    where
        F: FnOnce(&mut VisualConfig),
    {
        configure(&mut self.visuals);
        self
    }

    /// The configured parameters.
    pub fn parameters(&self) -> &SimulationParameters {
        &self.parameters
    }

    /// Open the window and run until it is closed.
    ///
    /// Returns an error if the window or GPU could not be set up or the
    /// device failed while rendering.
    pub fn run(self) -> Result<(), SimulationError> {
        tracing::info!(
            count = self.parameters.structural.particle_count,
            constant = %self.parameters.structural.constant,
            "starting simulation"
        );

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct App {
    visuals: VisualConfig,
    jitter: Jitter,
    channel: ParameterChannel,
    input: Input,
    controls: KeyboardControls,
    window: Option<Arc<Window>>,
    render_loop: Option<RenderLoop<GpuBackend>>,
    error: Option<SimulationError>,
    last_title: Instant,
}

impl App {
    fn new(sim: Simulation) -> Self {
        Self {
            visuals: sim.visuals,
            jitter: sim.jitter,
            channel: ParameterChannel::new(sim.parameters),
            input: Input::new(),
            controls: KeyboardControls,
            window: None,
            render_loop: None,
            error: None,
            last_title: Instant::now(),
        }
    }

    /// Create the window, GPU backend and render loop.
    fn mount(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let (width, height) = self.visuals.window_size;
        let window_attrs = Window::default_attributes()
            .with_title(self.visuals.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        self.window = Some(window.clone());

        let size = window.inner_size();
        let viewport = Viewport::from_window(size.width, size.height, window.scale_factor());

        let ctx = pollster::block_on(GpuContext::new(window.clone(), viewport))?;
        let backend = pollster::block_on(GpuBackend::new(ctx, &self.visuals))?;

        let mut render_loop = RenderLoop::new(backend, viewport)
            .with_jitter(self.jitter)
            .with_pacer(FramePacer::new(self.visuals.target_fps))
            .with_viewport_manager(ViewportManager::with_debounce(viewport, self.visuals.resize_debounce));
        render_loop.start(&self.channel, Instant::now())?;

        self.render_loop = Some(render_loop);
        window.request_redraw();
        tracing::info!(width = viewport.width, height = viewport.height, "mounted");
        Ok(())
    }

    /// Dispose the loop and close the window, in that order.
    fn teardown(&mut self) {
        if let Some(mut render_loop) = self.render_loop.take() {
            render_loop.dispose();
        }
        self.window = None;
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: SimulationError) {
        tracing::error!(error = %err, "simulation stopped");
        self.error = Some(err);
        self.teardown();
        event_loop.exit();
    }

    fn apply_controls(&mut self, event_loop: &ActiveEventLoop, now: Instant) {
        let actions = self.controls.actions(&self.input, &self.channel.snapshot());
        self.input.begin_frame();

        for action in actions {
            match action {
                ControlAction::Update(update) => {
                    if self.channel.apply(update) {
                        tracing::debug!(?update, "parameter updated");
                    }
                }
                ControlAction::TogglePause => {
                    if let Some(render_loop) = self.render_loop.as_mut() {
                        render_loop.toggle_pause(now);
                    }
                }
                ControlAction::Orbit(delta) => {
                    if let Some(render_loop) = self.render_loop.as_mut() {
                        render_loop.camera_mut().orbit(delta.x, delta.y);
                    }
                }
                ControlAction::Zoom(amount) => {
                    if let Some(render_loop) = self.render_loop.as_mut() {
                        render_loop.camera_mut().zoom(amount);
                    }
                }
                ControlAction::ResetCamera => {
                    if let Some(render_loop) = self.render_loop.as_mut() {
                        render_loop.camera_mut().reset();
                    }
                }
                ControlAction::Quit => {
                    tracing::info!("quit requested");
                    self.teardown();
                    event_loop.exit();
                    return;
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        self.apply_controls(event_loop, now);

        let Some(render_loop) = self.render_loop.as_mut() else {
            return;
        };

        match render_loop.frame(&self.channel, now) {
            Ok(FrameOutcome::Drawn { .. }) => self.refresh_title(now),
            Ok(FrameOutcome::Skipped | FrameOutcome::Inactive) => {}
            Err(err) => self.fail(event_loop, err.into()),
        }
    }

    fn refresh_title(&mut self, now: Instant) {
        if !self.visuals.show_fps || now.duration_since(self.last_title) < TITLE_REFRESH {
            return;
        }
        self.last_title = now;

        let (Some(window), Some(render_loop)) = (&self.window, &self.render_loop) else {
            return;
        };
        let structural = self.channel.structural();
        let paused = if render_loop.is_paused() { " | paused" } else { "" };
        window.set_title(&format!(
            "{} | {} | {} particles | {:.0} fps{}",
            self.visuals.title,
            structural.constant,
            structural.particle_count,
            render_loop.fps(),
            paused
        ));
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.mount(event_loop) {
                self.fail(event_loop, err);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("window closed");
                self.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let (Some(window), Some(render_loop)) = (&self.window, self.render_loop.as_mut()) {
                    render_loop.notify_resize(size.width, size.height, window.scale_factor(), Instant::now());
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                if let (Some(window), Some(render_loop)) = (&self.window, self.render_loop.as_mut()) {
                    let size = window.inner_size();
                    render_loop.notify_resize(size.width, size.height, scale_factor, Instant::now());
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            other => self.input.handle_event(&other),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(render_loop)) = (&self.window, &self.render_loop) else {
            return;
        };
        let now = Instant::now();
        match render_loop.next_deadline() {
            Some(deadline) if deadline > now => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
            }
            _ => {
                event_loop.set_control_flow(ControlFlow::Poll);
                window.request_redraw();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.teardown();
    }
}

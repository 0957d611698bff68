//! The frame loop and the lifetime of everything it draws.
//!
//! A [`RenderLoop`] moves through three states:
//!
//! ```text
//! Uninitialized --start--> Running --dispose--> Disposed
//!                  ^           |
//!                  +--rebuild--+   (structural parameter changed)
//! ```
//!
//! Entering `Running` generates the particle field, hands it to the
//! [`FieldBackend`] and starts the clock at zero. Each call to
//! [`frame`](RenderLoop::frame) takes one parameter snapshot, applies any
//! due resize, rebuilds if the structural revision moved, and draws if the
//! frame pacer allows it. A rebuild releases every backend resource before
//! the new field is generated, so no two fields are ever alive at once.
//!
//! After [`dispose`](RenderLoop::dispose) every operation is a no-op.
//! Dropping a loop disposes it.

use std::time::Instant;

use glam::Mat4;

use crate::constants::MathConstant;
use crate::field::{FieldGenerator, ParticleField};
use crate::gpu::camera::Camera;
use crate::params::{ContinuousParams, ParameterChannel, StructuralParams};
use crate::spawn::Jitter;
use crate::time::{FrameClock, FramePacer, TARGET_FPS};
use crate::viewport::{Viewport, ViewportManager};

/// Everything a backend needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// The field most recently passed to [`FieldBackend::upload`].
    pub field: &'a ParticleField,
    /// Elapsed animation time in seconds.
    pub time: f32,
    /// Constant the field was generated with.
    pub constant: MathConstant,
    /// Continuous parameters snapshot for this frame.
    pub params: ContinuousParams,
    /// Camera view-projection matrix.
    pub view_proj: Mat4,
    /// Current viewport.
    pub viewport: Viewport,
}

/// A rendering capability the loop programs against.
///
/// Implemented by the wgpu renderer and by the headless CPU rasterizer.
pub trait FieldBackend {
    type Error: std::error::Error + 'static;

    /// Allocate resources for `field`. Called once per build; a matching
    /// [`release`](Self::release) always happens before the next upload.
    fn upload(&mut self, field: &ParticleField) -> Result<(), Self::Error>;

    /// Apply a new viewport size.
    fn resize(&mut self, viewport: Viewport);

    /// Draw one frame.
    fn draw(&mut self, frame: &FrameInput<'_>) -> Result<(), Self::Error>;

    /// Free everything allocated by `upload`. Must tolerate repeated calls.
    fn release(&mut self);
}

/// Lifecycle state of a [`RenderLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Running,
    Disposed,
}

/// What a call to [`RenderLoop::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    /// Too early for the next frame; nothing drawn.
    Skipped,
    /// A frame was drawn at the given elapsed time.
    Drawn { time: f32 },
    /// The loop is not running; nothing happened.
    Inactive,
}

/// State that lives exactly as long as one generated field.
#[derive(Debug)]
struct RenderContext {
    field: ParticleField,
    clock: FrameClock,
    structural: StructuralParams,
    revision: u64,
}

/// Drives a [`FieldBackend`] from a [`ParameterChannel`].
pub struct RenderLoop<B: FieldBackend> {
    backend: B,
    jitter: Jitter,
    state: LoopState,
    context: Option<RenderContext>,
    pacer: FramePacer,
    viewport: ViewportManager,
    camera: Camera,
    paused: bool,
    frames_drawn: u64,
    builds: u64,
}

impl<B: FieldBackend> RenderLoop<B> {
    /// Create an uninitialized loop.
    pub fn new(backend: B, viewport: Viewport) -> Self {
        Self {
            backend,
            jitter: Jitter::default(),
            state: LoopState::Uninitialized,
            context: None,
            pacer: FramePacer::new(TARGET_FPS),
            viewport: ViewportManager::new(viewport),
            camera: Camera::new(),
            paused: false,
            frames_drawn: 0,
            builds: 0,
        }
    }

    /// Set the jitter strategy used for every build.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replace the frame pacer.
    pub fn with_pacer(mut self, pacer: FramePacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Replace the viewport manager, e.g. to change the debounce window.
    pub fn with_viewport_manager(mut self, viewport: ViewportManager) -> Self {
        self.viewport = viewport;
        self
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// The live field, if running.
    pub fn field(&self) -> Option<&ParticleField> {
        self.context.as_ref().map(|ctx| &ctx.field)
    }

    /// Current viewport.
    pub fn viewport(&self) -> Viewport {
        self.viewport.current()
    }

    /// Frames drawn over the loop's lifetime.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Number of fields built over the loop's lifetime.
    pub fn builds(&self) -> u64 {
        self.builds
    }

    /// Averaged FPS of the live field's clock.
    pub fn fps(&self) -> f32 {
        self.context.as_ref().map_or(0.0, |ctx| ctx.clock.fps())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Freeze or unfreeze animation time.
    pub fn toggle_pause(&mut self, now: Instant) {
        if self.state == LoopState::Disposed {
            return;
        }
        self.paused = !self.paused;
        if let Some(ctx) = self.context.as_mut() {
            if self.paused {
                ctx.clock.pause(now);
            } else {
                ctx.clock.resume(now);
            }
        }
        tracing::info!(paused = self.paused, "pause toggled");
    }

    /// Forward a resize notification to the debouncer.
    pub fn notify_resize(&mut self, width: u32, height: u32, pixel_ratio: f64, now: Instant) {
        if self.state == LoopState::Disposed {
            return;
        }
        self.viewport.notify_resize(width, height, pixel_ratio, now);
    }

    /// Earliest instant at which the loop has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.state != LoopState::Running {
            return None;
        }
        match (self.pacer.next_deadline(), self.viewport.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Enter `Running`: build the field, upload it and start the clock.
    ///
    /// Does nothing when already running or disposed.
    pub fn start(&mut self, channel: &ParameterChannel, now: Instant) -> Result<(), B::Error> {
        if self.state != LoopState::Uninitialized {
            return Ok(());
        }

        let structural = channel.structural();
        let color_shift = channel.continuous().color_shift;
        let build_start = Instant::now();

        let field = FieldGenerator::new()
            .with_jitter(self.jitter)
            .with_color_shift(color_shift)
            .generate(structural.particle_count, structural.constant);

        if field.is_empty() {
            tracing::warn!("particle count is zero, nothing will be drawn");
        }

        self.backend.upload(&field)?;
        self.backend.resize(self.viewport.current());

        let mut clock = FrameClock::new(now);
        if self.paused {
            clock.pause(now);
        }

        tracing::info!(
            count = field.len(),
            constant = %structural.constant,
            elapsed_ms = build_start.elapsed().as_secs_f64() * 1000.0,
            "field built"
        );

        self.context = Some(RenderContext {
            field,
            clock,
            structural,
            revision: channel.structural_revision(),
        });
        self.pacer.reset();
        self.builds += 1;
        self.state = LoopState::Running;
        tracing::debug!("render loop running");
        Ok(())
    }

    /// Run one iteration of the loop at `now`.
    pub fn frame(&mut self, channel: &ParameterChannel, now: Instant) -> Result<FrameOutcome, B::Error> {
        if self.state != LoopState::Running {
            return Ok(FrameOutcome::Inactive);
        }

        let snapshot = channel.snapshot();

        if let Some(viewport) = self.viewport.poll(now) {
            self.backend.resize(viewport);
        }

        let stale = self
            .context
            .as_ref()
            .map_or(true, |ctx| ctx.revision != channel.structural_revision());
        if stale {
            self.rebuild(channel, now)?;
        }

        if !self.pacer.ready(now) {
            return Ok(FrameOutcome::Skipped);
        }

        let viewport = self.viewport.current();
        let view_proj = self.camera.view_proj(viewport.aspect());

        let Some(ctx) = self.context.as_mut() else {
            return Ok(FrameOutcome::Inactive);
        };
        let time = ctx.clock.tick(now);

        let input = FrameInput {
            field: &ctx.field,
            time,
            constant: ctx.structural.constant,
            params: snapshot.continuous,
            view_proj,
            viewport,
        };
        self.backend.draw(&input)?;

        self.frames_drawn += 1;
        if self.frames_drawn <= 3 {
            tracing::info!(frame = self.frames_drawn, time, "frame rendered");
        }
        if ctx.clock.frame() % 300 == 0 {
            tracing::debug!(fps = ctx.clock.fps(), "frame rate");
        }

        Ok(FrameOutcome::Drawn { time })
    }

    /// Tear down the current field and build a new one from `channel`.
    fn rebuild(&mut self, channel: &ParameterChannel, now: Instant) -> Result<(), B::Error> {
        if let Some(old) = self.context.as_ref() {
            tracing::info!(
                from_constant = %old.structural.constant,
                from_count = old.structural.particle_count,
                to_constant = %channel.structural().constant,
                to_count = channel.structural().particle_count,
                "structural change, rebuilding field"
            );
        }
        self.release_context();
        self.state = LoopState::Uninitialized;
        self.start(channel, now)
    }

    /// Release backend resources and drop the field.
    fn release_context(&mut self) {
        if self.context.take().is_some() {
            self.backend.release();
        }
    }

    /// Stop the loop and free everything. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if self.state == LoopState::Disposed {
            return;
        }
        self.viewport.tear_down();
        self.pacer.reset();
        self.release_context();
        self.state = LoopState::Disposed;
        tracing::info!(frames = self.frames_drawn, "render loop disposed");
    }
}

impl<B: FieldBackend> Drop for RenderLoop<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

//! # Chromatic Vortex
//!
//! A field of glowing particles laid out on golden-angle spirals and animated
//! as a breathing vortex, governed by one mathematical constant.
//!
//! ## Quick Start
//!
//! ```ignore
//! use chromatic_vortex::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     Simulation::new()
//!         .with_particle_count(45_000)
//!         .with_constant(MathConstant::GoldenRatio)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### The field
//!
//! [`FieldGenerator`] builds a [`ParticleField`] once per structural
//! configuration: particle `i` sits at the golden angle `i * 2π / constant`
//! on a radius that grows with `sqrt(i / N)`, with a little spawn jitter.
//! Colors come from an HSV wheel advanced by the golden angle.
//!
//! ### Parameters
//!
//! Parameters are split in two groups. Structural ones (constant, count)
//! regenerate the field. Continuous ones (speeds, tightness, color shift,
//! opacity) are read every frame with no rebuild. Both live in a
//! [`ParameterChannel`]:
//!
//! ```ignore
//! let mut channel = ParameterChannel::default();
//! channel.set_rotation_speed(2.0);         // next frame, no rebuild
//! channel.set_constant(MathConstant::Pi);  // regenerates the field
//! ```
//!
//! ### Animation
//!
//! The per-frame motion is a pure function, [`transform`], of the particle,
//! elapsed time and the continuous parameters. The GPU backend runs the
//! same math in WGSL; the [`CpuBackend`] runs it with rayon and splats the
//! result into an in-memory image.
//!
//! ### The frame loop
//!
//! [`RenderLoop`] owns the field, the clock, the frame pacer and the
//! debounced viewport, and talks to any [`FieldBackend`]. It releases
//! every backend resource on rebuild and on dispose.
//!
//! ```ignore
//! let mut render_loop = RenderLoop::new(CpuBackend::new(), Viewport::new(320, 240, 1.0));
//! render_loop.start(&channel, Instant::now())?;
//! render_loop.frame(&channel, Instant::now())?;
//! render_loop.dispose();
//! ```
//!
//! ## Logging
//!
//! The library logs through `tracing` and never installs a subscriber.

pub mod color;
pub mod constants;
pub mod cpu;
mod error;
pub mod field;
pub mod glow;
pub mod gpu;
pub mod input;
pub mod params;
pub mod render_loop;
pub mod shader;
mod simulation;
pub mod spawn;
pub mod time;
pub mod transform;
pub mod viewport;
pub mod visuals;

pub use color::hsv_to_rgb;
pub use constants::{MathConstant, ParseConstantError, GOLDEN_RATIO};
pub use cpu::CpuBackend;
pub use error::{GpuError, SimulationError};
pub use field::{FieldGenerator, Particle, ParticleField};
pub use glam::{Mat4, Vec2, Vec3};
pub use glow::{shade, Fragment};
pub use gpu::{Camera, GpuBackend};
pub use params::{ContinuousParams, ParamUpdate, ParameterChannel, SimulationParameters, StructuralParams};
pub use render_loop::{FieldBackend, FrameInput, FrameOutcome, LoopState, RenderLoop};
pub use simulation::Simulation;
pub use spawn::Jitter;
pub use transform::{transform, transform_field, Transformed};
pub use viewport::{Viewport, ViewportManager};
pub use visuals::{BlendMode, VisualConfig};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use chromatic_vortex::prelude::*;
/// ```
pub mod prelude {
    pub use crate::constants::MathConstant;
    pub use crate::cpu::CpuBackend;
    pub use crate::error::{GpuError, SimulationError};
    pub use crate::field::{FieldGenerator, Particle, ParticleField};
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::params::{ContinuousParams, ParamUpdate, ParameterChannel, SimulationParameters};
    pub use crate::render_loop::{FieldBackend, FrameOutcome, RenderLoop};
    pub use crate::simulation::Simulation;
    pub use crate::spawn::Jitter;
    pub use crate::time::{FrameClock, FramePacer};
    pub use crate::viewport::Viewport;
    pub use crate::visuals::{BlendMode, VisualConfig};
    pub use crate::{Vec2, Vec3};
}

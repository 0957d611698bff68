//! Live simulation parameters.
//!
//! Parameters come in two kinds:
//!
//! - **Structural** ([`StructuralParams`]): the governing constant and the
//!   particle count. Changing either invalidates the particle field and the
//!   render loop rebuilds it.
//! - **Continuous** ([`ContinuousParams`]): speeds, spiral tightness, color
//!   shift and opacity. These are read once per frame and applied in place.
//!
//! The [`ParameterChannel`] is the only writer-facing surface. Every setter
//! clamps to the documented control range instead of rejecting the value,
//! and structural writes bump a revision counter that the render loop
//! compares against the revision of the field it built.
//!
//! ```ignore
//! let mut channel = ParameterChannel::new(SimulationParameters::default());
//! channel.set_rotation_speed(2.0);         // next frame, no rebuild
//! channel.set_constant(MathConstant::Pi);  // rebuild on next frame
//! ```

use crate::constants::MathConstant;

/// Range accepted for rotation speed.
pub const ROTATION_SPEED_RANGE: (f32, f32) = (0.0, 3.0);
/// Range accepted for breathe speed.
pub const BREATHE_SPEED_RANGE: (f32, f32) = (0.0, 3.0);
/// Range accepted for spiral tightness.
pub const SPIRAL_TIGHTNESS_RANGE: (f32, f32) = (0.1, 3.0);
/// Range accepted for color shift.
pub const COLOR_SHIFT_RANGE: (f32, f32) = (0.0, 3.0);
/// Range accepted for particle opacity.
pub const OPACITY_RANGE: (f32, f32) = (0.1, 1.0);

/// Particle count used when none is configured.
pub const DEFAULT_PARTICLE_COUNT: u32 = 45_000;

fn clamp_to(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Parameters whose change requires regenerating the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuralParams {
    pub constant: MathConstant,
    pub particle_count: u32,
}

impl Default for StructuralParams {
    fn default() -> Self {
        Self {
            constant: MathConstant::GoldenRatio,
            particle_count: DEFAULT_PARTICLE_COUNT,
        }
    }
}

/// Parameters applied per frame without touching the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousParams {
    /// Multiplier on all three rotation phases, in `[0, 3]`.
    pub rotation_speed: f32,
    /// Multiplier on breathing and wave terms, in `[0, 3]`.
    pub breathe_speed: f32,
    /// Multiplier on spiral winding, in `[0.1, 3]`.
    pub spiral_tightness: f32,
    /// Hue multiplier, in `[0, 3]`.
    pub color_shift: f32,
    /// Fragment alpha multiplier, in `[0.1, 1]`.
    pub particle_opacity: f32,
}

impl Default for ContinuousParams {
    fn default() -> Self {
        Self {
            rotation_speed: 1.0,
            breathe_speed: 1.0,
            spiral_tightness: 1.0,
            color_shift: 1.0,
            particle_opacity: 0.65,
        }
    }
}

impl ContinuousParams {
    /// Copy with every field clamped to its control range.
    pub fn clamped(self) -> Self {
        Self {
            rotation_speed: clamp_to(self.rotation_speed, ROTATION_SPEED_RANGE),
            breathe_speed: clamp_to(self.breathe_speed, BREATHE_SPEED_RANGE),
            spiral_tightness: clamp_to(self.spiral_tightness, SPIRAL_TIGHTNESS_RANGE),
            color_shift: clamp_to(self.color_shift, COLOR_SHIFT_RANGE),
            particle_opacity: clamp_to(self.particle_opacity, OPACITY_RANGE),
        }
    }
}

/// Full parameter set for one simulation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationParameters {
    pub structural: StructuralParams,
    pub continuous: ContinuousParams,
}

/// A single update pushed by a control source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamUpdate {
    Constant(MathConstant),
    ParticleCount(u32),
    RotationSpeed(f32),
    BreatheSpeed(f32),
    SpiralTightness(f32),
    ColorShift(f32),
    Opacity(f32),
}

impl ParamUpdate {
    /// Whether applying this update invalidates the field.
    pub fn is_structural(&self) -> bool {
        matches!(self, ParamUpdate::Constant(_) | ParamUpdate::ParticleCount(_))
    }
}

/// Holder of the shared [`SimulationParameters`].
///
/// Written only by the control source, read by the render loop once per
/// frame via [`snapshot`](Self::snapshot).
#[derive(Debug, Clone)]
pub struct ParameterChannel {
    params: SimulationParameters,
    structural_revision: u64,
}

impl Default for ParameterChannel {
    fn default() -> Self {
        Self::new(SimulationParameters::default())
    }
}

impl ParameterChannel {
    /// Create a channel; continuous values are clamped on entry.
    pub fn new(params: SimulationParameters) -> Self {
        Self {
            params: SimulationParameters {
                structural: params.structural,
                continuous: params.continuous.clamped(),
            },
            structural_revision: 0,
        }
    }

    /// Copy of the current parameters. One snapshot is taken per frame.
    #[inline]
    pub fn snapshot(&self) -> SimulationParameters {
        self.params
    }

    /// Current continuous parameters.
    #[inline]
    pub fn continuous(&self) -> ContinuousParams {
        self.params.continuous
    }

    /// Current structural parameters.
    #[inline]
    pub fn structural(&self) -> StructuralParams {
        self.params.structural
    }

    /// Counter bumped by every effective structural write.
    #[inline]
    pub fn structural_revision(&self) -> u64 {
        self.structural_revision
    }

    /// Apply one update. Returns `true` if it changed anything.
    pub fn apply(&mut self, update: ParamUpdate) -> bool {
        match update {
            ParamUpdate::Constant(c) => self.set_constant(c),
            ParamUpdate::ParticleCount(n) => self.set_particle_count(n),
            ParamUpdate::RotationSpeed(v) => self.set_rotation_speed(v),
            ParamUpdate::BreatheSpeed(v) => self.set_breathe_speed(v),
            ParamUpdate::SpiralTightness(v) => self.set_spiral_tightness(v),
            ParamUpdate::ColorShift(v) => self.set_color_shift(v),
            ParamUpdate::Opacity(v) => self.set_opacity(v),
        }
    }

    /// Select the governing constant. Structural.
    pub fn set_constant(&mut self, constant: MathConstant) -> bool {
        if self.params.structural.constant == constant {
            return false;
        }
        self.params.structural.constant = constant;
        self.structural_revision += 1;
        true
    }

    /// Select a constant by label or id. Unknown names leave the selection
    /// untouched.
    pub fn set_constant_by_name(&mut self, name: &str) -> bool {
        match MathConstant::from_name(name) {
            Some(c) => self.set_constant(c),
            None => {
                tracing::warn!(name, "ignoring unknown constant");
                false
            }
        }
    }

    /// Set the particle count. Structural; zero yields an empty field.
    pub fn set_particle_count(&mut self, count: u32) -> bool {
        if self.params.structural.particle_count == count {
            return false;
        }
        self.params.structural.particle_count = count;
        self.structural_revision += 1;
        true
    }

    pub fn set_rotation_speed(&mut self, v: f32) -> bool {
        replace(&mut self.params.continuous.rotation_speed, clamp_to(v, ROTATION_SPEED_RANGE))
    }

    pub fn set_breathe_speed(&mut self, v: f32) -> bool {
        replace(&mut self.params.continuous.breathe_speed, clamp_to(v, BREATHE_SPEED_RANGE))
    }

    pub fn set_spiral_tightness(&mut self, v: f32) -> bool {
        replace(
            &mut self.params.continuous.spiral_tightness,
            clamp_to(v, SPIRAL_TIGHTNESS_RANGE),
        )
    }

    pub fn set_color_shift(&mut self, v: f32) -> bool {
        replace(&mut self.params.continuous.color_shift, clamp_to(v, COLOR_SHIFT_RANGE))
    }

    pub fn set_opacity(&mut self, v: f32) -> bool {
        replace(&mut self.params.continuous.particle_opacity, clamp_to(v, OPACITY_RANGE))
    }
}

fn replace(slot: &mut f32, value: f32) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

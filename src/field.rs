//! Procedural particle field generation.
//!
//! A field is built once per structural configuration (particle count and
//! governing constant) and never mutated afterwards. Every particle carries
//! two phases, `golden_index` and `chromatic_phase`, that the per-frame
//! transform reads to animate it; the field itself has no per-frame state.
//!
//! # Layout
//!
//! For particle `i` of `n`, with `t = i / n` and governing constant `φ`:
//!
//! - phases: `golden = frac(t·φ·1.5)`, `chromatic = frac(t·φ²·0.8)`
//! - radius: `golden^0.6 / φ · 1.1`, biased toward the axis
//! - angle: the golden-angle stride `i·2π/φ` plus a chromatic offset
//! - height: a lens-shaped "vessel" profile from both phases
//!
//! Radius, angle and brightness receive a small random jitter controlled by
//! [`Jitter`].
//!
//! # Example
//!
//! ```ignore
//! let field = FieldGenerator::new()
//!     .with_jitter(Jitter::Seeded(1))
//!     .generate(45_000, MathConstant::GoldenRatio);
//! assert_eq!(field.len(), 45_000);
//! ```

use std::f64::consts::PI;

use glam::Vec3;

use crate::color::hsv_to_rgb;
use crate::constants::MathConstant;
use crate::spawn::Jitter;

/// A single particle as produced by the generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Initial position in local space.
    pub position: Vec3,
    /// Base color, each channel in `[0, 1]`.
    pub color: Vec3,
    /// Base point size before perspective scaling.
    pub size: f32,
    /// Primary phase in `[0, 1)`.
    pub golden_index: f32,
    /// Secondary phase in `[0, 1)`.
    pub chromatic_phase: f32,
}

/// An immutable, generated particle field.
#[derive(Debug, Clone, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
    constant: MathConstant,
    color_shift: f32,
}

impl ParticleField {
    /// The particles, in generation order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the field holds no particles.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// The constant the field was laid out with.
    pub fn constant(&self) -> MathConstant {
        self.constant
    }

    /// Color shift in effect when the colors were baked.
    pub fn color_shift(&self) -> f32 {
        self.color_shift
    }

    /// Split into the parallel attribute arrays uploaded to the GPU.
    pub fn attributes(&self) -> FieldAttributes {
        let n = self.particles.len();
        let mut attrs = FieldAttributes {
            positions: Vec::with_capacity(n),
            colors: Vec::with_capacity(n),
            sizes: Vec::with_capacity(n),
            golden_indices: Vec::with_capacity(n),
            chromatic_phases: Vec::with_capacity(n),
        };
        for p in &self.particles {
            attrs.positions.push(p.position.to_array());
            attrs.colors.push(p.color.to_array());
            attrs.sizes.push(p.size);
            attrs.golden_indices.push(p.golden_index);
            attrs.chromatic_phases.push(p.chromatic_phase);
        }
        attrs
    }
}

/// Per-attribute arrays of equal length, one entry per particle.
#[derive(Debug, Clone, Default)]
pub struct FieldAttributes {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
    pub sizes: Vec<f32>,
    pub golden_indices: Vec<f32>,
    pub chromatic_phases: Vec<f32>,
}

impl FieldAttributes {
    /// Number of particles described.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the arrays are empty.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Builds particle fields from a governing constant.
#[derive(Debug, Clone, Copy)]
pub struct FieldGenerator {
    jitter: Jitter,
    color_shift: f32,
}

impl Default for FieldGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldGenerator {
    /// Generator with entropy-seeded jitter and a color shift of 1.0.
    pub fn new() -> Self {
        Self {
            jitter: Jitter::Entropy,
            color_shift: 1.0,
        }
    }

    /// Set the jitter seeding strategy.
    pub fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    /// Set the hue multiplier used when baking particle colors.
    pub fn with_color_shift(mut self, color_shift: f32) -> Self {
        self.color_shift = color_shift.max(0.0);
        self
    }

    /// The configured jitter strategy.
    pub fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Generate `count` particles. A count of zero yields an empty field.
    pub fn generate(&self, count: u32, constant: MathConstant) -> ParticleField {
        let phi = constant.value();
        let mut jitter = self.jitter.source();

        let particles = (0..count)
            .map(|i| {
                let layout = Layout::new(i, count, phi);
                spawn_particle(&layout, phi, self.color_shift as f64, &mut jitter)
            })
            .collect();

        ParticleField {
            particles,
            constant,
            color_shift: self.color_shift,
        }
    }
}

/// The deterministic part of a particle's placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Primary phase before narrowing to `f32`.
    pub golden_t: f64,
    /// Secondary phase before narrowing to `f32`.
    pub chromatic_t: f64,
    /// Radius before jitter.
    pub radius: f64,
    /// Angle before jitter: golden angle plus chromatic offset.
    pub angle: f64,
    /// Vessel profile height.
    pub height: f64,
}

impl Layout {
    /// Compute the layout of particle `index` out of `count`.
    pub fn new(index: u32, count: u32, phi: f64) -> Self {
        let t = if count == 0 { 0.0 } else { index as f64 / count as f64 };
        let phi_inv = 1.0 / phi;

        let golden_t = frac(t * phi * 1.5);
        let chromatic_t = frac(t * phi * phi * 0.8);
        let radius = golden_t.powf(0.6) * phi_inv * 1.1;

        let chromatic_offset = chromatic_t * PI * 0.3;
        let angle = golden_angle(index, phi) + chromatic_offset;

        let height = (golden_t * PI).sin() * 2.0 + (chromatic_t * PI * 2.0).cos() * 0.3;

        Self {
            golden_t,
            chromatic_t,
            radius,
            angle,
            height,
        }
    }
}

/// Golden-angle stride `index · 2π / phi`, generalized to any constant.
#[inline]
pub fn golden_angle(index: u32, phi: f64) -> f64 {
    index as f64 * 2.0 * PI / phi
}

/// Fractional part for non-negative inputs, always in `[0, 1)`.
#[inline]
fn frac(x: f64) -> f64 {
    x - x.floor()
}

/// Narrow a phase to `f32` without letting rounding reach 1.0.
#[inline]
fn phase_f32(x: f64) -> f32 {
    let narrowed = x as f32;
    if narrowed >= 1.0 {
        0.0
    } else {
        narrowed
    }
}

fn spawn_particle(
    layout: &Layout,
    phi: f64,
    color_shift: f64,
    jitter: &mut crate::spawn::JitterSource,
) -> Particle {
    let phi_inv = 1.0 / phi;
    let phi_sq = phi * phi;
    let Layout {
        golden_t,
        chromatic_t,
        radius,
        angle,
        height,
    } = *layout;

    let jittered_radius = radius + jitter.symmetric(0.04 * phi_inv);
    let jittered_angle = angle + jitter.symmetric(0.08 * phi_inv);

    let position = Vec3::new(
        (jittered_angle.cos() * jittered_radius) as f32,
        height as f32,
        (jittered_angle.sin() * jittered_radius) as f32,
    );

    let primary_hue = frac(golden_t * phi * 3.2 * color_shift);
    let radius_hue = frac(radius * phi * 2.8 * color_shift);
    let height_hue = frac((height + 2.0) / 4.0 * phi_inv * 1.5 * color_shift);
    let chromatic_hue = frac(chromatic_t * phi_sq * 2.0 * color_shift);
    let hue = frac(
        primary_hue * phi_inv + radius_hue * phi_inv * 0.7 + height_hue * 0.4 + chromatic_hue * 0.3,
    );

    let saturation = 0.8
        + (golden_t * phi * PI * 3.0).sin() * 0.15
        + (chromatic_t * phi_sq * PI * 2.0).cos() * 0.1;
    let value = 0.6
        + radius.sqrt() * 0.35
        + golden_t * 0.25
        + chromatic_t * 0.15
        + jitter.unit() * 0.08;

    let color = hsv_to_rgb(
        phase_f32(hue),
        saturation.clamp(0.0, 1.0) as f32,
        value.clamp(0.0, 1.0) as f32,
    );

    let size = (1.0 - (height * 0.4).abs()) * 0.25 * phi_inv
        + 0.12
        + golden_t * 0.06
        + chromatic_t * 0.04;

    Particle {
        position,
        color,
        size: size as f32,
        golden_index: phase_f32(golden_t),
        chromatic_phase: phase_f32(chromatic_t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn generator() -> FieldGenerator {
        FieldGenerator::new().with_jitter(Jitter::Disabled)
    }

    #[test]
    fn test_empty_field() {
        let field = generator().generate(0, MathConstant::GoldenRatio);
        assert!(field.is_empty());
        assert!(field.attributes().is_empty());
    }

    #[test]
    fn test_exact_count_and_ranges() {
        for constant in MathConstant::ALL {
            for count in [1u32, 2, 3, 17, 1000] {
                let field = FieldGenerator::new().generate(count, constant);
                assert_eq!(field.len(), count as usize);
                for p in field.particles() {
                    assert!((0.0..1.0).contains(&p.golden_index), "{}", constant);
                    assert!((0.0..1.0).contains(&p.chromatic_phase), "{}", constant);
                    assert!(p.color.min_element() >= 0.0 && p.color.max_element() <= 1.0);
                    assert!(p.size > 0.0);
                    assert!(p.position.is_finite());
                }
            }
        }
    }

    #[test]
    fn test_golden_angles_for_three_particles() {
        let phi = MathConstant::GoldenRatio.value();
        assert_eq!(golden_angle(0, phi), 0.0);
        assert!((golden_angle(1, phi) - TAU / phi).abs() < 1e-12);
        assert!((golden_angle(1, phi) - 3.883_222).abs() < 1e-5);
        assert!((golden_angle(2, phi) - 2.0 * TAU / phi).abs() < 1e-12);
    }

    #[test]
    fn test_unjittered_position_follows_layout() {
        let field = generator().generate(3, MathConstant::GoldenRatio);
        let phi = MathConstant::GoldenRatio.value();

        for (i, p) in field.particles().iter().enumerate() {
            let layout = Layout::new(i as u32, 3, phi);
            let angle = (p.position.z as f64).atan2(p.position.x as f64);
            let diff = (angle - layout.angle).rem_euclid(TAU);
            assert!(diff < 1e-4 || TAU - diff < 1e-4, "particle {} angle off by {}", i, diff);

            let radius = (p.position.x as f64).hypot(p.position.z as f64);
            assert!((radius - layout.radius).abs() < 1e-5);
            assert!((p.position.y as f64 - layout.height).abs() < 1e-5);
        }

        // Particle 0 sits on the axis: t = 0 gives zero phase and zero radius.
        let first = field.particles()[0];
        assert_eq!(first.golden_index, 0.0);
        assert!(first.position.x.abs() < 1e-6 && first.position.z.abs() < 1e-6);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let a = FieldGenerator::new().with_jitter(Jitter::Seeded(99)).generate(500, MathConstant::Pi);
        let b = FieldGenerator::new().with_jitter(Jitter::Seeded(99)).generate(500, MathConstant::Pi);
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_jitter_leaves_deterministic_components() {
        let a = FieldGenerator::new().with_jitter(Jitter::Seeded(1)).generate(300, MathConstant::Euler);
        let b = FieldGenerator::new().with_jitter(Jitter::Seeded(2)).generate(300, MathConstant::Euler);
        for (pa, pb) in a.particles().iter().zip(b.particles()) {
            assert_eq!(pa.golden_index, pb.golden_index);
            assert_eq!(pa.chromatic_phase, pb.chromatic_phase);
            assert_eq!(pa.position.y, pb.position.y);
            assert_eq!(pa.size, pb.size);
        }
    }

    #[test]
    fn test_attributes_are_parallel() {
        let field = generator().generate(64, MathConstant::Plastic);
        let attrs = field.attributes();
        assert_eq!(attrs.len(), 64);
        assert_eq!(attrs.colors.len(), 64);
        assert_eq!(attrs.sizes.len(), 64);
        assert_eq!(attrs.golden_indices.len(), 64);
        assert_eq!(attrs.chromatic_phases.len(), 64);
        assert_eq!(attrs.positions[5], field.particles()[5].position.to_array());
    }

    #[test]
    fn test_color_shift_changes_colors_only() {
        let base = generator().generate(50, MathConstant::GoldenRatio);
        let shifted = generator().with_color_shift(2.5).generate(50, MathConstant::GoldenRatio);
        assert_eq!(shifted.color_shift(), 2.5);
        let mut differs = false;
        for (a, b) in base.particles().iter().zip(shifted.particles()) {
            assert_eq!(a.position, b.position);
            differs |= a.color != b.color;
        }
        assert!(differs);
    }
}

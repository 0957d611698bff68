//! The per-frame vortex deformation, evaluated on the CPU.
//!
//! This is the same math the vertex stage in [`crate::shader`] runs, in
//! single precision so both paths agree. Every particle is transformed
//! independently from its generated attributes, the elapsed time and one
//! snapshot of the continuous parameters; nothing is written back to the
//! field.
//!
//! ```ignore
//! let params = ContinuousParams::default();
//! let out = transform(&field.particles()[0], 1.5, &params, PHI);
//! assert!(out.intensity >= 0.0);
//! ```

use glam::Vec3;
use rayon::prelude::*;

use crate::field::{Particle, ParticleField};
use crate::params::ContinuousParams;

/// Point size numerator, in pixels at unit view depth.
pub const POINT_SCALE: f32 = 140.0;

/// Edge spans narrower than this are treated as a hard step.
const RAMP_EPSILON: f32 = 1e-6;

/// Result of transforming one particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformed {
    /// Rendered position in model space.
    pub position: Vec3,
    /// Brightness and size modifier, never negative.
    pub intensity: f32,
}

/// Powers of the governing constant shared by every particle in a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhiTerms {
    pub phi: f32,
    pub phi_inv: f32,
    pub phi_squared: f32,
}

impl PhiTerms {
    pub fn new(phi: f32) -> Self {
        Self {
            phi,
            phi_inv: 1.0 / phi,
            phi_squared: phi * phi,
        }
    }
}

/// Hermite ramp from `edge0` to `edge1`.
///
/// Works with reversed edges (`edge0 > edge1` ramps downward). Degenerate
/// spans collapse to a step at `edge0` instead of dividing by zero. The
/// WGSL `ramp` function is identical.
#[inline]
pub fn ramp(edge0: f32, edge1: f32, x: f32) -> f32 {
    let span = edge1 - edge0;
    if span.abs() < RAMP_EPSILON {
        return if x >= edge0 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / span).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Radial envelope bounds at `time`, as `(inner, outer)`.
pub fn vessel_bounds(time: f32, breathe: f32, phi: &PhiTerms) -> (f32, f32) {
    let inner = 0.25 * phi.phi_inv * (1.0 + (time * 0.2 * breathe).sin() * 0.1);
    let outer = 0.85 * phi.phi * 0.6 * (1.0 + (time * 0.15 * breathe).cos() * 0.08);
    (inner, outer)
}

/// Transform one particle.
pub fn transform(particle: &Particle, time: f32, params: &ContinuousParams, constant: f32) -> Transformed {
    transform_with(particle, time, params, &PhiTerms::new(constant))
}

/// Transform one particle with precomputed constant powers.
pub fn transform_with(particle: &Particle, time: f32, params: &ContinuousParams, k: &PhiTerms) -> Transformed {
    let rot = params.rotation_speed;
    let br = params.breathe_speed;
    let tight = params.spiral_tightness;
    let gi = particle.golden_index;
    let cp = particle.chromatic_phase;
    let pos = particle.position;

    let radius = (pos.x * pos.x + pos.z * pos.z).sqrt();
    let angle = pos.z.atan2(pos.x);
    let height = pos.y;

    let primary = time * 0.15 * k.phi * rot;
    let secondary = time * 0.12 * k.phi_inv * rot;
    let counter_rot = time * 0.08 * (k.phi - 1.0) * rot;

    let vortex_depth = (cp * k.phi + time * 0.3 * br).sin() * 0.2;
    let golden_radius = radius * (1.0 + vortex_depth + (gi * k.phi_squared).sin() * 0.15);

    let (inner, outer) = vessel_bounds(time, br, k);
    let vessel = ramp(inner, outer, radius) * ramp(1.2, outer, radius);

    let main_spiral = angle + primary + gi * k.phi_inv * 8.0 * tight;
    let chroma_spiral = angle + secondary + cp * k.phi * 12.0 * tight;
    let counter_spiral = angle - counter_rot + gi * k.phi * 4.0 * tight;

    let wave1 = (time * 0.4 * k.phi_inv * br + radius * k.phi * 4.0).sin() * 0.12;
    let wave2 = (time * 0.25 * k.phi * br + cp * 8.0).cos() * 0.08;
    let new_radius = (golden_radius + wave1 + wave2) * vessel;

    let blend = (cp * k.phi + time * 0.2 * rot).sin() * 0.5 + 0.5;
    let final_angle = main_spiral + (chroma_spiral - main_spiral) * blend + counter_spiral.sin() * 0.1;

    let mut y = height * vessel * k.phi - 1.0;
    y += (gi * k.phi_squared + primary).sin() * 0.2;
    y += (cp * k.phi + secondary).cos() * 0.15;
    y += (final_angle * 0.5 + time * 0.1 * br).sin() * 0.1;

    let mut out = Vec3::new(
        final_angle.cos() * new_radius * k.phi,
        y,
        final_angle.sin() * new_radius * k.phi,
    );

    let chromatic_scale = 2.5 / k.phi_inv * (1.0 + (time * 0.18 * br + cp).sin() * 0.06);
    out *= chromatic_scale;

    let global_breathe = 1.0
        + (time * 0.12 * k.phi_inv * br).sin() * 0.08
        + (time * 0.08 * k.phi * br).cos() * 0.05;
    out *= global_breathe;

    let intensity = vessel * (1.0 + (cp * k.phi).sin() * 0.3);

    Transformed {
        position: out,
        intensity: intensity.max(0.0),
    }
}

/// Rendered point diameter in pixels for a particle at `view_depth`.
///
/// Returns zero for points at or behind the eye.
#[inline]
pub fn point_size(size: f32, view_depth: f32, intensity: f32) -> f32 {
    if view_depth <= 0.0 {
        return 0.0;
    }
    size * (POINT_SCALE / view_depth) * (1.0 + intensity * 0.2)
}

/// Transform a whole field in parallel into `out`.
///
/// `out` is resized to the field length. All particles read the same
/// `time` and `params`.
pub fn transform_field_into(field: &ParticleField, time: f32, params: &ContinuousParams, out: &mut Vec<Transformed>) {
    let k = PhiTerms::new(field.constant().value_f32());
    out.clear();
    out.par_extend(
        field
            .particles()
            .par_iter()
            .map(|p| transform_with(p, time, params, &k)),
    );
}

/// Transform a whole field in parallel.
pub fn transform_field(field: &ParticleField, time: f32, params: &ContinuousParams) -> Vec<Transformed> {
    let mut out = Vec::with_capacity(field.len());
    transform_field_into(field, time, params, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MathConstant;
    use crate::field::FieldGenerator;
    use crate::spawn::Jitter;

    fn sample_field(n: u32, constant: MathConstant) -> ParticleField {
        FieldGenerator::new()
            .with_jitter(Jitter::Seeded(11))
            .generate(n, constant)
    }

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(ramp(0.0, 1.0, -1.0), 0.0);
        assert_eq!(ramp(0.0, 1.0, 2.0), 1.0);
        assert!((ramp(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
        // reversed edges ramp down
        assert_eq!(ramp(1.2, 0.8, 0.5), 1.0);
        assert_eq!(ramp(1.2, 0.8, 1.5), 0.0);
        // degenerate span is a step, never NaN
        assert_eq!(ramp(1.2, 1.2, 1.3), 1.0);
        assert_eq!(ramp(1.2, 1.2, 1.1), 0.0);
    }

    #[test]
    fn test_transform_is_pure() {
        let field = sample_field(500, MathConstant::GoldenRatio);
        let params = ContinuousParams::default();
        for p in field.particles() {
            let a = transform(p, 3.25, &params, MathConstant::GoldenRatio.value_f32());
            let b = transform(p, 3.25, &params, MathConstant::GoldenRatio.value_f32());
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_intensity_non_negative_and_finite() {
        let params = ContinuousParams {
            rotation_speed: 3.0,
            breathe_speed: 3.0,
            spiral_tightness: 0.1,
            color_shift: 0.0,
            particle_opacity: 1.0,
        };
        for constant in MathConstant::ALL {
            let field = sample_field(300, constant);
            for time in [0.0, 0.5, 17.0, 1234.5] {
                for t in transform_field(&field, time, &params) {
                    assert!(t.intensity >= 0.0);
                    assert!(t.intensity.is_finite(), "{} at t={}", constant, time);
                    assert!(t.position.is_finite(), "{} at t={}", constant, time);
                }
            }
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let field = sample_field(2_000, MathConstant::Plastic);
        let params = ContinuousParams::default();
        let k = MathConstant::Plastic.value_f32();
        let parallel = transform_field(&field, 7.0, &params);
        assert_eq!(parallel.len(), field.len());
        for (p, t) in field.particles().iter().zip(&parallel) {
            assert_eq!(*t, transform(p, 7.0, &params, k));
        }
    }

    #[test]
    fn test_zero_rotation_freezes_angle_terms() {
        // With every speed at zero the output no longer depends on time.
        let params = ContinuousParams {
            rotation_speed: 0.0,
            breathe_speed: 0.0,
            ..ContinuousParams::default()
        };
        let field = sample_field(200, MathConstant::Euler);
        let k = MathConstant::Euler.value_f32();
        for p in field.particles() {
            assert_eq!(transform(p, 0.0, &params, k), transform(p, 99.0, &params, k));
        }
    }

    #[test]
    fn test_point_size() {
        assert_eq!(point_size(0.2, 0.0, 1.0), 0.0);
        assert_eq!(point_size(0.2, -3.0, 1.0), 0.0);
        assert!((point_size(0.25, 5.0, 0.0) - 7.0).abs() < 1e-5);
        assert!((point_size(0.25, 5.0, 1.0) - 8.4).abs() < 1e-4);
    }
}

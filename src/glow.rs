//! Soft circular glow for point sprites.
//!
//! Mirrors the fragment stage of the particle shader. Coordinates are local
//! to the sprite, with the center at the origin and the edges at ±0.5; any
//! sample whose squared distance from the center exceeds 0.25 is discarded,
//! which cuts the square sprite down to a disc.

use glam::{Vec2, Vec3};

use crate::transform::ramp;

/// Squared radius beyond which fragments are discarded.
pub const DISCARD_RADIUS_SQ: f32 = 0.25;
/// Squared radius of the bright core.
pub const CORE_RADIUS_SQ: f32 = 0.1;

/// A shaded, non-discarded fragment. Color is not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub color: Vec3,
    pub alpha: f32,
}

/// Shade one sample of a point sprite, or `None` if it is discarded.
pub fn shade(color: Vec3, intensity: f32, point_coord: Vec2, opacity: f32) -> Option<Fragment> {
    let d = point_coord.length_squared();
    if d > DISCARD_RADIUS_SQ {
        return None;
    }

    let glow = 1.0 - ramp(0.0, DISCARD_RADIUS_SQ, d);
    let core = 1.0 - ramp(0.0, CORE_RADIUS_SQ, d);

    let enhanced = color * (1.0 + intensity * 0.4) + color * core * 0.3;
    let alpha = glow * opacity * (0.7 + intensity * 0.5);

    Some(Fragment {
        color: enhanced,
        alpha,
    })
}

/// Additive blend of `src` onto `dst`: color weighted by source alpha.
#[inline]
pub fn blend_additive(dst: Vec3, src: &Fragment) -> Vec3 {
    dst + src.color * src.alpha
}

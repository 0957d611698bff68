//! HSV color model.

use glam::Vec3;

/// Convert hue/saturation/value to linear RGB.
///
/// `h` is in `[0, 1)` and is split into six sectors of width 1/6; `s` and
/// `v` are in `[0, 1]`. Hues outside `[0, 1)` are wrapped and saturation and
/// value are clamped, so the result always stays inside the unit cube.
/// At `s = 0` the result is the gray `(v, v, v)`.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Vec3 {
    let h = h.rem_euclid(1.0);
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);

    let c = v * s;
    let x = c * (1.0 - ((h * 6.0).rem_euclid(2.0) - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 1.0 / 6.0 {
        (c, x, 0.0)
    } else if h < 2.0 / 6.0 {
        (x, c, 0.0)
    } else if h < 3.0 / 6.0 {
        (0.0, c, x)
    } else if h < 4.0 / 6.0 {
        (0.0, x, c)
    } else if h < 5.0 / 6.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (Vec3::new(r, g, b) + Vec3::splat(m)).clamp(Vec3::ZERO, Vec3::ONE)
}

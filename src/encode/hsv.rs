//! HSV color space helpers for vector (direction + speed) encoding.

use std::f32::consts::PI;

/// Map a vector direction to a hue in [0, 1]: `theta = atan2(v, u)` in
/// [-π, π], shifted so westward flow (theta = ±π) wraps at hue 0/1,
/// eastward (theta = 0) lands on hue 0.5.
pub fn direction_hue(u: f32, v: f32) -> f32 {
    (v.atan2(u) + PI) / (2.0 * PI)
}

/// Standard hexagonal HSV to RGB conversion. All inputs and outputs in
/// [0, 1]; the sextant is selected by `floor(hue * 6) mod 6` so a hue of
/// exactly 1.0 wraps back onto sextant 0.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    let sextant = (h * 6.0).floor();
    let i = (sextant as i32).rem_euclid(6);
    let f = h * 6.0 - sextant;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match i {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

//! Normalization of raw field values into [0, 1] display intensities.

/// A normalized sample: the display intensity plus whether the raw input
/// was finite. Finiteness is checked on the raw value, before the power
/// transform, because NaN raised to a fractional power is still NaN and
/// would otherwise leak through the gamma step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalized {
    pub t: f32,
    pub finite: bool,
}

/// Map `value` into [0, 1] over `[lower, upper]`, clipping outside, then
/// apply gamma compression (`gamma < 1` boosts faint signal). Non-finite
/// input maps to `t = 0` with the finite flag cleared so the sentinel
/// override can be applied at assembly time. A degenerate range
/// (`upper <= lower` or non-finite bounds) maps everything to zero.
pub fn normalize(value: f32, lower: f32, upper: f32, gamma: f32) -> Normalized {
    if !value.is_finite() {
        return Normalized { t: 0.0, finite: false };
    }
    if !lower.is_finite() || !upper.is_finite() || upper <= lower {
        return Normalized { t: 0.0, finite: true };
    }
    let mut t = ((value - lower) / (upper - lower)).clamp(0.0, 1.0);
    if gamma != 1.0 {
        t = t.powf(gamma);
    }
    Normalized { t, finite: true }
}

/// Quantize a [0, 1] intensity to a u8 channel.
pub fn to_u8(t: f32) -> u8 {
    (t.clamp(0.0, 1.0) * 255.0) as u8
}

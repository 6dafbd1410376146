//! Color encoding of normalized fields into fixed-depth pixel buffers.
//!
//! The four encoding schemes are a closed set of tagged variants dispatched
//! through one [`encode`] entry point. Whatever the scheme, any pixel with a
//! non-finite contributing source value is overridden to the sentinel color
//! (opaque black) in a final masking pass, after all numeric encoding, so
//! NaN arithmetic can never smuggle an apparently-finite result into the
//! output.

pub mod hsv;
pub mod normalize;

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{QuicklookError, Result};
use crate::field::GridField;
use crate::range::DisplayRange;

use hsv::{direction_hue, hsv_to_rgb};
use normalize::{normalize, to_u8};

/// Sentinel color for missing input: opaque black.
pub const SENTINEL_RGB: [u8; 3] = [0, 0, 0];

/// Saturation band for the hue/saturation vector variant.
const HUE_SAT_MIN: f32 = 0.4;
const HUE_SAT_MAX: f32 = 0.6;

/// The encoded raster: H x W with 3 (RGB) or 4 (RGBA) u8 channels,
/// depending on the scheme.
#[derive(Debug, Clone)]
pub enum PixelBuffer {
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

impl PixelBuffer {
    pub fn width(&self) -> u32 {
        match self {
            PixelBuffer::Rgb(img) => img.width(),
            PixelBuffer::Rgba(img) => img.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            PixelBuffer::Rgb(img) => img.height(),
            PixelBuffer::Rgba(img) => img.height(),
        }
    }

    /// Number of channels per pixel (3 or 4).
    pub fn channels(&self) -> u8 {
        match self {
            PixelBuffer::Rgb(_) => 3,
            PixelBuffer::Rgba(_) => 4,
        }
    }

    /// Convert into a `DynamicImage` for the external container encoder.
    pub fn into_dynamic(self) -> image::DynamicImage {
        match self {
            PixelBuffer::Rgb(img) => image::DynamicImage::ImageRgb8(img),
            PixelBuffer::Rgba(img) => image::DynamicImage::ImageRgba8(img),
        }
    }
}

/// How vector magnitude drives the HSV channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VectorChannel {
    /// Magnitude drives value; saturation is constant where not calm.
    Value { sat: f32 },
    /// Magnitude drives saturation (remapped into a narrow band); value is
    /// held constant.
    Saturation { value_const: f32 },
}

/// One of the four encoding schemes with its scheme-specific parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Scheme {
    /// Grayscale magnitude broadcast to RGB, linear or gamma-compressed.
    Grayscale { gamma: f32 },
    /// Two-color diverging scale: `negative` at the lower extreme through
    /// `neutral` at the range midpoint to `positive` at the upper extreme.
    Diverging {
        negative: [u8; 3],
        neutral: [u8; 3],
        positive: [u8; 3],
    },
    /// Two non-negative fields on one shared scale: field 1 in red,
    /// field 2 in blue, green zero, opaque alpha.
    DualChannel { gamma: f32 },
    /// Vector components (u, v): direction as hue, magnitude as value or
    /// saturation. Speeds below `calm` render neutral regardless of
    /// direction.
    Vector {
        channel: VectorChannel,
        gamma: f32,
        calm: f32,
    },
}

impl Scheme {
    /// Number of co-registered input fields the scheme consumes.
    pub fn field_count(&self) -> usize {
        match self {
            Scheme::Grayscale { .. } | Scheme::Diverging { .. } => 1,
            Scheme::DualChannel { .. } | Scheme::Vector { .. } => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Scheme::Grayscale { .. } => "grayscale",
            Scheme::Diverging { .. } => "diverging",
            Scheme::DualChannel { .. } => "dual",
            Scheme::Vector { .. } => "vector",
        }
    }
}

/// Linear interpolation between two colors.
fn lerp_color(c1: [u8; 3], c2: [u8; 3], t: f32) -> [u8; 3] {
    [
        (c1[0] as f32 * (1.0 - t) + c2[0] as f32 * t) as u8,
        (c1[1] as f32 * (1.0 - t) + c2[1] as f32 * t) as u8,
        (c1[2] as f32 * (1.0 - t) + c2[2] as f32 * t) as u8,
    ]
}

/// Encode one or two fields into a pixel buffer under the given range.
///
/// Fails when the field count does not match the scheme or the fields are
/// not co-registered.
pub fn encode(scheme: &Scheme, fields: &[&GridField], range: DisplayRange) -> Result<PixelBuffer> {
    if fields.len() != scheme.field_count() {
        return Err(QuicklookError::InvalidParameter {
            param: "fields".to_string(),
            message: format!(
                "Scheme {} requires {} field(s), got {}",
                scheme.name(),
                scheme.field_count(),
                fields.len()
            ),
        });
    }
    for other in &fields[1..] {
        fields[0].check_co_registered(other)?;
    }

    match scheme {
        Scheme::Grayscale { gamma } => encode_grayscale(fields[0], range, *gamma),
        Scheme::Diverging {
            negative,
            neutral,
            positive,
        } => encode_diverging(fields[0], range, *negative, *neutral, *positive),
        Scheme::DualChannel { gamma } => encode_dual(fields[0], fields[1], range, *gamma),
        Scheme::Vector {
            channel,
            gamma,
            calm,
        } => encode_vector(fields[0], fields[1], range, *channel, *gamma, *calm),
    }
}

fn encode_grayscale(field: &GridField, range: DisplayRange, gamma: f32) -> Result<PixelBuffer> {
    let (lower, upper) = range.bounds();
    let (h, w) = field.values.dim();
    let mut img = RgbImage::new(w as u32, h as u32);
    let mut mask = vec![false; h * w];

    for ((y, x), &value) in field.values.indexed_iter() {
        let n = normalize(value, lower, upper, gamma);
        let level = to_u8(n.t);
        img.put_pixel(x as u32, y as u32, Rgb([level, level, level]));
        mask[y * w + x] = !n.finite;
    }

    apply_sentinel_rgb(&mut img, &mask);
    Ok(PixelBuffer::Rgb(img))
}

fn encode_diverging(
    field: &GridField,
    range: DisplayRange,
    negative: [u8; 3],
    neutral: [u8; 3],
    positive: [u8; 3],
) -> Result<PixelBuffer> {
    let (lower, upper) = range.bounds();
    let (h, w) = field.values.dim();
    let mut img = RgbaImage::new(w as u32, h as u32);
    let mut mask = vec![false; h * w];

    for ((y, x), &value) in field.values.indexed_iter() {
        let n = normalize(value, lower, upper, 1.0);
        let rgb = if n.t < 0.5 {
            lerp_color(negative, neutral, n.t * 2.0)
        } else {
            lerp_color(neutral, positive, (n.t - 0.5) * 2.0)
        };
        img.put_pixel(x as u32, y as u32, Rgba([rgb[0], rgb[1], rgb[2], 255]));
        mask[y * w + x] = !n.finite;
    }

    apply_sentinel_rgba(&mut img, &mask);
    Ok(PixelBuffer::Rgba(img))
}

fn encode_dual(
    field1: &GridField,
    field2: &GridField,
    range: DisplayRange,
    gamma: f32,
) -> Result<PixelBuffer> {
    let (lower, upper) = range.bounds();
    let (h, w) = field1.values.dim();
    let mut img = RgbaImage::new(w as u32, h as u32);
    let mut mask = vec![false; h * w];

    for ((y, x), &v1) in field1.values.indexed_iter() {
        let v2 = field2.values[[y, x]];
        let n1 = normalize(v1, lower, upper, gamma);
        let n2 = normalize(v2, lower, upper, gamma);
        img.put_pixel(
            x as u32,
            y as u32,
            Rgba([to_u8(n1.t), 0, to_u8(n2.t), 255]),
        );
        mask[y * w + x] = !n1.finite || !n2.finite;
    }

    apply_sentinel_rgba(&mut img, &mask);
    Ok(PixelBuffer::Rgba(img))
}

fn encode_vector(
    u_field: &GridField,
    v_field: &GridField,
    range: DisplayRange,
    channel: VectorChannel,
    gamma: f32,
    calm: f32,
) -> Result<PixelBuffer> {
    let max_speed = range.vmax();
    if !(max_speed > 0.0) || !max_speed.is_finite() {
        return Err(QuicklookError::InvalidParameter {
            param: "range".to_string(),
            message: format!("Vector encoding needs a positive max speed, got {}", max_speed),
        });
    }

    let (h, w) = u_field.values.dim();
    let mut img = RgbaImage::new(w as u32, h as u32);
    let mut mask = vec![false; h * w];

    for ((y, x), &u) in u_field.values.indexed_iter() {
        let v = v_field.values[[y, x]];
        let finite = u.is_finite() && v.is_finite();
        if !finite {
            mask[y * w + x] = true;
            img.put_pixel(x as u32, y as u32, Rgba([0, 0, 0, 255]));
            continue;
        }

        let speed = (u * u + v * v).sqrt();
        let hue = direction_hue(u, v);
        let magnitude = (speed / max_speed).clamp(0.0, 1.0).powf(gamma);

        let (s, val) = match channel {
            VectorChannel::Value { sat } => {
                // Calm cells drop to black; hue noise near zero wind is
                // worse than no signal.
                let val = if speed < calm { 0.0 } else { magnitude };
                let s = if val > 0.0 { sat } else { 0.0 };
                (s, val)
            }
            VectorChannel::Saturation { value_const } => {
                let s = if speed < calm {
                    0.0
                } else {
                    HUE_SAT_MIN + (HUE_SAT_MAX - HUE_SAT_MIN) * magnitude
                };
                (s, value_const)
            }
        };

        let rgb = hsv_to_rgb(hue, s, val);
        img.put_pixel(
            x as u32,
            y as u32,
            Rgba([to_u8(rgb[0]), to_u8(rgb[1]), to_u8(rgb[2]), 255]),
        );
    }

    apply_sentinel_rgba(&mut img, &mask);
    Ok(PixelBuffer::Rgba(img))
}

fn apply_sentinel_rgb(img: &mut RgbImage, mask: &[bool]) {
    let w = img.width() as usize;
    for (i, &missing) in mask.iter().enumerate() {
        if missing {
            img.put_pixel((i % w) as u32, (i / w) as u32, Rgb(SENTINEL_RGB));
        }
    }
}

fn apply_sentinel_rgba(img: &mut RgbaImage, mask: &[bool]) {
    let w = img.width() as usize;
    for (i, &missing) in mask.iter().enumerate() {
        if missing {
            let [r, g, b] = SENTINEL_RGB;
            img.put_pixel((i % w) as u32, (i / w) as u32, Rgba([r, g, b, 255]));
        }
    }
}

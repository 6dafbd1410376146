//! Rendering pipeline orchestration.
//!
//! One rendering request moves through fixed, one-way stages:
//! Loaded -> Reduced -> Oriented -> Ranged -> Encoded. There are no
//! retries; any failed precondition aborts the run. The Encoded stage
//! yields PNG bytes for the caller to write out.

use image::ImageFormat;
use std::io::Cursor;
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::dataset::Dataset;
use crate::encode::{self, PixelBuffer, Scheme, VectorChannel};
use crate::error::{QuicklookError, Result};
use crate::field::GridField;
use crate::logging::{generate_run_id, log_timed_stage};
use crate::orient::{orient_north_up, sort_latitude_ascending};
use crate::range::{
    fixed_wind_range, robust_interval, robust_shared_vmax, symmetric_abs_vmax, DisplayRange,
};
use crate::reduce::ReduceStat;

/// Default gamma per scheme, matching the tuning the encodings were
/// designed around.
const DEFAULT_GAMMA_DUAL: f32 = 0.5;
const DEFAULT_GAMMA_VECTOR: f32 = 0.3;
const DEFAULT_GAMMA_GRAYSCALE: f32 = 1.0;

/// Diverging endpoints: coolwarm-style dark blue / light gray / dark red.
const DIVERGING_NEGATIVE: [u8; 3] = [59, 76, 192];
const DIVERGING_NEUTRAL: [u8; 3] = [221, 221, 221];
const DIVERGING_POSITIVE: [u8; 3] = [192, 40, 47];

/// Plausibility bound for temperature-like diverging fields (degrees C).
const TEMP_PLAUSIBLE_ABS_MAX: f32 = 100.0;

/// Which encoding family a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeKind {
    Grayscale,
    Diverging,
    Dual,
    Vector,
}

impl SchemeKind {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "grayscale" => Ok(SchemeKind::Grayscale),
            "diverging" => Ok(SchemeKind::Diverging),
            "dual" => Ok(SchemeKind::Dual),
            "vector" => Ok(SchemeKind::Vector),
            _ => Err(QuicklookError::InvalidParameter {
                param: "scheme".to_string(),
                message: format!(
                    "Unknown scheme: {}. Must be one of: grayscale, diverging, dual, vector",
                    name
                ),
            }),
        }
    }

    fn field_count(&self) -> usize {
        match self {
            SchemeKind::Grayscale | SchemeKind::Diverging => 1,
            SchemeKind::Dual | SchemeKind::Vector => 2,
        }
    }
}

/// How the display range is chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeSpec {
    /// Percentile-based estimate from the data (the default)
    Robust,
    /// Two-sided percentile interval from the data
    RobustInterval { lo_pct: f64, hi_pct: f64 },
    /// Static per-pressure-level lookup, bypassing the data entirely
    FixedLevel,
}

/// One rendering request: which variables, how to reduce them, and how to
/// turn them into pixels.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Per-field prioritized variable name candidates
    pub candidates: Vec<Vec<String>>,
    pub stat: ReduceStat,
    /// Pressure level to select before reducing, when the source has a
    /// level axis
    pub level: Option<i64>,
    pub scheme: SchemeKind,
    pub range: RangeSpec,
    /// Negate the first field before clipping (upward-flux convention)
    pub upward_flux: bool,
}

/// Everything the Encoded stage produces: the PNG bytes plus the summary
/// a caller reports to the console and records as provenance.
#[derive(Debug)]
pub struct RenderOutput {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Reduced fields, pre-orientation, for optional climatology output
    pub fields: Vec<GridField>,
    pub range: DisplayRange,
    pub samples: usize,
}

/// The single-run rendering pipeline.
pub struct ImagePipeline {
    config: Config,
}

impl ImagePipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run one request end to end against a loaded dataset.
    pub fn render(&self, dataset: &Dataset, request: &RenderRequest) -> Result<RenderOutput> {
        let run_id = generate_run_id();

        if request.candidates.len() != request.scheme.field_count() {
            return Err(QuicklookError::InvalidParameter {
                param: "var".to_string(),
                message: format!(
                    "Scheme {:?} needs {} variable(s), got {}",
                    request.scheme,
                    request.scheme.field_count(),
                    request.candidates.len()
                ),
            });
        }

        // Loaded -> Reduced
        let reduced = log_timed_stage(&run_id, "reduce", || self.reduce_fields(dataset, request))?;
        let samples = reduced[0].samples;

        // Reduced -> Oriented (exactly once per field)
        let oriented: Vec<GridField> = log_timed_stage(&run_id, "orient", || {
            reduced.iter().cloned().map(orient_north_up).collect()
        });

        // Oriented -> Ranged
        let range = log_timed_stage(&run_id, "range", || {
            self.estimate_range(&oriented, request)
        })?;

        // Ranged -> Encoded
        let buffer = log_timed_stage(&run_id, "encode", || {
            let scheme = self.build_scheme(request.scheme);
            let refs: Vec<&GridField> = oriented.iter().collect();
            encode::encode(&scheme, &refs, range)
        })?;

        let width = buffer.width();
        let height = buffer.height();
        let png = encode_png(buffer)?;

        info!(
            run_id = %run_id,
            width = width,
            height = height,
            samples = samples,
            range = ?range,
            "Rendering completed"
        );

        Ok(RenderOutput {
            png,
            width,
            height,
            fields: reduced,
            range,
            samples,
        })
    }

    /// Resolve, select, squeeze, and reduce every requested field, then
    /// apply unit scaling and the sign conventions the scheme expects.
    fn reduce_fields(&self, dataset: &Dataset, request: &RenderRequest) -> Result<Vec<GridField>> {
        let mut fields = Vec::with_capacity(request.candidates.len());
        for (slot, candidates) in request.candidates.iter().enumerate() {
            let refs: Vec<&str> = candidates.iter().map(String::as_str).collect();
            let name = dataset.resolve_variable(&refs)?;
            let mut cube = dataset.extract(&name)?;
            if let Some(level) = request.level {
                cube = cube.select_level(level)?;
            }
            let mut field = cube.squeeze().reduce(request.stat)?;

            let temp_scale = self.config.render.temp_scale;
            if temp_scale != 1.0 {
                field.values.mapv_inplace(|v| v * temp_scale);
            }

            // Sign conventions: dual-channel composites show non-negative
            // "amounts"; an upward-flux first field is negated before the
            // clip so upward transport reads as a positive amount.
            if request.scheme == SchemeKind::Dual {
                field = if slot == 0 && request.upward_flux {
                    field.into_upward_amount()
                } else {
                    field.into_nonnegative()
                };
            }

            fields.push(field);
        }

        for other in &fields[1..] {
            fields[0].check_co_registered(other)?;
        }

        if request.scheme == SchemeKind::Diverging {
            if let Some(extreme) = fields[0]
                .finite_values()
                .map(f32::abs)
                .fold(None, |acc: Option<f32>, v| Some(acc.map_or(v, |a| a.max(v))))
            {
                if extreme > TEMP_PLAUSIBLE_ABS_MAX {
                    warn!(
                        variable = %fields[0].name,
                        extreme = extreme,
                        temp_scale = self.config.render.temp_scale,
                        "Field magnitude exceeds plausible temperature range; check the unit scale"
                    );
                }
            }
        }

        Ok(fields)
    }

    fn estimate_range(&self, fields: &[GridField], request: &RenderRequest) -> Result<DisplayRange> {
        let pct = self.config.render.percentile;
        match (request.range, request.scheme) {
            (RangeSpec::FixedLevel, _) => {
                let level = request.level.ok_or_else(|| QuicklookError::InvalidParameter {
                    param: "level".to_string(),
                    message: "Fixed ranges require a pressure level".to_string(),
                })?;
                fixed_wind_range(level)
            }
            (RangeSpec::RobustInterval { lo_pct, hi_pct }, _) => {
                // A two-sided interval from one field would silently scale
                // the other; only single-field schemes may request it.
                if fields.len() > 1 {
                    return Err(QuicklookError::InvalidParameter {
                        param: "range".to_string(),
                        message: format!(
                            "Interval ranges apply to single-field schemes, got {} fields",
                            fields.len()
                        ),
                    });
                }
                robust_interval(&fields[0], lo_pct, hi_pct)
            }
            (RangeSpec::Robust, SchemeKind::Diverging) => symmetric_abs_vmax(&fields[0], pct),
            (RangeSpec::Robust, SchemeKind::Vector) => {
                let speed = speed_field(&fields[0], &fields[1])?;
                robust_shared_vmax(&[&speed], pct)
            }
            (RangeSpec::Robust, _) => {
                let refs: Vec<&GridField> = fields.iter().collect();
                robust_shared_vmax(&refs, pct)
            }
        }
    }

    fn build_scheme(&self, kind: SchemeKind) -> Scheme {
        let render = &self.config.render;
        match kind {
            SchemeKind::Grayscale => Scheme::Grayscale {
                gamma: render.gamma.unwrap_or(DEFAULT_GAMMA_GRAYSCALE),
            },
            SchemeKind::Diverging => Scheme::Diverging {
                negative: DIVERGING_NEGATIVE,
                neutral: DIVERGING_NEUTRAL,
                positive: DIVERGING_POSITIVE,
            },
            SchemeKind::Dual => Scheme::DualChannel {
                gamma: render.gamma.unwrap_or(DEFAULT_GAMMA_DUAL),
            },
            SchemeKind::Vector => Scheme::Vector {
                channel: match render.value_const {
                    Some(value_const) => VectorChannel::Saturation { value_const },
                    None => VectorChannel::Value { sat: render.sat },
                },
                gamma: render.gamma.unwrap_or(DEFAULT_GAMMA_VECTOR),
                calm: render.calm_mps,
            },
        }
    }
}

/// Vector magnitude field for robust speed-range estimation. Cells where
/// either component is missing stay missing.
fn speed_field(u: &GridField, v: &GridField) -> Result<GridField> {
    u.check_co_registered(v)?;
    let mut values = u.values.clone();
    values.zip_mut_with(&v.values, |a, &b| {
        *a = if a.is_finite() && b.is_finite() {
            (*a * *a + b * b).sqrt()
        } else {
            f32::NAN
        };
    });
    GridField::new("speed", values, u.latitude.clone(), u.samples)
}

/// Encode a pixel buffer as PNG bytes.
fn encode_png(buffer: PixelBuffer) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    buffer
        .into_dynamic()
        .write_to(&mut bytes, ImageFormat::Png)
        .map_err(|e| QuicklookError::ImageEncoding {
            message: format!("Failed to encode PNG: {}", e),
        })?;
    Ok(bytes.into_inner())
}

/// Write reduced fields back to NetCDF with provenance attributes, rows
/// sorted so latitude is ascending (the documented on-disk convention).
pub fn write_mean_netcdf(
    out_path: &Path,
    source: &Dataset,
    fields: &[GridField],
    level: Option<i64>,
) -> Result<()> {
    if fields.is_empty() {
        return Err(QuicklookError::InvalidParameter {
            param: "fields".to_string(),
            message: "No reduced fields to write".to_string(),
        });
    }

    let sorted: Vec<GridField> = fields.iter().cloned().map(sort_latitude_ascending).collect();
    let (h, w) = sorted[0].values.dim();

    let mut file = netcdf::create(out_path)?;
    file.add_dimension("latitude", h)?;
    file.add_dimension("longitude", w)?;

    if let Some(lat) = &sorted[0].latitude {
        let mut lat_var = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(lat, &[..])?;
    }

    for field in &sorted {
        let name = format!("{}_mean", field.name);
        let flat: Vec<f32> = field.values.iter().copied().collect();
        let mut var = file.add_variable::<f32>(&name, &["latitude", "longitude"])?;
        var.put_attribute("source_variable", field.name.as_str())?;
        var.put_values(&flat, &[.., ..])?;
    }

    file.add_attribute("times_averaged", sorted[0].samples as i64)?;
    file.add_attribute("source_file", source.path.to_string_lossy().as_ref())?;
    if let Some(level) = level {
        file.add_attribute("pressure_level_hpa", level)?;
    }

    info!(
        path = %out_path.display(),
        fields = sorted.len(),
        times_averaged = sorted[0].samples,
        "Wrote mean NetCDF"
    );
    Ok(())
}

//! Robust display-range estimation.
//!
//! Naive min/max scaling lets a handful of extreme cells compress the rest
//! of a geophysical field to near-zero intensity. Every estimator here is
//! percentile-based over finite values only, with a positive floor so the
//! resulting range can always be divided by.

use crate::error::{QuicklookError, Result};
use crate::field::GridField;

/// Fixed plausible wind-component half-ranges (m/s) per pressure level.
pub const WIND_RANGES_MPS: &[(i64, f32)] = &[(850, 60.0), (500, 80.0), (250, 120.0)];

/// Smallest allowed vmax for percentile-derived positive ranges.
const VMAX_EPSILON: f32 = 1e-9;

/// A display range mapped onto the [0, 1] normalization interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayRange {
    /// [0, vmax], for non-negative "amount" fields
    UpTo { vmax: f32 },
    /// [vmin, vmax], arbitrary interval
    Interval { vmin: f32, vmax: f32 },
    /// [-abs_vmax, +abs_vmax], symmetric about zero for diverging fields
    Symmetric { abs_vmax: f32 },
}

impl DisplayRange {
    /// The (lower, upper) bounds of the range.
    pub fn bounds(&self) -> (f32, f32) {
        match *self {
            DisplayRange::UpTo { vmax } => (0.0, vmax),
            DisplayRange::Interval { vmin, vmax } => (vmin, vmax),
            DisplayRange::Symmetric { abs_vmax } => (-abs_vmax, abs_vmax),
        }
    }

    /// Upper magnitude of the range (used as the divisor for speed scaling).
    pub fn vmax(&self) -> f32 {
        match *self {
            DisplayRange::UpTo { vmax } => vmax,
            DisplayRange::Interval { vmax, .. } => vmax,
            DisplayRange::Symmetric { abs_vmax } => abs_vmax,
        }
    }
}

/// Percentile of a sample set, with linear interpolation between order
/// statistics (numpy's default). `pct` in [0, 100]. Caller guarantees the
/// input is non-empty and finite.
fn percentile(sorted: &[f32], pct: f64) -> f32 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = (rank - lo as f64) as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn sorted_finite(values: impl Iterator<Item = f32>, context: &str) -> Result<Vec<f32>> {
    let mut finite: Vec<f32> = values.filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return Err(QuicklookError::NoFiniteData {
            context: context.to_string(),
        });
    }
    finite.sort_by(f32::total_cmp);
    Ok(finite)
}

/// Shared robust vmax over one or more fields: the given percentile of the
/// pooled finite values, floored at a small positive epsilon.
pub fn robust_shared_vmax(fields: &[&GridField], pct: f64) -> Result<DisplayRange> {
    let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    let pooled = sorted_finite(
        fields.iter().flat_map(|f| f.finite_values()),
        &names.join("+"),
    )?;
    let vmax = percentile(&pooled, pct).max(VMAX_EPSILON);
    Ok(DisplayRange::UpTo { vmax })
}

/// Symmetric robust range: the given percentile of |finite values|, floored
/// at one unit so near-constant-zero fields still get a usable ±1 scale.
pub fn symmetric_abs_vmax(field: &GridField, pct: f64) -> Result<DisplayRange> {
    let abs = sorted_finite(field.finite_values().map(f32::abs), &field.name)?;
    let abs_vmax = percentile(&abs, pct).max(1.0);
    Ok(DisplayRange::Symmetric { abs_vmax })
}

/// Two-sided robust interval from low/high percentiles of a single field.
pub fn robust_interval(field: &GridField, lo_pct: f64, hi_pct: f64) -> Result<DisplayRange> {
    let sorted = sorted_finite(field.finite_values(), &field.name)?;
    let vmin = percentile(&sorted, lo_pct);
    let vmax = percentile(&sorted, hi_pct);
    if vmax <= vmin {
        return Err(QuicklookError::InvalidParameter {
            param: "percentile".to_string(),
            message: format!(
                "Degenerate interval [{}, {}] for {} (p{} .. p{})",
                vmin, vmax, field.name, lo_pct, hi_pct
            ),
        });
    }
    Ok(DisplayRange::Interval { vmin, vmax })
}

/// Fixed symmetric wind range for a pressure level, bypassing percentile
/// computation entirely.
pub fn fixed_wind_range(level_hpa: i64) -> Result<DisplayRange> {
    WIND_RANGES_MPS
        .iter()
        .find(|(level, _)| *level == level_hpa)
        .map(|&(_, abs_vmax)| DisplayRange::Symmetric { abs_vmax })
        .ok_or_else(|| QuicklookError::UnsupportedLevel {
            level: level_hpa,
            supported: WIND_RANGES_MPS.iter().map(|(l, _)| *l).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn field_from(values: Array2<f32>) -> GridField {
        GridField::new("x", values, None, 1).unwrap()
    }

    #[test]
    fn test_percentile_interpolates() {
        let sorted = [0.0, 1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.0), 0.0);
        assert_eq!(percentile(&sorted, 50.0), 2.0);
        assert_eq!(percentile(&sorted, 100.0), 4.0);
        assert_eq!(percentile(&sorted, 25.0), 1.0);
        assert!((percentile(&sorted, 90.0) - 3.6).abs() < 1e-6);
    }

    #[test]
    fn test_robust_vmax_is_positive_and_resists_outliers() {
        // 99 ordinary cells and one wild outlier
        let mut v = vec![1.0f32; 99];
        v.push(1e6);
        let values = Array2::from_shape_vec((10, 10), v).unwrap();
        let field = field_from(values);
        let range = robust_shared_vmax(&[&field], 99.0).unwrap();
        let vmax = range.vmax();
        assert!(vmax > 0.0);
        assert!(vmax < 1e6, "outlier should not set the scale, got {}", vmax);
    }

    #[test]
    fn test_all_nan_fails() {
        let field = field_from(Array2::from_elem((2, 2), f32::NAN));
        assert!(matches!(
            robust_shared_vmax(&[&field], 99.0),
            Err(QuicklookError::NoFiniteData { .. })
        ));
        assert!(symmetric_abs_vmax(&field, 99.0).is_err());
        assert!(robust_interval(&field, 1.0, 99.0).is_err());
    }

    #[test]
    fn test_shared_vmax_pools_fields() {
        let a = field_from(array![[1.0, 1.0]]);
        let b = field_from(array![[9.0, 9.0]]);
        let range = robust_shared_vmax(&[&a, &b], 99.0).unwrap();
        assert!(range.vmax() > 8.0);
    }

    #[test]
    fn test_symmetric_floor_is_one_unit() {
        let field = field_from(array![[0.001, -0.002], [0.0, 0.0]]);
        let range = symmetric_abs_vmax(&field, 99.0).unwrap();
        assert_eq!(range, DisplayRange::Symmetric { abs_vmax: 1.0 });
        assert_eq!(range.bounds(), (-1.0, 1.0));
    }

    #[test]
    fn test_symmetric_uses_abs() {
        let field = field_from(array![[-40.0, 2.0], [3.0, 1.0]]);
        let range = symmetric_abs_vmax(&field, 100.0).unwrap();
        assert_eq!(range.vmax(), 40.0);
    }

    #[test]
    fn test_fixed_wind_range_lookup() {
        assert_eq!(
            fixed_wind_range(850).unwrap(),
            DisplayRange::Symmetric { abs_vmax: 60.0 }
        );
        assert_eq!(fixed_wind_range(250).unwrap().vmax(), 120.0);
        match fixed_wind_range(700) {
            Err(QuicklookError::UnsupportedLevel { level, supported }) => {
                assert_eq!(level, 700);
                assert_eq!(supported, vec![850, 500, 250]);
            }
            other => panic!("expected UnsupportedLevel, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_interval_from_quantiles() {
        let values = Array2::from_shape_vec((1, 101), (0..=100).map(|i| i as f32).collect()).unwrap();
        let field = field_from(values);
        let range = robust_interval(&field, 1.0, 99.0).unwrap();
        assert_eq!(range.bounds(), (1.0, 99.0));
    }
}

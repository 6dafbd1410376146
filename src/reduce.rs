//! Reduction of an N-D field along its time/ensemble axis.
//!
//! Each output cell is the chosen statistic over the reduction axis,
//! computed over finite values only. A cell is missing (NaN) only when
//! every input sample at that location is missing. Sources that are
//! already 2-D skip reduction entirely; the pipeline reports a sample
//! count of 1 for them.

use ndarray::{ArrayD, ArrayViewD, Axis};

use crate::error::{QuicklookError, Result};

/// The statistic applied along the reduction axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceStat {
    /// Arithmetic mean of finite samples
    Mean,
    /// Maximum of finite samples
    Max,
    /// Sum of finite samples
    Sum,
}

impl ReduceStat {
    /// Parse a statistic name from configuration.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "mean" => Ok(ReduceStat::Mean),
            "max" => Ok(ReduceStat::Max),
            "sum" => Ok(ReduceStat::Sum),
            _ => Err(QuicklookError::InvalidParameter {
                param: "stat".to_string(),
                message: format!("Unknown statistic: {}. Must be one of: mean, max, sum", name),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReduceStat::Mean => "mean",
            ReduceStat::Max => "max",
            ReduceStat::Sum => "sum",
        }
    }

    /// Reduce one lane of samples, skipping non-finite values.
    fn reduce_lane(&self, lane: impl Iterator<Item = f32>) -> f32 {
        let mut count = 0usize;
        let mut acc = match self {
            ReduceStat::Max => f32::NEG_INFINITY,
            _ => 0.0,
        };
        for v in lane {
            if !v.is_finite() {
                continue;
            }
            count += 1;
            match self {
                ReduceStat::Mean | ReduceStat::Sum => acc += v,
                ReduceStat::Max => acc = acc.max(v),
            }
        }
        if count == 0 {
            return f32::NAN;
        }
        match self {
            ReduceStat::Mean => acc / count as f32,
            _ => acc,
        }
    }
}

/// Collapse one axis of an N-D array with the given statistic.
///
/// Returns the reduced array and the number of samples along the collapsed
/// axis (what the climatology output records as `times_averaged`).
pub fn reduce_axis(
    values: ArrayViewD<'_, f32>,
    axis: usize,
    stat: ReduceStat,
) -> Result<(ArrayD<f32>, usize)> {
    if axis >= values.ndim() {
        return Err(QuicklookError::InvalidParameter {
            param: "axis".to_string(),
            message: format!(
                "Reduction axis {} out of bounds for {}-dimensional data",
                axis,
                values.ndim()
            ),
        });
    }
    let samples = values.len_of(Axis(axis));
    let reduced = values.map_axis(Axis(axis), |lane| {
        stat.reduce_lane(lane.iter().copied())
    });
    Ok((reduced, samples))
}

//! The 2-D field data model.
//!
//! A [`GridField`] is what the reduction step produces and what every later
//! stage (orientation, range estimation, color encoding) consumes: a named
//! (H, W) grid of f32 values with NaN marking missing cells, plus the
//! latitude coordinate needed to decide row order.

use ndarray::Array2;

use crate::error::{QuicklookError, Result};

/// A named, reduced 2-D scalar field.
///
/// Missing values are NaN. The latitude coordinate is optional; when absent
/// the orientation is unknown and the field is rendered as-is.
#[derive(Debug, Clone)]
pub struct GridField {
    /// Variable name (the resolved source name, e.g. "u" or "tp")
    pub name: String,
    /// Row-major (H, W) values, NaN for missing
    pub values: Array2<f32>,
    /// Latitude coordinate, one value per row, monotonic when present
    pub latitude: Option<Vec<f64>>,
    /// Number of samples collapsed along the reduction axis (1 if the
    /// source was already 2-D)
    pub samples: usize,
    /// Whether north-up canonicalization has already been applied
    pub north_up: bool,
}

impl GridField {
    /// Create a field from reduced values and an optional latitude coordinate.
    pub fn new(
        name: impl Into<String>,
        values: Array2<f32>,
        latitude: Option<Vec<f64>>,
        samples: usize,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(lat) = &latitude {
            if lat.len() != values.nrows() {
                return Err(QuicklookError::Shape {
                    name,
                    shape: vec![lat.len(), values.nrows()],
                });
            }
        }
        Ok(Self {
            name,
            values,
            latitude,
            samples,
            north_up: false,
        })
    }

    /// Grid height (number of latitude rows).
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    /// Grid width (number of longitude columns).
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// Iterator over the finite values of the field.
    pub fn finite_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied().filter(|v| v.is_finite())
    }

    /// Check that two fields are co-registered (identical grid shape).
    pub fn check_co_registered(&self, other: &GridField) -> Result<()> {
        if self.values.dim() != other.values.dim() {
            return Err(QuicklookError::Shape {
                name: format!("{}/{}", self.name, other.name),
                shape: other.values.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Negate and clip at zero, turning an upward-flux field (e.g. ERA5
    /// evaporation, negative for upward) into a non-negative "amount".
    /// NaN cells stay NaN.
    pub fn into_upward_amount(mut self) -> Self {
        self.values.mapv_inplace(|v| {
            if v.is_finite() {
                (-v).max(0.0)
            } else {
                f32::NAN
            }
        });
        self
    }

    /// Clip at zero, keeping NaN cells as NaN.
    pub fn into_nonnegative(mut self) -> Self {
        self.values.mapv_inplace(|v| {
            if v.is_finite() {
                v.max(0.0)
            } else {
                f32::NAN
            }
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_latitude_length_must_match_rows() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(GridField::new("t", values.clone(), Some(vec![0.0, 1.0]), 1).is_ok());
        assert!(GridField::new("t", values, Some(vec![0.0]), 1).is_err());
    }

    #[test]
    fn test_finite_values_skips_nan() {
        let values = array![[1.0, f32::NAN], [3.0, 4.0]];
        let field = GridField::new("t", values, None, 1).unwrap();
        let finite: Vec<f32> = field.finite_values().collect();
        assert_eq!(finite, vec![1.0, 3.0, 4.0]);
    }

    #[test]
    fn test_upward_amount_negates_and_clips() {
        let values = array![[-2.0, 0.5], [f32::NAN, -0.0]];
        let field = GridField::new("e", values, None, 1).unwrap();
        let amount = field.into_upward_amount();
        assert_eq!(amount.values[[0, 0]], 2.0);
        assert_eq!(amount.values[[0, 1]], 0.0); // downward flux clipped to zero
        assert!(amount.values[[1, 0]].is_nan());
        assert_eq!(amount.values[[1, 1]], 0.0);
    }

    #[test]
    fn test_co_registration_check() {
        let a = GridField::new("a", Array2::zeros((2, 3)), None, 1).unwrap();
        let b = GridField::new("b", Array2::zeros((2, 3)), None, 1).unwrap();
        let c = GridField::new("c", Array2::zeros((3, 2)), None, 1).unwrap();
        assert!(a.check_co_registered(&b).is_ok());
        assert!(a.check_co_registered(&c).is_err());
    }
}

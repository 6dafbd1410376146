//! North-up orientation normalization.
//!
//! Image row 0 is the top of the rendered raster. If the latitude
//! coordinate increases with row index (south to north), north ends up at
//! the bottom, so the rows must be flipped. If latitude decreases, the
//! field is already north-up. Fields without a usable latitude coordinate
//! pass through unchanged.
//!
//! This is a rendering concern only. On-disk outputs follow the opposite,
//! documented convention: latitude sorted ascending (see
//! [`sort_latitude_ascending`]).

use ndarray::{Axis, Slice};

use crate::field::GridField;

/// Canonicalize a field to north-up row order.
///
/// Applied at most once per field: a field already canonicalized is
/// returned untouched, so the operation is idempotent.
pub fn orient_north_up(mut field: GridField) -> GridField {
    if field.north_up {
        return field;
    }
    if let Some(lat) = &field.latitude {
        if lat.len() >= 2 && lat[1] - lat[0] > 0.0 {
            // Ascending latitude: row 0 is the southernmost row, flip.
            field.values = field
                .values
                .slice_axis(Axis(0), Slice::new(0, None, -1))
                .to_owned();
            let mut reversed = lat.clone();
            reversed.reverse();
            field.latitude = Some(reversed);
        }
    }
    field.north_up = true;
    field
}

/// Sort a field's rows so latitude is ascending (south to north), the
/// documented on-disk convention for climatology outputs. Idempotent and
/// independent of [`orient_north_up`].
pub fn sort_latitude_ascending(mut field: GridField) -> GridField {
    if let Some(lat) = &field.latitude {
        if lat.len() >= 2 && lat.windows(2).any(|w| w[1] - w[0] < 0.0) {
            field.values = field
                .values
                .slice_axis(Axis(0), Slice::new(0, None, -1))
                .to_owned();
            let mut reversed = lat.clone();
            reversed.reverse();
            field.latitude = Some(reversed);
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn field(lat: Option<Vec<f64>>) -> GridField {
        let values = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        GridField::new("t", values, lat, 1).unwrap()
    }

    #[test]
    fn test_ascending_latitude_flips_rows() {
        let oriented = orient_north_up(field(Some(vec![-30.0, 0.0, 30.0])));
        assert_eq!(oriented.values[[0, 0]], 5.0); // northernmost row first
        assert_eq!(oriented.values[[2, 0]], 1.0);
        assert_eq!(oriented.latitude.as_deref(), Some(&[30.0, 0.0, -30.0][..]));
        assert!(oriented.north_up);
    }

    #[test]
    fn test_descending_latitude_unchanged() {
        let oriented = orient_north_up(field(Some(vec![30.0, 0.0, -30.0])));
        assert_eq!(oriented.values[[0, 0]], 1.0);
        assert!(oriented.north_up);
    }

    #[test]
    fn test_no_latitude_passes_through() {
        let oriented = orient_north_up(field(None));
        assert_eq!(oriented.values[[0, 0]], 1.0);
    }

    #[test]
    fn test_orientation_is_idempotent() {
        let once = orient_north_up(field(Some(vec![-30.0, 0.0, 30.0])));
        let twice = orient_north_up(once.clone());
        assert_eq!(once.values, twice.values);
        assert_eq!(once.latitude, twice.latitude);
    }

    #[test]
    fn test_sort_ascending_reverses_descending() {
        let sorted = sort_latitude_ascending(field(Some(vec![30.0, 0.0, -30.0])));
        assert_eq!(sorted.latitude.as_deref(), Some(&[-30.0, 0.0, 30.0][..]));
        assert_eq!(sorted.values[[0, 0]], 5.0);
        // Already ascending: no-op
        let again = sort_latitude_ascending(sorted.clone());
        assert_eq!(again.values, sorted.values);
    }
}

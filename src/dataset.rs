//! NetCDF dataset loading and labeled-array access.
//!
//! This module reads a NetCDF file fully into memory and exposes it as a
//! set of named N-D f32 arrays with named dimensions and coordinate
//! vectors. Fill values (and packed scale/offset encodings) are resolved
//! at load time so the rest of the pipeline only ever sees NaN-for-missing
//! f32 data.

use ndarray::{Array, ArrayD, Axis, IxDyn, Slice};
use netcdf::{AttributeValue, Variable as NcVariable};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{QuicklookError, Result};
use crate::field::GridField;
use crate::reduce::{reduce_axis, ReduceStat};

/// Dimension names treated as the reduction (time) axis, in priority order.
pub const TIME_DIMS: &[&str] = &["time", "valid_time"];

/// Dimension names treated as the categorical pressure-level axis.
pub const LEVEL_DIMS: &[&str] = &["level", "pressure_level", "isobaricInhPa"];

/// Coordinate names treated as latitude.
pub const LAT_DIMS: &[&str] = &["latitude", "lat", "y"];

/// One loaded source variable: its dimension names and values.
#[derive(Debug, Clone)]
struct SourceVariable {
    dims: Vec<String>,
    values: ArrayD<f32>,
}

/// An in-memory NetCDF dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Source path, recorded for output provenance
    pub path: PathBuf,
    variables: HashMap<String, SourceVariable>,
    coordinates: HashMap<String, Vec<f64>>,
}

impl Dataset {
    /// Open a NetCDF file and load every supported numeric variable.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(QuicklookError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )));
        }

        let file = netcdf::open(path)?;
        debug!("Opened NetCDF file: {}", path.display());

        let mut variables = HashMap::new();
        let mut coordinates = HashMap::new();

        for var in file.variables() {
            let dims: Vec<String> = var
                .dimensions()
                .iter()
                .map(|d| d.name().to_string())
                .collect();

            let values = match read_as_f32(&var) {
                Ok(values) => values,
                Err(e) => {
                    warn!(
                        variable = %var.name(),
                        error = %e,
                        "Skipping unreadable variable"
                    );
                    continue;
                }
            };

            // Coordinate variables share their dimension's name.
            if dims.len() == 1 && dims[0] == var.name() {
                coordinates.insert(
                    var.name().to_string(),
                    values.iter().map(|&v| v as f64).collect(),
                );
            }

            debug!(
                variable = %var.name(),
                dims = ?dims,
                shape = ?values.shape(),
                "Loaded variable"
            );
            variables.insert(var.name().to_string(), SourceVariable { dims, values });
        }

        if variables.is_empty() {
            return Err(QuicklookError::Config {
                message: format!("No readable variables in {}", path.display()),
            });
        }

        let mut names: Vec<String> = variables.keys().cloned().collect();
        names.sort();
        let cells = variables.values().map(|v| v.values.len()).sum();
        crate::logging::log_data_load_stats(&path.to_string_lossy(), &names, cells);

        Ok(Self {
            path: path.to_path_buf(),
            variables,
            coordinates,
        })
    }

    /// Names of all loaded variables.
    pub fn variable_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.variables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Resolve the first matching name from a prioritized candidate list.
    ///
    /// This is the single ordered-candidate resolver used for every
    /// variable lookup; candidate lists differ per quantity (wind
    /// components, evaporation, precipitation) but the resolution rule
    /// does not.
    pub fn resolve_variable(&self, candidates: &[&str]) -> Result<String> {
        candidates
            .iter()
            .find(|name| self.variables.contains_key(**name))
            .map(|name| name.to_string())
            .ok_or_else(|| QuicklookError::MissingVariable {
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
                found: self.variable_names(),
            })
    }

    /// Extract a variable as a labeled cube (values + dims + coordinates).
    pub fn extract(&self, name: &str) -> Result<DataCube> {
        let var = self
            .variables
            .get(name)
            .ok_or_else(|| QuicklookError::MissingVariable {
                candidates: vec![name.to_string()],
                found: self.variable_names(),
            })?;
        let coords = var
            .dims
            .iter()
            .filter_map(|d| self.coordinates.get(d).map(|c| (d.clone(), c.clone())))
            .collect();
        Ok(DataCube {
            name: name.to_string(),
            values: var.values.clone(),
            dims: var.dims.clone(),
            coords,
        })
    }
}

/// A labeled N-D array extracted from a [`Dataset`], supporting the
/// coordinate-based selection and axis operations the pipeline needs
/// before reduction.
#[derive(Debug, Clone)]
pub struct DataCube {
    pub name: String,
    pub values: ArrayD<f32>,
    pub dims: Vec<String>,
    pub coords: HashMap<String, Vec<f64>>,
}

impl DataCube {
    /// Select a fixed pressure level along the categorical axis, if one
    /// exists. Cubes without a level axis pass through unchanged.
    pub fn select_level(mut self, level_hpa: i64) -> Result<Self> {
        let Some(axis) = self.find_dim(LEVEL_DIMS) else {
            return Ok(self);
        };
        let dim_name = self.dims[axis].clone();
        let coord = self.coords.get(&dim_name).ok_or_else(|| {
            QuicklookError::InvalidParameter {
                param: "level".to_string(),
                message: format!("Level axis {} has no coordinate values", dim_name),
            }
        })?;
        let index = coord
            .iter()
            .position(|&c| (c - level_hpa as f64).abs() < 1e-6)
            .ok_or_else(|| QuicklookError::InvalidParameter {
                param: "level".to_string(),
                message: format!(
                    "Level {} hPa not present on axis {} (values: {:?})",
                    level_hpa, dim_name, coord
                ),
            })?;
        self.values = self.values.index_axis(Axis(axis), index).to_owned();
        self.dims.remove(axis);
        self.coords.remove(&dim_name);
        Ok(self)
    }

    /// Drop every size-1 axis (e.g. a stray `expver` dimension).
    pub fn squeeze(mut self) -> Self {
        while let Some(axis) = self
            .values
            .shape()
            .iter()
            .position(|&len| len == 1)
            .filter(|_| self.values.ndim() > 2)
        {
            let dim_name = self.dims.remove(axis);
            self.coords.remove(&dim_name);
            self.values = self.values.index_axis(Axis(axis), 0).to_owned();
        }
        self
    }

    /// Reverse the latitude axis so the coordinate is ascending (south to
    /// north), the documented on-disk convention. Idempotent; monotonic
    /// coordinates make a reversal equivalent to a sort.
    pub fn sort_latitude_ascending(mut self) -> Self {
        let Some(axis) = self.find_dim(LAT_DIMS) else {
            return self;
        };
        let dim_name = self.dims[axis].clone();
        let Some(coord) = self.coords.get_mut(&dim_name) else {
            return self;
        };
        if coord.windows(2).any(|w| w[1] - w[0] < 0.0) {
            coord.reverse();
            self.values = self
                .values
                .slice_axis(Axis(axis), Slice::new(0, None, -1))
                .to_owned();
        }
        self
    }

    /// Position of the reduction (time) axis, if any.
    pub fn time_axis(&self) -> Option<usize> {
        self.find_dim(TIME_DIMS)
    }

    /// Latitude coordinate, if the cube has one.
    pub fn latitude(&self) -> Option<Vec<f64>> {
        self.find_dim(LAT_DIMS)
            .and_then(|axis| self.coords.get(&self.dims[axis]).cloned())
    }

    fn find_dim(&self, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| self.dims.iter().position(|d| d == name))
    }

    /// Collapse the time axis with the given statistic, producing a 2-D
    /// field. Cubes that are already 2-D are the identity with a reported
    /// sample count of 1. Fails with a shape error if the residual is not
    /// exactly 2-D.
    pub fn reduce(self, stat: ReduceStat) -> Result<GridField> {
        let latitude = self.latitude();
        let (reduced, samples) = match self.time_axis() {
            Some(axis) => reduce_axis(self.values.view(), axis, stat)?,
            None => (self.values, 1),
        };
        let shape = reduced.shape().to_vec();
        let values = reduced
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|_| QuicklookError::Shape {
                name: self.name.clone(),
                shape,
            })?;
        GridField::new(self.name, values, latitude, samples)
    }
}

/// Read a variable as f32, resolving fill values to NaN and unpacking
/// scale/offset encodings.
fn read_as_f32(var: &NcVariable) -> Result<ArrayD<f32>> {
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let data: Vec<f32> = var.get_values::<f32, _>(..)?;
    let mut values = Array::from_shape_vec(IxDyn(&shape), data).map_err(|_| {
        QuicklookError::Shape {
            name: var.name().to_string(),
            shape,
        }
    })?;

    // Fill-value masking must happen on the raw (packed) values.
    let fill = numeric_attr(var, "_FillValue").or_else(|| numeric_attr(var, "missing_value"));
    if let Some(fill) = fill {
        let fill = fill as f32;
        values.mapv_inplace(|v| if v == fill { f32::NAN } else { v });
    }

    let scale = numeric_attr(var, "scale_factor");
    let offset = numeric_attr(var, "add_offset");
    if scale.is_some() || offset.is_some() {
        let scale = scale.unwrap_or(1.0) as f32;
        let offset = offset.unwrap_or(0.0) as f32;
        values.mapv_inplace(|v| v * scale + offset);
    }

    Ok(values)
}

/// Read a numeric attribute of a variable, if present.
fn numeric_attr(var: &NcVariable, name: &str) -> Option<f64> {
    let attr = var.attribute(name)?;
    match attr.value().ok()? {
        AttributeValue::Uchar(v) => Some(v as f64),
        AttributeValue::Schar(v) => Some(v as f64),
        AttributeValue::Ushort(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Uint(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Double(v) => Some(v),
        _ => None,
    }
}

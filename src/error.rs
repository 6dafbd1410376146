//! Error types for the quicklook application.
//!
//! A single error enum covers every failure mode in the pipeline. All of
//! these abort the current rendering request; there is no retry policy and
//! no partial output.

use thiserror::Error;

/// The main error type for quicklook operations.
#[derive(Error, Debug)]
pub enum QuicklookError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// IO errors (missing input file, unwritable output path)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// None of the candidate variable names exist in the source
    #[error("No variable matching {candidates:?} found in dataset. Found: {found:?}")]
    MissingVariable {
        candidates: Vec<String>,
        found: Vec<String>,
    },

    /// Residual dimensionality is not 2-D after level selection and reduction
    #[error("Unexpected shape for {name}: got {shape:?}, expected a 2D grid")]
    Shape { name: String, shape: Vec<usize> },

    /// Range estimation over a set with no finite values
    #[error("No finite values found in {context}")]
    NoFiniteData { context: String },

    /// Fixed-range lookup miss (e.g. pressure level not in the wind table)
    #[error("No fixed display range configured for level {level} hPa. Supported: {supported:?}")]
    UnsupportedLevel { level: i64, supported: Vec<i64> },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Image encoding errors
    #[error("Image encoding error: {message}")]
    ImageEncoding { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results with QuicklookError
pub type Result<T> = std::result::Result<T, QuicklookError>;

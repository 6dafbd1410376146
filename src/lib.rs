//! # quicklook
//!
//! Quick-look raster rendering for gridded climate fields.
//!
//! This library reduces multi-decadal NetCDF fields (time or pressure-level
//! stacks) to 2-D summary grids and renders them as color-encoded PNG
//! rasters for visual inspection. It is built for analysts who want a fast
//! look at a field, not publication cartography.
//!
//! ## Pipeline
//!
//! - **Reduce**: collapse the time axis with a NaN-skipping statistic,
//!   after optional pressure-level selection
//! - **Orient**: canonicalize row order to north-up from the latitude
//!   coordinate
//! - **Range**: robust percentile-based display ranges that resist outliers
//! - **Encode**: grayscale, diverging, dual-channel, or HSV vector color
//!   encoding, with a sentinel color for missing data

pub mod config;
pub mod dataset;
pub mod encode;
pub mod error;
pub mod field;
pub mod logging;
pub mod orient;
pub mod pipeline;
pub mod range;
pub mod reduce;

pub use config::Config;
pub use dataset::{DataCube, Dataset};
pub use encode::{PixelBuffer, Scheme, VectorChannel};
pub use error::{QuicklookError, Result};
pub use field::GridField;
pub use logging::init_tracing;
pub use orient::{orient_north_up, sort_latitude_ascending};
pub use pipeline::{ImagePipeline, RangeSpec, RenderOutput, RenderRequest, SchemeKind};
pub use range::DisplayRange;
pub use reduce::ReduceStat;

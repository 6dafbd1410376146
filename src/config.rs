//! Configuration management for quicklook.
//!
//! Layered configuration with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables (via clap `env` fallbacks)
//! 3. JSON config file
//! 4. Default values (lowest priority)
//!
//! Paths and rendering knobs are explicit inputs here; nothing is read
//! from process-wide environment state at render time.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{QuicklookError, Result};

/// Command-line arguments for quicklook
#[derive(Parser, Debug)]
#[command(name = "quicklook")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input NetCDF file
    pub input: PathBuf,

    /// Path for the output PNG image
    pub output: PathBuf,

    /// Comma-separated variable name candidates, once per field
    /// (e.g. --var u,u_component_of_wind --var v,v_component_of_wind)
    #[arg(long = "var", required = true)]
    pub variables: Vec<String>,

    /// Encoding scheme (grayscale, diverging, dual, vector)
    #[arg(short, long, env = "QUICKLOOK_SCHEME", default_value = "grayscale")]
    pub scheme: String,

    /// Reduction statistic (mean, max, sum)
    #[arg(long, default_value = "mean")]
    pub stat: String,

    /// Pressure level to select before reducing (hPa)
    #[arg(short, long)]
    pub level: Option<i64>,

    /// Use the fixed per-level wind range table instead of a robust estimate
    #[arg(long)]
    pub fixed_range: bool,

    /// Gamma exponent for power-law compression (scheme default if unset)
    #[arg(short, long)]
    pub gamma: Option<f32>,

    /// Treat the first field as an upward flux: negate, then clip at zero
    #[arg(long)]
    pub upward_flux: bool,

    /// Unit scale applied to the field before encoding (e.g. 0.1 for
    /// rasters stored in tenths of a degree)
    #[arg(long, default_value_t = 1.0)]
    pub temp_scale: f32,

    /// Also write the reduced fields to this NetCDF path
    #[arg(long)]
    pub mean_out: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "QUICKLOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "QUICKLOOK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Rendering parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Percentile for robust range estimation
    #[serde(default = "default_percentile")]
    pub percentile: f64,

    /// Speed below which vector direction is suppressed (m/s)
    #[serde(default = "default_calm_mps")]
    pub calm_mps: f32,

    /// Constant saturation for the hue/value vector encoding
    #[serde(default = "default_sat")]
    pub sat: f32,

    /// Constant value for the hue/saturation vector encoding; selects that
    /// variant when set
    #[serde(default)]
    pub value_const: Option<f32>,

    /// Gamma exponent; None means the per-scheme default
    #[serde(default)]
    pub gamma: Option<f32>,

    /// Unit scale applied to field values before encoding
    #[serde(default = "default_temp_scale")]
    pub temp_scale: f32,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Rendering parameters
    #[serde(default)]
    pub render: RenderConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Build configuration from parsed arguments and an optional JSON file.
    pub fn from_args(args: &Args) -> Result<Self> {
        let mut config = Config::default();

        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Command-line arguments take precedence
        if args.gamma.is_some() {
            config.render.gamma = args.gamma;
        }
        config.render.temp_scale = args.temp_scale;
        config.log_level = args.log_level.clone();

        Ok(config)
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.render = other.render;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(QuicklookError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        let r = &self.render;
        if !(r.percentile > 0.0 && r.percentile <= 100.0) {
            return Err(QuicklookError::Config {
                message: format!("Percentile must be in (0, 100], got {}", r.percentile),
            });
        }
        if r.calm_mps < 0.0 || !r.calm_mps.is_finite() {
            return Err(QuicklookError::Config {
                message: format!("Calm threshold must be non-negative, got {}", r.calm_mps),
            });
        }
        if !(0.0..=1.0).contains(&r.sat) {
            return Err(QuicklookError::Config {
                message: format!("Saturation must be in [0, 1], got {}", r.sat),
            });
        }
        if let Some(value_const) = r.value_const {
            if !(0.0..=1.0).contains(&value_const) {
                return Err(QuicklookError::Config {
                    message: format!("value_const must be in [0, 1], got {}", value_const),
                });
            }
        }
        if let Some(gamma) = r.gamma {
            if !(gamma > 0.0 && gamma.is_finite()) {
                return Err(QuicklookError::Config {
                    message: format!("Gamma must be positive and finite, got {}", gamma),
                });
            }
        }
        if !(r.temp_scale > 0.0 && r.temp_scale.is_finite()) {
            return Err(QuicklookError::Config {
                message: format!(
                    "Unit scale must be positive and finite, got {}",
                    r.temp_scale
                ),
            });
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            render: RenderConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            percentile: default_percentile(),
            calm_mps: default_calm_mps(),
            sat: default_sat(),
            value_const: None,
            gamma: None,
            temp_scale: default_temp_scale(),
        }
    }
}

// Default value functions for serde
fn default_percentile() -> f64 {
    99.0
}

fn default_calm_mps() -> f32 {
    0.7
}

fn default_sat() -> f32 {
    0.9
}

fn default_temp_scale() -> f32 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

//! Logging utilities for quicklook.
//!
//! Structured logging for the batch pipeline: one run id per rendering
//! request, timed stage events, and a data-load summary.

use std::time::Instant;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Initialize the tracing subscriber with the given log level
pub fn init_tracing(log_level: &str) {
    let filter = match std::env::var("RUST_LOG") {
        Ok(val) => val,
        Err(_) => log_level.to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Generate a unique run id for a rendering request
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Run a pipeline stage with timing and a shared run id
pub fn log_timed_stage<F, R>(run_id: &str, stage: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let start = Instant::now();

    debug!(stage = stage, run_id = run_id, "Starting stage");

    let result = f();

    info!(
        stage = stage,
        run_id = run_id,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Stage completed"
    );

    result
}

/// Log a summary of the loaded dataset
pub fn log_data_load_stats(file_path: &str, var_names: &[String], cells: usize) {
    info!(
        stage = "load",
        file_path = file_path,
        var_count = var_names.len(),
        vars = %var_names.join(", "),
        cells = cells,
        "Data loaded successfully"
    );
}

/// Log an error with context
pub fn log_error(error: &crate::error::QuicklookError, context: &str) {
    error!(
        error = %error,
        context = context,
        "Error occurred"
    );
}

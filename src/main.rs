//! quicklook - quick-look raster rendering for gridded climate fields
//!
//! Renders one color-encoded PNG per invocation from a NetCDF input.

use clap::Parser;
use tracing::{error, info};

use quicklook::config::Args;
use quicklook::pipeline::{write_mean_netcdf, RangeSpec, RenderRequest};
use quicklook::{Config, Dataset, ImagePipeline, ReduceStat, Result, SchemeKind};

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::from_args(&args)?;
    config.validate().map_err(|e| {
        eprintln!("Invalid configuration: {}", e);
        e
    })?;

    quicklook::init_tracing(&config.log_level);
    info!("Starting quicklook v{}", env!("CARGO_PKG_VERSION"));

    let request = build_request(&args)?;

    info!("Loading NetCDF file: {:?}", args.input);
    let dataset = Dataset::open(&args.input).map_err(|e| {
        error!("Failed to load NetCDF file: {}", e);
        e
    })?;

    let pipeline = ImagePipeline::new(config);
    let output = pipeline.render(&dataset, &request).map_err(|e| {
        quicklook::logging::log_error(&e, "rendering request");
        e
    })?;

    std::fs::write(&args.output, &output.png)?;
    println!("Wrote PNG: {}", args.output.display());
    println!("Size: {}x{}", output.width, output.height);
    println!("Times averaged: {}", output.samples);
    println!("Display range: {:?}", output.range);
    for field in &output.fields {
        let (lo, hi) = field
            .finite_values()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        println!("{} range: [{:.6}, {:.6}]", field.name, lo, hi);
    }

    if let Some(mean_out) = &args.mean_out {
        write_mean_netcdf(mean_out, &dataset, &output.fields, args.level)?;
        println!("Wrote mean file: {}", mean_out.display());
    }

    Ok(())
}

/// Translate CLI arguments into a pipeline request.
fn build_request(args: &Args) -> Result<RenderRequest> {
    let candidates: Vec<Vec<String>> = args
        .variables
        .iter()
        .map(|list| list.split(',').map(|s| s.trim().to_string()).collect())
        .collect();

    let range = if args.fixed_range {
        RangeSpec::FixedLevel
    } else {
        RangeSpec::Robust
    };

    Ok(RenderRequest {
        candidates,
        stat: ReduceStat::parse(&args.stat)?,
        level: args.level,
        scheme: SchemeKind::parse(&args.scheme)?,
        range,
        upward_flux: args.upward_flux,
    })
}

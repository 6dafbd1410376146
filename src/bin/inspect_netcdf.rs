//! Dump the dimensions, variables, and attributes of a NetCDF file.
//!
//! Handy for diagnosing missing-variable errors: the pipeline reports the
//! candidate list it tried, and this shows what the file actually has.

use anyhow::Context;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let path: PathBuf = match std::env::args_os().nth(1) {
        Some(path) => path.into(),
        None => {
            eprintln!("Usage: inspect_netcdf <file.nc>");
            std::process::exit(2);
        }
    };

    println!("Inspecting NetCDF file: {}", path.display());

    let file = netcdf::open(&path).with_context(|| format!("opening {}", path.display()))?;

    println!("\nDimensions:");
    for dim in file.dimensions() {
        println!(
            "  {} = {}{}",
            dim.name(),
            dim.len(),
            if dim.is_unlimited() { " (unlimited)" } else { "" }
        );
    }

    println!("\nVariables:");
    for var in file.variables() {
        print!("  {} ({:?}) [", var.name(), var.vartype());
        for (i, dim) in var.dimensions().iter().enumerate() {
            if i > 0 {
                print!(", ");
            }
            print!("{} = {}", dim.name(), dim.len());
        }
        println!("]");

        for attr in var.attributes() {
            match attr.value() {
                Ok(val) => println!("    {}: {:?}", attr.name(), val),
                Err(e) => println!("    {}: <error: {}>", attr.name(), e),
            }
        }
    }

    println!("\nGlobal attributes:");
    for attr in file.attributes() {
        match attr.value() {
            Ok(val) => println!("  {}: {:?}", attr.name(), val),
            Err(e) => println!("  {}: <error: {}>", attr.name(), e),
        }
    }

    Ok(())
}

//! Test data generation utilities.
//!
//! Builders for small synthetic NetCDF files with known data patterns,
//! used by the pipeline integration tests.

use std::path::Path;

use netcdf::Error;
type Result<T> = std::result::Result<T, Error>;

/// Fill value used by the fixtures that exercise missing-data handling.
pub const FILL_VALUE: f32 = 9999.0;

/// Creates a precipitation-like file: `tp(time, latitude, longitude)` with
/// 2 time steps over a 3x4 grid, ascending latitude (south to north).
///
/// Cell values at time t are `base + 2 * t` where `base = y * 4 + x`, so
/// the time mean is `base + 1`. The cell at (lat index 0, lon index 0) is
/// the fill value at every time step.
pub fn create_precip_nc(path: &Path) -> Result<()> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("latitude", 3)?;
    file.add_dimension("longitude", 4)?;
    file.add_unlimited_dimension("time")?;

    file.add_attribute("title", "Precipitation Test Data")?;

    let lat_values: Vec<f64> = vec![-30.0, 0.0, 30.0];
    let lon_values: Vec<f64> = vec![0.0, 90.0, 180.0, 270.0];
    let time_values: Vec<f32> = vec![0.0, 1.0];

    let mut data_values = Vec::with_capacity(2 * 3 * 4);
    for t in 0..2 {
        for y in 0..3 {
            for x in 0..4 {
                if y == 0 && x == 0 {
                    data_values.push(FILL_VALUE);
                } else {
                    data_values.push((y * 4 + x) as f32 + 2.0 * t as f32);
                }
            }
        }
    }

    {
        let mut lat_var = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(&lat_values, &[..])?;
    }
    {
        let mut lon_var = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_values(&lon_values, &[..])?;
    }
    {
        let mut time_var = file.add_variable::<f32>("time", &["time"])?;
        time_var.put_attribute("units", "days since 2000-01-01")?;
        time_var.put_values(&time_values, &[..])?;
    }
    {
        let mut tp_var =
            file.add_variable::<f32>("tp", &["time", "latitude", "longitude"])?;
        tp_var.put_attribute("units", "m")?;
        tp_var.put_attribute("_FillValue", FILL_VALUE)?;
        tp_var.put_values(&data_values, &[.., .., ..])?;
    }

    Ok(())
}

/// Creates a wind file: `u`/`v` on (time, pressure_level, latitude,
/// longitude) with levels [250, 500, 850]. At every time step,
/// `u = 3 * (level index + 1)` and `v = 4 * (level index + 1)`, so the
/// 850 hPa mean wind is (9, 12) with speed 15.
pub fn create_wind_nc(path: &Path) -> Result<()> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("pressure_level", 3)?;
    file.add_dimension("latitude", 2)?;
    file.add_dimension("longitude", 2)?;
    file.add_unlimited_dimension("time")?;

    let level_values: Vec<f64> = vec![250.0, 500.0, 850.0];
    let lat_values: Vec<f64> = vec![-10.0, 10.0];
    let lon_values: Vec<f64> = vec![0.0, 180.0];
    let time_values: Vec<f32> = vec![0.0, 1.0];

    let mut u_values = Vec::with_capacity(2 * 3 * 2 * 2);
    let mut v_values = Vec::with_capacity(2 * 3 * 2 * 2);
    for _t in 0..2 {
        for l in 0..3 {
            for _cell in 0..4 {
                u_values.push(3.0 * (l + 1) as f32);
                v_values.push(4.0 * (l + 1) as f32);
            }
        }
    }

    {
        let mut level_var = file.add_variable::<f64>("pressure_level", &["pressure_level"])?;
        level_var.put_attribute("units", "hPa")?;
        level_var.put_values(&level_values, &[..])?;
    }
    {
        let mut lat_var = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat_var.put_attribute("units", "degrees_north")?;
        lat_var.put_values(&lat_values, &[..])?;
    }
    {
        let mut lon_var = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon_var.put_attribute("units", "degrees_east")?;
        lon_var.put_values(&lon_values, &[..])?;
    }
    {
        let mut time_var = file.add_variable::<f32>("time", &["time"])?;
        time_var.put_values(&time_values, &[..])?;
    }
    {
        let mut u_var = file.add_variable::<f32>(
            "u",
            &["time", "pressure_level", "latitude", "longitude"],
        )?;
        u_var.put_attribute("units", "m s**-1")?;
        u_var.put_values(&u_values, &[.., .., .., ..])?;
    }
    {
        let mut v_var = file.add_variable::<f32>(
            "v",
            &["time", "pressure_level", "latitude", "longitude"],
        )?;
        v_var.put_attribute("units", "m s**-1")?;
        v_var.put_values(&v_values, &[.., .., .., ..])?;
    }

    Ok(())
}

/// Creates an evaporation + precipitation climatology file with constant
/// fields: `e = -0.002` (upward flux, ERA5 sign convention) and
/// `tp = 0.001`, over 2 time steps on a 2x4 grid.
pub fn create_evap_precip_nc(path: &Path) -> Result<()> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("latitude", 2)?;
    file.add_dimension("longitude", 4)?;
    file.add_unlimited_dimension("time")?;

    let lat_values: Vec<f64> = vec![-45.0, 45.0];
    let lon_values: Vec<f64> = vec![0.0, 90.0, 180.0, 270.0];
    let time_values: Vec<f32> = vec![0.0, 1.0];

    let e_values = vec![-0.002f32; 2 * 2 * 4];
    let tp_values = vec![0.001f32; 2 * 2 * 4];

    {
        let mut lat_var = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat_var.put_values(&lat_values, &[..])?;
    }
    {
        let mut lon_var = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon_var.put_values(&lon_values, &[..])?;
    }
    {
        let mut time_var = file.add_variable::<f32>("time", &["time"])?;
        time_var.put_values(&time_values, &[..])?;
    }
    {
        let mut e_var = file.add_variable::<f32>("e", &["time", "latitude", "longitude"])?;
        e_var.put_values(&e_values, &[.., .., ..])?;
    }
    {
        let mut tp_var = file.add_variable::<f32>("tp", &["time", "latitude", "longitude"])?;
        tp_var.put_values(&tp_values, &[.., .., ..])?;
    }

    Ok(())
}

/// Creates a pre-reduced 2-D temperature anomaly file (no time axis),
/// descending latitude (already north-up): `t2m_mean(latitude, longitude)`
/// with values in tenths of a degree.
pub fn create_mean_temp_nc(path: &Path) -> Result<()> {
    let mut file = netcdf::create(path)?;

    file.add_dimension("latitude", 2)?;
    file.add_dimension("longitude", 2)?;

    let lat_values: Vec<f64> = vec![60.0, -60.0];
    let lon_values: Vec<f64> = vec![0.0, 180.0];
    // Tenths of a degree: -150 and 150 decode to -15 C and 15 C
    let temp_values: Vec<f32> = vec![-150.0, 0.0, 150.0, 75.0];

    {
        let mut lat_var = file.add_variable::<f64>("latitude", &["latitude"])?;
        lat_var.put_values(&lat_values, &[..])?;
    }
    {
        let mut lon_var = file.add_variable::<f64>("longitude", &["longitude"])?;
        lon_var.put_values(&lon_values, &[..])?;
    }
    {
        let mut temp_var = file.add_variable::<f32>("t2m_mean", &["latitude", "longitude"])?;
        temp_var.put_attribute("units", "0.1 degC")?;
        temp_var.put_values(&temp_values, &[.., ..])?;
    }

    Ok(())
}

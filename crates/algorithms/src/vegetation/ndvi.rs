//! Normalized Difference Vegetation Index

use ndarray::Zip;
use ndvibio_core::raster::Raster;
use ndvibio_core::{Error, Result};

/// NDVI for a single pixel.
///
/// `(nir - red) / (nir + red)`, or exactly `0.0` when the sum is exactly zero.
/// No tolerance is applied: a sum of `1e-300` is divided normally. NaN
/// inputs give NaN, and the result is not clamped to [-1, 1].
#[inline]
pub fn ndvi_pixel(nir: f64, red: f64) -> f64 {
    let denom = nir + red;
    if denom == 0.0 {
        0.0
    } else {
        (nir - red) / denom
    }
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
///
/// Values range from -1 to 1 for non-negative reflectances:
/// - Dense vegetation: 0.6 to 0.9
/// - Sparse vegetation: 0.2 to 0.5
/// - Bare soil: 0.1 to 0.2
/// - Water/clouds: -1.0 to 0.0
///
/// The output keeps the NIR band's georeferencing.
///
/// # Errors
/// [`Error::ShapeMismatch`] if the bands differ in shape; nothing is computed.
pub fn compute_ndvi(nir: &Raster, red: &Raster) -> Result<Raster> {
    check_dimensions(nir, red)?;

    let data = Zip::from(nir.view())
        .and(red.view())
        .map_collect(|&n, &r| ndvi_pixel(n, r));

    Ok(nir.with_data(data))
}

pub(crate) fn check_dimensions(a: &Raster, b: &Raster) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::ShapeMismatch {
            expected: a.shape(),
            actual: b.shape(),
        });
    }
    Ok(())
}

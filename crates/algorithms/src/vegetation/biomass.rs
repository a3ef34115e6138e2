//! Linear biomass proxy

use ndvibio_core::raster::Raster;
use ndvibio_core::{Error, Result};

/// Reject NaN and infinite coefficients.
///
/// Any finite value passes, including zero and negatives.
pub fn validate_coefficient(coefficient: f64) -> Result<()> {
    if coefficient.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidCoefficient { value: coefficient })
    }
}

/// Scale an NDVI raster by `coefficient`, cell by cell.
///
/// This is an uncalibrated proxy, not a physical biomass model. The output
/// keeps the NDVI raster's georeferencing. NaN cells stay NaN.
///
/// # Errors
/// [`Error::InvalidCoefficient`] for a non-finite coefficient.
pub fn compute_biomass(ndvi: &Raster, coefficient: f64) -> Result<Raster> {
    validate_coefficient(coefficient)?;
    let data = ndvi.data().mapv(|v| v * coefficient);
    Ok(ndvi.with_data(data))
}

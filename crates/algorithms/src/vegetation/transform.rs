//! NDVI + biomass in one validated pass

use ndvibio_core::raster::Raster;
use ndvibio_core::{Algorithm, Error, Result};
use tracing::debug;

use super::biomass::{compute_biomass, validate_coefficient};
use super::ndvi::{check_dimensions, compute_ndvi};
use super::summary::summarize;

/// Coefficient used when the caller does not supply one
pub const DEFAULT_BIOMASS_COEFFICIENT: f64 = 0.5;

/// Parameters for biomass estimation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiomassParams {
    /// Multiplier applied to NDVI. Must be finite; sign and magnitude are free.
    /// Default: 0.5
    pub coefficient: f64,
}

impl Default for BiomassParams {
    fn default() -> Self {
        Self {
            coefficient: DEFAULT_BIOMASS_COEFFICIENT,
        }
    }
}

/// Everything one estimation run produces.
///
/// Both rasters have the input shape and carry the NIR band's geotransform
/// and projection.
#[derive(Debug, Clone)]
pub struct VegetationOutputs {
    pub ndvi: Raster,
    pub biomass: Raster,
    /// NaN-aware mean of `ndvi`
    pub ndvi_mean: f64,
    /// NaN-aware mean of `biomass`
    pub biomass_mean: f64,
}

/// NDVI and biomass estimation over a NIR/red band pair.
///
/// Stateless; construct one wherever it is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterVegetationTransform;

impl RasterVegetationTransform {
    /// Validate, compute NDVI, scale to biomass, summarize.
    ///
    /// Both checks run before any computation, so an error means no output
    /// raster was produced.
    ///
    /// # Errors
    /// - [`Error::ShapeMismatch`] if `nir` and `red` differ in shape
    /// - [`Error::InvalidCoefficient`] if `coefficient` is NaN or infinite
    pub fn run(&self, nir: &Raster, red: &Raster, coefficient: f64) -> Result<VegetationOutputs> {
        check_dimensions(nir, red)?;
        validate_coefficient(coefficient)?;

        let (rows, cols) = nir.shape();
        debug!(rows, cols, coefficient, "estimating NDVI and biomass");

        let ndvi = compute_ndvi(nir, red)?;
        let biomass = compute_biomass(&ndvi, coefficient)?;

        let ndvi_mean = summarize(&ndvi);
        let biomass_mean = summarize(&biomass);
        debug!(ndvi_mean, biomass_mean, "estimation finished");

        Ok(VegetationOutputs {
            ndvi,
            biomass,
            ndvi_mean,
            biomass_mean,
        })
    }
}

impl Algorithm for RasterVegetationTransform {
    type Input = (Raster, Raster);
    type Output = VegetationOutputs;
    type Params = BiomassParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "NDVI & Biomass Estimator"
    }

    fn description(&self) -> &'static str {
        "Compute NDVI from NIR and red bands and a linear biomass estimate from NDVI"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (nir, red) = input;
        self.run(&nir, &red, params.coefficient)
    }
}

/// Run [`RasterVegetationTransform`] with explicit parameters
pub fn estimate_vegetation(
    nir: &Raster,
    red: &Raster,
    params: BiomassParams,
) -> Result<VegetationOutputs> {
    RasterVegetationTransform.run(nir, red, params.coefficient)
}

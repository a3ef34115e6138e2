//! Vegetation index and biomass estimation
//!
//! - NDVI from paired NIR and red bands, with an exact-zero denominator guard
//! - Linear biomass proxy: NDVI scaled by a single coefficient
//! - NaN-aware summary means
//! - [`RasterVegetationTransform`]: validates inputs, then runs all three

mod biomass;
mod ndvi;
mod summary;
mod transform;

pub use biomass::{compute_biomass, validate_coefficient};
pub use ndvi::{compute_ndvi, ndvi_pixel};
pub use summary::summarize;
pub use transform::{
    estimate_vegetation, BiomassParams, RasterVegetationTransform, VegetationOutputs,
    DEFAULT_BIOMASS_COEFFICIENT,
};

//! # ndvibio Algorithms
//!
//! Vegetation analysis over paired raster bands.
//!
//! - **vegetation**: NDVI, linear biomass estimate, NaN-aware summary means

pub mod vegetation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::vegetation::{
        compute_biomass, compute_ndvi, estimate_vegetation, summarize, BiomassParams,
        RasterVegetationTransform, VegetationOutputs,
    };
    pub use ndvibio_core::prelude::*;
}

//! # ndvibio Core
//!
//! Core types, traits and I/O for the ndvibio vegetation estimator.
//!
//! This crate provides:
//! - `Raster`: a georeferenced 2D grid of `f64` samples
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `Projection`: opaque spatial reference carried from input to output
//! - Algorithm trait for a consistent API
//! - GeoTIFF reading and staged (all-or-nothing) writing

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{GeoKeyDirectory, GeoTransform, Projection, Raster};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Projection, Raster};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in ndvibio.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

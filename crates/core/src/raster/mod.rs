//! Raster data structures

mod geotransform;
mod grid;
mod projection;

pub use geotransform::GeoTransform;
pub use grid::{Raster, RasterStatistics};
pub use projection::{GeoKeyDirectory, Projection};

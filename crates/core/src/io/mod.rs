//! I/O operations for reading and writing GeoTIFF bands

#[cfg(feature = "gdal")]
mod gdal_io;
mod native;
mod staged;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, write_geotiff};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, write_geotiff};

// Buffer-based I/O (always available, no filesystem dependency)
pub use native::{read_geotiff_from_buffer, write_geotiff_to_buffer};

pub use staged::{
    check_distinct_destinations, commit_all, stage_bytes, stage_geotiff, StagedOutput,
};

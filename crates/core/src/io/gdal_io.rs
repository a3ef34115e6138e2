//! GeoTIFF reading and writing using GDAL

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Projection, Raster};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use std::path::Path;
use tracing::warn;

/// Read one band of any GDAL-readable raster into a Raster
///
/// `band` is 1-indexed and defaults to 1.
pub fn read_geotiff<P: AsRef<Path>>(path: P, band: Option<usize>) -> Result<Raster> {
    let path = path.as_ref();
    let fail = |e: gdal::errors::GdalError| Error::source_read(path, e);

    let dataset = Dataset::open(path).map_err(fail)?;
    let rasterband = dataset.rasterband(band.unwrap_or(1)).map_err(fail)?;
    let (cols, rows) = dataset.raster_size();

    let buffer = rasterband
        .read_as::<f64>((0, 0), (cols, rows), (cols, rows), None)
        .map_err(fail)?;
    let mut raster = Raster::from_vec(buffer.data().to_vec(), rows, cols)
        .map_err(|e| Error::source_read(path, e))?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }

    let wkt = dataset.projection();
    if !wkt.is_empty() {
        raster.set_projection(Some(Projection::Wkt(wkt)));
    }

    Ok(raster)
}

/// Write a Raster to a single-band 32-bit float GeoTIFF
pub fn write_geotiff<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<()> {
    let path = path.as_ref();
    let fail = |e: gdal::errors::GdalError| Error::destination_write(path, e);

    let driver = DriverManager::get_driver_by_name("GTiff").map_err(fail)?;
    let (rows, cols) = raster.shape();
    let create_options = ["COMPRESS=DEFLATE", "TILED=YES"];

    let mut dataset = driver
        .create_with_band_type_with_options::<f32, _>(
            path,
            cols as isize,
            rows as isize,
            1,
            &create_options,
        )
        .map_err(fail)?;

    dataset
        .set_geo_transform(&raster.transform().to_gdal())
        .map_err(fail)?;

    match raster.projection() {
        Some(Projection::Wkt(wkt)) => {
            let srs = SpatialRef::from_wkt(wkt).map_err(fail)?;
            dataset.set_spatial_ref(&srs).map_err(fail)?;
        }
        Some(proj @ Projection::GeoKeys(_)) => match proj.epsg() {
            Some(code) => {
                let srs = SpatialRef::from_epsg(code).map_err(fail)?;
                dataset.set_spatial_ref(&srs).map_err(fail)?;
            }
            None => warn!(
                "{}: GeoTIFF key directory without EPSG code cannot be handed to GDAL",
                path.display()
            ),
        },
        None => {}
    }

    let mut band = dataset.rasterband(1).map_err(fail)?;
    let data: Vec<f32> = raster.data().iter().map(|&v| v as f32).collect();
    band.write((0, 0), (cols, rows), &data).map_err(fail)?;

    Ok(())
}

//! Summary statistics for output rasters

use ndvibio_core::raster::Raster;

/// Mean of all non-NaN cells.
///
/// Returns NaN, rather than an error, when no cell is a number (an all-NaN
/// or empty raster).
pub fn summarize(raster: &Raster) -> f64 {
    raster.statistics().mean.unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_plain_mean() {
        let r = Raster::from_rows(&[[0.0, 0.8]]).unwrap();
        assert_relative_eq!(summarize(&r), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_nan_cells_are_ignored() {
        let r = Raster::from_rows(&[[0.2, f64::NAN], [f64::NAN, 0.6]]).unwrap();
        assert_relative_eq!(summarize(&r), 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_all_nan_gives_nan() {
        assert!(summarize(&Raster::filled(2, 3, f64::NAN)).is_nan());
        assert!(summarize(&Raster::new(0, 0)).is_nan());
    }
}

//! Error types for ndvibio

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ndvibio operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Raster shape mismatch: expected {expected:?} (rows, cols), got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Invalid biomass coefficient: {value} (must be finite)")]
    InvalidCoefficient { value: f64 },

    #[error("Cannot read source raster {}: {reason}", .path.display())]
    SourceRead { path: PathBuf, reason: String },

    #[error("Cannot write output raster {}: {reason}", .path.display())]
    DestinationWrite { path: PathBuf, reason: String },

    #[error("Invalid raster dimensions: {rows}x{cols} for {len} samples")]
    InvalidDimensions { rows: usize, cols: usize, len: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

impl Error {
    /// Label a decoding failure against the source it came from
    pub fn source_read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::SourceRead {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Label a persistence failure against the destination it was headed for
    pub fn destination_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Error::DestinationWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for ndvibio operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = Error::source_read("bands/nir.tif", "not a TIFF");
        assert_eq!(
            err.to_string(),
            "Cannot read source raster bands/nir.tif: not a TIFF"
        );

        let err = Error::destination_write("out/ndvi.tif", "permission denied");
        assert!(err.to_string().contains("out/ndvi.tif"));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = Error::ShapeMismatch {
            expected: (2, 2),
            actual: (2, 3),
        };
        assert_eq!(
            err.to_string(),
            "Raster shape mismatch: expected (2, 2) (rows, cols), got (2, 3)"
        );
    }
}

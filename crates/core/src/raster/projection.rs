//! Opaque spatial reference carried from input bands to outputs
//!
//! The estimator never reprojects, so the projection is kept in whatever
//! form the reader found it and written back unchanged.

use std::fmt;

/// GeoKeyDirectory key for ProjectedCSTypeGeoKey
const PROJECTED_CS_TYPE: u16 = 3072;
/// GeoKeyDirectory key for GeographicTypeGeoKey
const GEOGRAPHIC_TYPE: u16 = 2048;

/// Raw GeoTIFF georeferencing tags.
///
/// `keys` is the GeoKeyDirectory (tag 34735) exactly as stored, `doubles`
/// and `ascii` are GeoDoubleParams (34736) and GeoAsciiParams (34737) that
/// keys may point into.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeyDirectory {
    pub keys: Vec<u16>,
    pub doubles: Vec<f64>,
    pub ascii: Option<String>,
}

impl GeoKeyDirectory {
    /// Number of keys declared in the directory header
    pub fn key_count(&self) -> usize {
        self.keys.get(3).map(|&n| n as usize).unwrap_or(0)
    }

    /// EPSG code from ProjectedCSType or GeographicType, when stored inline
    pub fn epsg(&self) -> Option<u32> {
        // Header is [version, revision, minor, count], then 4-short entries
        // [key_id, tag_location, count, value_or_index].
        self.keys
            .get(4..)?
            .chunks_exact(4)
            .take(self.key_count())
            .find(|entry| {
                matches!(entry[0], PROJECTED_CS_TYPE | GEOGRAPHIC_TYPE)
                    && entry[1] == 0
                    && entry[3] > 0
            })
            .map(|entry| entry[3] as u32)
    }
}

/// Spatial reference of a raster, in the form its reader produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Well-known text, as reported by GDAL
    Wkt(String),
    /// GeoTIFF key directory, as read by the native decoder
    GeoKeys(GeoKeyDirectory),
}

impl Projection {
    /// EPSG code if one can be read without a projection database
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Projection::Wkt(_) => None,
            Projection::GeoKeys(dir) => dir.epsg(),
        }
    }

    /// Short human-readable identifier
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg() {
            return format!("EPSG:{}", code);
        }
        match self {
            Projection::Wkt(wkt) => {
                let head: String = wkt.chars().take(50).collect();
                format!("WKT:{}", head)
            }
            Projection::GeoKeys(dir) => format!("GeoKeys ({} keys)", dir.key_count()),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

//! Native GeoTIFF reading/writing (without GDAL dependency)
//!
//! Uses the `tiff` crate. Georeferencing is read from and written to the
//! standard GeoTIFF tags; the key directory is copied byte for byte so the
//! projection survives without being interpreted.

use crate::error::{Error, Result};
use crate::raster::{GeoKeyDirectory, GeoTransform, Projection, Raster};
use num_traits::ToPrimitive;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tracing::{debug, warn};

const MODEL_PIXEL_SCALE: Tag = Tag::Unknown(33550);
const MODEL_TIEPOINT: Tag = Tag::Unknown(33922);
const MODEL_TRANSFORMATION: Tag = Tag::Unknown(34264);
const GEO_KEY_DIRECTORY: Tag = Tag::Unknown(34735);
const GEO_DOUBLE_PARAMS: Tag = Tag::Unknown(34736);
const GEO_ASCII_PARAMS: Tag = Tag::Unknown(34737);

/// Placeholder path for errors on in-memory sources and sinks
const BUFFER_PATH: &str = "<buffer>";

/// Read one band of a GeoTIFF file into a Raster
///
/// `band` is 1-indexed and defaults to 1. Any integer or float sample type
/// is widened to `f64`.
pub fn read_geotiff<P: AsRef<Path>>(path: P, band: Option<usize>) -> Result<Raster> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::source_read(path, e))?;
    decode_geotiff(BufReader::new(file), band, path)
}

/// Read one band of a GeoTIFF held in memory
///
/// Same as `read_geotiff` but operates on a byte slice instead of a file path.
pub fn read_geotiff_from_buffer(data: &[u8], band: Option<usize>) -> Result<Raster> {
    decode_geotiff(Cursor::new(data), band, Path::new(BUFFER_PATH))
}

/// Buffer limits for the decoder.
///
/// The `tiff` defaults cap a decoded image at 256 MiB, which rejects a
/// float32 band larger than about 8100 x 8100. Whole bands are held in
/// memory anyway, so the only bound is available memory.
fn decoder_limits() -> Limits {
    Limits::unlimited()
}

fn decode_geotiff<R: Read + Seek>(
    reader: R,
    band: Option<usize>,
    origin: &Path,
) -> Result<Raster> {
    let fail = |reason: String| Error::source_read(origin, reason);

    let mut decoder = Decoder::new(reader)
        .map_err(|e| fail(format!("TIFF decode error: {}", e)))?
        .with_limits(decoder_limits());

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| fail(format!("cannot read dimensions: {}", e)))?;
    let rows = height as usize;
    let cols = width as usize;

    let samples = match decoder
        .read_image()
        .map_err(|e| fail(format!("cannot read image data: {}", e)))?
    {
        DecodingResult::U8(buf) => widen(buf),
        DecodingResult::U16(buf) => widen(buf),
        DecodingResult::U32(buf) => widen(buf),
        DecodingResult::U64(buf) => widen(buf),
        DecodingResult::I8(buf) => widen(buf),
        DecodingResult::I16(buf) => widen(buf),
        DecodingResult::I32(buf) => widen(buf),
        DecodingResult::I64(buf) => widen(buf),
        DecodingResult::F32(buf) => widen(buf),
        DecodingResult::F64(buf) => buf,
        #[allow(unreachable_patterns)]
        _ => return Err(fail("unsupported TIFF sample format".to_string())),
    };

    let data = select_band(samples, rows * cols, band.unwrap_or(1)).map_err(fail)?;
    let mut raster = Raster::from_vec(data, rows, cols).map_err(|e| fail(e.to_string()))?;

    match read_geotransform(&mut decoder) {
        Some(transform) => raster.set_transform(transform),
        None => debug!(
            "{}: no georeferencing tags, using identity transform",
            origin.display()
        ),
    }
    raster.set_projection(read_projection(&mut decoder));

    Ok(raster)
}

fn widen<T: ToPrimitive>(buf: Vec<T>) -> Vec<f64> {
    buf.into_iter()
        .map(|v| v.to_f64().unwrap_or(f64::NAN))
        .collect()
}

/// Pick one band out of pixel-interleaved samples
fn select_band(
    samples: Vec<f64>,
    pixels: usize,
    band: usize,
) -> std::result::Result<Vec<f64>, String> {
    if pixels == 0 {
        return Err("image has no pixels".to_string());
    }
    if samples.len() % pixels != 0 {
        return Err(format!(
            "{} samples do not divide evenly over {} pixels",
            samples.len(),
            pixels
        ));
    }
    let bands = samples.len() / pixels;
    if band == 0 || band > bands {
        return Err(format!("band {} requested but image has {} band(s)", band, bands));
    }
    if bands == 1 {
        return Ok(samples);
    }
    Ok(samples.into_iter().skip(band - 1).step_by(bands).collect())
}

/// ModelPixelScale + ModelTiepoint first, then ModelTransformation
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok();
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok();
    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if let Some(gt) = GeoTransform::from_tiepoint(&scale, &tiepoint) {
            return Some(gt);
        }
    }

    let matrix = decoder.get_tag_f64_vec(MODEL_TRANSFORMATION).ok()?;
    GeoTransform::from_model_transformation(&matrix)
}

fn read_projection<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<Projection> {
    let keys = decoder.get_tag_u16_vec(GEO_KEY_DIRECTORY).ok()?;
    let doubles = decoder.get_tag_f64_vec(GEO_DOUBLE_PARAMS).unwrap_or_default();
    let ascii = decoder
        .get_tag_ascii_string(GEO_ASCII_PARAMS)
        .ok()
        .map(|s| s.trim_end_matches('\0').to_string());

    Some(Projection::GeoKeys(GeoKeyDirectory {
        keys,
        doubles,
        ascii,
    }))
}

/// Write a Raster to a single-band 32-bit float GeoTIFF file
pub fn write_geotiff<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| Error::destination_write(path, e))?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer, path)?;
    writer.flush().map_err(|e| Error::destination_write(path, e))
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer(raster: &Raster) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), Path::new(BUFFER_PATH))?;
    Ok(buf)
}

fn encode_geotiff<W: Write + Seek>(raster: &Raster, writer: W, destination: &Path) -> Result<()> {
    let fail = |what: &str, e: tiff::TiffError| {
        Error::destination_write(destination, format!("{}: {}", what, e))
    };

    let mut encoder = TiffEncoder::new(writer).map_err(|e| fail("TIFF encoder error", e))?;

    let (rows, cols) = raster.shape();
    let data: Vec<f32> = raster.data().iter().map(|&v| v as f32).collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| fail("cannot create TIFF image", e))?;

    let gt = raster.transform();
    if gt.is_rotated() {
        image
            .encoder()
            .write_tag(MODEL_TRANSFORMATION, &gt.to_model_transformation()[..])
            .map_err(|e| fail("cannot write transformation tag", e))?;
    } else {
        let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
        image
            .encoder()
            .write_tag(MODEL_PIXEL_SCALE, &scale[..])
            .map_err(|e| fail("cannot write scale tag", e))?;

        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        image
            .encoder()
            .write_tag(MODEL_TIEPOINT, &tiepoint[..])
            .map_err(|e| fail("cannot write tiepoint tag", e))?;
    }

    match raster.projection() {
        Some(Projection::GeoKeys(dir)) => {
            image
                .encoder()
                .write_tag(GEO_KEY_DIRECTORY, dir.keys.as_slice())
                .map_err(|e| fail("cannot write geokey tag", e))?;
            if !dir.doubles.is_empty() {
                image
                    .encoder()
                    .write_tag(GEO_DOUBLE_PARAMS, dir.doubles.as_slice())
                    .map_err(|e| fail("cannot write geo double params", e))?;
            }
            if let Some(ascii) = &dir.ascii {
                image
                    .encoder()
                    .write_tag(GEO_ASCII_PARAMS, ascii.as_str())
                    .map_err(|e| fail("cannot write geo ascii params", e))?;
            }
        }
        other => {
            if let Some(Projection::Wkt(_)) = other {
                warn!(
                    "{}: WKT projection cannot be stored without GDAL, \
                     writing a bare key directory",
                    destination.display()
                );
            }
            // GTModelTypeGeoKey=1 (Projected), GTRasterTypeGeoKey=1 (PixelIsArea)
            let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
            image
                .encoder()
                .write_tag(GEO_KEY_DIRECTORY, &geokeys[..])
                .map_err(|e| fail("cannot write geokey tag", e))?;
        }
    }

    image
        .write_data(&data)
        .map_err(|e| fail("cannot write image data", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiff::encoder::colortype::RGB32Float;

    fn georeferenced(rows: usize, cols: usize) -> Raster {
        let data = (0..rows * cols).map(|i| i as f64 * 0.25).collect();
        let mut raster = Raster::from_vec(data, rows, cols).unwrap();
        raster.set_transform(GeoTransform::new(500_000.0, 4_200_000.0, 10.0, -10.0));
        raster.set_projection(Some(Projection::GeoKeys(GeoKeyDirectory {
            keys: vec![1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 32633],
            doubles: vec![6_378_137.0],
            ascii: Some("WGS 84 / UTM zone 33N|".to_string()),
        })));
        raster
    }

    #[test]
    fn test_buffer_roundtrip_keeps_georeferencing() {
        let raster = georeferenced(3, 4);
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let loaded = read_geotiff_from_buffer(&bytes, None).unwrap();

        assert_eq!(loaded.shape(), (3, 4));
        assert_eq!(loaded.get(2, 3).unwrap(), 2.75);
        assert_eq!(loaded.transform(), raster.transform());
        assert_eq!(loaded.projection(), raster.projection());
    }

    #[test]
    fn test_rotated_transform_survives() {
        let mut raster = georeferenced(2, 2);
        raster.set_transform(GeoTransform {
            origin_x: 10.0,
            origin_y: 20.0,
            pixel_width: 1.0,
            pixel_height: -1.0,
            row_rotation: 0.5,
            col_rotation: 0.25,
        });
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let loaded = read_geotiff_from_buffer(&bytes, None).unwrap();
        assert_eq!(loaded.transform(), raster.transform());
    }

    #[test]
    fn test_samples_are_stored_as_f32() {
        let raster = Raster::from_rows(&[[0.1, 1.0 / 3.0]]).unwrap();
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let loaded = read_geotiff_from_buffer(&bytes, None).unwrap();
        assert_eq!(loaded.get(0, 1).unwrap(), (1.0f64 / 3.0) as f32 as f64);
    }

    fn three_band_tiff() -> Vec<u8> {
        // 2x1 image, pixel-interleaved: (1, 2, 3), (4, 5, 6)
        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            encoder
                .write_image::<RGB32Float>(2, 1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
                .unwrap();
        }
        buf
    }

    #[test]
    fn test_band_selection() {
        let bytes = three_band_tiff();

        let first = read_geotiff_from_buffer(&bytes, None).unwrap();
        assert_eq!(first.data().iter().copied().collect::<Vec<_>>(), vec![1.0, 4.0]);

        let third = read_geotiff_from_buffer(&bytes, Some(3)).unwrap();
        assert_eq!(third.data().iter().copied().collect::<Vec<_>>(), vec![3.0, 6.0]);
        assert_eq!(third.projection(), None);
    }

    #[test]
    fn test_missing_band_is_a_source_error() {
        let bytes = three_band_tiff();
        let err = read_geotiff_from_buffer(&bytes, Some(4)).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }), "got {:?}", err);
        assert!(err.to_string().contains("band 4"));

        let err = read_geotiff_from_buffer(&bytes, Some(0)).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }

    #[test]
    fn test_decoder_limits_allow_full_scenes() {
        // A 10980 x 10980 float32 band needs about 460 MiB of decode buffer
        let limits = decoder_limits();
        assert!(limits.decoding_buffer_size >= 10980 * 10980 * 4);
        assert!(limits.intermediate_buffer_size >= 10980 * 10980 * 4);
    }

    #[test]
    fn test_band_over_default_decoder_limit() {
        // 8200 x 8200 float32 is just above the tiff crate's 256 MiB default
        let raster = Raster::filled(8200, 8200, 0.5);
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        drop(raster);
        assert!(bytes.len() > 256 * 1024 * 1024);

        let loaded = read_geotiff_from_buffer(&bytes, None).unwrap();
        assert_eq!(loaded.shape(), (8200, 8200));
        assert_eq!(loaded.get(8199, 8199).unwrap(), 0.5);
    }

    #[test]
    fn test_garbage_is_a_source_error() {
        let err = read_geotiff_from_buffer(b"definitely not a tiff", None).unwrap_err();
        assert!(matches!(err, Error::SourceRead { .. }));
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let err = read_geotiff("/nonexistent/dir/nir.tif", None).unwrap_err();
        match err {
            Error::SourceRead { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/dir/nir.tif"))
            }
            other => panic!("expected SourceRead, got {:?}", other),
        }
    }
}

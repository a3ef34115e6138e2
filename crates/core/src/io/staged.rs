//! Two-phase output writing
//!
//! Outputs are encoded next to their destination under a temporary name and
//! only renamed into place once every output of a run has been encoded. A
//! failure before [`commit_all`] leaves existing destination files as they
//! were, and dropping a [`StagedOutput`] removes its temporary file.

use crate::error::{Error, Result};
use crate::io::write_geotiff;
use crate::raster::Raster;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// An encoded output waiting to be moved onto its destination
#[derive(Debug)]
pub struct StagedOutput {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedOutput {
    /// Final path this output will be committed to
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Temporary path currently holding the encoded contents
    pub fn staging_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically rename the staged file onto its destination
    pub fn commit(self) -> Result<PathBuf> {
        let StagedOutput { temp, destination } = self;
        temp.persist(&destination)
            .map_err(|e| Error::destination_write(&destination, e.error))?;
        debug!("committed {}", destination.display());
        Ok(destination)
    }
}

fn staging_dir(destination: &Path) -> PathBuf {
    match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn staging_file(destination: &Path, suffix: &str) -> Result<NamedTempFile> {
    Builder::new()
        .prefix(".ndvibio-")
        .suffix(suffix)
        .tempfile_in(staging_dir(destination))
        .map_err(|e| Error::destination_write(destination, e))
}

/// Encode a raster as GeoTIFF into a temporary file beside `path`
pub fn stage_geotiff<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<StagedOutput> {
    let destination = path.as_ref().to_path_buf();
    let temp = staging_file(&destination, ".tif")?;

    write_geotiff(raster, temp.path()).map_err(|e| match e {
        // Report against the real destination, not the temporary name
        Error::DestinationWrite { reason, .. } => Error::destination_write(&destination, reason),
        other => other,
    })?;

    debug!(
        "staged {} at {}",
        destination.display(),
        temp.path().display()
    );
    Ok(StagedOutput { temp, destination })
}

/// Write arbitrary file contents into a temporary file beside `path`
pub fn stage_bytes<P: AsRef<Path>>(contents: &[u8], path: P) -> Result<StagedOutput> {
    let destination = path.as_ref().to_path_buf();
    let mut temp = staging_file(&destination, ".tmp")?;

    let file = temp.as_file_mut();
    file.write_all(contents)
        .and_then(|_| file.flush())
        .map_err(|e| Error::destination_write(&destination, e))?;

    debug!(
        "staged {} bytes for {}",
        contents.len(),
        destination.display()
    );
    Ok(StagedOutput { temp, destination })
}

/// Lexical identity of a destination: its canonical directory plus file name.
/// `out.tif` and `./out.tif` map to the same key.
fn destination_key(path: &Path) -> PathBuf {
    let dir = staging_dir(path);
    let dir = dir.canonicalize().unwrap_or(dir);
    match path.file_name() {
        Some(name) => dir.join(name),
        None => path.to_path_buf(),
    }
}

/// Fail if two outputs of one run point at the same file
pub fn check_distinct_destinations<P: AsRef<Path>>(paths: &[P]) -> Result<()> {
    let mut seen = HashSet::new();
    for path in paths {
        let path = path.as_ref();
        if !seen.insert(destination_key(path)) {
            return Err(Error::destination_write(
                path,
                "same destination given for more than one output",
            ));
        }
    }
    Ok(())
}

/// Commit staged outputs in order, returning their final paths
///
/// Repeated destinations are rejected before any file is renamed.
pub fn commit_all(staged: Vec<StagedOutput>) -> Result<Vec<PathBuf>> {
    let destinations: Vec<&Path> = staged.iter().map(StagedOutput::destination).collect();
    check_distinct_destinations(&destinations)?;
    staged.into_iter().map(StagedOutput::commit).collect()
}

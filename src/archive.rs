//! Overlay archive handling.
//!
//! Vector overlays arrive as zip archives holding a shapefile set named
//! after the archive (`overlay-12.zip` holds `overlay-12.shp` and its
//! sidecars). Extraction goes into a caller-owned scratch directory so
//! each job row works in isolation and cleanup rides on the directory's
//! drop.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{GeorefError, Result};

/// Extract `archive` into `scratch` and locate the shapefile inside.
///
/// # Errors
/// [`GeorefError::ArchiveExtractionFailure`] when the archive cannot be
/// opened or unpacked, or the expected shapefile is not among its members.
pub fn extract_overlay<P, Q>(archive: P, scratch: Q) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let archive = archive.as_ref();
    let scratch = scratch.as_ref();

    let file = File::open(archive)
        .map_err(|e| extraction_error(archive, format!("cannot open: {e}")))?;
    let mut zip =
        ZipArchive::new(file).map_err(|e| extraction_error(archive, e.to_string()))?;
    zip.extract(scratch)
        .map_err(|e| extraction_error(archive, e.to_string()))?;

    let member = archive
        .with_extension("shp")
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| extraction_error(archive, "archive path has no file name"))?;
    let shapefile = scratch.join(&member);
    if !shapefile.exists() {
        return Err(extraction_error(
            archive,
            format!("no {member} among the extracted members"),
        ));
    }

    debug!(
        archive = %archive.display(),
        shapefile = %shapefile.display(),
        "Extracted overlay"
    );
    Ok(shapefile)
}

fn extraction_error(path: &Path, reason: impl Into<String>) -> GeorefError {
    GeorefError::ArchiveExtractionFailure {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

//! Job table ingestion.
//!
//! A batch run is driven by a CSV listing one row per scanned sheet: the
//! image, the GCP table digitized on it, an operator-facing id, an ignore
//! flag, and the optional vector overlay archive with its output path.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{GeorefError, Result};

/// Header columns every job table must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 6] =
    ["source", "gcp_file", "id", "ignore", "numeros", "numeros_output"];

/// One row of the job table. Read-only once parsed; `Clone` because rows
/// are handed to worker threads when a row timeout is configured.
#[derive(Debug, Clone, Deserialize)]
pub struct JobRow {
    /// Scanned source image.
    pub source: PathBuf,
    /// GCP table digitized on the image.
    pub gcp_file: PathBuf,
    /// Row identifier used in logs and the summary.
    pub id: String,
    /// Skip marker; see [`is_ignored`](Self::is_ignored).
    #[serde(default)]
    pub ignore: Option<String>,
    /// Zip archive holding the vector overlay, when one was digitized.
    #[serde(default)]
    pub numeros: Option<PathBuf>,
    /// Destination for the reprojected overlay.
    #[serde(default)]
    pub numeros_output: Option<PathBuf>,
}

impl JobRow {
    /// Whether the operator flagged this row to be skipped
    /// (`1`, `true` or `yes`, any case; an empty cell means no).
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignore
            .as_deref()
            .is_some_and(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
    }

    /// Raster output path derived from the GCP table name. See
    /// [`raster_output_for`].
    ///
    /// # Errors
    /// [`GeorefError::UnrecognizedGcpSuffix`] as in [`raster_output_for`].
    pub fn raster_output(&self) -> Result<PathBuf> {
        raster_output_for(&self.gcp_file)
    }
}

/// Derive the raster output path for a GCP table.
///
/// Tables are named after the image they were digitized on
/// (`plan-12.jpg.points`); the georeferenced raster replaces that whole
/// suffix with `.tif`, next to the table.
///
/// # Errors
/// [`GeorefError::UnrecognizedGcpSuffix`] when the name ends in neither
/// `.jpg.points` nor `.png.points`.
pub fn raster_output_for(gcp_file: &Path) -> Result<PathBuf> {
    let unrecognized = || GeorefError::UnrecognizedGcpSuffix {
        path: gcp_file.to_path_buf(),
    };
    let name = gcp_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(unrecognized)?;
    let stem = name
        .strip_suffix(".jpg.points")
        .or_else(|| name.strip_suffix(".png.points"))
        .ok_or_else(unrecognized)?;
    Ok(gcp_file.with_file_name(format!("{stem}.tif")))
}

/// Read and validate a job table.
///
/// All of [`REQUIRED_COLUMNS`] must be present in the header; extra
/// columns are ignored and blank lines are skipped. Empty `numeros` /
/// `numeros_output` cells deserialize to `None`.
///
/// # Errors
/// [`GeorefError::MalformedJobTable`] when the file cannot be read, a
/// required column is missing, or a row does not deserialize.
pub fn read_jobs<P: AsRef<Path>>(path: P) -> Result<Vec<JobRow>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| malformed(path, format!("cannot open: {e}")))?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr.headers().map_err(|e| malformed(path, e.to_string()))?;
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == **required))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(malformed(
            path,
            format!("missing required columns {}", missing.join(", ")),
        ));
    }

    let mut rows = Vec::new();
    for row in rdr.deserialize() {
        let row: JobRow = row.map_err(|e| malformed(path, e.to_string()))?;
        rows.push(row);
    }
    Ok(rows)
}

fn malformed(path: &Path, reason: impl Into<String>) -> GeorefError {
    GeorefError::MalformedJobTable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

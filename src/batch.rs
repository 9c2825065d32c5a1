//! Batch driver.
//!
//! Reads a job table and processes every row in file order: raster warp
//! first, then the optional address overlay. Rows are independent; one
//! failing row is recorded in the summary and the run continues with the
//! next.
//!
//! # Example
//!
//! ```rust,no_run
//! use georef::{run_batch, BatchOptions, Projection, TransformSpec};
//!
//! # fn main() -> georef::Result<()> {
//! let projection = Projection::from_proj4("+proj=utm +zone=31 +datum=WGS84 +units=m")?;
//! let summary = run_batch(
//!     "jobs.csv",
//!     &projection,
//!     TransformSpec::resolve("poly2"),
//!     &BatchOptions::default(),
//! )?;
//! print!("{summary}");
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, info_span, warn, Span};

use crate::archive::extract_overlay;
use crate::error::{GeorefError, Result};
use crate::gcp::parse_gcp_file;
use crate::jobs::{read_jobs, JobRow};
use crate::projection::Projection;
use crate::raster::warp_raster;
use crate::report::{BatchSummary, RowOutcome, RowReport};
use crate::transform::TransformSpec;
use crate::vector::warp_vector;

/// Knobs for a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Read GCP tables with the older `pixelX`/`pixelY` column names.
    pub legacy_gcp_format: bool,
    /// Mark a row failed when it runs longer than this.
    pub row_timeout: Option<Duration>,
}

impl BatchOptions {
    /// Set the GCP column scheme.
    #[must_use]
    pub fn with_legacy_gcp_format(mut self, legacy: bool) -> Self {
        self.legacy_gcp_format = legacy;
        self
    }

    /// Set the per-row time limit.
    #[must_use]
    pub fn with_row_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.row_timeout = timeout;
        self
    }
}

/// Run every row of a job table and report per-row outcomes.
///
/// Row errors never abort the run; they become
/// [`RowOutcome::Failed`] entries in the summary. The caller decides the
/// process exit code from [`BatchSummary::has_failures`].
///
/// # Errors
/// Only a job table that cannot be read or validated aborts the run, as
/// [`GeorefError::MalformedJobTable`].
pub fn run_batch<P: AsRef<Path>>(
    jobs_csv: P,
    projection: &Projection,
    spec: TransformSpec,
    options: &BatchOptions,
) -> Result<BatchSummary> {
    let jobs_csv = jobs_csv.as_ref();
    let rows = read_jobs(jobs_csv)?;
    info!(
        table = %jobs_csv.display(),
        rows = rows.len(),
        transform = %spec.kind,
        "Starting batch run"
    );

    let mut summary = BatchSummary::default();
    for row in rows {
        let span = info_span!("row", id = %row.id);
        let _guard = span.enter();
        let outcome = match run_row(&row, projection, spec, options) {
            Ok(outcome) => outcome,
            Err(e) => {
                let reason = describe(&e);
                warn!(reason = %reason, "Row failed");
                RowOutcome::Failed(reason)
            }
        };
        summary.rows.push(RowReport {
            id: row.id.clone(),
            gcp_file: row.gcp_file.clone(),
            outcome,
        });
    }

    info!(
        processed = summary.processed(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "Batch run finished"
    );
    Ok(summary)
}

fn run_row(
    row: &JobRow,
    projection: &Projection,
    spec: TransformSpec,
    options: &BatchOptions,
) -> Result<RowOutcome> {
    match options.row_timeout {
        Some(timeout) => {
            run_row_with_timeout(row, projection, spec, options.legacy_gcp_format, timeout)
        }
        None => process_row(row, projection, spec, options.legacy_gcp_format),
    }
}

/// Run the row on a worker thread, waiting at most `timeout`.
fn run_row_with_timeout(
    row: &JobRow,
    projection: &Projection,
    spec: TransformSpec,
    legacy_format: bool,
    timeout: Duration,
) -> Result<RowOutcome> {
    let (tx, rx) = mpsc::channel();
    let worker_row = row.clone();
    let worker_projection = projection.clone();
    let span = Span::current();
    // A worker stuck inside a GDAL call cannot be interrupted; on expiry
    // the thread is left to finish in the background and its result is
    // discarded. Entered spans are thread-local, so the worker re-enters
    // the row span to keep its events tagged, late ones included.
    let _worker = thread::Builder::new()
        .name(format!("georef-row-{}", row.id))
        .spawn(move || {
            let _entered = span.enter();
            let result = process_row(&worker_row, &worker_projection, spec, legacy_format);
            let _ = tx.send(result);
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(GeorefError::RowTimeout {
            id: row.id.clone(),
            seconds: timeout.as_secs(),
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(GeorefError::RowWorkerLost { id: row.id.clone() })
        }
    }
}

/// One row, start to terminal state.
fn process_row(
    row: &JobRow,
    projection: &Projection,
    spec: TransformSpec,
    legacy_format: bool,
) -> Result<RowOutcome> {
    let raster_output = row.raster_output()?;

    if !row.gcp_file.exists() {
        warn!(gcp_file = %row.gcp_file.display(), "No GCP table on disk, skipping row");
        return Ok(RowOutcome::SkippedMissingGcp);
    }
    if row.is_ignored() {
        warn!("Row flagged ignore, skipping");
        return Ok(RowOutcome::SkippedIgnored);
    }

    let gcps = parse_gcp_file(&row.gcp_file, legacy_format)?;
    debug!(count = gcps.len(), "Parsed control points");
    warp_raster(&row.source, &raster_output, projection, spec, &gcps, None)?;
    info!(output = %raster_output.display(), "Raster georeferenced");

    let Some(archive) = row.numeros.as_deref().filter(|p| !p.as_os_str().is_empty()) else {
        debug!("No overlay archive for this row");
        return Ok(RowOutcome::SkippedNoOverlay);
    };
    if !archive.exists() {
        warn!(archive = %archive.display(), "Overlay archive not on disk, skipping overlay");
        return Ok(RowOutcome::SkippedNoOverlay);
    }
    let overlay_output = row
        .numeros_output
        .as_deref()
        .ok_or_else(|| GeorefError::MissingOverlayOutput { id: row.id.clone() })?;

    let scratch = tempfile::Builder::new()
        .prefix(&scratch_prefix(&row.id))
        .tempdir()?;
    let shapefile = extract_overlay(archive, scratch.path())?;
    warp_vector(
        &shapefile,
        &row.gcp_file,
        overlay_output,
        projection,
        spec,
        legacy_format,
    )?;
    info!(output = %overlay_output.display(), "Overlay reprojected");
    Ok(RowOutcome::Processed)
}

/// Scratch directory prefix for a row. Row ids come from operator
/// spreadsheets, so anything outside `[A-Za-z0-9_-]` is replaced.
fn scratch_prefix(id: &str) -> String {
    let safe: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("georef-{safe}-")
}

/// Flatten an error and its sources into a single summary line.
fn describe(error: &GeorefError) -> String {
    let mut parts = vec![error.to_string()];
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}

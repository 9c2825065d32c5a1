//! Pipeline error taxonomy.
//!
//! Every failure a job row can hit has a variant here, so the batch driver
//! can record it and keep going. Variants carry the path (or row id) they
//! concern; lower-level detail rides along as a source error.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::programs::UtilityError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GeorefError>;

/// Which half of the raster pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpStage {
    /// Attaching GCPs and the target CRS to the in-memory copy.
    Attach,
    /// Fitting the transform and resampling to disk.
    Warp,
}

impl fmt::Display for WarpStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attach => write!(f, "GCP attach"),
            Self::Warp => write!(f, "warp"),
        }
    }
}

/// Everything that can go wrong while georeferencing a batch.
#[derive(Debug, Error)]
pub enum GeorefError {
    /// A GCP table could not be parsed.
    #[error("malformed GCP table {}: {reason}", path.display())]
    MalformedGcpData { path: PathBuf, reason: String },

    /// A GCP table parsed cleanly but held no control points.
    #[error("GCP table {} contains no control points", path.display())]
    EmptyGcpSet { path: PathBuf },

    /// A GCP table name the raster output path cannot be derived from.
    #[error(
        "cannot derive a raster output from {}: expected a `.jpg.points` or `.png.points` suffix",
        path.display()
    )]
    UnrecognizedGcpSuffix { path: PathBuf },

    /// The scanned source image could not be opened.
    #[error("failed to open raster {}", path.display())]
    RasterOpenFailure {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    /// One of the two raster stages failed.
    #[error("{stage} stage failed for {}", path.display())]
    WarpFailure {
        stage: WarpStage,
        path: PathBuf,
        #[source]
        source: UtilityError,
    },

    /// The vector overlay could not be reprojected.
    #[error("vector reprojection failed for {}: {reason}", path.display())]
    VectorReprojectionFailure { path: PathBuf, reason: String },

    /// Reprojection succeeded but the schema rewrite did not.
    #[error("schema normalization failed for {}", path.display())]
    SchemaNormalization {
        path: PathBuf,
        #[source]
        source: gdal::errors::GdalError,
    },

    /// The overlay archive could not be unpacked or was missing its shapefile.
    #[error("failed to extract archive {}: {reason}", path.display())]
    ArchiveExtractionFailure { path: PathBuf, reason: String },

    /// The target CRS definition was rejected by the projection engine.
    #[error("invalid PROJ.4 definition {definition:?}")]
    InvalidProjection {
        definition: String,
        #[source]
        source: gdal::errors::GdalError,
    },

    /// The job table itself is unusable.
    #[error("malformed job table {}: {reason}", path.display())]
    MalformedJobTable { path: PathBuf, reason: String },

    /// A row names an overlay archive but no destination for it.
    #[error("row {id}: overlay archive set but numeros_output is empty")]
    MissingOverlayOutput { id: String },

    /// A row ran past the configured time limit.
    #[error("row {id} did not finish within {seconds}s")]
    RowTimeout { id: String, seconds: u64 },

    /// A row's worker thread died without reporting a result.
    #[error("row {id} worker terminated without reporting a result")]
    RowWorkerLost { id: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

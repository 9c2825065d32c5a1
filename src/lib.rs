#![doc = include_str!("../README.md")]
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`gcp`]: Ground control point tables, both column schemes
//! - [`transform`]: Transform token resolution ([`TransformSpec`])
//! - [`projection`]: Validated target CRS ([`Projection`])
//! - [`programs`]: Safe wrappers over the GDAL utility entry points
//! - [`raster`]: Two-stage raster georeferencing
//! - [`vector`]: Overlay reprojection and schema normalization
//! - [`archive`]: Zipped overlay extraction
//! - [`jobs`]: Job table ingestion ([`JobRow`])
//! - [`batch`]: Row-by-row batch driver ([`run_batch`])
//! - [`report`]: Per-row outcomes and the run summary
//! - [`error`]: Pipeline error taxonomy ([`GeorefError`])

// ============================================================================
// Public modules
// ============================================================================

pub mod archive;
pub mod batch;
pub mod error;
pub mod gcp;
pub mod jobs;
pub mod programs;
pub mod projection;
pub mod raster;
pub mod report;
pub mod transform;
pub mod vector;

// ============================================================================
// Errors
// ============================================================================

pub use error::{
    GeorefError,
    Result,
    WarpStage,
};

// ============================================================================
// Control Points
// ============================================================================

pub use gcp::{
    GcpColumns,
    GcpParseError,
    GroundControlPoint,
    parse_gcp_file,
    parse_gcp_reader,
};

// ============================================================================
// Transforms & Projections
// ============================================================================

pub use projection::Projection;
pub use transform::{
    TransformKind,
    TransformSpec,
};

// ============================================================================
// Raster & Vector Engines
// ============================================================================
// Primary API: run_batch(...); per-sheet work via warp_raster/warp_vector

pub use raster::{
    warp_raster,
    POLY_NODATA,
};
pub use vector::{
    normalize_layer,
    warp_vector,
};
pub use programs::UtilityError;

// ============================================================================
// Archives
// ============================================================================

pub use archive::extract_overlay;

// ============================================================================
// Batch Driver
// ============================================================================

pub use batch::{
    run_batch,
    BatchOptions,
};
pub use jobs::{
    read_jobs,
    JobRow,
};
pub use report::{
    BatchSummary,
    RowOutcome,
    RowReport,
};

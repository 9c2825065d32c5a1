//! Raster georeferencing engine.
//!
//! Two stages, the way an operator would do it by hand: first attach the
//! control points and target CRS to an in-memory copy of the scan (no
//! solving, nothing touches disk), then warp that copy to the output
//! file, letting the backend fit the requested transform. Polynomial
//! warps mark collar pixels with nodata 1; TPS warps add an alpha band
//! instead.

use std::path::Path;

use gdal::Dataset;
use tracing::debug;

use crate::error::{GeorefError, Result, WarpStage};
use crate::gcp::GroundControlPoint;
use crate::programs;
use crate::projection::Projection;
use crate::transform::TransformSpec;

/// Nodata value marking collar pixels introduced by polynomial warps.
pub const POLY_NODATA: f64 = 1.0;

/// Georeference one scanned raster.
///
/// Opens `source`, attaches `gcps` and the target CRS to an in-memory
/// copy, then warps it to `output` with the transform described by
/// `spec`. `cutline` may name an OGR datasource whose first layer clips
/// the output; the batch driver never supplies one, but callers can.
///
/// # Errors
/// [`GeorefError::RasterOpenFailure`] when `source` cannot be opened,
/// [`GeorefError::WarpFailure`] when either stage fails.
pub fn warp_raster<P, Q>(
    source: P,
    output: Q,
    projection: &Projection,
    spec: TransformSpec,
    gcps: &[GroundControlPoint],
    cutline: Option<&Path>,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source = source.as_ref();
    let output = output.as_ref();

    let src = Dataset::open(source).map_err(|e| GeorefError::RasterOpenFailure {
        path: source.to_path_buf(),
        source: e,
    })?;

    debug!(
        source = %source.display(),
        gcps = gcps.len(),
        transform = %spec.kind,
        "Attaching control points"
    );
    let referenced = programs::translate_to_memory(&src, &attach_args(projection, gcps))
        .map_err(|e| GeorefError::WarpFailure {
            stage: WarpStage::Attach,
            path: source.to_path_buf(),
            source: e,
        })?;

    debug!(output = %output.display(), "Warping");
    let warped = programs::warp(&referenced, output, &warp_args(spec, cutline)).map_err(|e| {
        GeorefError::WarpFailure {
            stage: WarpStage::Warp,
            path: output.to_path_buf(),
            source: e,
        }
    })?;
    // Closing the output dataset is what flushes it.
    drop(warped);

    Ok(())
}

/// Translate argv attaching `gcps` and the target CRS to an in-memory copy.
fn attach_args(projection: &Projection, gcps: &[GroundControlPoint]) -> Vec<String> {
    let mut args = vec![
        "-of".to_string(),
        "MEM".to_string(),
        "-a_srs".to_string(),
        projection.proj4().to_string(),
    ];
    for gcp in gcps {
        args.push("-gcp".to_string());
        args.push(gcp.source_x.to_string());
        args.push(gcp.source_y.to_string());
        args.push(gcp.map_x.to_string());
        args.push(gcp.map_y.to_string());
    }
    args
}

/// Warp argv for `spec`, with an optional cutline datasource.
fn warp_args(spec: TransformSpec, cutline: Option<&Path>) -> Vec<String> {
    let mut args = Vec::new();
    if spec.exact_interpolation {
        args.push("-tps".to_string());
        args.push("-dstalpha".to_string());
    } else {
        args.push("-order".to_string());
        args.push(spec.order.unwrap_or(1).to_string());
        args.push("-dstnodata".to_string());
        args.push(POLY_NODATA.to_string());
    }
    if let Some(cutline) = cutline {
        args.push("-cutline".to_string());
        args.push(cutline.to_string_lossy().into_owned());
    }
    args
}

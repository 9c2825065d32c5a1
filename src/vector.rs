//! Vector overlay georeferencing and schema normalization.
//!
//! Overlays are digitized directly on the scanned sheet, so their
//! coordinates live in the same pixel space the GCPs were picked in.
//! Reprojection fits the same transform family as the raster warp through
//! the GCP quadruples and rewrites the geometry into the target CRS;
//! afterwards the attribute schema is normalized for the downstream
//! geocoder.
//!
//! The quadruples keep the table's raw Y sign here, unlike the raster
//! path, which inverts it. The two backends expect different row
//! conventions and outputs match the historical pipeline; whether the
//! vector convention is actually intended remains an open question with
//! the data producers.

use std::fs;
use std::path::Path;

use gdal::vector::{Feature, LayerAccess};
use gdal::{Dataset, DatasetOptions, GdalOpenFlags};
use gdal_sys::OGRFieldType;
use tracing::{debug, info};

use crate::error::{GeorefError, Result};
use crate::gcp::{parse_gcp_file, GroundControlPoint};
use crate::programs;
use crate::projection::Projection;
use crate::transform::TransformSpec;

/// Field holding the assembled street label.
pub const DISPLAY_NAME_FIELD: &str = "displayName";
/// Field marking features as georeferenced by this pipeline.
pub const PROVENANCE_FIELD: &str = "geocodingProvenance";
/// Value written into [`PROVENANCE_FIELD`].
pub const PROVENANCE_GEOREFERENCED: i32 = 1;

/// Attribute fields joined into the display name, in order.
const NAME_PARTS: [&str; 3] = ["prefix1", "prefix2", "streetName"];

/// Reproject one vector overlay and normalize its schema.
///
/// `source` is the extracted overlay datasource (typically a shapefile),
/// `gcp_file` the same GCP table used for the raster warp, `output` the
/// destination datasource, created along with any missing parent
/// directories. The output layer carries the source's basename, and the
/// format follows the output extension.
///
/// # Errors
/// GCP table errors propagate as in [`parse_gcp_file`]; reprojection
/// failures surface as [`GeorefError::VectorReprojectionFailure`] and
/// schema rewrite failures as [`GeorefError::SchemaNormalization`].
///
/// [`parse_gcp_file`]: crate::gcp::parse_gcp_file
pub fn warp_vector<P, Q, R>(
    source: P,
    gcp_file: Q,
    output: R,
    projection: &Projection,
    spec: TransformSpec,
    legacy_format: bool,
) -> Result<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let source = source.as_ref();
    let output = output.as_ref();

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let gcps = parse_gcp_file(gcp_file, legacy_format)?;

    let src = Dataset::open(source).map_err(|e| GeorefError::VectorReprojectionFailure {
        path: source.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!(
        source = %source.display(),
        output = %output.display(),
        gcps = gcps.len(),
        transform = %spec.kind,
        "Reprojecting overlay"
    );
    let translated = programs::vector_translate(&src, output, &translate_args(projection, spec, &gcps))
        .map_err(|e| GeorefError::VectorReprojectionFailure {
            path: output.to_path_buf(),
            reason: e.to_string(),
        })?;
    // Close before reopening for the schema pass.
    drop(translated);

    let layer = layer_name(source);
    if normalize_layer(output, &layer)? {
        info!(output = %output.display(), layer = %layer, "Normalized overlay schema");
    }
    Ok(())
}

/// Ensure the normalized fields exist on `layer_name` inside `dataset`.
///
/// Adds [`DISPLAY_NAME_FIELD`] (the name part fields of each feature,
/// joined with single spaces, missing and empty parts skipped) and
/// [`PROVENANCE_FIELD`] when absent. Returns whether the datasource was
/// modified; when both fields already exist nothing is written and a
/// second call is a no-op.
///
/// # Errors
/// [`GeorefError::SchemaNormalization`] when the datasource cannot be
/// opened for update or the rewrite fails.
pub fn normalize_layer<P: AsRef<Path>>(dataset: P, layer_name: &str) -> Result<bool> {
    let path = dataset.as_ref();
    let ds = Dataset::open_ex(
        path,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_UPDATE,
            ..DatasetOptions::default()
        },
    )
    .map_err(|e| normalization_error(path, e))?;
    let mut layer = ds
        .layer_by_name(layer_name)
        .map_err(|e| normalization_error(path, e))?;

    let existing: Vec<String> = layer.defn().fields().map(|f| f.name()).collect();
    let needs_display = !existing.iter().any(|n| n == DISPLAY_NAME_FIELD);
    let needs_provenance = !existing.iter().any(|n| n == PROVENANCE_FIELD);
    if !needs_display && !needs_provenance {
        debug!(dataset = %path.display(), layer = layer_name, "Schema already normalized");
        return Ok(false);
    }

    let mut additions = Vec::new();
    if needs_display {
        additions.push((DISPLAY_NAME_FIELD, OGRFieldType::OFTString));
    }
    if needs_provenance {
        additions.push((PROVENANCE_FIELD, OGRFieldType::OFTInteger));
    }
    layer
        .create_defn_fields(&additions)
        .map_err(|e| normalization_error(path, e))?;

    // Collect FIDs first; rewriting features while iterating them is
    // undefined under some drivers.
    let fids: Vec<u64> = layer.features().filter_map(|f| f.fid()).collect();
    for fid in fids {
        let Some(mut feature) = layer.feature(fid) else {
            continue;
        };
        if needs_display {
            let display = display_name(&feature);
            feature
                .set_field_string(DISPLAY_NAME_FIELD, &display)
                .map_err(|e| normalization_error(path, e))?;
        }
        if needs_provenance {
            feature
                .set_field_integer(PROVENANCE_FIELD, PROVENANCE_GEOREFERENCED)
                .map_err(|e| normalization_error(path, e))?;
        }
        layer
            .set_feature(feature)
            .map_err(|e| normalization_error(path, e))?;
    }
    Ok(true)
}

/// Vector translate argv: assigned SRS, transform flags, GCP quadruples
/// with the raw (un-inverted) Y.
fn translate_args(
    projection: &Projection,
    spec: TransformSpec,
    gcps: &[GroundControlPoint],
) -> Vec<String> {
    let mut args = vec!["-a_srs".to_string(), projection.proj4().to_string()];
    if spec.exact_interpolation {
        args.push("-tps".to_string());
    } else {
        args.push("-order".to_string());
        args.push(spec.order.unwrap_or(1).to_string());
    }
    for gcp in gcps {
        args.push("-gcp".to_string());
        args.push(gcp.source_x.to_string());
        args.push(gcp.image_row_y().to_string());
        args.push(gcp.map_x.to_string());
        args.push(gcp.map_y.to_string());
    }
    args
}

/// Layer name the translate step gives the output: the source basename
/// without its extension.
fn layer_name(source: &Path) -> String {
    source
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Join the name part fields present on `feature` with single spaces.
fn display_name(feature: &Feature) -> String {
    let parts: Vec<String> = NAME_PARTS
        .iter()
        .filter_map(|field| feature.field_as_string_by_name(field).ok().flatten())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();
    parts.join(" ")
}

fn normalization_error(path: &Path, source: gdal::errors::GdalError) -> GeorefError {
    GeorefError::SchemaNormalization {
        path: path.to_path_buf(),
        source,
    }
}

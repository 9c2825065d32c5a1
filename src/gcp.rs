//! Ground control point tables.
//!
//! A GCP table is the CSV export of a digitizing session: one row per
//! control point, pairing a pixel position on the scanned sheet with the
//! map coordinate it depicts. Two header schemes exist in the wild:
//! `pixelX`/`pixelY` from older digitizers and `sourceX`/`sourceY` from
//! current ones. Both come with `mapX`/`mapY`, `#` comment lines and
//! assorted bookkeeping columns (`enable`, `dX`, `dY`, `residual`) that the
//! pipeline ignores.
//!
//! The raw Y value uses the digitizer's negated-row convention. Parsing
//! inverts the sign so [`GroundControlPoint::source_y`] is the pixel row
//! the raster transform solver expects; [`GroundControlPoint::image_row_y`]
//! recovers the raw value for the vector path, which wants it unchanged.
//!
//! # Example
//!
//! ```rust
//! use georef::gcp::{parse_gcp_reader, GcpColumns};
//!
//! let table = "\
//! #CRS: +proj=longlat +datum=WGS84 +no_defs
//! mapX,mapY,sourceX,sourceY,enable
//! 761196.5,6277336.9,153.1,-1812.4,1
//! ";
//! let gcps = parse_gcp_reader(table.as_bytes(), GcpColumns::Current)?;
//! assert_eq!(gcps[0].source_y, 1812.4);
//! assert_eq!(gcps[0].image_row_y(), -1812.4);
//! # Ok::<(), georef::gcp::GcpParseError>(())
//! ```

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

use crate::error::{GeorefError, Result};

/// One digitized control point, normalized for the raster solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundControlPoint {
    /// Pixel column on the scanned sheet.
    pub source_x: f64,
    /// Pixel row on the scanned sheet, sign-inverted from the raw table value.
    pub source_y: f64,
    /// Easting (or longitude) in the target CRS.
    pub map_x: f64,
    /// Northing (or latitude) in the target CRS.
    pub map_y: f64,
}

impl GroundControlPoint {
    /// Raw Y as the digitizer wrote it (negated row). The vector
    /// reprojection backend expects this convention; the raster solver
    /// expects [`source_y`](Self::source_y).
    #[must_use]
    pub fn image_row_y(&self) -> f64 {
        -self.source_y
    }
}

/// Header scheme of a GCP table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GcpColumns {
    /// `pixelX`/`pixelY`, written by older digitizers.
    Legacy,
    /// `sourceX`/`sourceY`, the current export format.
    Current,
}

impl GcpColumns {
    /// Map the engines' `legacy_format` flag onto a scheme.
    #[must_use]
    pub fn from_legacy_flag(legacy_format: bool) -> Self {
        if legacy_format {
            Self::Legacy
        } else {
            Self::Current
        }
    }

    fn source_x(self) -> &'static str {
        match self {
            Self::Legacy => "pixelX",
            Self::Current => "sourceX",
        }
    }

    fn source_y(self) -> &'static str {
        match self {
            Self::Legacy => "pixelY",
            Self::Current => "sourceY",
        }
    }

    fn other(self) -> Self {
        match self {
            Self::Legacy => Self::Current,
            Self::Current => Self::Legacy,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Legacy => "legacy (pixelX/pixelY)",
            Self::Current => "current (sourceX/sourceY)",
        }
    }
}

/// Error type for GCP table parsing.
#[derive(Debug, Error)]
pub enum GcpParseError {
    /// Required columns absent from the header.
    #[error("{0}")]
    MissingColumns(String),
    /// Both header schemes present at once.
    #[error("table mixes the legacy (pixelX/pixelY) and current (sourceX/sourceY) column schemes")]
    MixedSchemes,
    /// A data cell did not parse.
    #[error("line {line}: {reason}")]
    BadRecord { line: u64, reason: String },
    /// No control points after comments and blanks were dropped.
    #[error("no control points")]
    Empty,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse a GCP table from disk.
///
/// `legacy_format` selects the `pixelX`/`pixelY` header scheme instead of
/// the current `sourceX`/`sourceY` one. Row order is preserved.
///
/// # Errors
/// [`GeorefError::MalformedGcpData`] when the table cannot be read or
/// parsed, [`GeorefError::EmptyGcpSet`] when it holds no control points.
pub fn parse_gcp_file<P: AsRef<Path>>(
    path: P,
    legacy_format: bool,
) -> Result<Vec<GroundControlPoint>> {
    let path = path.as_ref();
    let columns = GcpColumns::from_legacy_flag(legacy_format);
    let parsed = File::open(path)
        .map_err(GcpParseError::from)
        .and_then(|file| parse_gcp_reader(file, columns));

    match parsed {
        Ok(gcps) => Ok(gcps),
        Err(GcpParseError::Empty) => Err(GeorefError::EmptyGcpSet {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(GeorefError::MalformedGcpData {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}

/// Parse a GCP table from any reader.
///
/// Same semantics as [`parse_gcp_file`], surfaced separately so tests and
/// benchmarks can feed in-memory tables.
pub fn parse_gcp_reader<R: io::Read>(
    reader: R,
    columns: GcpColumns,
) -> std::result::Result<Vec<GroundControlPoint>, GcpParseError> {
    let mut rdr = ReaderBuilder::new()
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let index = ColumnIndex::locate(&headers, columns)?;

    let mut gcps = Vec::new();
    for record in rdr.records() {
        let record = record?;
        gcps.push(index.point(&record)?);
    }
    if gcps.is_empty() {
        return Err(GcpParseError::Empty);
    }
    Ok(gcps)
}

/// Positions of the four required columns within one header scheme.
struct ColumnIndex {
    columns: GcpColumns,
    map_x: usize,
    map_y: usize,
    source_x: usize,
    source_y: usize,
}

impl ColumnIndex {
    fn locate(headers: &StringRecord, columns: GcpColumns) -> std::result::Result<Self, GcpParseError> {
        let position = |name: &str| headers.iter().position(|h| h == name);

        let other = columns.other();
        if position(columns.source_x()).is_some() && position(other.source_x()).is_some() {
            return Err(GcpParseError::MixedSchemes);
        }

        let mut missing = Vec::new();
        let mut resolve = |name: &'static str| match position(name) {
            Some(idx) => idx,
            None => {
                missing.push(name);
                0
            }
        };
        let index = Self {
            columns,
            map_x: resolve("mapX"),
            map_y: resolve("mapY"),
            source_x: resolve(columns.source_x()),
            source_y: resolve(columns.source_y()),
        };
        if missing.is_empty() {
            return Ok(index);
        }

        let mut reason = format!("missing required columns {}", missing.join(", "));
        if position(other.source_x()).is_some() || position(other.source_y()).is_some() {
            reason.push_str(&format!(
                "; the table looks like the {} scheme",
                other.describe()
            ));
        }
        Err(GcpParseError::MissingColumns(reason))
    }

    fn point(&self, record: &StringRecord) -> std::result::Result<GroundControlPoint, GcpParseError> {
        let line = record.position().map_or(0, csv::Position::line);
        let field = |idx: usize, name: &str| -> std::result::Result<f64, GcpParseError> {
            let raw = record.get(idx).ok_or_else(|| GcpParseError::BadRecord {
                line,
                reason: format!("missing {name} value"),
            })?;
            raw.parse::<f64>().map_err(|_| GcpParseError::BadRecord {
                line,
                reason: format!("{name} value {raw:?} is not a number"),
            })
        };

        Ok(GroundControlPoint {
            source_x: field(self.source_x, self.columns.source_x())?,
            // The digitizer writes the negated row; flip it for the solver.
            source_y: -field(self.source_y, self.columns.source_y())?,
            map_x: field(self.map_x, "mapX")?,
            map_y: field(self.map_y, "mapY")?,
        })
    }
}

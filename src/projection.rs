//! Target coordinate reference system handling.
//!
//! The batch takes the target CRS as one PROJ.4 string that every row
//! shares. Validating it is the first thing a run does; afterwards the
//! text itself is what the warp utilities consume, since they accept SRS
//! definitions as arguments.

use std::fmt;

use gdal::spatial_ref::SpatialRef;

use crate::error::{GeorefError, Result};

/// A PROJ.4 definition that survived a round through the projection engine.
///
/// `Clone` because the batch driver hands owned copies to row worker
/// threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    proj4: String,
}

impl Projection {
    /// Validate a PROJ.4 definition string.
    ///
    /// # Errors
    /// [`GeorefError::InvalidProjection`] when the projection engine
    /// rejects the definition.
    pub fn from_proj4(definition: &str) -> Result<Self> {
        let definition = definition.trim();
        SpatialRef::from_proj4(definition).map_err(|e| GeorefError::InvalidProjection {
            definition: definition.to_string(),
            source: e,
        })?;
        Ok(Self {
            proj4: definition.to_string(),
        })
    }

    /// The validated PROJ.4 text.
    #[must_use]
    pub fn proj4(&self) -> &str {
        &self.proj4
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.proj4)
    }
}

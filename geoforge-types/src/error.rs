//! Error type used by the crate.

use thiserror::Error;

/// Error enum.
#[derive(Debug, Error)]
pub enum GeoforgeTypesError {
    /// Geometry conversion error.
    #[error("invalid input geometry: {0}")]
    Conversion(String),
    /// GeoJSON value has a different shape than the requested geometry.
    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
    /// A feature has no geometry at all.
    #[error("feature has no geometry")]
    MissingGeometry,
}

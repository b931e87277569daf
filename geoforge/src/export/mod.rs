//! Serialization of layer data for download, and parsing of uploaded GeoJSON.

use std::string::FromUtf8Error;

use geojson::{Feature, FeatureCollection, GeoJson};
use thiserror::Error;

use crate::error::GeoforgeError;
use crate::layer::collection;

mod gpx;

pub use gpx::{to_gpx, GEOFORGE_NAMESPACE, GPX_NAMESPACE};

/// Error of exporting a feature collection.
#[derive(Debug, Error)]
pub enum ExportError {
    /// JSON serialization failed.
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// XML writer failed.
    #[error("failed to write XML: {0}")]
    Xml(#[from] std::io::Error),
    /// Writer produced invalid UTF-8.
    #[error("exported document is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
    /// The geometry cannot be represented in the target format.
    #[error("{0} geometries cannot be exported")]
    UnsupportedGeometry(&'static str),
}

/// Writes the collection as GeoJSON text.
pub fn to_geojson_string(
    collection: &FeatureCollection,
    pretty: bool,
) -> Result<String, ExportError> {
    Ok(if pretty {
        serde_json::to_string_pretty(collection)?
    } else {
        serde_json::to_string(collection)?
    })
}

/// Parses uploaded GeoJSON text.
///
/// A feature collection is returned as is, a single feature or a bare geometry is wrapped into a collection.
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, GeoforgeError> {
    Ok(match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(feature) => collection(vec![feature]),
        GeoJson::Geometry(geometry) => collection(vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }]),
    })
}

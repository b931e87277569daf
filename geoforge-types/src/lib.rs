//! Feature-level helpers shared by the `geoforge` engine and anything that displays its layers.
//!
//! Layers in geoforge hold plain [`geojson::FeatureCollection`] values. This crate provides the small set of
//! operations everybody working with those collections needs to agree on:
//!
//! * [`GeometryKind`] - which of the six GeoJSON geometry kinds a feature or a layer has, and which render family
//!   (point, line or polygon) it belongs to;
//! * [`convert`] - conversion between GeoJSON geometries and [`geo_types`] geometries used for computations;
//! * [`ring`] - minimal closed-ring validation of polygon coordinates;
//! * [`FeatureKey`] - the one and only way to derive a stable identity for a feature in a collection.

pub mod convert;
pub mod error;
mod feature_key;
mod geometry_kind;
pub mod ring;

pub use feature_key::{feature_key, FeatureKey};
pub use geometry_kind::{GeometryFamily, GeometryKind};

// Reexport geojson and geo_types
pub use geo_types;
pub use geojson;

//! Geoforge is a vector geoprocessing engine for interactive web maps. It keeps an ordered set of GeoJSON layers,
//! mirrors them to a map renderer and runs overlay operations on them: buffer, union, difference, intersection,
//! clip, dissolve, Voronoi diagrams and feature extraction.
//!
//! # Quick start
//!
//! ```no_run
//! use geoforge::layer::LayerStore;
//! use geoforge::ops::{DissolveParams, OperationRequest, OutputSpec};
//! use geoforge::{Geoprocessor, ProcessingConfig};
//!
//! # tokio_test::block_on(async {
//! let config = ProcessingConfig::default();
//! let mut store = LayerStore::headless(&config);
//! let data = geoforge::export::parse_feature_collection(r#"{"type": "FeatureCollection", "features": []}"#)?;
//! let parcels = store.add_upload(data, "Parcels", None)?;
//!
//! let processor = Geoprocessor::new(config);
//! let report = processor
//!     .execute(
//!         &mut store,
//!         OperationRequest::Dissolve(DissolveParams {
//!             source: Some(parcels),
//!             field: Some("region".into()),
//!             output: OutputSpec::new("Regions"),
//!             keep_inputs: true,
//!         }),
//!     )
//!     .await?;
//! println!("created layers: {:?}", report.created);
//! # Ok::<(), geoforge::GeoforgeError>(())
//! # });
//! ```
//!
//! # Main components
//!
//! * [`LayerStore`] - ordered registry of layers, the only owner of layer data. Every change is mirrored to a
//!   [`MapRenderer`](layer::MapRenderer).
//! * [`Geoprocessor`] - validates [`OperationRequest`]s, runs them and commits the results to the store.
//! * [`overlay`] - overlay helpers that never fail: when a geometry primitive fails they fall back to simpler
//!   strategies instead of aborting the whole operation.
//! * [`geometry`] - the [`GeometryEngine`](geometry::GeometryEngine) trait with its `geo` based implementation.
//! * [`filter`] and [`export`] - attribute filtering and GeoJSON/GPX output of layer data.

pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod geometry;
pub mod layer;
pub mod naming;
pub mod ops;
pub mod overlay;

mod async_runtime;

#[cfg(test)]
mod tests;

pub use color::Color;
pub use config::ProcessingConfig;
pub use error::GeoforgeError;
pub use layer::LayerStore;
pub use ops::{Geoprocessor, OperationRequest};

// Reexport geoforge_types
pub use geoforge_types;

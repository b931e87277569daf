//! Geoprocessing operations.
//!
//! Every operation reads its input layers from a [`LayerStore`], computes the complete result without touching the
//! store, and only then adds the output layers (and removes the consumed inputs if requested). An operation that
//! fails leaves the store exactly as it was.
//!
//! ```ignore
//! let processor = Geoprocessor::new(ProcessingConfig::default());
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
//! ```

use geo::Geometry;
use geoforge_types::convert::feature_to_geo;
use geoforge_types::GeometryKind;
use geojson::{Feature, FeatureCollection, JsonObject};

use crate::config::ProcessingConfig;
use crate::error::{GeoforgeError, Notification, ValidationError};
use crate::geometry::{GeoEngine, GeometryEngine};
use crate::layer::{Layer, LayerDraft, LayerId, LayerStore, LayerStyle};

mod buffer;
mod clip;
mod difference;
mod dissolve;
mod extract;
mod intersect;
mod union;
mod voronoi;

pub use buffer::{buffer_features, BufferParams};
pub use clip::{clip_features, ClipParams};
pub use difference::{difference_features, DifferenceParams};
pub use dissolve::{dissolve_features, DissolveParams, NULL_GROUP};
pub use extract::{extract_features, ExtractParams};
pub use intersect::{intersect_features, IntersectParams};
pub use union::{union_features, UnionParams};
pub use voronoi::{voronoi_features, VoronoiParams, MIN_VORONOI_POINTS};

/// Kind of a geoprocessing operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Expand features by a distance.
    Buffer,
    /// Merge features of several layers into one area.
    Union,
    /// Remove the area of some layers from another layer.
    Difference,
    /// Pairwise overlaps of two layers.
    Intersect,
    /// Cut layers by a polygon mask.
    Clip,
    /// Merge polygons, optionally grouped by an attribute.
    Dissolve,
    /// Voronoi cells of a point layer.
    Voronoi,
    /// Copy selected features into a new layer.
    Extract,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Buffer => "Buffer",
            Self::Union => "Union",
            Self::Difference => "Difference",
            Self::Intersect => "Intersect",
            Self::Clip => "Clip",
            Self::Dissolve => "Dissolve",
            Self::Voronoi => "Voronoi",
            Self::Extract => "Feature extraction",
        };
        f.write_str(name)
    }
}

/// Name and style of an output layer.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    /// Proposed name. It is made unique when the layer is added.
    pub name: String,
    /// Style of the layer. If not set, a palette color is used.
    pub style: Option<LayerStyle>,
}

impl OutputSpec {
    /// Output with the given name and automatic style.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: None,
        }
    }

    /// Sets the style.
    pub fn with_style(mut self, style: LayerStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            Err(ValidationError::EmptyName)
        } else {
            Ok(())
        }
    }

    pub(crate) fn draft(&self, data: FeatureCollection) -> LayerDraft {
        LayerDraft::new(self.name.clone(), data).with_style(self.style)
    }
}

/// A validated-on-execution request to run one operation.
#[derive(Debug, Clone)]
pub enum OperationRequest {
    /// See [`BufferParams`].
    Buffer(BufferParams),
    /// See [`UnionParams`].
    Union(UnionParams),
    /// See [`DifferenceParams`].
    Difference(DifferenceParams),
    /// See [`IntersectParams`].
    Intersect(IntersectParams),
    /// See [`ClipParams`].
    Clip(ClipParams),
    /// See [`DissolveParams`].
    Dissolve(DissolveParams),
    /// See [`VoronoiParams`].
    Voronoi(VoronoiParams),
    /// See [`ExtractParams`].
    Extract(ExtractParams),
}

impl OperationRequest {
    /// Operation this request runs.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Buffer(_) => OperationKind::Buffer,
            Self::Union(_) => OperationKind::Union,
            Self::Difference(_) => OperationKind::Difference,
            Self::Intersect(_) => OperationKind::Intersect,
            Self::Clip(_) => OperationKind::Clip,
            Self::Dissolve(_) => OperationKind::Dissolve,
            Self::Voronoi(_) => OperationKind::Voronoi,
            Self::Extract(_) => OperationKind::Extract,
        }
    }

    /// Checks user input without looking at the layer data.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Buffer(p) => p.validate(),
            Self::Union(p) => p.validate(),
            Self::Difference(p) => p.validate(),
            Self::Intersect(p) => p.validate(),
            Self::Clip(p) => p.validate(),
            Self::Dissolve(p) => p.validate(),
            Self::Voronoi(p) => p.validate(),
            Self::Extract(p) => p.validate(),
        }
    }
}

/// Layers changed by a successful operation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OperationReport {
    /// New layers, in the order they were added.
    pub created: Vec<LayerId>,
    /// Input layers removed because the caller did not ask to keep them.
    pub removed: Vec<LayerId>,
}

/// Progress of an operation as reported to an [`OperationListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum OperationState {
    /// Operation was accepted and is about to start the computation.
    Processing,
    /// Operation finished and changed the store.
    Completed(OperationReport),
    /// Operation failed. The store was not changed.
    Failed(Notification),
}

/// Receives state changes of operations run by a [`Geoprocessor`].
pub trait OperationListener {
    /// Called when the state of an operation changes.
    fn state_changed(&self, operation: OperationKind, state: &OperationState);
}

/// Runs geoprocessing operations against a [`LayerStore`].
pub struct Geoprocessor<E = GeoEngine> {
    engine: E,
    config: ProcessingConfig,
    listener: Option<Box<dyn OperationListener>>,
}

impl Geoprocessor<GeoEngine> {
    /// Creates a processor backed by the `geo` crate.
    pub fn new(config: ProcessingConfig) -> Self {
        Self::with_engine(GeoEngine::new(), config)
    }
}

impl<E: GeometryEngine> Geoprocessor<E> {
    /// Creates a processor with a custom geometry engine.
    pub fn with_engine(engine: E, config: ProcessingConfig) -> Self {
        Self {
            engine,
            config,
            listener: None,
        }
    }

    /// Sets the listener notified about operation progress.
    pub fn with_listener(mut self, listener: impl OperationListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Configuration of the processor.
    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Geometry engine of the processor.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Runs the operation.
    ///
    /// The listener is notified with [`OperationState::Processing`] and control is returned to the executor once
    /// before the computation starts. The computation itself is synchronous and cannot be cancelled. The returned
    /// result is the only completion signal; the listener receives the same outcome.
    pub async fn execute(
        &self,
        store: &mut LayerStore,
        request: OperationRequest,
    ) -> Result<OperationReport, GeoforgeError> {
        let kind = request.kind();
        self.notify(kind, &OperationState::Processing);

        crate::async_runtime::yield_now().await;

        let result = self.execute_now(store, request);
        match &result {
            Ok(report) => self.notify(kind, &OperationState::Completed(report.clone())),
            Err(err) => {
                log::warn!("{kind} failed: {err}");
                self.notify(kind, &OperationState::Failed(err.notification()));
            }
        }

        result
    }

    /// Runs the operation synchronously, without notifying the listener.
    pub fn execute_now(
        &self,
        store: &mut LayerStore,
        request: OperationRequest,
    ) -> Result<OperationReport, GeoforgeError> {
        request.validate()?;
        log::debug!("Starting {}", request.kind());

        match request {
            OperationRequest::Buffer(params) => self.buffer(store, params),
            OperationRequest::Union(params) => self.union(store, params),
            OperationRequest::Difference(params) => self.difference(store, params),
            OperationRequest::Intersect(params) => self.intersect(store, params),
            OperationRequest::Clip(params) => self.clip(store, params),
            OperationRequest::Dissolve(params) => self.dissolve(store, params),
            OperationRequest::Voronoi(params) => self.voronoi(store, params),
            OperationRequest::Extract(params) => self.extract(store, params),
        }
    }

    fn notify(&self, operation: OperationKind, state: &OperationState) {
        if let Some(listener) = &self.listener {
            listener.state_changed(operation, state);
        }
    }
}

impl<E> std::fmt::Debug for Geoprocessor<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geoprocessor")
            .field("config", &self.config)
            .field("has_listener", &self.listener.is_some())
            .finish_non_exhaustive()
    }
}

/// Returns the layer or [`GeoforgeError::LayerNotFound`].
pub(crate) fn layer(store: &LayerStore, id: LayerId) -> Result<&Layer, GeoforgeError> {
    store.get(id).ok_or(GeoforgeError::LayerNotFound(id))
}

/// Converts every feature geometry of the collection. Features without geometry or with geometry that cannot be
/// converted are skipped.
pub(crate) fn geometries(collection: &FeatureCollection) -> Vec<(&Feature, Geometry<f64>)> {
    collection
        .features
        .iter()
        .filter_map(|feature| match feature_to_geo(feature) {
            Ok(geometry) => Some((feature, geometry)),
            Err(err) => {
                log::warn!("Skipping feature: {err}");
                None
            }
        })
        .collect()
}

/// Creates a feature from a GeoJSON geometry value and properties.
pub(crate) fn new_feature(value: geojson::Value, properties: Option<JsonObject>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(value)),
        id: None,
        properties,
        foreign_members: None,
    }
}

/// Checks that the layers are distinct.
pub(crate) fn ensure_distinct(ids: &[LayerId]) -> Result<(), ValidationError> {
    for (index, id) in ids.iter().enumerate() {
        if ids[..index].contains(id) {
            return Err(ValidationError::DuplicateLayer(*id));
        }
    }

    Ok(())
}

/// Checks that the layer holds polygons.
pub(crate) fn ensure_polygonal(layer: &Layer) -> Result<(), ValidationError> {
    let kind = layer.geometry_type();
    if kind.is_polygonal() {
        Ok(())
    } else {
        Err(ValidationError::WrongGeometry {
            layer: layer.name().to_string(),
            expected: "polygon",
            actual: kind,
        })
    }
}

/// Adds all output layers and then removes the consumed inputs, unless they are to be kept.
///
/// Readiness of the store and geometry types of all drafts are checked before the first layer is added, so either
/// all outputs are added or none.
pub(crate) fn commit(
    store: &mut LayerStore,
    operation: OperationKind,
    drafts: Vec<LayerDraft>,
    consumed: &[LayerId],
    keep_inputs: bool,
) -> Result<OperationReport, GeoforgeError> {
    if !store.is_ready() {
        return Err(GeoforgeError::RendererNotReady);
    }

    if let Some(draft) = drafts.iter().find(|d| d.resolved_geometry_type().is_none()) {
        return Err(GeoforgeError::UnknownGeometryType(draft.name.clone()));
    }

    let mut report = OperationReport::default();
    for draft in drafts {
        report.created.push(store.add(draft)?);
    }

    if !keep_inputs {
        for id in consumed {
            if let Some(layer) = store.remove(*id) {
                report.removed.push(layer.id());
            }
        }
    }

    log::debug!(
        "{operation} created {} layer(s) and removed {} layer(s)",
        report.created.len(),
        report.removed.len()
    );

    Ok(report)
}

/// Draft for an output layer holding polygons. The geometry type is set explicitly if there are no features.
pub(crate) fn polygon_draft(output: &OutputSpec, features: Vec<Feature>) -> LayerDraft {
    let draft = output.draft(crate::layer::collection(features));
    match draft.resolved_geometry_type() {
        Some(_) => draft,
        None => draft.with_geometry_type(GeometryKind::Polygon),
    }
}

//! [Layers](Layer) are named, styled feature collections managed as one unit by the [`LayerStore`].

use geoforge_types::GeometryKind;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;

pub mod render;
mod store;

pub use render::{Camera, DummyRenderer, MapRenderer, RenderLayer, RenderType, Visibility};
pub use store::LayerStore;

/// Opaque unique identifier of a layer. Identifiers are generated when a layer is added to a store and are never
/// reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer-{}", self.0.as_simple())
    }
}

/// Fill style of a layer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// Fill (or stroke, or circle) color.
    pub fill_color: Color,
    /// Opacity in `[0, 1]`.
    pub fill_opacity: f32,
}

impl LayerStyle {
    /// Creates a new style. Opacity is clamped into `[0, 1]`.
    pub fn new(fill_color: Color, fill_opacity: f32) -> Self {
        Self {
            fill_color,
            fill_opacity: fill_opacity.clamp(0.0, 1.0),
        }
    }
}

/// A layer as stored in the [`LayerStore`].
///
/// Layers are only created by the store from a [`LayerDraft`]. The data of a layer is never modified in place:
/// [`LayerStore::update`] replaces data and style wholesale.
#[derive(Debug, Clone)]
pub struct Layer {
    id: LayerId,
    name: String,
    data: FeatureCollection,
    style: LayerStyle,
    visible: bool,
    geometry_type: GeometryKind,
}

impl Layer {
    /// Identifier of the layer.
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Display name, unique among the layers of the store at the moment the layer was added.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Features of the layer.
    pub fn data(&self) -> &FeatureCollection {
        &self.data
    }

    /// Fill style.
    pub fn style(&self) -> LayerStyle {
        self.style
    }

    /// Returns true if the layer is displayed on the map.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Geometry kind of the layer features.
    pub fn geometry_type(&self) -> GeometryKind {
        self.geometry_type
    }

    /// The way the renderer draws this layer.
    pub fn render_type(&self) -> RenderType {
        RenderType::for_kind(self.geometry_type)
    }

    pub(crate) fn render_layer(&self) -> RenderLayer {
        RenderLayer::new(self.render_type(), self.style, self.visible)
    }
}

/// Everything needed to create a layer, except for its identifier.
///
/// When `style` is not set, the store picks the next free palette color. When `geometry_type` is not set, it is
/// taken from the first feature of `data`.
#[derive(Debug, Clone)]
pub struct LayerDraft {
    /// Proposed name. The store appends ` (n)` to it if the name is already taken.
    pub name: String,
    /// Features of the new layer.
    pub data: FeatureCollection,
    /// Fill style.
    pub style: Option<LayerStyle>,
    /// Geometry kind of the layer.
    pub geometry_type: Option<GeometryKind>,
}

impl LayerDraft {
    /// Creates a draft with automatic style and geometry type.
    pub fn new(name: impl Into<String>, data: FeatureCollection) -> Self {
        Self {
            name: name.into(),
            data,
            style: None,
            geometry_type: None,
        }
    }

    /// Sets the style of the layer.
    pub fn with_style(mut self, style: Option<LayerStyle>) -> Self {
        self.style = style;
        self
    }

    /// Sets the geometry kind explicitly. Needed for layers that may have no features.
    pub fn with_geometry_type(mut self, geometry_type: GeometryKind) -> Self {
        self.geometry_type = Some(geometry_type);
        self
    }

    /// Geometry kind of the draft: the explicit one, or the kind of the first feature.
    pub fn resolved_geometry_type(&self) -> Option<GeometryKind> {
        self.geometry_type.or_else(|| {
            self.data
                .features
                .first()
                .and_then(GeometryKind::of_feature)
        })
    }
}

/// Creates an empty feature collection.
pub fn empty_collection() -> FeatureCollection {
    collection(Vec::new())
}

/// Wraps features into a feature collection without bounding box or foreign members.
pub fn collection(features: Vec<geojson::Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

//! Contract between the [`LayerStore`](super::LayerStore) and the map that displays its layers.
//!
//! The store is the single source of truth. The renderer only mirrors it: every store mutation is translated into
//! calls of [`MapRenderer`] methods, and the renderer state can be thrown away and rebuilt from the store at any
//! moment.

use geoforge_types::{GeometryFamily, GeometryKind};
use geojson::{FeatureCollection, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{LayerId, LayerStyle};

/// Radius of circles representing point features, in pixels.
pub const CIRCLE_RADIUS: f64 = 6.0;
/// Width of lines representing line features, in pixels.
pub const LINE_WIDTH: f64 = 2.0;

/// The way a layer is drawn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderType {
    /// Filled polygons.
    Fill,
    /// Circles at point positions.
    Circle,
    /// Stroked lines.
    Line,
}

impl RenderType {
    /// Render type for layers of the given geometry kind.
    pub fn for_kind(kind: GeometryKind) -> Self {
        match kind.family() {
            GeometryFamily::Point => Self::Circle,
            GeometryFamily::Line => Self::Line,
            GeometryFamily::Polygon => Self::Fill,
        }
    }

    /// Style-spec name of the render type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fill => "fill",
            Self::Circle => "circle",
            Self::Line => "line",
        }
    }

    /// Paint properties for a layer of this type drawn with the given style.
    pub fn paint(&self, style: &LayerStyle) -> JsonObject {
        let color = style.fill_color.to_hex();
        let opacity = style.fill_opacity;
        let paint = match self {
            Self::Fill => json!({
                "fill-color": color,
                "fill-opacity": opacity,
                "fill-outline-color": style.fill_color.darken(0.3).to_hex(),
            }),
            Self::Circle => json!({
                "circle-color": color,
                "circle-opacity": opacity,
                "circle-radius": CIRCLE_RADIUS,
            }),
            Self::Line => json!({
                "line-color": color,
                "line-opacity": opacity,
                "line-width": LINE_WIDTH,
            }),
        };

        match paint {
            JsonValue::Object(map) => map,
            _ => JsonObject::new(),
        }
    }
}

/// Value of the `visibility` layout property.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Layer is drawn.
    Visible,
    /// Layer is hidden.
    None,
}

impl Visibility {
    /// Style-spec value of the property.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::None => "none",
        }
    }
}

impl From<bool> for Visibility {
    fn from(visible: bool) -> Self {
        if visible {
            Self::Visible
        } else {
            Self::None
        }
    }
}

/// Description of a render layer passed to [`MapRenderer::add_layer`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderLayer {
    /// How the layer is drawn.
    pub render_type: RenderType,
    /// Paint properties.
    pub paint: JsonObject,
    /// Initial visibility.
    pub visibility: Visibility,
}

impl RenderLayer {
    pub(crate) fn new(render_type: RenderType, style: LayerStyle, visible: bool) -> Self {
        Self {
            render_type,
            paint: render_type.paint(&style),
            visibility: visible.into(),
        }
    }
}

/// Camera state of the map that must survive a base style swap.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Longitude and latitude of the view center.
    pub center: [f64; 2],
    /// Zoom level.
    pub zoom: f64,
    /// Rotation in degrees.
    pub bearing: f64,
    /// Tilt in degrees.
    pub pitch: f64,
}

/// Map rendering surface the layer store mirrors its layers to.
///
/// Each store layer corresponds to one source and one render layer, both identified by the [`LayerId`]. Render
/// layers are drawn in the order they were added: later layers are drawn on top.
pub trait MapRenderer {
    /// Returns false while the map is not able to accept sources and layers yet.
    fn is_ready(&self) -> bool;
    /// Adds a GeoJSON source.
    fn add_source(&mut self, id: LayerId, data: &FeatureCollection);
    /// Removes a source. Sources can only be removed after the layers using them.
    fn remove_source(&mut self, id: LayerId);
    /// Adds a render layer on top of all other layers.
    fn add_layer(&mut self, id: LayerId, layer: &RenderLayer);
    /// Removes a render layer.
    fn remove_layer(&mut self, id: LayerId);
    /// Sets a paint property of a render layer.
    fn set_paint_property(&mut self, id: LayerId, name: &str, value: JsonValue);
    /// Sets a layout property of a render layer.
    fn set_layout_property(&mut self, id: LayerId, name: &str, value: JsonValue);
    /// Current camera state.
    fn camera(&self) -> Camera;
    /// Moves the camera.
    fn set_camera(&mut self, camera: Camera);
    /// Replaces the base style. All sources and layers are lost after this call.
    fn load_style(&mut self, style: &str);
}

/// Renderer that is always ready and draws nothing. Used by headless stores.
#[derive(Debug, Default, Copy, Clone)]
pub struct DummyRenderer {
    camera: Camera,
}

impl MapRenderer for DummyRenderer {
    fn is_ready(&self) -> bool {
        true
    }

    fn add_source(&mut self, _id: LayerId, _data: &FeatureCollection) {}

    fn remove_source(&mut self, _id: LayerId) {}

    fn add_layer(&mut self, _id: LayerId, _layer: &RenderLayer) {}

    fn remove_layer(&mut self, _id: LayerId) {}

    fn set_paint_property(&mut self, _id: LayerId, _name: &str, _value: JsonValue) {}

    fn set_layout_property(&mut self, _id: LayerId, _name: &str, _value: JsonValue) {}

    fn camera(&self) -> Camera {
        self.camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn load_style(&mut self, _style: &str) {}
}

use geojson::{FeatureCollection, JsonValue};

use super::render::{DummyRenderer, MapRenderer, Visibility};
use super::{Layer, LayerDraft, LayerId, LayerStyle};
use crate::color::Color;
use crate::config::ProcessingConfig;
use crate::error::GeoforgeError;
use crate::naming::{pick_color, unique_name};

/// Ordered registry of layers. The single source of truth about what layers exist and how they look.
///
/// Layers are drawn in the order they are stored: the last layer is drawn on top. The store mirrors every change to
/// its [`MapRenderer`], which never holds any state the store cannot rebuild.
///
/// The store can only be changed through its methods:
/// * [`LayerStore::add`] - creates a layer from a [`LayerDraft`];
/// * [`LayerStore::remove`] - deletes a layer;
/// * [`LayerStore::update`] - replaces data and style of a layer;
/// * [`LayerStore::toggle_visibility`] - shows or hides a layer;
/// * [`LayerStore::reorder`] - moves a layer to another position.
///
/// ```
/// use geoforge::layer::{empty_collection, LayerDraft, LayerStore};
/// use geoforge::config::ProcessingConfig;
/// use geoforge_types::GeometryKind;
///
/// let mut store = LayerStore::headless(&ProcessingConfig::default());
/// let a = store.add(LayerDraft::new("Roads", empty_collection()).with_geometry_type(GeometryKind::LineString))?;
/// let b = store.add(LayerDraft::new("Roads", empty_collection()).with_geometry_type(GeometryKind::LineString))?;
///
/// assert_eq!(store.get(b).unwrap().name(), "Roads (1)");
/// store.reorder(1, 0);
/// assert_eq!(store.iter().next().unwrap().id(), b);
/// # Ok::<(), geoforge::error::GeoforgeError>(())
/// ```
pub struct LayerStore {
    layers: Vec<Layer>,
    renderer: Box<dyn MapRenderer>,
    palette: Vec<Color>,
    default_opacity: f32,
    created_count: u64,
}

impl LayerStore {
    /// Creates an empty store that mirrors its layers to the given renderer.
    pub fn new(renderer: impl MapRenderer + 'static, config: &ProcessingConfig) -> Self {
        Self {
            layers: Vec::new(),
            renderer: Box::new(renderer),
            palette: config.palette.clone(),
            default_opacity: config.default_fill_opacity,
            created_count: 0,
        }
    }

    /// Creates an empty store without a map.
    pub fn headless(config: &ProcessingConfig) -> Self {
        Self::new(DummyRenderer::default(), config)
    }

    /// Returns true if the renderer can accept new layers.
    pub fn is_ready(&self) -> bool {
        self.renderer.is_ready()
    }

    /// Adds a new layer on top of all other layers and returns its id.
    ///
    /// The name of the draft is made unique among the current layer names and, if the draft has no style, the next
    /// free palette color is assigned.
    ///
    /// The draft is rejected and the store is left untouched if the renderer is not ready, or if the geometry type of
    /// the layer is neither given explicitly nor can be taken from its first feature.
    pub fn add(&mut self, draft: LayerDraft) -> Result<LayerId, GeoforgeError> {
        if !self.is_ready() {
            log::warn!("Layer '{}' is not added: map is not ready", draft.name);
            return Err(GeoforgeError::RendererNotReady);
        }

        let Some(geometry_type) = draft.resolved_geometry_type() else {
            log::warn!(
                "Layer '{}' is not added: geometry type cannot be determined",
                draft.name
            );
            return Err(GeoforgeError::UnknownGeometryType(draft.name));
        };

        let style = match draft.style {
            Some(style) => style,
            None => LayerStyle::new(self.next_color(), self.default_opacity),
        };

        let layer = Layer {
            id: LayerId::generate(),
            name: self.unique_name(&draft.name),
            data: draft.data,
            style,
            visible: true,
            geometry_type,
        };
        self.created_count += 1;

        self.renderer.add_source(layer.id, &layer.data);
        self.renderer.add_layer(layer.id, &layer.render_layer());

        log::info!(
            "Added layer '{}' ({}) with {} features",
            layer.name,
            layer.geometry_type,
            layer.data.features.len()
        );

        let id = layer.id;
        self.layers.push(layer);
        Ok(id)
    }

    /// Adds a layer from uploaded data. Same as [`LayerStore::add`], the name is made unique and a color is picked
    /// if no style is given.
    pub fn add_upload(
        &mut self,
        data: FeatureCollection,
        name: &str,
        style: Option<LayerStyle>,
    ) -> Result<LayerId, GeoforgeError> {
        log::debug!("Adding uploaded layer '{name}'");
        self.add(LayerDraft::new(name, data).with_style(style))
    }

    /// Removes the layer and its render state. Returns the removed layer, or `None` if there is no layer with this
    /// id.
    pub fn remove(&mut self, id: LayerId) -> Option<Layer> {
        let index = self.index_of(id)?;
        let layer = self.layers.remove(index);

        self.renderer.remove_layer(id);
        self.renderer.remove_source(id);

        log::info!("Removed layer '{}'", layer.name);
        Some(layer)
    }

    /// Replaces the name, data and style of an existing layer, keeping its id, position and visibility. Returns
    /// false and does nothing if there is no layer with this id.
    ///
    /// The geometry type is recomputed from the draft; if it cannot be determined, the old one is kept. When the
    /// draft has no style, the current style is kept.
    pub fn update(&mut self, id: LayerId, draft: LayerDraft) -> bool {
        let Some(index) = self.index_of(id) else {
            log::debug!("Update of unknown layer {id} is ignored");
            return false;
        };

        let geometry_type = draft.resolved_geometry_type();
        let layer = &mut self.layers[index];
        let data_changed = layer.data != draft.data;
        let type_changed = geometry_type.is_some_and(|kind| kind != layer.geometry_type);

        layer.name = draft.name;
        layer.data = draft.data;
        if let Some(style) = draft.style {
            layer.style = style;
        }
        if let Some(kind) = geometry_type {
            layer.geometry_type = kind;
        }

        if data_changed || type_changed {
            // Sources cannot be patched in place, and re-adding one puts it on top.
            self.rebuild();
        } else {
            let layer = &self.layers[index];
            for (name, value) in layer.render_type().paint(&layer.style) {
                self.renderer.set_paint_property(id, &name, value);
            }
        }

        true
    }

    /// Shows a hidden layer or hides a visible one. Returns the new visibility, or `None` if there is no layer with
    /// this id.
    pub fn toggle_visibility(&mut self, id: LayerId) -> Option<bool> {
        let index = self.index_of(id)?;
        let layer = &mut self.layers[index];
        layer.visible = !layer.visible;

        let visibility = Visibility::from(layer.visible);
        self.renderer.set_layout_property(
            id,
            "visibility",
            JsonValue::String(visibility.as_str().into()),
        );

        Some(layer.visible)
    }

    /// Moves the layer at `from` to position `to`, shifting the layers in between. The renderer draw order is rebuilt.
    ///
    /// Returns false and does nothing if either index is out of bounds.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        if from >= self.layers.len() || to >= self.layers.len() {
            return false;
        }

        if from != to {
            let layer = self.layers.remove(from);
            self.layers.insert(to, layer);
            self.rebuild();
        }

        true
    }

    /// Tears down all render state and adds every layer again in store order.
    pub fn rebuild(&mut self) {
        for layer in &self.layers {
            self.renderer.remove_layer(layer.id);
            self.renderer.remove_source(layer.id);
        }

        self.add_all_to_renderer();
    }

    /// Swaps the base style of the map, keeping the camera position and all layers.
    pub fn set_base_style(&mut self, style: &str) {
        let camera = self.renderer.camera();
        self.renderer.load_style(style);
        self.renderer.set_camera(camera);

        // A style swap drops every source and layer of the map.
        self.add_all_to_renderer();
    }

    fn add_all_to_renderer(&mut self) {
        for layer in &self.layers {
            self.renderer.add_source(layer.id, &layer.data);
            self.renderer.add_layer(layer.id, &layer.render_layer());
        }
    }

    /// Returns the layer with the given id.
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    /// Returns the first layer with the given name.
    pub fn find_by_name(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Position of the layer in the draw order.
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id == id)
    }

    /// Iterates over layers in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter()
    }

    /// Iterates over visible layers in draw order.
    pub fn iter_visible(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().filter(|layer| layer.visible)
    }

    /// Names of all layers.
    pub fn names(&self) -> impl Iterator<Item = &str> + Clone + '_ {
        self.layers.iter().map(|layer| layer.name.as_str())
    }

    /// Count of layers in the store.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if the store contains no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Returns `name` if it is free, or the name with the first free ` (n)` suffix.
    pub fn unique_name(&self, name: &str) -> String {
        unique_name(self.names(), name)
    }

    /// Picks a color for a new layer.
    pub fn next_color(&self) -> Color {
        let used: Vec<Color> = self.layers.iter().map(|layer| layer.style.fill_color).collect();
        pick_color(&used, &self.palette, self.created_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::DEFAULT_PALETTE;
    use crate::layer::{collection, empty_collection, RenderType};
    use crate::tests::{point_feature, polygon_feature, unit_square, RecordingRenderer, RenderCall};
    use assert_matches::assert_matches;
    use geoforge_types::GeometryKind;

    fn store_with_recorder() -> (LayerStore, RecordingRenderer) {
        let renderer = RecordingRenderer::default();
        let store = LayerStore::new(renderer.clone(), &ProcessingConfig::default());
        (store, renderer)
    }

    fn points_draft(name: &str) -> LayerDraft {
        LayerDraft::new(name, collection(vec![point_feature(1.0, 2.0)]))
    }

    #[test]
    fn add_assigns_unique_names_and_palette_colors() {
        let mut store = LayerStore::headless(&ProcessingConfig::default());
        let a = store.add(points_draft("Wells")).unwrap();
        let b = store.add(points_draft("Wells")).unwrap();
        let c = store.add(points_draft("Wells")).unwrap();

        assert_eq!(store.get(a).unwrap().name(), "Wells");
        assert_eq!(store.get(b).unwrap().name(), "Wells (1)");
        assert_eq!(store.get(c).unwrap().name(), "Wells (2)");

        assert_eq!(store.get(a).unwrap().style().fill_color, DEFAULT_PALETTE[0]);
        assert_eq!(store.get(b).unwrap().style().fill_color, DEFAULT_PALETTE[1]);
        assert_eq!(store.get(c).unwrap().geometry_type(), GeometryKind::Point);
        assert_eq!(store.get(c).unwrap().render_type(), RenderType::Circle);
    }

    #[test]
    fn add_rejects_layers_without_geometry_type() {
        let mut store = LayerStore::headless(&ProcessingConfig::default());
        assert_matches!(
            store.add(LayerDraft::new("Empty", empty_collection())),
            Err(GeoforgeError::UnknownGeometryType(name)) if name == "Empty"
        );
        assert!(store.is_empty());

        let draft = LayerDraft::new("Empty", empty_collection())
            .with_geometry_type(GeometryKind::Polygon);
        let id = store.add(draft).unwrap();
        assert_eq!(store.get(id).unwrap().render_type(), RenderType::Fill);
    }

    #[test]
    fn add_rejects_when_renderer_is_not_ready() {
        let (mut store, renderer) = store_with_recorder();
        renderer.set_ready(false);

        assert_matches!(store.add(points_draft("Wells")), Err(GeoforgeError::RendererNotReady));
        assert!(store.is_empty());
        assert!(renderer.calls().is_empty());
    }

    #[test]
    fn add_and_remove_mirror_to_renderer() {
        let (mut store, renderer) = store_with_recorder();
        let id = store.add(points_draft("Wells")).unwrap();
        assert_eq!(
            renderer.calls(),
            vec![RenderCall::AddSource(id), RenderCall::AddLayer(id, RenderType::Circle)]
        );

        renderer.clear();
        assert!(store.remove(id).is_some());
        assert_eq!(
            renderer.calls(),
            vec![RenderCall::RemoveLayer(id), RenderCall::RemoveSource(id)]
        );

        renderer.clear();
        assert!(store.remove(id).is_none());
        assert!(renderer.calls().is_empty());
    }

    #[test]
    fn toggle_visibility_sets_layout_property() {
        let (mut store, renderer) = store_with_recorder();
        let id = store.add(points_draft("Wells")).unwrap();
        renderer.clear();

        assert_eq!(store.toggle_visibility(id), Some(false));
        assert_eq!(store.iter_visible().count(), 0);
        assert_eq!(store.toggle_visibility(id), Some(true));
        assert_eq!(
            renderer.calls(),
            vec![
                RenderCall::SetLayout(id, "visibility".into(), "none".into()),
                RenderCall::SetLayout(id, "visibility".into(), "visible".into()),
            ]
        );
    }

    #[test]
    fn reorder_rebuilds_draw_order() {
        let (mut store, renderer) = store_with_recorder();
        let a = store.add(points_draft("A")).unwrap();
        let b = store.add(points_draft("B")).unwrap();
        let c = store.add(points_draft("C")).unwrap();
        renderer.clear();

        assert!(store.reorder(2, 0));
        let order: Vec<_> = store.iter().map(|l| l.id()).collect();
        assert_eq!(order, vec![c, a, b]);
        assert_eq!(renderer.drawn_layers(), vec![c, a, b]);

        assert!(!store.reorder(3, 0));
    }

    #[test]
    fn update_restyles_in_place() {
        let (mut store, renderer) = store_with_recorder();
        let id = store.add(points_draft("Wells")).unwrap();
        renderer.clear();

        let style = LayerStyle::new(Color::BLACK, 1.0);
        let data = store.get(id).unwrap().data().clone();
        assert!(store.update(id, LayerDraft::new("Springs", data).with_style(Some(style))));

        let layer = store.get(id).unwrap();
        assert_eq!(layer.name(), "Springs");
        assert_eq!(layer.style(), style);
        assert!(renderer
            .calls()
            .iter()
            .all(|call| matches!(call, RenderCall::SetPaint(..))));
    }

    #[test]
    fn update_with_new_data_keeps_position() {
        let (mut store, renderer) = store_with_recorder();
        let a = store.add(points_draft("A")).unwrap();
        let b = store.add(points_draft("B")).unwrap();

        let draft = LayerDraft::new("A", collection(vec![polygon_feature(unit_square(0.0, 0.0))]));
        assert!(store.update(a, draft));
        assert_eq!(store.index_of(a), Some(0));
        assert_eq!(store.get(a).unwrap().geometry_type(), GeometryKind::Polygon);
        assert_eq!(renderer.drawn_layers(), vec![a, b]);

        assert!(!store.update(LayerId::generate(), points_draft("X")));
    }

    #[test]
    fn base_style_swap_keeps_camera_and_layers() {
        let (mut store, renderer) = store_with_recorder();
        let a = store.add(points_draft("A")).unwrap();
        let b = store.add(points_draft("B")).unwrap();
        let camera = crate::layer::Camera {
            center: [10.0, 50.0],
            zoom: 7.0,
            bearing: 15.0,
            pitch: 30.0,
        };
        renderer.set_camera_state(camera);

        store.set_base_style("https://example.com/dark.json");

        assert_eq!(renderer.camera_state(), camera);
        assert_eq!(renderer.drawn_layers(), vec![a, b]);
    }
}

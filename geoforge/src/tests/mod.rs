use std::cell::{Cell, RefCell};
use std::rc::Rc;

use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon, Rect};
use geoforge_types::convert::from_geo;
use geojson::{Feature, FeatureCollection, JsonValue};

use crate::geometry::{GeoEngine, GeometryEngine, GeometryError};
use crate::layer::{Camera, LayerId, MapRenderer, RenderLayer, RenderType};

mod scenarios;

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn unit_square(x: f64, y: f64) -> Polygon<f64> {
    Rect::new((x, y), (x + 1.0, y + 1.0)).to_polygon()
}

pub(crate) fn feature(geometry: Geometry<f64>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geojson::Geometry::new(from_geo(&geometry).unwrap())),
        id: None,
        properties: Some(Default::default()),
        foreign_members: None,
    }
}

pub(crate) fn point_feature(x: f64, y: f64) -> Feature {
    feature(Geometry::Point(Point::new(x, y)))
}

pub(crate) fn multi_point_feature(points: &[(f64, f64)]) -> Feature {
    feature(Geometry::MultiPoint(points.iter().map(|&(x, y)| Point::new(x, y)).collect()))
}

pub(crate) fn line_feature(points: &[(f64, f64)]) -> Feature {
    feature(Geometry::LineString(LineString::from(points.to_vec())))
}

pub(crate) fn multi_line_feature(lines: Vec<Vec<(f64, f64)>>) -> Feature {
    feature(Geometry::MultiLineString(MultiLineString::new(
        lines.into_iter().map(LineString::from).collect(),
    )))
}

pub(crate) fn polygon_feature(polygon: Polygon<f64>) -> Feature {
    feature(Geometry::Polygon(polygon))
}

pub(crate) fn multi_polygon_feature(polygons: Vec<Polygon<f64>>) -> Feature {
    feature(Geometry::MultiPolygon(MultiPolygon::new(polygons)))
}

/// Geometry engine that fails selected primitives and counts intersection calls.
#[derive(Debug, Default)]
pub(crate) struct FailingEngine {
    inner: GeoEngine,
    fail_union: bool,
    fail_difference: bool,
    fail_dissolve: bool,
    intersection_calls: Cell<usize>,
}

impl FailingEngine {
    pub(crate) fn fail_union(mut self) -> Self {
        self.fail_union = true;
        self
    }

    pub(crate) fn fail_difference(mut self) -> Self {
        self.fail_difference = true;
        self
    }

    pub(crate) fn fail_dissolve(mut self) -> Self {
        self.fail_dissolve = true;
        self
    }

    pub(crate) fn intersection_calls(&self) -> usize {
        self.intersection_calls.get()
    }

    fn failure(operation: &'static str) -> GeometryError {
        GeometryError::Panicked {
            operation,
            message: "degenerate input".into(),
        }
    }
}

impl GeometryEngine for FailingEngine {
    fn union(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        if self.fail_union {
            return Err(Self::failure("union"));
        }
        self.inner.union(a, b)
    }

    fn difference(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        if self.fail_difference {
            return Err(Self::failure("difference"));
        }
        self.inner.difference(a, b)
    }

    fn intersection(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        self.intersection_calls.set(self.intersection_calls.get() + 1);
        self.inner.intersection(a, b)
    }

    fn dissolve(&self, polygons: &[Polygon<f64>]) -> Result<MultiPolygon<f64>, GeometryError> {
        if self.fail_dissolve {
            return Err(Self::failure("dissolve"));
        }
        self.inner.dissolve(polygons)
    }

    fn buffer(
        &self,
        geometry: &Geometry<f64>,
        distance: f64,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        self.inner.buffer(geometry, distance)
    }

    fn contains_point(&self, area: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
        self.inner.contains_point(area, point)
    }

    fn contains_line(&self, area: &MultiPolygon<f64>, line: &LineString<f64>) -> bool {
        self.inner.contains_line(area, line)
    }

    fn split_line(
        &self,
        line: &LineString<f64>,
        cutter: &MultiLineString<f64>,
    ) -> Vec<LineString<f64>> {
        self.inner.split_line(line, cutter)
    }

    fn voronoi(&self, sites: &[Point<f64>], bounds: Rect<f64>) -> Vec<Option<Polygon<f64>>> {
        self.inner.voronoi(sites, bounds)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RenderCall {
    AddSource(LayerId),
    RemoveSource(LayerId),
    AddLayer(LayerId, RenderType),
    RemoveLayer(LayerId),
    SetPaint(LayerId, String, JsonValue),
    SetLayout(LayerId, String, String),
    LoadStyle(String),
}

#[derive(Debug)]
struct RecorderState {
    ready: bool,
    calls: Vec<RenderCall>,
    drawn: Vec<LayerId>,
    camera: Camera,
}

/// Renderer that records all calls. Clones share the same record.
#[derive(Debug, Clone)]
pub(crate) struct RecordingRenderer {
    state: Rc<RefCell<RecorderState>>,
}

impl Default for RecordingRenderer {
    fn default() -> Self {
        Self {
            state: Rc::new(RefCell::new(RecorderState {
                ready: true,
                calls: vec![],
                drawn: vec![],
                camera: Camera::default(),
            })),
        }
    }
}

impl RecordingRenderer {
    pub(crate) fn set_ready(&self, ready: bool) {
        self.state.borrow_mut().ready = ready;
    }

    pub(crate) fn calls(&self) -> Vec<RenderCall> {
        self.state.borrow().calls.clone()
    }

    pub(crate) fn clear(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Layers currently on the map, bottom to top.
    pub(crate) fn drawn_layers(&self) -> Vec<LayerId> {
        self.state.borrow().drawn.clone()
    }

    pub(crate) fn set_camera_state(&self, camera: Camera) {
        self.state.borrow_mut().camera = camera;
    }

    pub(crate) fn camera_state(&self) -> Camera {
        self.state.borrow().camera
    }

    fn record(&self, call: RenderCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl MapRenderer for RecordingRenderer {
    fn is_ready(&self) -> bool {
        self.state.borrow().ready
    }

    fn add_source(&mut self, id: LayerId, _data: &FeatureCollection) {
        self.record(RenderCall::AddSource(id));
    }

    fn remove_source(&mut self, id: LayerId) {
        self.record(RenderCall::RemoveSource(id));
    }

    fn add_layer(&mut self, id: LayerId, layer: &RenderLayer) {
        self.record(RenderCall::AddLayer(id, layer.render_type));
        self.state.borrow_mut().drawn.push(id);
    }

    fn remove_layer(&mut self, id: LayerId) {
        self.record(RenderCall::RemoveLayer(id));
        self.state.borrow_mut().drawn.retain(|drawn| *drawn != id);
    }

    fn set_paint_property(&mut self, id: LayerId, name: &str, value: JsonValue) {
        self.record(RenderCall::SetPaint(id, name.to_string(), value));
    }

    fn set_layout_property(&mut self, id: LayerId, name: &str, value: JsonValue) {
        let value = value.as_str().map(str::to_string).unwrap_or_else(|| value.to_string());
        self.record(RenderCall::SetLayout(id, name.to_string(), value));
    }

    fn camera(&self) -> Camera {
        self.state.borrow().camera
    }

    fn set_camera(&mut self, camera: Camera) {
        self.state.borrow_mut().camera = camera;
    }

    fn load_style(&mut self, style: &str) {
        self.record(RenderCall::LoadStyle(style.to_string()));
        let mut state = self.state.borrow_mut();
        state.drawn.clear();
        state.camera = Camera::default();
    }
}

//! Extraction of parts of a given dimension from arbitrary geometries.

use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon};

/// All polygons of the geometry. Non-polygonal parts are ignored.
pub fn polygons(geometry: &Geometry<f64>) -> Vec<Polygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(polygons).collect(),
        _ => vec![],
    }
}

/// Polygonal part of the geometry as one area, or `None` if the geometry has no polygonal part.
pub fn area(geometry: &Geometry<f64>) -> Option<MultiPolygon<f64>> {
    let parts = polygons(geometry);
    if parts.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(parts))
    }
}

/// All line strings of the geometry. Non-linear parts are ignored.
pub fn lines(geometry: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::Line(l) => vec![LineString::from(*l)],
        Geometry::LineString(ls) => vec![ls.clone()],
        Geometry::MultiLineString(mls) => mls.0.clone(),
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(lines).collect(),
        _ => vec![],
    }
}

/// All points of the geometry. Non-point parts are ignored.
pub fn points(geometry: &Geometry<f64>) -> Vec<Point<f64>> {
    match geometry {
        Geometry::Point(p) => vec![*p],
        Geometry::MultiPoint(mp) => mp.0.clone(),
        Geometry::GeometryCollection(gc) => gc.iter().flat_map(points).collect(),
        _ => vec![],
    }
}

/// Boundary rings of all polygons of the area as lines.
pub fn boundary(area: &MultiPolygon<f64>) -> MultiLineString<f64> {
    MultiLineString::new(
        area.iter()
            .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
            .cloned()
            .collect(),
    )
}

use std::panic::{catch_unwind, AssertUnwindSafe};

use geo::algorithm::Buffer;
use geo::{
    unary_union, BooleanOps, Contains, CoordsIter, Geometry, Intersects, LineString,
    MultiLineString, MultiPolygon, Point, Polygon, Rect,
};

use super::{split, voronoi, GeometryEngine, GeometryError};

/// [`GeometryEngine`] implemented with the `geo` crate.
///
/// Overlay and buffer calls are guarded: inputs with non-finite coordinates are rejected, and a panic inside `geo`
/// is converted into [`GeometryError::Panicked`] instead of unwinding into the caller.
#[derive(Debug, Default, Copy, Clone)]
pub struct GeoEngine;

impl GeoEngine {
    /// Creates a new engine.
    pub fn new() -> Self {
        Self
    }
}

impl GeometryEngine for GeoEngine {
    fn union(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        ensure_finite("union", a)?;
        ensure_finite("union", b)?;
        guarded("union", || a.union(b))
    }

    fn difference(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        ensure_finite("difference", a)?;
        ensure_finite("difference", b)?;
        guarded("difference", || a.difference(b))
    }

    fn intersection(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        ensure_finite("intersection", a)?;
        ensure_finite("intersection", b)?;
        guarded("intersection", || a.intersection(b))
    }

    fn dissolve(&self, polygons: &[Polygon<f64>]) -> Result<MultiPolygon<f64>, GeometryError> {
        let input = MultiPolygon::new(polygons.to_vec());
        ensure_finite("dissolve", &input)?;
        guarded("dissolve", || unary_union(input.0.iter()))
    }

    fn buffer(
        &self,
        geometry: &Geometry<f64>,
        distance: f64,
    ) -> Result<MultiPolygon<f64>, GeometryError> {
        ensure_finite("buffer", geometry)?;
        if !distance.is_finite() {
            return Err(GeometryError::NonFinite("buffer"));
        }

        if distance == 0.0 {
            return Ok(zero_buffer(geometry));
        }

        guarded("buffer", || geometry.buffer(distance))
    }

    fn contains_point(&self, area: &MultiPolygon<f64>, point: &Point<f64>) -> bool {
        area.intersects(point)
    }

    fn contains_line(&self, area: &MultiPolygon<f64>, line: &LineString<f64>) -> bool {
        guarded("contains", || area.contains(line)).unwrap_or(false)
    }

    fn split_line(
        &self,
        line: &LineString<f64>,
        cutter: &MultiLineString<f64>,
    ) -> Vec<LineString<f64>> {
        split::split_line(line, cutter)
    }

    fn voronoi(&self, sites: &[Point<f64>], bounds: Rect<f64>) -> Vec<Option<Polygon<f64>>> {
        voronoi::voronoi_cells(sites, bounds)
    }
}

/// Buffer of zero width: the area of polygonal geometries, nothing for points and lines.
fn zero_buffer(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Polygon(p) => MultiPolygon::new(vec![p.clone()]),
        Geometry::MultiPolygon(mp) => mp.clone(),
        Geometry::Rect(r) => MultiPolygon::new(vec![r.to_polygon()]),
        Geometry::Triangle(t) => MultiPolygon::new(vec![t.to_polygon()]),
        Geometry::GeometryCollection(gc) => {
            MultiPolygon::new(gc.iter().flat_map(|g| zero_buffer(g).0).collect())
        }
        _ => MultiPolygon::new(vec![]),
    }
}

fn ensure_finite(
    operation: &'static str,
    geometry: &impl CoordsIter<Scalar = f64>,
) -> Result<(), GeometryError> {
    if geometry
        .coords_iter()
        .all(|c| c.x.is_finite() && c.y.is_finite())
    {
        Ok(())
    } else {
        Err(GeometryError::NonFinite(operation))
    }
}

fn guarded<T>(operation: &'static str, f: impl FnOnce() -> T) -> Result<T, GeometryError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::warn!("Geometry primitive {operation} panicked: {message}");
        GeometryError::Panicked { operation, message }
    })
}

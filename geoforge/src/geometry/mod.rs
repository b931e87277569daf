//! Geometry primitives the operations are built from.
//!
//! All primitives are accessed through the [`GeometryEngine`] trait, so the robust overlay helpers and the
//! operations can be tested against engines that fail on purpose. [`GeoEngine`] is the implementation backed by the
//! `geo` crate.

use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Point, Polygon, Rect};
use thiserror::Error;

mod engine;
pub mod flatten;
pub mod projection;
pub mod split;
pub mod voronoi;

pub use engine::GeoEngine;

/// Failure of a geometry primitive.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// The primitive panicked. The panic was caught at the engine boundary.
    #[error("{operation} panicked: {message}")]
    Panicked {
        /// Name of the primitive.
        operation: &'static str,
        /// Panic message, if it was a string.
        message: String,
    },
    /// Input contains NaN or infinite coordinates.
    #[error("{0} input contains non-finite coordinates")]
    NonFinite(&'static str),
}

/// Computational geometry primitives used by the engine.
///
/// Polygon overlay primitives take and return [`MultiPolygon`]s. An empty multipolygon is a valid result meaning
/// "no area"; whether an empty result is acceptable is decided by the caller.
pub trait GeometryEngine {
    /// Union of two areas.
    fn union(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError>;

    /// Part of `a` not covered by `b`.
    fn difference(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>)
        -> Result<MultiPolygon<f64>, GeometryError>;

    /// Area covered by both `a` and `b`.
    fn intersection(
        &self,
        a: &MultiPolygon<f64>,
        b: &MultiPolygon<f64>,
    ) -> Result<MultiPolygon<f64>, GeometryError>;

    /// Merges all polygons into one area, removing boundaries shared between them.
    fn dissolve(&self, polygons: &[Polygon<f64>]) -> Result<MultiPolygon<f64>, GeometryError>;

    /// Expands the geometry outward by `distance` in coordinate units.
    fn buffer(
        &self,
        geometry: &Geometry<f64>,
        distance: f64,
    ) -> Result<MultiPolygon<f64>, GeometryError>;

    /// Returns true if the point is inside the area or on its boundary.
    fn contains_point(&self, area: &MultiPolygon<f64>, point: &Point<f64>) -> bool;

    /// Returns true if the whole line lies within the area.
    fn contains_line(&self, area: &MultiPolygon<f64>, line: &LineString<f64>) -> bool;

    /// Splits the line at every point where it crosses the cutter.
    fn split_line(
        &self,
        line: &LineString<f64>,
        cutter: &MultiLineString<f64>,
    ) -> Vec<LineString<f64>>;

    /// Voronoi cells of the sites clipped to `bounds`, one entry per site. An entry is `None` if the site has no
    /// cell with positive area.
    fn voronoi(&self, sites: &[Point<f64>], bounds: Rect<f64>) -> Vec<Option<Polygon<f64>>>;
}

//! Overlay helpers that keep working when geometry primitives fail.
//!
//! Overlay algorithms routinely fail on imperfect real world polygons. The helpers in this module never return an
//! error: a failing primitive is replaced by a degraded but usable result, and the substitution is logged.

use geo::{BoundingRect, MultiPolygon, Polygon, Rect};

use crate::geometry::GeometryEngine;

mod clip;
mod ladder;

pub(crate) use clip::polygonal_geometry;
pub use clip::{clip_line, clip_points, clip_polygon};
pub use ladder::{
    ConcatenateTier, DissolveTier, FallbackLadder, MergeOutcome, MergeStrategy, PairwiseUnionTier,
};

/// Returns true if the bounding boxes of the two geometries intersect. Touching boxes count as intersecting.
///
/// Geometries without coordinates have no bounding box and never overlap anything.
pub fn bboxes_overlap<A, B>(a: &A, b: &B) -> bool
where
    A: BoundingRect<f64>,
    B: BoundingRect<f64>,
    A::Output: Into<Option<Rect<f64>>>,
    B::Output: Into<Option<Rect<f64>>>,
{
    match (a.bounding_rect().into(), b.bounding_rect().into()) {
        (Some(a), Some(b)) => rects_overlap(a, b),
        _ => false,
    }
}

pub(crate) fn rects_overlap(a: Rect<f64>, b: Rect<f64>) -> bool {
    a.min().x <= b.max().x
        && b.min().x <= a.max().x
        && a.min().y <= b.max().y
        && b.min().y <= a.max().y
}

/// Union of two areas that never fails.
///
/// If the union primitive fails or returns nothing, all polygons of both areas are concatenated into one
/// multipolygon without merging their boundaries. The result then covers the full area of both inputs, but may
/// contain overlapping parts.
pub fn safe_union(
    engine: &dyn GeometryEngine,
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> MultiPolygon<f64> {
    FallbackLadder::union()
        .merge(engine, &[a.clone(), b.clone()])
        .area
}

/// Part of `a` not covered by `b`. If the difference primitive fails, `a` is returned unchanged.
///
/// An empty result is legitimate here: it means `b` covers all of `a`.
pub fn safe_difference(
    engine: &dyn GeometryEngine,
    a: &MultiPolygon<f64>,
    b: &MultiPolygon<f64>,
) -> MultiPolygon<f64> {
    match engine.difference(a, b) {
        Ok(result) => result,
        Err(err) => {
            log::warn!("Difference failed, keeping the original area: {err}");
            a.clone()
        }
    }
}

/// Folds all polygons left to right through [`safe_union`]. Returns `None` if there are no polygons.
pub fn union_all(
    engine: &dyn GeometryEngine,
    polygons: impl IntoIterator<Item = Polygon<f64>>,
) -> Option<MultiPolygon<f64>> {
    polygons
        .into_iter()
        .map(|p| MultiPolygon::new(vec![p]))
        .reduce(|acc, next| safe_union(engine, &acc, &next))
}

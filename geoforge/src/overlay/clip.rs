use geo::{
    Euclidean, Geometry, InterpolatableLine, LineString, MultiLineString, MultiPoint, MultiPolygon,
};

use crate::geometry::{flatten, GeometryEngine};

/// Points of the geometry that lie inside the mask or on its boundary.
///
/// A point is returned as is if it is inside. For a multipoint the surviving points are returned as a multipoint.
/// Returns `None` if nothing survives or the geometry has no points.
pub fn clip_points(
    engine: &dyn GeometryEngine,
    geometry: &Geometry<f64>,
    mask: &MultiPolygon<f64>,
) -> Option<Geometry<f64>> {
    match geometry {
        Geometry::Point(p) => engine.contains_point(mask, p).then_some(Geometry::Point(*p)),
        Geometry::MultiPoint(mp) => {
            let inside: Vec<_> = mp
                .iter()
                .filter(|p| engine.contains_point(mask, p))
                .copied()
                .collect();
            if inside.is_empty() {
                None
            } else {
                Some(Geometry::MultiPoint(MultiPoint::new(inside)))
            }
        }
        _ => None,
    }
}

/// Parts of the line geometry that lie inside the mask.
///
/// Lines completely within the mask are kept whole. Other lines are split at every crossing with the mask boundary
/// and a piece is kept if the point at half of its length is inside the mask. One surviving piece is returned as a
/// line string, several as a multi line string.
pub fn clip_line(
    engine: &dyn GeometryEngine,
    geometry: &Geometry<f64>,
    mask: &MultiPolygon<f64>,
) -> Option<Geometry<f64>> {
    let lines = flatten::lines(geometry);
    if lines.is_empty() {
        return None;
    }

    if lines.iter().all(|l| engine.contains_line(mask, l)) {
        return Some(geometry.clone());
    }

    let boundary = flatten::boundary(mask);
    let mut kept: Vec<LineString<f64>> = vec![];
    for line in lines {
        if engine.contains_line(mask, &line) {
            kept.push(line);
            continue;
        }

        kept.extend(engine.split_line(&line, &boundary).into_iter().filter(|piece| {
            piece
                .point_at_ratio_from_start(&Euclidean, 0.5)
                .map(|middle| engine.contains_point(mask, &middle))
                .unwrap_or(false)
        }));
    }

    match kept.len() {
        0 => None,
        1 => kept.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(kept))),
    }
}

/// Intersection of the polygonal geometry with the mask, or `None` if it is empty or cannot be computed.
pub fn clip_polygon(
    engine: &dyn GeometryEngine,
    geometry: &Geometry<f64>,
    mask: &MultiPolygon<f64>,
) -> Option<Geometry<f64>> {
    let area = flatten::area(geometry)?;
    match engine.intersection(&area, mask) {
        Ok(result) => polygonal_geometry(result),
        Err(err) => {
            log::warn!("Failed to clip polygon: {err}");
            None
        }
    }
}

/// Single polygon as `Polygon`, several as `MultiPolygon`, nothing as `None`.
pub(crate) fn polygonal_geometry(mut area: MultiPolygon<f64>) -> Option<Geometry<f64>> {
    match area.0.len() {
        0 => None,
        1 => area.0.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(area)),
    }
}

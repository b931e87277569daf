//! Conversion between GeoJSON geometries and [`geo_types`] geometries.
//!
//! The conversions themselves are the ones `geojson` provides. This module adds the checks the engine relies on:
//! positions must have at least two finite ordinates, polygons must have an exterior ring and geometry collections
//! are rejected. Positions with more than two ordinates are truncated to `x, y`. Polygon rings are closed by
//! `geo_types` on conversion, so ring validity must be checked on the GeoJSON side (see [`ring`](crate::ring))
//! before converting.

use geo_types::{Geometry as GeoGeometry, MultiPolygon};
use geojson::{Feature, Position, Value};

use crate::error::GeoforgeTypesError;

/// Converts GeoJSON geometry value into a `geo` geometry.
pub fn to_geo(value: &Value) -> Result<GeoGeometry<f64>, GeoforgeTypesError> {
    check_positions(value)?;
    Ok(GeoGeometry::try_from(value)?)
}

/// Converts the geometry of the feature into a `geo` geometry.
pub fn feature_to_geo(feature: &Feature) -> Result<GeoGeometry<f64>, GeoforgeTypesError> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or(GeoforgeTypesError::MissingGeometry)?;
    to_geo(&geometry.value)
}

/// Converts a `geo` geometry into a GeoJSON geometry value.
///
/// `Line`, `Rect` and `Triangle` are written as `LineString` and `Polygon`.
pub fn from_geo(geometry: &GeoGeometry<f64>) -> Result<Value, GeoforgeTypesError> {
    match geometry {
        GeoGeometry::GeometryCollection(_) => Err(collections_unsupported()),
        other => Ok(Value::from(other)),
    }
}

/// Writes the polygon set as a `Polygon` value if it has exactly one part, or as a `MultiPolygon` otherwise.
pub fn polygonal_value(mp: &MultiPolygon<f64>) -> Value {
    match mp.0.as_slice() {
        [polygon] => Value::from(polygon),
        _ => Value::from(mp),
    }
}

fn collections_unsupported() -> GeoforgeTypesError {
    GeoforgeTypesError::Conversion("geometry collections are not supported".into())
}

fn check_positions(value: &Value) -> Result<(), GeoforgeTypesError> {
    let positions: Vec<&Position> = match value {
        Value::Point(p) => vec![p],
        Value::MultiPoint(points) | Value::LineString(points) => points.iter().collect(),
        Value::MultiLineString(lines) => lines.iter().flatten().collect(),
        Value::Polygon(rings) => {
            check_exterior(rings)?;
            rings.iter().flatten().collect()
        }
        Value::MultiPolygon(polygons) => {
            polygons.iter().try_for_each(|rings| check_exterior(rings))?;
            polygons.iter().flatten().flatten().collect()
        }
        Value::GeometryCollection(_) => return Err(collections_unsupported()),
    };

    positions.into_iter().try_for_each(check_position)
}

fn check_exterior(rings: &[Vec<Position>]) -> Result<(), GeoforgeTypesError> {
    if rings.is_empty() {
        Err(GeoforgeTypesError::Conversion(
            "polygon has no exterior ring".into(),
        ))
    } else {
        Ok(())
    }
}

fn check_position(position: &Position) -> Result<(), GeoforgeTypesError> {
    match position.as_slice() {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(()),
        [_, _, ..] => Err(GeoforgeTypesError::Conversion(
            "position has non-finite coordinates".into(),
        )),
        _ => Err(GeoforgeTypesError::Conversion(format!(
            "position must have at least 2 ordinates, got {}",
            position.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn polygon_conversion_closes_rings() {
        let value = Value::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
        ]]);
        let GeoGeometry::Polygon(polygon) = to_geo(&value).expect("conversion failed") else {
            panic!("not a polygon");
        };
        assert_eq!(polygon.exterior().0.len(), 4);
    }

    #[test]
    fn single_part_polygon_set_is_written_as_polygon() {
        let value = Value::MultiPolygon(vec![vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]]);
        let GeoGeometry::MultiPolygon(mp) = to_geo(&value).expect("conversion failed") else {
            panic!("not a multipolygon");
        };
        assert_matches!(polygonal_value(&mp), Value::Polygon(rings) if rings[0].len() == 4);
    }

    #[test]
    fn short_positions_are_rejected() {
        assert_matches!(
            to_geo(&Value::Point(vec![1.0])),
            Err(GeoforgeTypesError::Conversion(_))
        );
        assert_matches!(
            to_geo(&Value::LineString(vec![vec![0.0, 0.0], vec![f64::NAN, 1.0]])),
            Err(GeoforgeTypesError::Conversion(_))
        );
    }

    #[test]
    fn polygons_without_rings_are_rejected() {
        assert_matches!(
            to_geo(&Value::Polygon(vec![])),
            Err(GeoforgeTypesError::Conversion(_))
        );
        assert_matches!(
            to_geo(&Value::MultiPolygon(vec![vec![]])),
            Err(GeoforgeTypesError::Conversion(_))
        );
    }

    #[test]
    fn collections_are_rejected_both_ways() {
        assert_matches!(
            to_geo(&Value::GeometryCollection(vec![])),
            Err(GeoforgeTypesError::Conversion(_))
        );
        let collection =
            GeoGeometry::GeometryCollection(geo_types::GeometryCollection::new_from(vec![]));
        assert_matches!(from_geo(&collection), Err(GeoforgeTypesError::Conversion(_)));
    }

    #[test]
    fn rect_is_written_as_polygon() {
        let rect = geo_types::Rect::new((0.0, 0.0), (2.0, 1.0));
        assert_matches!(
            from_geo(&GeoGeometry::Rect(rect)),
            Ok(Value::Polygon(rings)) if rings.len() == 1 && rings[0].len() == 5
        );
    }

    #[test]
    fn extra_ordinates_are_dropped() {
        let value = Value::Point(vec![1.0, 2.0, 30.0]);
        let geometry = to_geo(&value).expect("conversion failed");
        assert_eq!(from_geo(&geometry).expect("conversion failed"), Value::Point(vec![1.0, 2.0]));
    }
}

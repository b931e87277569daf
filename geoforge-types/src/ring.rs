//! Minimal topological checks of polygon rings.
//!
//! Only two properties are checked: a ring must have at least [`MIN_RING_POSITIONS`] positions, and its first
//! and last positions must be equal within the given epsilon. Self-intersections and ring orientation are not
//! validated.

use geojson::{PolygonType, Position, Value};
use thiserror::Error;

/// Minimum number of positions in a closed ring (a triangle plus the closing position).
pub const MIN_RING_POSITIONS: usize = 4;

/// Default tolerance for comparing the first and the last positions of a ring.
pub const DEFAULT_RING_EPSILON: f64 = 1e-10;

/// Reason a ring failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RingError {
    /// Ring has fewer than 4 positions.
    #[error("ring {ring} of polygon {polygon} has {positions} positions, at least 4 are required")]
    TooShort {
        /// Index of the polygon in a multipolygon (0 for a polygon).
        polygon: usize,
        /// Index of the ring in the polygon.
        ring: usize,
        /// Number of positions in the ring.
        positions: usize,
    },
    /// First and last positions of the ring differ.
    #[error("ring {ring} of polygon {polygon} is not closed")]
    NotClosed {
        /// Index of the polygon in a multipolygon (0 for a polygon).
        polygon: usize,
        /// Index of the ring in the polygon.
        ring: usize,
    },
    /// Polygon without any rings.
    #[error("polygon {polygon} has no rings")]
    Empty {
        /// Index of the polygon in a multipolygon (0 for a polygon).
        polygon: usize,
    },
    /// The geometry is not a polygon or a multipolygon.
    #[error("geometry is not polygonal")]
    NotPolygonal,
}

/// Checks all rings of a `Polygon` or `MultiPolygon` value.
pub fn validate_polygonal(value: &Value, epsilon: f64) -> Result<(), RingError> {
    match value {
        Value::Polygon(polygon) => validate_polygon(polygon, 0, epsilon),
        Value::MultiPolygon(polygons) => polygons
            .iter()
            .enumerate()
            .try_for_each(|(index, polygon)| validate_polygon(polygon, index, epsilon)),
        _ => Err(RingError::NotPolygonal),
    }
}

fn validate_polygon(
    polygon: &PolygonType,
    polygon_index: usize,
    epsilon: f64,
) -> Result<(), RingError> {
    if polygon.is_empty() {
        return Err(RingError::Empty {
            polygon: polygon_index,
        });
    }

    for (ring_index, ring) in polygon.iter().enumerate() {
        if ring.len() < MIN_RING_POSITIONS {
            return Err(RingError::TooShort {
                polygon: polygon_index,
                ring: ring_index,
                positions: ring.len(),
            });
        }

        if !is_closed(&ring[0], &ring[ring.len() - 1], epsilon) {
            return Err(RingError::NotClosed {
                polygon: polygon_index,
                ring: ring_index,
            });
        }
    }

    Ok(())
}

fn is_closed(first: &Position, last: &Position, epsilon: f64) -> bool {
    match (first.as_slice(), last.as_slice()) {
        ([x1, y1, ..], [x2, y2, ..]) => (x1 - x2).abs() <= epsilon && (y1 - y2).abs() <= epsilon,
        _ => false,
    }
}

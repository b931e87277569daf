//! Local metric frame for buffering geographic coordinates.

use geo::{Coord, Geometry, MapCoords, MultiPolygon, Rect};

/// Approximate length of one degree of latitude in meters.
pub const METERS_PER_DEGREE_LAT: f64 = 110_540.0;
/// Approximate length of one degree of longitude at the equator in meters.
pub const METERS_PER_DEGREE_LON: f64 = 111_320.0;

/// Equirectangular projection centered at a fixed origin.
///
/// Distortion grows with distance from the origin, so the frame is meant for geometries spanning at most a few
/// degrees, which is the case for features of a single layer in a typical web GIS session.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalProjection {
    origin: Coord<f64>,
    x_scale: f64,
    y_scale: f64,
}

impl LocalProjection {
    /// Creates a projection centered at the given longitude/latitude.
    pub fn new(origin: Coord<f64>) -> Self {
        let x_scale = METERS_PER_DEGREE_LON * origin.y.to_radians().cos();
        Self {
            origin,
            x_scale,
            y_scale: METERS_PER_DEGREE_LAT,
        }
    }

    /// Projection centered at the center of the given bounding box.
    pub fn centered_on(bounds: Rect<f64>) -> Self {
        Self::new(bounds.center())
    }

    /// Origin of the frame.
    pub fn origin(&self) -> Coord<f64> {
        self.origin
    }

    /// Converts a longitude/latitude pair to meters relative to the origin.
    pub fn project(&self, input: Coord<f64>) -> Option<Coord<f64>> {
        let x = (input.x - self.origin.x) * self.x_scale;
        let y = (input.y - self.origin.y) * self.y_scale;

        if x.is_finite() && y.is_finite() {
            Some(Coord { x, y })
        } else {
            None
        }
    }

    /// Converts meters relative to the origin back to longitude/latitude.
    pub fn unproject(&self, input: Coord<f64>) -> Option<Coord<f64>> {
        if self.x_scale.abs() < 1e-6 {
            return None;
        }

        Some(Coord {
            x: self.origin.x + input.x / self.x_scale,
            y: self.origin.y + input.y / self.y_scale,
        })
    }

    /// Projects all coordinates of the geometry. Returns `None` if any of them cannot be projected.
    pub fn project_geometry(&self, geometry: &Geometry<f64>) -> Option<Geometry<f64>> {
        geometry
            .try_map_coords(|c| self.project(c).ok_or(()))
            .ok()
    }

    /// Inverse of [`LocalProjection::project_geometry`] for areas.
    pub fn unproject_area(&self, area: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
        area.try_map_coords(|c| self.unproject(c).ok_or(())).ok()
    }
}

use geojson::{Feature, Value};
use serde::{Deserialize, Serialize};

/// One of the six GeoJSON geometry kinds a layer can hold.
///
/// Geometry collections are not a valid layer kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    /// Single point.
    Point,
    /// Set of points.
    MultiPoint,
    /// Single line.
    LineString,
    /// Set of lines.
    MultiLineString,
    /// Single polygon, possibly with holes.
    Polygon,
    /// Set of polygons.
    MultiPolygon,
}

/// Family of a geometry kind. Single and multi variants of the same shape belong to the same family.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryFamily {
    /// `Point` and `MultiPoint`.
    Point,
    /// `LineString` and `MultiLineString`.
    Line,
    /// `Polygon` and `MultiPolygon`.
    Polygon,
}

impl GeometryKind {
    /// Kind of the GeoJSON geometry value. Returns `None` for geometry collections.
    pub fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::Point(_) => Some(Self::Point),
            Value::MultiPoint(_) => Some(Self::MultiPoint),
            Value::LineString(_) => Some(Self::LineString),
            Value::MultiLineString(_) => Some(Self::MultiLineString),
            Value::Polygon(_) => Some(Self::Polygon),
            Value::MultiPolygon(_) => Some(Self::MultiPolygon),
            Value::GeometryCollection(_) => None,
        }
    }

    /// Kind of the feature geometry, if the feature has one.
    pub fn of_feature(feature: &Feature) -> Option<Self> {
        feature
            .geometry
            .as_ref()
            .and_then(|geometry| Self::of_value(&geometry.value))
    }

    /// Kind of the `geo` geometry. Lines, rectangles and triangles are reported as the GeoJSON kind they are
    /// written as.
    pub fn of_geo(geometry: &geo_types::Geometry<f64>) -> Option<Self> {
        use geo_types::Geometry as G;
        match geometry {
            G::Point(_) => Some(Self::Point),
            G::MultiPoint(_) => Some(Self::MultiPoint),
            G::Line(_) | G::LineString(_) => Some(Self::LineString),
            G::MultiLineString(_) => Some(Self::MultiLineString),
            G::Polygon(_) | G::Rect(_) | G::Triangle(_) => Some(Self::Polygon),
            G::MultiPolygon(_) => Some(Self::MultiPolygon),
            G::GeometryCollection(_) => None,
        }
    }

    /// Family of the kind.
    pub fn family(&self) -> GeometryFamily {
        match self {
            Self::Point | Self::MultiPoint => GeometryFamily::Point,
            Self::LineString | Self::MultiLineString => GeometryFamily::Line,
            Self::Polygon | Self::MultiPolygon => GeometryFamily::Polygon,
        }
    }

    /// Returns true for `Polygon` and `MultiPolygon`.
    pub fn is_polygonal(&self) -> bool {
        self.family() == GeometryFamily::Polygon
    }

    /// GeoJSON name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Point => "Point",
            Self::MultiPoint => "MultiPoint",
            Self::LineString => "LineString",
            Self::MultiLineString => "MultiLineString",
            Self::Polygon => "Polygon",
            Self::MultiPolygon => "MultiPolygon",
        }
    }
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

use geo::{BoundingRect, MultiPoint, Point};
use geoforge_types::convert::polygonal_value;
use geoforge_types::GeometryFamily;
use geojson::{Feature, FeatureCollection};

use super::{
    commit, geometries, layer, new_feature, polygon_draft, Geoprocessor, OperationKind,
    OperationReport, OutputSpec,
};
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::{flatten, GeometryEngine};
use crate::layer::{LayerId, LayerStore};

/// Minimum number of points a Voronoi diagram is built for.
pub const MIN_VORONOI_POINTS: usize = 3;

/// Parameters of the Voronoi operation.
#[derive(Debug, Clone, PartialEq)]
pub struct VoronoiParams {
    /// Point layer.
    pub source: Option<LayerId>,
    /// Output layer.
    pub output: OutputSpec,
    /// Keep the input layer after the output is created.
    pub keep_inputs: bool,
}

impl VoronoiParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        self.source()?;
        self.output.validate()
    }

    fn source(&self) -> Result<LayerId, ValidationError> {
        self.source.ok_or(ValidationError::NoLayerSelected("source"))
    }
}

/// Voronoi cells of all points of the collection, clipped to the bounding box of the points.
///
/// Multipoints are split into single points that share the properties of their feature. Every cell carries the
/// properties of its point. Points repeating an earlier point and cells without area are dropped.
pub fn voronoi_features(
    engine: &dyn GeometryEngine,
    collection: &FeatureCollection,
) -> Result<Vec<Feature>, GeoforgeError> {
    let fail = |reason: String| GeoforgeError::failed(OperationKind::Voronoi, reason);

    let sites: Vec<(Point<f64>, &Feature)> = geometries(collection)
        .into_iter()
        .flat_map(|(feature, geometry)| {
            flatten::points(&geometry)
                .into_iter()
                .map(move |point| (point, feature))
        })
        .collect();

    if sites.len() < MIN_VORONOI_POINTS {
        return Err(fail(format!(
            "at least {MIN_VORONOI_POINTS} points are required, found {}",
            sites.len()
        )));
    }

    let points: Vec<Point<f64>> = sites.iter().map(|(point, _)| *point).collect();
    let bounds = MultiPoint::new(points.clone())
        .bounding_rect()
        .ok_or_else(|| fail("points have no extent".into()))?;

    let features: Vec<Feature> = engine
        .voronoi(&points, bounds)
        .into_iter()
        .zip(&sites)
        .filter_map(|(cell, (_, feature))| {
            let cell = cell?;
            Some(new_feature(
                polygonal_value(&geo::MultiPolygon::new(vec![cell])),
                feature.properties.clone(),
            ))
        })
        .collect();

    if features.is_empty() {
        return Err(fail("no Voronoi cell could be built, points may be collinear".into()));
    }

    log::debug!("Built {} Voronoi cells for {} points", features.len(), points.len());
    Ok(features)
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn voronoi(
        &self,
        store: &mut LayerStore,
        params: VoronoiParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let source_id = params.source()?;
        let source = layer(store, source_id)?;
        if source.geometry_type().family() != GeometryFamily::Point {
            return Err(ValidationError::WrongGeometry {
                layer: source.name().to_string(),
                expected: "point",
                actual: source.geometry_type(),
            }
            .into());
        }

        let features = voronoi_features(&self.engine, source.data())?;

        commit(
            store,
            OperationKind::Voronoi,
            vec![polygon_draft(&params.output, features)],
            &[source_id],
            params.keep_inputs,
        )
    }
}

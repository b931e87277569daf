use geo::BoundingRect;
use geoforge_types::convert::polygonal_value;
use geoforge_types::feature_key;
use geojson::{Feature, FeatureCollection};

use super::{
    commit, geometries, layer, new_feature, polygon_draft, Geoprocessor, OperationKind,
    OperationReport, OutputSpec,
};
use crate::config::DistanceSpace;
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::projection::LocalProjection;
use crate::geometry::GeometryEngine;
use crate::layer::{LayerId, LayerStore};

/// Parameters of the buffer operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferParams {
    /// Layer to buffer.
    pub source: Option<LayerId>,
    /// Buffer distance in meters. Must be positive.
    pub distance: Option<f64>,
    /// Output layer.
    pub output: OutputSpec,
}

impl BufferParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        self.source()?;
        self.distance()?;
        self.output.validate()
    }

    fn source(&self) -> Result<LayerId, ValidationError> {
        self.source.ok_or(ValidationError::NoLayerSelected("source"))
    }

    fn distance(&self) -> Result<f64, ValidationError> {
        match self.distance {
            Some(distance) if distance.is_finite() && distance > 0.0 => Ok(distance),
            _ => Err(ValidationError::InvalidDistance),
        }
    }
}

/// Buffers every feature of the collection by `distance`, keeping feature properties.
///
/// With [`DistanceSpace::Geographic`] the distance is in meters and every feature is buffered in a local metric
/// frame centered on its bounding box. Features whose buffer is empty (points and lines with zero distance) are
/// omitted. A failing buffer primitive fails the whole operation.
pub fn buffer_features(
    engine: &dyn GeometryEngine,
    collection: &FeatureCollection,
    distance: f64,
    space: DistanceSpace,
) -> Result<Vec<Feature>, GeoforgeError> {
    let mut features = vec![];
    for (index, (feature, geometry)) in geometries(collection).into_iter().enumerate() {
        let key = feature_key(feature, index);
        let fail = |reason: String| {
            GeoforgeError::failed(OperationKind::Buffer, format!("feature {key}: {reason}"))
        };

        let area = match space {
            DistanceSpace::Planar => engine
                .buffer(&geometry, distance)
                .map_err(|e| fail(e.to_string()))?,
            DistanceSpace::Geographic => {
                let Some(bounds) = geometry.bounding_rect() else {
                    continue;
                };
                let projection = LocalProjection::centered_on(bounds);
                let projected = projection
                    .project_geometry(&geometry)
                    .ok_or_else(|| fail("cannot be projected to meters".into()))?;
                let buffered = engine
                    .buffer(&projected, distance)
                    .map_err(|e| fail(e.to_string()))?;
                projection
                    .unproject_area(&buffered)
                    .ok_or_else(|| fail("buffer cannot be projected back".into()))?
            }
        };

        if area.0.is_empty() {
            continue;
        }

        features.push(new_feature(polygonal_value(&area), feature.properties.clone()));
    }

    Ok(features)
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn buffer(
        &self,
        store: &mut LayerStore,
        params: BufferParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let source = layer(store, params.source()?)?;
        let features = buffer_features(
            &self.engine,
            source.data(),
            params.distance()?,
            self.config.distance_space,
        )?;

        log::debug!(
            "Buffered {} of {} features of layer {}",
            features.len(),
            source.data().features.len(),
            source.name()
        );

        commit(
            store,
            OperationKind::Buffer,
            vec![polygon_draft(&params.output, features)],
            &[],
            true,
        )
    }
}

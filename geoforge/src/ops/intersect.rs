use geo::Geometry;
use geoforge_types::convert::from_geo;
use geoforge_types::{GeometryFamily, GeometryKind};
use geojson::{Feature, FeatureCollection, JsonObject};

use super::{
    commit, ensure_distinct, geometries, layer, new_feature, Geoprocessor, OperationKind,
    OperationReport, OutputSpec,
};
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::{flatten, GeometryEngine};
use crate::layer::{collection, LayerId, LayerStore};
use crate::overlay::{bboxes_overlap, clip_line, clip_points};

/// Parameters of the intersect operation.
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectParams {
    /// First layer. Output features carry its properties.
    pub first: Option<LayerId>,
    /// Second layer.
    pub second: Option<LayerId>,
    /// Output layer.
    pub output: OutputSpec,
}

impl IntersectParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let (first, second) = self.layers()?;
        ensure_distinct(&[first, second])?;
        self.output.validate()
    }

    fn layers(&self) -> Result<(LayerId, LayerId), ValidationError> {
        match (self.first, self.second) {
            (Some(first), Some(second)) => Ok((first, second)),
            (None, _) => Err(ValidationError::NoLayerSelected("first")),
            (_, None) => Err(ValidationError::NoLayerSelected("second")),
        }
    }
}

/// Intersections of every feature of `first` with every feature of `second`, as separate features.
///
/// Pairs with disjoint bounding boxes are skipped without computing anything. Polygon pairs are intersected as
/// areas; points and lines of `first` are clipped by polygons of `second`; other pairs are ignored. A pair that
/// cannot be intersected is skipped. The result may be empty.
pub fn intersect_features(
    engine: &dyn GeometryEngine,
    first: &FeatureCollection,
    second: &FeatureCollection,
) -> Vec<Feature> {
    let second = geometries(second);
    let mut features = vec![];

    for (first_feature, first_geometry) in geometries(first) {
        for (second_feature, second_geometry) in &second {
            if !bboxes_overlap(&first_geometry, second_geometry) {
                continue;
            }

            let Some(geometry) = intersect_pair(engine, &first_geometry, second_geometry) else {
                continue;
            };

            match from_geo(&geometry) {
                Ok(value) => features.push(new_feature(
                    value,
                    Some(merge_properties(first_feature, second_feature)),
                )),
                Err(err) => log::warn!("Skipping intersection: {err}"),
            }
        }
    }

    features
}

fn family(geometry: &Geometry<f64>) -> Option<GeometryFamily> {
    GeometryKind::of_geo(geometry).map(|kind| kind.family())
}

fn intersect_pair(
    engine: &dyn GeometryEngine,
    first: &Geometry<f64>,
    second: &Geometry<f64>,
) -> Option<Geometry<f64>> {
    if family(second)? != GeometryFamily::Polygon {
        return None;
    }

    let mask = flatten::area(second)?;
    match family(first)? {
        GeometryFamily::Point => clip_points(engine, first, &mask),
        GeometryFamily::Line => clip_line(engine, first, &mask),
        GeometryFamily::Polygon => {
            let area = flatten::area(first)?;
            match engine.intersection(&area, &mask) {
                Ok(result) => crate::overlay::polygonal_geometry(result),
                Err(err) => {
                    log::warn!("Failed to intersect features: {err}");
                    None
                }
            }
        }
    }
}

/// Properties of `first`, then properties of `second` that `first` does not have.
fn merge_properties(first: &Feature, second: &Feature) -> JsonObject {
    let mut properties = first.properties.clone().unwrap_or_default();
    for (key, value) in second.properties.iter().flatten() {
        if !properties.contains_key(key) {
            properties.insert(key.clone(), value.clone());
        }
    }

    properties
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn intersect(
        &self,
        store: &mut LayerStore,
        params: IntersectParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let (first, second) = params.layers()?;
        let first = layer(store, first)?;
        let second = layer(store, second)?;

        let features = intersect_features(&self.engine, first.data(), second.data());
        log::debug!(
            "Found {} intersections between {} and {}",
            features.len(),
            first.name(),
            second.name()
        );

        let fallback_kind = first.geometry_type();
        let mut draft = params.output.draft(collection(features));
        if draft.resolved_geometry_type().is_none() {
            draft = draft.with_geometry_type(fallback_kind);
        }

        commit(store, OperationKind::Intersect, vec![draft], &[], true)
    }
}

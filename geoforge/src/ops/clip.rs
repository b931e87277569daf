use geo::MultiPolygon;
use geoforge_types::convert::from_geo;
use geoforge_types::{GeometryFamily, GeometryKind};
use geojson::{Feature, FeatureCollection};

use super::{
    commit, ensure_distinct, ensure_polygonal, geometries, layer, new_feature, Geoprocessor,
    OperationKind, OperationReport, OutputSpec,
};
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::{flatten, GeometryEngine};
use crate::layer::{collection, LayerId, LayerStore};
use crate::overlay::{bboxes_overlap, clip_line, clip_points, clip_polygon, union_all};

/// Parameters of the clip operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipParams {
    /// Layers to clip. Each one produces its own output layer.
    pub inputs: Vec<LayerId>,
    /// Polygon layer used as the mask.
    pub mask: Option<LayerId>,
    /// One output per input layer, in the same order. If empty, every output is named `<input> (clipped)`.
    pub outputs: Vec<OutputSpec>,
    /// Keep the clipped input layers after the outputs are created. The mask layer is always kept.
    pub keep_inputs: bool,
}

impl ClipParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.inputs.is_empty() {
            return Err(ValidationError::NoLayerSelected("input"));
        }

        let mask = self.mask()?;
        let mut all = self.inputs.clone();
        all.push(mask);
        ensure_distinct(&all)?;

        if !self.outputs.is_empty() && self.outputs.len() != self.inputs.len() {
            return Err(ValidationError::OutputCountMismatch {
                expected: self.inputs.len(),
                actual: self.outputs.len(),
            });
        }

        self.outputs.iter().try_for_each(OutputSpec::validate)
    }

    fn mask(&self) -> Result<LayerId, ValidationError> {
        self.mask.ok_or(ValidationError::NoLayerSelected("mask"))
    }
}

/// Clips every feature of the collection by the mask, keeping feature properties.
///
/// Features are clipped according to their geometry family: points are kept if inside the mask, lines are cut at
/// the mask boundary, polygons are intersected with the mask. Features outside the mask are dropped.
pub fn clip_features(
    engine: &dyn GeometryEngine,
    collection: &FeatureCollection,
    mask: &MultiPolygon<f64>,
) -> Vec<Feature> {
    geometries(collection)
        .into_iter()
        .filter(|(_, geometry)| bboxes_overlap(geometry, mask))
        .filter_map(|(feature, geometry)| {
            let clipped = match GeometryKind::of_geo(&geometry)?.family() {
                GeometryFamily::Point => clip_points(engine, &geometry, mask),
                GeometryFamily::Line => clip_line(engine, &geometry, mask),
                GeometryFamily::Polygon => clip_polygon(engine, &geometry, mask),
            }?;

            match from_geo(&clipped) {
                Ok(value) => Some(new_feature(value, feature.properties.clone())),
                Err(err) => {
                    log::warn!("Skipping clipped feature: {err}");
                    None
                }
            }
        })
        .collect()
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn clip(
        &self,
        store: &mut LayerStore,
        params: ClipParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let mask_layer = layer(store, params.mask()?)?;
        ensure_polygonal(mask_layer)?;

        let polygons = geometries(mask_layer.data())
            .into_iter()
            .flat_map(|(_, geometry)| flatten::polygons(&geometry));
        let mask = union_all(&self.engine, polygons).ok_or_else(|| {
            GeoforgeError::failed(OperationKind::Clip, "mask layer has no polygons")
        })?;

        let mut drafts = vec![];
        let mut clipped = vec![];
        for (index, id) in params.inputs.iter().enumerate() {
            let input = layer(store, *id)?;
            let features = clip_features(&self.engine, input.data(), &mask);
            if features.is_empty() {
                log::debug!("Nothing of layer {} is inside the mask, skipping it", input.name());
                continue;
            }

            let output = params
                .outputs
                .get(index)
                .cloned()
                .unwrap_or_else(|| OutputSpec::new(format!("{} (clipped)", input.name())));
            drafts.push(output.draft(collection(features)));
            clipped.push(*id);
        }

        commit(store, OperationKind::Clip, drafts, &clipped, params.keep_inputs)
    }
}

use geoforge_types::convert::polygonal_value;
use geojson::{Feature, FeatureCollection, JsonObject};

use super::{
    commit, ensure_distinct, geometries, layer, new_feature, polygon_draft, Geoprocessor,
    OperationKind, OperationReport, OutputSpec,
};
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::{flatten, GeometryEngine};
use crate::layer::{LayerId, LayerStore};
use crate::overlay::union_all;

/// Parameters of the union operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionParams {
    /// Layers to merge, at least two.
    pub layers: Vec<LayerId>,
    /// Output layer.
    pub output: OutputSpec,
    /// Keep the input layers after the output is created.
    pub keep_inputs: bool,
}

impl UnionParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.layers.len() < 2 {
            return Err(ValidationError::NotEnoughLayers {
                required: 2,
                selected: self.layers.len(),
            });
        }

        ensure_distinct(&self.layers)?;
        self.output.validate()
    }
}

/// Merges all polygons of all collections into one feature.
///
/// Multi-part features are split into single polygons, which are then unioned one by one. Non-polygonal features are
/// ignored. Fails if fewer than two polygons are found.
pub fn union_features(
    engine: &dyn GeometryEngine,
    collections: &[&FeatureCollection],
) -> Result<Feature, GeoforgeError> {
    let polygons: Vec<_> = collections
        .iter()
        .copied()
        .flat_map(geometries)
        .flat_map(|(_, geometry)| flatten::polygons(&geometry))
        .collect();

    if polygons.len() < 2 {
        return Err(GeoforgeError::failed(
            OperationKind::Union,
            format!("at least two polygons are required, found {}", polygons.len()),
        ));
    }

    log::debug!("Merging {} polygons", polygons.len());
    let area = union_all(engine, polygons)
        .ok_or_else(|| GeoforgeError::failed(OperationKind::Union, "no polygons to merge"))?;

    Ok(new_feature(polygonal_value(&area), Some(JsonObject::new())))
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn union(
        &self,
        store: &mut LayerStore,
        params: UnionParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let inputs = params
            .layers
            .iter()
            .map(|id| layer(store, *id).map(|l| l.data()))
            .collect::<Result<Vec<_>, _>>()?;

        let feature = union_features(&self.engine, &inputs)?;

        commit(
            store,
            OperationKind::Union,
            vec![polygon_draft(&params.output, vec![feature])],
            &params.layers,
            params.keep_inputs,
        )
    }
}

use geo::{Geometry, MultiPolygon};
use geoforge_types::convert::polygonal_value;
use geojson::{Feature, FeatureCollection, JsonObject};

use super::{
    commit, ensure_distinct, geometries, layer, new_feature, polygon_draft, Geoprocessor,
    OperationKind, OperationReport, OutputSpec,
};
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::{flatten, GeometryEngine};
use crate::layer::{LayerId, LayerStore};
use crate::overlay::{safe_difference, union_all};

/// Parameters of the difference operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceParams {
    /// Layer to subtract from.
    pub base: Option<LayerId>,
    /// Layers whose area is removed from the base. Their features are pooled together.
    pub subtract: Vec<LayerId>,
    /// Output layer.
    pub output: OutputSpec,
}

impl DifferenceParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let base = self.base()?;
        if self.subtract.is_empty() {
            return Err(ValidationError::NoLayerSelected("subtract"));
        }

        let mut all = vec![base];
        all.extend_from_slice(&self.subtract);
        ensure_distinct(&all)?;

        self.output.validate()
    }

    fn base(&self) -> Result<LayerId, ValidationError> {
        self.base.ok_or(ValidationError::NoLayerSelected("base"))
    }
}

fn merged_area(
    engine: &dyn GeometryEngine,
    collections: &[&FeatureCollection],
) -> Option<MultiPolygon<f64>> {
    let polygons = collections
        .iter()
        .copied()
        .flat_map(geometries)
        .flat_map(|(_, geometry): (_, Geometry<f64>)| flatten::polygons(&geometry));
    union_all(engine, polygons)
}

/// Area of the `base` collections not covered by the `subtract` collections, as one feature.
///
/// Both sides are merged into a single area first. Fails if either side has no polygons or nothing is left after
/// the subtraction.
pub fn difference_features(
    engine: &dyn GeometryEngine,
    base: &[&FeatureCollection],
    subtract: &[&FeatureCollection],
) -> Result<Feature, GeoforgeError> {
    let fail = |reason: &str| GeoforgeError::failed(OperationKind::Difference, reason);

    let base = merged_area(engine, base).ok_or_else(|| fail("base layer has no polygons"))?;
    let subtract =
        merged_area(engine, subtract).ok_or_else(|| fail("subtract layers have no polygons"))?;

    let result = safe_difference(engine, &base, &subtract);
    if result.0.is_empty() {
        return Err(fail("result is empty"));
    }

    Ok(new_feature(polygonal_value(&result), Some(JsonObject::new())))
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn difference(
        &self,
        store: &mut LayerStore,
        params: DifferenceParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let base = layer(store, params.base()?)?;
        let subtract = params
            .subtract
            .iter()
            .map(|id| layer(store, *id).map(|l| l.data()))
            .collect::<Result<Vec<_>, _>>()?;

        let feature = difference_features(&self.engine, &[base.data()], &subtract)?;

        commit(
            store,
            OperationKind::Difference,
            vec![polygon_draft(&params.output, vec![feature])],
            &[],
            true,
        )
    }
}

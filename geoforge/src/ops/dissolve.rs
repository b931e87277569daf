use ahash::{HashMap, HashMapExt};
use geo::MultiPolygon;
use geoforge_types::convert::{polygonal_value, to_geo};
use geoforge_types::ring::validate_polygonal;
use geoforge_types::GeometryKind;
use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};

use super::{
    commit, ensure_polygonal, layer, new_feature, polygon_draft, Geoprocessor, OperationKind,
    OperationReport, OutputSpec,
};
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::{flatten, GeometryEngine};
use crate::layer::{LayerId, LayerStore};
use crate::overlay::FallbackLadder;

/// Group of features that have no value of the grouping field.
pub const NULL_GROUP: &str = "__null__";

/// Parameters of the dissolve operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DissolveParams {
    /// Polygon layer to dissolve.
    pub source: Option<LayerId>,
    /// Property to group features by. If not set (or empty), all features are merged into one.
    pub field: Option<String>,
    /// Output layer.
    pub output: OutputSpec,
    /// Keep the input layer after the output is created.
    pub keep_inputs: bool,
}

impl DissolveParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        self.source()?;
        self.output.validate()
    }

    fn source(&self) -> Result<LayerId, ValidationError> {
        self.source.ok_or(ValidationError::NoLayerSelected("source"))
    }

    fn field(&self) -> Option<&str> {
        self.field.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

struct Group {
    value: JsonValue,
    areas: Vec<MultiPolygon<f64>>,
}

/// Merges polygon features, removing boundaries shared between them.
///
/// Non-polygonal features are ignored. Polygons with rings shorter than 4 positions or not closed within
/// `ring_epsilon` are dropped with a warning. Without a `field` all valid polygons are merged into one feature with
/// no properties. With a `field` features are grouped by the string value of that property and every group becomes
/// one feature with that property as its only attribute; features without the property form one group with `null`
/// value. Groups are returned in the order of their first feature.
///
/// Fails only if there are no valid polygons at all.
pub fn dissolve_features(
    engine: &dyn GeometryEngine,
    collection: &FeatureCollection,
    field: Option<&str>,
    ring_epsilon: f64,
) -> Result<Vec<Feature>, GeoforgeError> {
    let mut groups: Vec<Group> = vec![];
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for (index, feature) in collection.features.iter().enumerate() {
        let Some(area) = valid_area(feature, index, ring_epsilon) else {
            continue;
        };

        let (key, value) = match field {
            Some(field) => group_key(feature, field),
            None => (String::new(), JsonValue::Null),
        };

        let position = *group_index.entry(key).or_insert_with(|| {
            groups.push(Group {
                value,
                areas: vec![],
            });
            groups.len() - 1
        });
        groups[position].areas.push(area);
    }

    if groups.is_empty() {
        return Err(GeoforgeError::failed(
            OperationKind::Dissolve,
            "no valid polygon features to dissolve",
        ));
    }

    let ladder = FallbackLadder::dissolve();
    let features = groups
        .into_iter()
        .map(|mut group| {
            let area = if group.areas.len() == 1 {
                group.areas.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
            } else {
                let outcome = ladder.merge(engine, &group.areas);
                log::debug!("Dissolved {} features by {}", group.areas.len(), outcome.strategy);
                outcome.area
            };

            let properties = match field {
                Some(field) => JsonObject::from_iter([(field.to_string(), group.value)]),
                None => JsonObject::new(),
            };

            new_feature(polygonal_value(&area), Some(properties))
        })
        .collect();

    Ok(features)
}

/// Polygons of the feature if it is polygonal and all its rings are valid.
fn valid_area(feature: &Feature, index: usize, ring_epsilon: f64) -> Option<MultiPolygon<f64>> {
    let geometry = feature.geometry.as_ref()?;
    if !GeometryKind::of_value(&geometry.value).is_some_and(|kind| kind.is_polygonal()) {
        return None;
    }

    if let Err(err) = validate_polygonal(&geometry.value, ring_epsilon) {
        log::warn!("Dropping feature {index} from dissolve: {err}");
        return None;
    }

    match to_geo(&geometry.value) {
        Ok(geometry) => flatten::area(&geometry),
        Err(err) => {
            log::warn!("Dropping feature {index} from dissolve: {err}");
            None
        }
    }
}

/// Group key and the property value representing the group.
fn group_key(feature: &Feature, field: &str) -> (String, JsonValue) {
    match feature.property(field) {
        None | Some(JsonValue::Null) => (NULL_GROUP.to_string(), JsonValue::Null),
        Some(JsonValue::String(s)) => (s.clone(), JsonValue::String(s.clone())),
        Some(other) => (other.to_string(), other.clone()),
    }
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn dissolve(
        &self,
        store: &mut LayerStore,
        params: DissolveParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let source_id = params.source()?;
        let source = layer(store, source_id)?;
        ensure_polygonal(source)?;

        let features = dissolve_features(
            &self.engine,
            source.data(),
            params.field(),
            self.config.ring_epsilon,
        )?;

        commit(
            store,
            OperationKind::Dissolve,
            vec![polygon_draft(&params.output, features)],
            &[source_id],
            params.keep_inputs,
        )
    }
}

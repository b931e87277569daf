use ahash::HashSet;
use geoforge_types::{feature_key, FeatureKey};
use geojson::{Feature, FeatureCollection};

use super::{commit, layer, Geoprocessor, OperationKind, OperationReport, OutputSpec};
use crate::error::{GeoforgeError, ValidationError};
use crate::geometry::GeometryEngine;
use crate::layer::{collection, LayerId, LayerStore};

/// Parameters of the feature extraction operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractParams {
    /// Layer to copy features from.
    pub source: Option<LayerId>,
    /// Keys of the selected features, see [`feature_key`].
    pub keys: HashSet<FeatureKey>,
    /// Output layer.
    pub output: OutputSpec,
    /// Keep the input layer after the output is created.
    pub keep_inputs: bool,
}

impl ExtractParams {
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        self.source()?;
        if self.keys.is_empty() {
            return Err(ValidationError::EmptySelection);
        }

        self.output.validate()
    }

    fn source(&self) -> Result<LayerId, ValidationError> {
        self.source.ok_or(ValidationError::NoLayerSelected("source"))
    }
}

/// Copies of the features whose keys are in `keys`, in collection order.
pub fn extract_features(
    collection: &FeatureCollection,
    keys: &HashSet<FeatureKey>,
) -> Vec<Feature> {
    collection
        .features
        .iter()
        .enumerate()
        .filter(|(index, feature)| keys.contains(&feature_key(feature, *index)))
        .map(|(_, feature)| feature.clone())
        .collect()
}

impl<E: GeometryEngine> Geoprocessor<E> {
    pub(super) fn extract(
        &self,
        store: &mut LayerStore,
        params: ExtractParams,
    ) -> Result<OperationReport, GeoforgeError> {
        let source_id = params.source()?;
        let source = layer(store, source_id)?;

        let features = extract_features(source.data(), &params.keys);
        if features.is_empty() {
            return Err(GeoforgeError::failed(
                OperationKind::Extract,
                "none of the selected features exist in the layer",
            ));
        }

        let draft = params
            .output
            .draft(collection(features))
            .with_geometry_type(source.geometry_type());

        commit(
            store,
            OperationKind::Extract,
            vec![draft],
            &[source_id],
            params.keep_inputs,
        )
    }
}

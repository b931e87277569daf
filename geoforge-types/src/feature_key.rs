use geojson::feature::Id;
use geojson::{Feature, JsonValue};
use serde::{Deserialize, Serialize};

/// Stable identity of a feature inside a feature collection.
///
/// Use [`feature_key`] to obtain it. Every place that needs to remember features (selection, attribute table rows,
/// extraction) must use that function, otherwise keys of the same feature may diverge between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKey {
    /// Key derived from the feature `id` member or from its `id` property.
    Id(String),
    /// Position of the feature in the collection, used when the feature has no id.
    Index(usize),
}

/// Returns the key of the feature at position `index` of its collection.
///
/// The key is the GeoJSON `id` of the feature if present, else the `id` property of the feature if present and not
/// `null`, else the position of the feature in the collection.
pub fn feature_key(feature: &Feature, index: usize) -> FeatureKey {
    if let Some(id) = &feature.id {
        return FeatureKey::Id(match id {
            Id::String(s) => s.clone(),
            Id::Number(n) => n.to_string(),
        });
    }

    match feature.properties.as_ref().and_then(|props| props.get("id")) {
        None | Some(JsonValue::Null) => FeatureKey::Index(index),
        Some(JsonValue::String(s)) => FeatureKey::Id(s.clone()),
        Some(other) => FeatureKey::Id(other.to_string()),
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureKey::Id(id) => f.write_str(id),
            FeatureKey::Index(index) => write!(f, "#{index}"),
        }
    }
}

//! Attribute filtering for feature tables.
//!
//! A table shows the features of one layer and lets the user narrow them down with a set of conditions. All
//! conditions must hold for a feature to be shown. Rows are identified by [`FeatureKey`], so the selection made in a
//! filtered table can be passed to [`ExtractParams`](crate::ops::ExtractParams) as is.

use std::cmp::Ordering;
use std::str::FromStr;

use geoforge_types::{feature_key, FeatureKey};
use geojson::{Feature, FeatureCollection, JsonValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layer::collection;

/// Comparison operator of a [`FilterCondition`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    /// `=`
    #[serde(rename = "=")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    NotEq,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
}

/// Operator string is not one of `=`, `!=`, `>`, `<`, `>=`, `<=`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter operator '{0}'")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "=" => Self::Eq,
            "!=" => Self::NotEq,
            ">" => Self::Gt,
            "<" => Self::Lt,
            ">=" => Self::Ge,
            "<=" => Self::Le,
            other => return Err(UnknownOperator(other.to_string())),
        })
    }
}

impl std::fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Ge => ">=",
            Self::Le => "<=",
        })
    }
}

/// Predicate over one property of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    /// Property name.
    pub field: String,
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Value to compare with, as entered by the user.
    pub value: String,
}

impl FilterCondition {
    /// Creates a new condition.
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    /// Returns true if the feature satisfies the condition.
    ///
    /// `=` and `!=` compare the string form of the property. Other operators compare numbers if both sides are
    /// numbers and strings otherwise. A feature without the property (or with `null` value) never matches.
    pub fn matches(&self, feature: &Feature) -> bool {
        let Some(property) = feature.property(&self.field).and_then(display_value) else {
            return false;
        };

        match self.operator {
            FilterOperator::Eq => property == self.value,
            FilterOperator::NotEq => property != self.value,
            FilterOperator::Gt => self.compare(&property) == Ordering::Greater,
            FilterOperator::Lt => self.compare(&property) == Ordering::Less,
            FilterOperator::Ge => self.compare(&property) != Ordering::Less,
            FilterOperator::Le => self.compare(&property) != Ordering::Greater,
        }
    }

    fn compare(&self, property: &str) -> Ordering {
        match (property.trim().parse::<f64>(), self.value.trim().parse::<f64>()) {
            (Ok(a), Ok(b)) => a.total_cmp(&b),
            _ => property.cmp(&self.value),
        }
    }
}

/// String form of a property value as shown in a table cell. `None` for `null`.
pub fn display_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Features matching all conditions, with their keys.
pub fn filter_features<'a>(
    collection: &'a FeatureCollection,
    conditions: &[FilterCondition],
) -> Vec<(FeatureKey, &'a Feature)> {
    collection
        .features
        .iter()
        .enumerate()
        .filter(|(_, feature)| conditions.iter().all(|c| c.matches(feature)))
        .map(|(index, feature)| (feature_key(feature, index), feature))
        .collect()
}

/// New collection with the features matching all conditions.
pub fn filtered_collection(
    source: &FeatureCollection,
    conditions: &[FilterCondition],
) -> FeatureCollection {
    collection(
        filter_features(source, conditions)
            .into_iter()
            .map(|(_, feature)| feature.clone())
            .collect(),
    )
}

/// Names of all properties of the features. A name is listed when it is first met while iterating the features.
pub fn table_columns(collection: &FeatureCollection) -> Vec<String> {
    let mut columns: Vec<String> = vec![];
    for properties in collection.features.iter().filter_map(|f| f.properties.as_ref()) {
        for key in properties.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    columns
}

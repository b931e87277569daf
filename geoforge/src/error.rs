//! Error types used by the crate.

use geoforge_types::error::GeoforgeTypesError;
use geoforge_types::GeometryKind;
use thiserror::Error;

use crate::export::ExportError;
use crate::geometry::GeometryError;
use crate::layer::LayerId;
use crate::ops::OperationKind;

/// Geoforge error type.
#[derive(Debug, Error)]
pub enum GeoforgeError {
    /// User input is missing or invalid. Nothing was computed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Referenced layer is not in the store.
    #[error("layer {0} not found")]
    LayerNotFound(LayerId),
    /// The map cannot accept new layers yet.
    #[error("map is not ready")]
    RendererNotReady,
    /// Geometry type of a new layer cannot be determined from its features.
    #[error("cannot determine geometry type of layer '{0}'")]
    UnknownGeometryType(String),
    /// Operation ran but could not produce a result, even after all fallbacks.
    #[error("{operation} failed: {reason}")]
    OperationFailed {
        /// Operation that failed.
        operation: OperationKind,
        /// Human readable reason.
        reason: String,
    },
    /// Geometry primitive failed in a place without a fallback.
    #[error("geometry error: {0}")]
    Geometry(#[from] GeometryError),
    /// Input feature data is malformed.
    #[error("invalid feature data: {0}")]
    Features(#[from] GeoforgeTypesError),
    /// Input text is not valid GeoJSON.
    #[error("failed to parse GeoJSON: {0}")]
    GeoJson(#[from] geojson::Error),
    /// Layer data cannot be exported.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}

/// Invalid user input, detected before any geometry is computed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required layer was not selected.
    #[error("no {0} layer selected")]
    NoLayerSelected(&'static str),
    /// Fewer layers were selected than the operation needs.
    #[error("at least {required} layers must be selected, got {selected}")]
    NotEnoughLayers {
        /// Minimum number of layers.
        required: usize,
        /// Number of selected layers.
        selected: usize,
    },
    /// The same layer was selected in two roles.
    #[error("layer {0} is selected more than once")]
    DuplicateLayer(LayerId),
    /// Buffer distance is missing, zero, negative or not a number.
    #[error("distance must be a positive number")]
    InvalidDistance,
    /// Extraction without any selected feature.
    #[error("no features selected")]
    EmptySelection,
    /// Output layer name is empty.
    #[error("output layer name must not be empty")]
    EmptyName,
    /// Number of output specifications does not match the number of input layers.
    #[error("expected {expected} output layer settings, got {actual}")]
    OutputCountMismatch {
        /// Number of input layers.
        expected: usize,
        /// Number of output settings.
        actual: usize,
    },
    /// A layer has the wrong kind of geometry for its role in the operation.
    #[error("layer '{layer}' must contain {expected} features, it contains {actual} features")]
    WrongGeometry {
        /// Layer name.
        layer: String,
        /// Expected geometry family, e.g. "polygon".
        expected: &'static str,
        /// Actual geometry kind of the layer.
        actual: GeometryKind,
    },
}

/// Non-blocking message for the user describing the outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short title.
    pub title: String,
    /// Details.
    pub description: String,
}

impl GeoforgeError {
    /// Converts the error into a notification that can be shown to the user.
    pub fn notification(&self) -> Notification {
        let title = match self {
            Self::Validation(_) => "Invalid input".to_string(),
            Self::OperationFailed { operation, .. } => format!("{operation} failed"),
            Self::RendererNotReady => "Map is not ready".to_string(),
            Self::GeoJson(_) | Self::Features(_) => "Invalid data".to_string(),
            Self::Export(_) => "Export failed".to_string(),
            Self::LayerNotFound(_) | Self::UnknownGeometryType(_) | Self::Geometry(_) => {
                "Operation failed".to_string()
            }
        };

        let description = match self {
            Self::OperationFailed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };

        Notification { title, description }
    }

    pub(crate) fn failed(operation: OperationKind, reason: impl Into<String>) -> Self {
        Self::OperationFailed {
            operation,
            reason: reason.into(),
        }
    }
}

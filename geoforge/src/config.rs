//! Engine configuration.

use geoforge_types::ring::DEFAULT_RING_EPSILON;
use serde::{Deserialize, Serialize};

use crate::color::{Color, DEFAULT_PALETTE};

/// How distances given in meters relate to the coordinates of the features.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSpace {
    /// Coordinates are longitude/latitude in degrees. Metric distances are applied in a local equirectangular
    /// frame centered on each geometry.
    #[default]
    Geographic,
    /// Coordinates are planar and already measured in meters.
    Planar,
}

/// Settings shared by the layer store and all operations.
///
/// ```
/// use geoforge::config::{DistanceSpace, ProcessingConfig};
///
/// let config = ProcessingConfig::default()
///     .with_distance_space(DistanceSpace::Planar)
///     .with_default_fill_opacity(0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Tolerance used when checking that polygon rings are closed.
    pub ring_epsilon: f64,
    /// Coordinate space of buffer distances.
    pub distance_space: DistanceSpace,
    /// Opacity of new layers created without an explicit style.
    pub default_fill_opacity: f32,
    /// Colors assigned to new layers before random colors are used.
    pub palette: Vec<Color>,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            ring_epsilon: DEFAULT_RING_EPSILON,
            distance_space: DistanceSpace::default(),
            default_fill_opacity: 0.5,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl ProcessingConfig {
    /// Sets the tolerance of ring closure checks.
    pub fn with_ring_epsilon(mut self, epsilon: f64) -> Self {
        self.ring_epsilon = epsilon;
        self
    }

    /// Sets the coordinate space of buffer distances.
    pub fn with_distance_space(mut self, space: DistanceSpace) -> Self {
        self.distance_space = space;
        self
    }

    /// Sets the opacity of new layers. The value is clamped into `[0, 1]`.
    pub fn with_default_fill_opacity(mut self, opacity: f32) -> Self {
        self.default_fill_opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Replaces the palette of layer colors.
    pub fn with_palette(mut self, palette: Vec<Color>) -> Self {
        self.palette = palette;
        self
    }
}

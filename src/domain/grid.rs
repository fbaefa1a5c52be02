//! # Feature Grid
//!
//! Immutable per-cell spatial features covering the analyzed area: sunlight
//! exposure, terrain classification, obstacle proximity, slope and economic
//! cost. Constructed once from upstream vision outputs and read-only for the
//! rest of the pipeline, so it is safe to share across parallel scoring
//! workers without locking.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Terrain classification of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TerrainClass {
    Vegetation,
    Water,
    Building,
    Road,
    #[default]
    BareLand,
    Shadow,
}

/// Per-cell feature layers, row-major, all of length `width * height`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridLayers {
    /// Annual sunlight exposure per cell in hours
    pub sunlight_hours: Vec<f64>,
    /// Terrain class per cell (unclassified cells default to bare land upstream)
    pub terrain_class: Vec<TerrainClass>,
    /// Distance to the nearest obstacle in grid units
    pub obstacle_distance: Vec<f64>,
    /// Terrain slope per cell in degrees
    pub slope_degrees: Vec<f64>,
    /// Normalized economic cost index per cell
    pub cost_index: Vec<f64>,
}

/// Grid construction errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum GridShapeError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("layer '{layer}' has {actual} cells, expected {expected} ({width}x{height})")]
    LayerMismatch {
        layer: &'static str,
        expected: usize,
        actual: usize,
        width: usize,
        height: usize,
    },

    #[error("layer '{layer}' contains a negative value {value} at cell {index}")]
    NegativeValue {
        layer: &'static str,
        index: usize,
        value: f64,
    },
}

/// Immutable spatial feature grid
///
/// All layers are validated to share the same `width * height` shape at
/// construction; the observed maximum sunlight is precomputed here since the
/// scoring function normalizes against it on every evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureGrid {
    width: usize,
    height: usize,
    layers: GridLayers,
    max_sunlight_hours: f64,
}

impl FeatureGrid {
    pub fn new(width: usize, height: usize, layers: GridLayers) -> Result<Self, GridShapeError> {
        if width == 0 || height == 0 {
            return Err(GridShapeError::EmptyGrid { width, height });
        }

        let expected = width * height;
        let shapes: [(&'static str, usize); 5] = [
            ("sunlight_hours", layers.sunlight_hours.len()),
            ("terrain_class", layers.terrain_class.len()),
            ("obstacle_distance", layers.obstacle_distance.len()),
            ("slope_degrees", layers.slope_degrees.len()),
            ("cost_index", layers.cost_index.len()),
        ];
        for (layer, actual) in shapes {
            if actual != expected {
                return Err(GridShapeError::LayerMismatch {
                    layer,
                    expected,
                    actual,
                    width,
                    height,
                });
            }
        }

        let numeric: [(&'static str, &[f64]); 4] = [
            ("sunlight_hours", &layers.sunlight_hours),
            ("obstacle_distance", &layers.obstacle_distance),
            ("slope_degrees", &layers.slope_degrees),
            ("cost_index", &layers.cost_index),
        ];
        for (layer, values) in numeric {
            if let Some((index, &value)) = values.iter().enumerate().find(|(_, v)| **v < 0.0) {
                return Err(GridShapeError::NegativeValue {
                    layer,
                    index,
                    value,
                });
            }
        }

        let max_sunlight_hours = layers
            .sunlight_hours
            .iter()
            .copied()
            .fold(0.0_f64, f64::max);

        Ok(Self {
            width,
            height,
            layers,
            max_sunlight_hours,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Observed maximum annual sunlight across the grid
    pub fn max_sunlight_hours(&self) -> f64 {
        self.max_sunlight_hours
    }

    /// Row-major index of cell (x, y)
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    #[inline]
    pub fn sunlight_at(&self, index: usize) -> f64 {
        self.layers.sunlight_hours[index]
    }

    #[inline]
    pub fn terrain_at(&self, index: usize) -> TerrainClass {
        self.layers.terrain_class[index]
    }

    #[inline]
    pub fn obstacle_distance_at(&self, index: usize) -> f64 {
        self.layers.obstacle_distance[index]
    }

    #[inline]
    pub fn slope_at(&self, index: usize) -> f64 {
        self.layers.slope_degrees[index]
    }

    #[inline]
    pub fn cost_at(&self, index: usize) -> f64 {
        self.layers.cost_index[index]
    }
}

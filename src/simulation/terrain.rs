//! # Synthetic Terrain Generation
//!
//! Builders for synthetic feature grids. The optimization core consumes
//! grids produced by an upstream vision pipeline; these builders stand in
//! for that pipeline in the demo binary and in tests, painting terrain
//! patches onto a uniform base and optionally roughening the sunlight field
//! with gaussian noise.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{FeatureGrid, GridLayers, GridShapeError, TerrainClass};

/// Builder for a synthetic feature grid
///
/// Starts from a uniform, favorable base (bare land, clear of obstacles,
/// flat, zero cost) and layers terrain patches and noise on top.
#[derive(Debug, Clone)]
pub struct GridBuilder {
    width: usize,
    height: usize,
    sunlight_hours: f64,
    sunlight_noise_std: f64,
    obstacle_distance: f64,
    slope_degrees: f64,
    cost_index: f64,
    patches: Vec<TerrainPatch>,
}

#[derive(Debug, Clone)]
struct TerrainPatch {
    class: TerrainClass,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
}

impl GridBuilder {
    pub fn uniform(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            sunlight_hours: 10.0,
            sunlight_noise_std: 0.0,
            obstacle_distance: 100.0,
            slope_degrees: 0.0,
            cost_index: 0.0,
            patches: Vec::new(),
        }
    }

    pub fn with_sunlight(mut self, hours: f64) -> Self {
        self.sunlight_hours = hours;
        self
    }

    /// Gaussian roughness on the sunlight field; requires `build_with_rng`
    pub fn with_sunlight_noise(mut self, std_dev: f64) -> Self {
        self.sunlight_noise_std = std_dev;
        self
    }

    pub fn with_obstacle_distance(mut self, distance: f64) -> Self {
        self.obstacle_distance = distance;
        self
    }

    pub fn with_slope(mut self, degrees: f64) -> Self {
        self.slope_degrees = degrees;
        self
    }

    pub fn with_cost(mut self, index: f64) -> Self {
        self.cost_index = index;
        self
    }

    /// Paint a terrain patch over the half-open cell range `[x0, x1) x [y0, y1)`
    pub fn paint(mut self, class: TerrainClass, x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        self.patches.push(TerrainPatch { class, x0, y0, x1, y1 });
        self
    }

    pub fn build(self) -> Result<FeatureGrid, GridShapeError> {
        let layers = self.layers(None);
        FeatureGrid::new(self.width, self.height, layers)
    }

    /// Build with a generator for the noisy sunlight field
    pub fn build_with_rng(self, rng: &mut StdRng) -> Result<FeatureGrid, GridShapeError> {
        let layers = self.layers(Some(rng));
        FeatureGrid::new(self.width, self.height, layers)
    }

    fn layers(&self, rng: Option<&mut StdRng>) -> GridLayers {
        let cells = self.width * self.height;

        let sunlight_hours = match rng {
            Some(rng) if self.sunlight_noise_std > 0.0 => {
                // The guard above rules out the only failure modes (sigma <= 0 or NaN)
                let normal =
                    Normal::new(0.0, self.sunlight_noise_std).expect("positive std dev");
                (0..cells)
                    .map(|_| (self.sunlight_hours + normal.sample(rng)).max(0.0))
                    .collect()
            }
            _ => vec![self.sunlight_hours; cells],
        };

        let mut terrain_class = vec![TerrainClass::BareLand; cells];
        for patch in &self.patches {
            let x1 = patch.x1.min(self.width);
            let y1 = patch.y1.min(self.height);
            for y in patch.y0..y1 {
                for x in patch.x0..x1 {
                    terrain_class[y * self.width + x] = patch.class;
                }
            }
        }

        GridLayers {
            sunlight_hours,
            terrain_class,
            obstacle_distance: vec![self.obstacle_distance; cells],
            slope_degrees: vec![self.slope_degrees; cells],
            cost_index: vec![self.cost_index; cells],
        }
    }
}

//! # Multi-Criteria Site Scoring
//!
//! Pure fitness function mapping a candidate site and the feature grid to a
//! weighted suitability score in [0, 1] plus a per-criterion breakdown. The
//! optimizer calls this up to `population_size * generations` times per run,
//! from parallel workers, so it carries no hidden state: the result is a
//! deterministic function of (site, grid, weights).

use crate::config::{ConfigError, ScoringConfig, ScoringWeights};
use crate::domain::{CandidateSite, FeatureGrid, ScoreBreakdown, TerrainClass};

/// Base suitability of a terrain class before exclusion penalties
fn base_suitability(class: TerrainClass) -> f64 {
    match class {
        TerrainClass::BareLand => 1.0,
        TerrainClass::Vegetation => 0.7,
        TerrainClass::Road => 0.5,
        TerrainClass::Shadow => 0.3,
        // Penalized multiplicatively in `Scorer::score`
        TerrainClass::Water | TerrainClass::Building => 1.0,
    }
}

/// Weighted multi-criteria scorer
///
/// Weights and normalization references are validated once at construction;
/// `score` itself cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    weights: ScoringWeights,
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(weights: ScoringWeights, config: ScoringConfig) -> Result<Self, ConfigError> {
        weights.validate()?;
        config.validate()?;
        Ok(Self { weights, config })
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Weighted total of a breakdown
    pub fn total(&self, breakdown: &ScoreBreakdown) -> f64 {
        self.weights.sunlight * breakdown.sunlight
            + self.weights.terrain * breakdown.terrain
            + self.weights.obstacles * breakdown.obstacles
            + self.weights.accessibility * breakdown.accessibility
            + self.weights.cost * breakdown.cost
    }

    /// Score a site against the grid
    ///
    /// Each criterion aggregates the covered cells by mean and normalizes to
    /// [0, 1] against its configured reference. A site covering nothing but
    /// water, or nothing but buildings, is a hard exclusion and scores zero
    /// outright; keeping it in the population (rather than discarding it)
    /// leaves the scoring function as the single source of truth for fitness.
    pub fn score(&self, site: &CandidateSite, grid: &FeatureGrid) -> (f64, ScoreBreakdown) {
        let rect = site.cell_rect(grid.width(), grid.height());
        let cells = rect.cell_count();

        let mut water_cells = 0usize;
        let mut building_cells = 0usize;
        let mut sunlight_sum = 0.0;
        let mut terrain_sum = 0.0;
        let mut obstacle_sum = 0.0;
        let mut slope_sum = 0.0;
        let mut cost_sum = 0.0;

        for index in rect.indices(grid.width()) {
            let class = grid.terrain_at(index);
            let cell_suitability = match class {
                TerrainClass::Water => {
                    water_cells += 1;
                    base_suitability(class) * self.config.water_penalty
                }
                TerrainClass::Building => {
                    building_cells += 1;
                    base_suitability(class) * self.config.building_penalty
                }
                other => base_suitability(other),
            };

            terrain_sum += cell_suitability;
            sunlight_sum += grid.sunlight_at(index);
            obstacle_sum += grid.obstacle_distance_at(index);
            slope_sum += grid.slope_at(index);
            cost_sum += grid.cost_at(index);
        }

        if water_cells == cells || building_cells == cells {
            return (0.0, ScoreBreakdown::zero());
        }

        let n = cells as f64;
        let sunlight = if grid.max_sunlight_hours() > 0.0 {
            (sunlight_sum / n) / grid.max_sunlight_hours()
        } else {
            0.0
        };
        let terrain = terrain_sum / n;
        let obstacles = ((obstacle_sum / n) / self.config.obstacle_reference).min(1.0);
        let accessibility = (1.0 - (slope_sum / n) / self.config.slope_reference).clamp(0.0, 1.0);
        let cost = (1.0 - (cost_sum / n) / self.config.cost_reference).clamp(0.0, 1.0);

        let breakdown = ScoreBreakdown {
            sunlight,
            terrain,
            obstacles,
            accessibility,
            cost,
        };
        (self.total(&breakdown), breakdown)
    }
}

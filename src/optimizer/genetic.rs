//! # Genetic Site Search
//!
//! Population-based stochastic search over candidate placements. Each
//! generation scores the whole population (the only parallel step; scoring
//! is pure and the grid is read-only), truncates to the fittest half,
//! refills by mean recombination and mutates the children. The generation
//! budget is fixed: no early stopping, so runtime is bounded and two runs
//! with the same seed produce bit-identical rankings.

use chrono::{DateTime, Utc};
use itertools::Itertools;
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::{debug, info};
use uuid::Uuid;

use super::population::{
    initial_population, next_generation, select_survivors, ASPECT_MAX, ASPECT_MIN,
};
use crate::config::{Config, ConfigError, OptimizerConfig};
use crate::domain::{CandidateSite, FeatureGrid};
use crate::scoring::Scorer;

/// Optimizer failure modes, all surfaced before the first generation runs
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptimizeError {
    #[error("population_size must be at least 2, got {actual}")]
    InvalidPopulationSize { actual: usize },

    #[error("generations must be at least 1, got {actual}")]
    InvalidGenerations { actual: usize },

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    #[error(
        "grid {width}x{height} cannot fit a site of min_area {min_area} \
         (requires at least {required_width:.1}x{required_height:.1})"
    )]
    InsufficientGrid {
        width: usize,
        height: usize,
        min_area: f64,
        required_width: f64,
        required_height: f64,
    },

    #[error("no valid placement found after {attempts} attempts")]
    PlacementExhausted { attempts: usize },
}

/// Summary metrics for one optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub generations: usize,
    pub population_size: usize,
    pub candidates_evaluated: usize,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
}

/// Ranked result of an optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    /// Top-N sites, score descending, ids re-assigned in rank order
    pub sites: Vec<CandidateSite>,
    pub report: OptimizationReport,
}

#[derive(Debug)]
pub struct GeneticOptimizer {
    config: OptimizerConfig,
    scorer: Scorer,
}

impl GeneticOptimizer {
    pub fn new(config: &Config) -> Result<Self, OptimizeError> {
        let scorer = Scorer::new(config.weights, config.scoring)?;
        Self::with_scorer(config.optimizer.clone(), scorer)
    }

    pub fn with_scorer(config: OptimizerConfig, scorer: Scorer) -> Result<Self, OptimizeError> {
        config.validate()?;
        if config.population_size < 2 {
            return Err(OptimizeError::InvalidPopulationSize {
                actual: config.population_size,
            });
        }
        if config.generations < 1 {
            return Err(OptimizeError::InvalidGenerations {
                actual: config.generations,
            });
        }
        Ok(Self { config, scorer })
    }

    /// Run the search with a generator seeded from the configuration
    pub fn optimize(&self, grid: &FeatureGrid) -> Result<OptimizationOutcome, OptimizeError> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.optimize_with_rng(grid, &mut rng)
    }

    /// Run the search with an explicit generator
    ///
    /// All randomness (initialization, parent selection, mutation) draws from
    /// this generator; scoring is deterministic, so evaluation order cannot
    /// affect results.
    pub fn optimize_with_rng(
        &self,
        grid: &FeatureGrid,
        rng: &mut StdRng,
    ) -> Result<OptimizationOutcome, OptimizeError> {
        self.check_grid_capacity(grid)?;

        info!(
            population_size = self.config.population_size,
            generations = self.config.generations,
            grid_width = grid.width(),
            grid_height = grid.height(),
            "starting genetic site search"
        );

        let mut population = initial_population(grid, &self.config, rng)?;
        for generation in 0..self.config.generations {
            self.evaluate(grid, &mut population);

            let survivors = select_survivors(&population);
            debug!(
                generation,
                best_score = survivors.first().map(|s| s.score).unwrap_or(0.0),
                mean_score = mean_score(&population),
                "generation evaluated"
            );

            population = next_generation(survivors, grid, &self.config, rng)?;
        }
        self.evaluate(grid, &mut population);

        let sites = rank_top_n(population, self.config.top_n);
        let report = self.build_report(&sites);
        info!(
            run_id = %report.run_id,
            top_n = sites.len(),
            best_score = report.max_score,
            "site search complete"
        );

        Ok(OptimizationOutcome { sites, report })
    }

    /// Score every member; embarrassingly parallel, no cross-candidate state
    fn evaluate(&self, grid: &FeatureGrid, population: &mut [CandidateSite]) {
        population.par_iter_mut().for_each(|site| {
            let (score, breakdown) = self.scorer.score(site, grid);
            site.score = score;
            site.breakdown = breakdown;
        });
    }

    /// Reject grids on which no minimum-area site could ever be placed
    fn check_grid_capacity(&self, grid: &FeatureGrid) -> Result<(), OptimizeError> {
        let required_width = (self.config.min_area * ASPECT_MIN).sqrt();
        let required_height = (self.config.min_area / ASPECT_MAX).sqrt();
        if (grid.width() as f64) < required_width || (grid.height() as f64) < required_height {
            return Err(OptimizeError::InsufficientGrid {
                width: grid.width(),
                height: grid.height(),
                min_area: self.config.min_area,
                required_width,
                required_height,
            });
        }
        Ok(())
    }

    fn build_report(&self, sites: &[CandidateSite]) -> OptimizationReport {
        let scores: Vec<f64> = sites.iter().map(|s| s.score).collect();
        let (min_score, max_score) = match scores.iter().copied().map(OrderedFloat).minmax() {
            itertools::MinMaxResult::NoElements => (0.0, 0.0),
            itertools::MinMaxResult::OneElement(v) => (v.0, v.0),
            itertools::MinMaxResult::MinMax(lo, hi) => (lo.0, hi.0),
        };
        let average_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        OptimizationReport {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            generations: self.config.generations,
            population_size: self.config.population_size,
            candidates_evaluated: self.config.population_size * (self.config.generations + 1),
            average_score,
            min_score,
            max_score,
        }
    }
}

fn mean_score(population: &[CandidateSite]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(|s| s.score).sum::<f64>() / population.len() as f64
}

/// Total-order ranking: score desc, then smaller area, then center x, then
/// center y; required for top-N to be a well-defined, reproducible operation
fn rank_top_n(mut population: Vec<CandidateSite>, top_n: usize) -> Vec<CandidateSite> {
    population.sort_by_key(|site| {
        (
            Reverse(OrderedFloat(site.score)),
            OrderedFloat(site.area()),
            OrderedFloat(site.center_x),
            OrderedFloat(site.center_y),
        )
    });
    population.truncate(top_n);
    for (rank, site) in population.iter_mut().enumerate() {
        site.id = rank;
    }
    population
}

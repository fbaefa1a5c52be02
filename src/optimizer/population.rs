//! Population construction and the per-generation operators.
//!
//! Generations are immutable snapshots: selection, recombination and mutation
//! are pure functions from one scored population to the next, so every
//! generation is independently testable and no aliasing survives across the
//! generation boundary.

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::Rng;
use std::cmp::Reverse;

use super::genetic::OptimizeError;
use crate::config::OptimizerConfig;
use crate::domain::{CandidateSite, FeatureGrid};

/// Admissible width/height aspect ratios for sampled extents
pub const ASPECT_MIN: f64 = 0.8;
pub const ASPECT_MAX: f64 = 2.0;

/// Resample budget per population member before giving up
const MAX_PLACEMENT_ATTEMPTS: usize = 1_000;

/// One placement attempt: uniform center, uniform area, uniform aspect ratio
///
/// Returns `None` when the sampled extent cannot fit the grid; the caller
/// resamples rather than clipping, so the distribution over valid placements
/// stays uniform.
fn sample_candidate(
    id: usize,
    grid: &FeatureGrid,
    config: &OptimizerConfig,
    rng: &mut StdRng,
) -> Option<CandidateSite> {
    let area = rng.gen_range(config.min_area..=config.max_area);
    let aspect = rng.gen_range(ASPECT_MIN..=ASPECT_MAX);
    let width = (area * aspect).sqrt();
    let height = area / width;

    let grid_w = grid.width() as f64;
    let grid_h = grid.height() as f64;
    if width > grid_w || height > grid_h {
        return None;
    }

    let center_x = rng.gen_range(width / 2.0..=grid_w - width / 2.0);
    let center_y = rng.gen_range(height / 2.0..=grid_h - height / 2.0);
    Some(CandidateSite::new(id, center_x, center_y, width, height))
}

/// Generate the initial population of `population_size` valid placements
pub fn initial_population(
    grid: &FeatureGrid,
    config: &OptimizerConfig,
    rng: &mut StdRng,
) -> Result<Vec<CandidateSite>, OptimizeError> {
    let mut population = Vec::with_capacity(config.population_size);
    for id in 0..config.population_size {
        let site = place_with_retries(|| sample_candidate(id, grid, config, rng))?;
        population.push(site);
    }
    Ok(population)
}

fn place_with_retries<F>(mut attempt: F) -> Result<CandidateSite, OptimizeError>
where
    F: FnMut() -> Option<CandidateSite>,
{
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        if let Some(site) = attempt() {
            return Ok(site);
        }
    }
    Err(OptimizeError::PlacementExhausted {
        attempts: MAX_PLACEMENT_ATTEMPTS,
    })
}

/// Elitist truncation: keep the top half of the scored population
///
/// Order is score descending, ties broken by smaller footprint, remaining
/// ties by insertion order (stable sort), so selection is fully
/// deterministic.
pub fn select_survivors(population: &[CandidateSite]) -> Vec<CandidateSite> {
    let mut ranked: Vec<CandidateSite> = population.to_vec();
    ranked.sort_by_key(|site| (Reverse(OrderedFloat(site.score)), OrderedFloat(site.area())));
    ranked.truncate((population.len() / 2).max(1));
    ranked
}

/// Refill the population with children of uniformly drawn survivor pairs
///
/// A child is the arithmetic mean of its parents' centers and extents, then
/// mutated in place. Parent pairs whose mean extent would leave the
/// configured area band are redrawn; the mean of two in-bounds placements is
/// itself in bounds, so no positional check is needed.
pub fn next_generation(
    survivors: Vec<CandidateSite>,
    grid: &FeatureGrid,
    config: &OptimizerConfig,
    rng: &mut StdRng,
) -> Result<Vec<CandidateSite>, OptimizeError> {
    let parent_pool = survivors.len();
    let children_needed = config.population_size.saturating_sub(parent_pool);
    let mut generation = survivors;
    generation.reserve(children_needed);

    for _ in 0..children_needed {
        let id = generation.len();
        let mut child = place_with_retries(|| {
            let parent_a = &generation[rng.gen_range(0..parent_pool)];
            let parent_b = &generation[rng.gen_range(0..parent_pool)];
            let child = crossover(id, parent_a, parent_b);
            let area = child.area();
            (config.min_area..=config.max_area)
                .contains(&area)
                .then_some(child)
        })?;

        mutate(&mut child, grid, config, rng);
        generation.push(child);
    }
    Ok(generation)
}

/// Arithmetic-mean recombination of two parents
fn crossover(id: usize, a: &CandidateSite, b: &CandidateSite) -> CandidateSite {
    CandidateSite::new(
        id,
        (a.center_x + b.center_x) / 2.0,
        (a.center_y + b.center_y) / 2.0,
        (a.width + b.width) / 2.0,
        (a.height + b.height) / 2.0,
    )
}

/// Perturb the center with probability `mutation_rate`; the extent is fixed
///
/// The shift is uniform in ±`mutation_shift` per axis and the center is
/// re-clamped so the full extent stays inside the grid.
fn mutate(site: &mut CandidateSite, grid: &FeatureGrid, config: &OptimizerConfig, rng: &mut StdRng) {
    if rng.gen::<f64>() >= config.mutation_rate {
        return;
    }

    let shift = config.mutation_shift;
    site.center_x += rng.gen_range(-shift..=shift);
    site.center_y += rng.gen_range(-shift..=shift);

    let half_w = site.width / 2.0;
    let half_h = site.height / 2.0;
    site.center_x = site.center_x.clamp(half_w, grid.width() as f64 - half_w);
    site.center_y = site.center_y.clamp(half_h, grid.height() as f64 - half_h);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GridLayers, TerrainClass};
    use rand::SeedableRng;

    fn uniform_grid(width: usize, height: usize) -> FeatureGrid {
        let cells = width * height;
        FeatureGrid::new(
            width,
            height,
            GridLayers {
                sunlight_hours: vec![10.0; cells],
                terrain_class: vec![TerrainClass::BareLand; cells],
                obstacle_distance: vec![100.0; cells],
                slope_degrees: vec![0.0; cells],
                cost_index: vec![0.0; cells],
            },
        )
        .unwrap()
    }

    fn small_config() -> OptimizerConfig {
        OptimizerConfig {
            population_size: 40,
            min_area: 100.0,
            max_area: 900.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_population_within_constraints() {
        let grid = uniform_grid(100, 100);
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(7);

        let population = initial_population(&grid, &config, &mut rng).unwrap();

        assert_eq!(population.len(), 40);
        for site in &population {
            assert!(site.fits_within(100, 100));
            assert!(site.area() >= config.min_area && site.area() <= config.max_area);
            let aspect = site.width / site.height;
            assert!(aspect >= ASPECT_MIN - 1e-9 && aspect <= ASPECT_MAX + 1e-9);
        }
    }

    #[test]
    fn test_initial_population_deterministic() {
        let grid = uniform_grid(100, 100);
        let config = small_config();

        let mut rng_a = StdRng::seed_from_u64(11);
        let mut rng_b = StdRng::seed_from_u64(11);
        let pop_a = initial_population(&grid, &config, &mut rng_a).unwrap();
        let pop_b = initial_population(&grid, &config, &mut rng_b).unwrap();

        for (a, b) in pop_a.iter().zip(pop_b.iter()) {
            assert_eq!(a.center_x, b.center_x);
            assert_eq!(a.center_y, b.center_y);
            assert_eq!(a.width, b.width);
        }
    }

    #[test]
    fn test_selection_keeps_top_half_by_score() {
        let mut population: Vec<CandidateSite> = (0..10)
            .map(|i| {
                let mut site = CandidateSite::new(i, 50.0, 50.0, 10.0, 10.0);
                site.score = i as f64 / 10.0;
                site
            })
            .collect();
        population.reverse();

        let survivors = select_survivors(&population);

        assert_eq!(survivors.len(), 5);
        assert_eq!(survivors[0].score, 0.9);
        assert_eq!(survivors[4].score, 0.5);
    }

    #[test]
    fn test_selection_is_monotonic() {
        let grid = uniform_grid(100, 100);
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(3);
        let mut population = initial_population(&grid, &config, &mut rng).unwrap();
        for (i, site) in population.iter_mut().enumerate() {
            site.score = ((i * 37) % 100) as f64 / 100.0;
        }

        let mean = |sites: &[CandidateSite]| {
            sites.iter().map(|s| s.score).sum::<f64>() / sites.len() as f64
        };
        let survivors = select_survivors(&population);

        assert!(mean(&survivors) >= mean(&population));
    }

    #[test]
    fn test_selection_tie_prefers_smaller_area() {
        let mut big = CandidateSite::new(0, 50.0, 50.0, 30.0, 30.0);
        let mut small = CandidateSite::new(1, 50.0, 50.0, 10.0, 10.0);
        big.score = 0.5;
        small.score = 0.5;

        let survivors = select_survivors(&[big, small]);
        assert_eq!(survivors[0].id, 1);
    }

    #[test]
    fn test_next_generation_refills_population() {
        let grid = uniform_grid(100, 100);
        let config = small_config();
        let mut rng = StdRng::seed_from_u64(5);
        let mut population = initial_population(&grid, &config, &mut rng).unwrap();
        for site in &mut population {
            site.score = 0.5;
        }

        let survivors = select_survivors(&population);
        let next = next_generation(survivors, &grid, &config, &mut rng).unwrap();

        assert_eq!(next.len(), config.population_size);
        for site in &next {
            assert!(site.fits_within(100, 100));
            assert!(site.area() >= config.min_area && site.area() <= config.max_area);
        }
    }

    #[test]
    fn test_mutation_respects_bounds() {
        let grid = uniform_grid(100, 100);
        let config = OptimizerConfig {
            mutation_rate: 1.0,
            mutation_shift: 500.0,
            ..small_config()
        };
        let mut rng = StdRng::seed_from_u64(9);

        for _ in 0..50 {
            let mut site = CandidateSite::new(0, 50.0, 50.0, 20.0, 20.0);
            mutate(&mut site, &grid, &config, &mut rng);
            assert!(site.fits_within(100, 100));
            // Extent never mutates
            assert_eq!(site.width, 20.0);
            assert_eq!(site.height, 20.0);
        }
    }

    #[test]
    fn test_crossover_is_arithmetic_mean() {
        let a = CandidateSite::new(0, 20.0, 30.0, 10.0, 20.0);
        let b = CandidateSite::new(1, 40.0, 50.0, 30.0, 10.0);

        let child = crossover(2, &a, &b);

        assert_eq!(child.center_x, 30.0);
        assert_eq!(child.center_y, 40.0);
        assert_eq!(child.width, 20.0);
        assert_eq!(child.height, 15.0);
    }
}

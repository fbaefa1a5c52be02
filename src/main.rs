use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use solar_site_optimizer::{config::Config, optimizer, simulation, telemetry, validation};
use solar_site_optimizer::domain::TerrainClass;
use tracing::info;

fn main() -> Result<()> {
    telemetry::init_tracing();

    let cfg = Config::load()?;

    // Demo area standing in for the upstream vision pipeline: a lake, a few
    // built-up blocks and a noisy sunlight field on otherwise open land.
    let mut grid_rng = StdRng::seed_from_u64(cfg.optimizer.seed + 1);
    let grid = simulation::GridBuilder::uniform(512, 512)
        .with_sunlight(2800.0)
        .with_sunlight_noise(250.0)
        .paint(TerrainClass::Water, 60, 300, 180, 420)
        .paint(TerrainClass::Building, 380, 40, 470, 120)
        .paint(TerrainClass::Vegetation, 200, 200, 320, 280)
        .paint(TerrainClass::Road, 0, 250, 512, 256)
        .build_with_rng(&mut grid_rng)?;

    info!(
        width = grid.width(),
        height = grid.height(),
        max_sunlight = grid.max_sunlight_hours(),
        "demo grid constructed"
    );

    let genetic = optimizer::GeneticOptimizer::new(&cfg)?;
    let outcome = genetic.optimize(&grid)?;

    let validator = validation::RealityValidator::new(cfg.validator)?;
    let mut validation_rng = StdRng::seed_from_u64(cfg.optimizer.seed + 2);
    let report = validator.validate_synthesized(&outcome.sites, &mut validation_rng)?;

    for recommendation in &report.recommendations {
        info!(%recommendation);
    }

    for record in validation::site_records(&outcome.sites, &report) {
        println!("{}", serde_json::to_string(&record)?);
    }
    println!("{}", serde_json::to_string(&outcome.report)?);

    Ok(())
}

//! Property tests for the scoring and validation invariants.

use proptest::prelude::*;
use solar_site_optimizer::config::{ScoringConfig, ScoringWeights, ValidatorConfig};
use solar_site_optimizer::domain::CandidateSite;
use solar_site_optimizer::scoring::Scorer;
use solar_site_optimizer::simulation::GridBuilder;
use solar_site_optimizer::validation::{FieldReference, RealityValidator};

/// Weights drawn positive and normalized; the sum lands within a few ulps of
/// 1.0, well inside the validator's 1e-9 tolerance.
fn arb_weights() -> impl Strategy<Value = ScoringWeights> {
    (0.05f64..1.0, 0.05f64..1.0, 0.05f64..1.0, 0.05f64..1.0, 0.05f64..1.0).prop_map(
        |(a, b, c, d, e)| {
            let sum = a + b + c + d + e;
            ScoringWeights {
                sunlight: a / sum,
                terrain: b / sum,
                obstacles: c / sum,
                accessibility: d / sum,
                cost: e / sum,
            }
        },
    )
}

/// In-bounds sites on a 100x100 grid
fn arb_site() -> impl Strategy<Value = CandidateSite> {
    (5.0f64..45.0, 5.0f64..45.0).prop_flat_map(|(half_w, half_h)| {
        (
            Just(half_w),
            Just(half_h),
            half_w..(100.0 - half_w),
            half_h..(100.0 - half_h),
        )
            .prop_map(|(half_w, half_h, cx, cy)| {
                CandidateSite::new(0, cx, cy, half_w * 2.0, half_h * 2.0)
            })
    })
}

proptest! {
    #[test]
    fn score_total_is_within_unit_interval(weights in arb_weights(), site in arb_site()) {
        let grid = GridBuilder::uniform(100, 100)
            .with_sunlight(7.5)
            .with_slope(12.0)
            .with_cost(0.4)
            .build()
            .unwrap();
        let scorer = Scorer::new(weights, ScoringConfig::default()).unwrap();

        let (total, breakdown) = scorer.score(&site, &grid);

        prop_assert!((0.0..=1.0).contains(&total));
        for value in [
            breakdown.sunlight,
            breakdown.terrain,
            breakdown.obstacles,
            breakdown.accessibility,
            breakdown.cost,
        ] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn weighted_breakdown_reconstructs_total(weights in arb_weights(), site in arb_site()) {
        let grid = GridBuilder::uniform(100, 100).build().unwrap();
        let scorer = Scorer::new(weights, ScoringConfig::default()).unwrap();

        let (total, breakdown) = scorer.score(&site, &grid);
        let reconstructed = weights.sunlight * breakdown.sunlight
            + weights.terrain * breakdown.terrain
            + weights.obstacles * breakdown.obstacles
            + weights.accessibility * breakdown.accessibility
            + weights.cost * breakdown.cost;

        prop_assert!((total - reconstructed).abs() < 1e-9);
    }

    #[test]
    fn validator_confidence_is_bounded(
        scores in prop::collection::vec(0.0f64..1.0, 1..20),
        noise in prop::collection::vec(-0.9f64..2.0, 20),
    ) {
        let sites: Vec<CandidateSite> = scores
            .iter()
            .enumerate()
            .map(|(i, &score)| {
                let mut site = CandidateSite::new(i, 50.0, 50.0, 20.0, 20.0);
                site.score = score;
                site
            })
            .collect();
        let reference: FieldReference = sites
            .iter()
            .zip(noise.iter())
            .map(|(site, n)| (site.id, (site.score * (1.0 + n)).max(0.0)))
            .collect();

        let validator = RealityValidator::new(ValidatorConfig::default()).unwrap();
        let report = validator.validate(&sites, &reference).unwrap();

        prop_assert!((0.0..=1.0).contains(&report.gap.confidence));
        for result in &report.results {
            prop_assert!(result.absolute_error >= 0.0);
            prop_assert!(result.relative_error >= 0.0);
        }
    }
}

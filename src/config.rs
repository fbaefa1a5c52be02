use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::{Deserialize, Serialize};

/// Configuration validation errors
///
/// Construction fails closed: invalid configuration is surfaced immediately
/// with the offending field and the expected range, never clamped or dropped.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("criterion weights must sum to 1.0 (tolerance 1e-9), got {sum}")]
    WeightSum { sum: f64 },

    #[error("'{field}' must be within [{min}, {max}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("'{field}' must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("area bounds inverted: min_area {min_area} > max_area {max_area}")]
    InvertedAreaBounds { min_area: f64, max_area: f64 },

    #[error("noise band inverted: noise_min {noise_min} > noise_max {noise_max}")]
    InvertedNoiseBand { noise_min: f64, noise_max: f64 },

    #[error(
        "feasibility thresholds must descend within (0, 1): \
         highly_feasible {highly_feasible}, feasible {feasible}, \
         moderately_feasible {moderately_feasible}"
    )]
    ThresholdOrder {
        highly_feasible: f64,
        feasible: f64,
        moderately_feasible: f64,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub optimizer: OptimizerConfig,
    pub weights: ScoringWeights,
    pub scoring: ScoringConfig,
    pub validator: ValidatorConfig,
}

/// Genetic search parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
    pub mutation_shift: f64,
    pub min_area: f64,
    pub max_area: f64,
    pub top_n: usize,
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 1000,
            generations: 50,
            mutation_rate: 0.10,
            mutation_shift: 20.0,
            min_area: 1000.0,
            max_area: 50_000.0,
            top_n: 10,
            seed: 42,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::OutOfRange {
                field: "optimizer.mutation_rate",
                value: self.mutation_rate,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.min_area <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "optimizer.min_area",
                value: self.min_area,
            });
        }
        if self.min_area > self.max_area {
            return Err(ConfigError::InvertedAreaBounds {
                min_area: self.min_area,
                max_area: self.max_area,
            });
        }
        Ok(())
    }
}

/// Named multi-criteria weights, required to sum to 1.0
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ScoringWeights {
    pub sunlight: f64,
    pub terrain: f64,
    pub obstacles: f64,
    pub accessibility: f64,
    pub cost: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            sunlight: 0.40,
            terrain: 0.25,
            obstacles: 0.20,
            accessibility: 0.10,
            cost: 0.05,
        }
    }
}

impl ScoringWeights {
    const SUM_TOLERANCE: f64 = 1e-9;

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("weights.sunlight", self.sunlight),
            ("weights.terrain", self.terrain),
            ("weights.obstacles", self.obstacles),
            ("weights.accessibility", self.accessibility),
            ("weights.cost", self.cost),
        ];
        for (field, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        let sum = self.sunlight + self.terrain + self.obstacles + self.accessibility + self.cost;
        if (sum - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// Criterion normalization references and terrain exclusion penalties
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ScoringConfig {
    /// Multiplicative penalty applied to water cells
    pub water_penalty: f64,
    /// Multiplicative penalty applied to building cells
    pub building_penalty: f64,
    /// Obstacle distance (grid units) treated as fully clear
    pub obstacle_reference: f64,
    /// Slope (degrees) treated as inaccessible
    pub slope_reference: f64,
    /// Cost index treated as prohibitive
    pub cost_reference: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            water_penalty: 0.5,
            building_penalty: 0.3,
            obstacle_reference: 100.0,
            slope_reference: 45.0,
            cost_reference: 1.0,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let penalties = [
            ("scoring.water_penalty", self.water_penalty),
            ("scoring.building_penalty", self.building_penalty),
        ];
        for (field, value) in penalties {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    field,
                    value,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }

        let references = [
            ("scoring.obstacle_reference", self.obstacle_reference),
            ("scoring.slope_reference", self.slope_reference),
            ("scoring.cost_reference", self.cost_reference),
        ];
        for (field, value) in references {
            if value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        Ok(())
    }
}

/// Reality-gap validator parameters
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ValidatorConfig {
    /// Lower bound of the synthesized multiplicative noise magnitude
    pub noise_min: f64,
    /// Upper bound of the synthesized multiplicative noise magnitude
    pub noise_max: f64,
    /// Reference mean relative error the gap analysis is compared against
    pub baseline_error: f64,
    pub highly_feasible: f64,
    pub feasible: f64,
    pub moderately_feasible: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            noise_min: 0.10,
            noise_max: 0.30,
            baseline_error: 0.35,
            highly_feasible: 0.8,
            feasible: 0.6,
            moderately_feasible: 0.4,
        }
    }
}

impl ValidatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.noise_min < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "validator.noise_min",
                value: self.noise_min,
                min: 0.0,
                max: 1.0,
            });
        }
        if self.noise_min > self.noise_max {
            return Err(ConfigError::InvertedNoiseBand {
                noise_min: self.noise_min,
                noise_max: self.noise_max,
            });
        }
        if self.baseline_error <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "validator.baseline_error",
                value: self.baseline_error,
            });
        }

        let ordered = self.highly_feasible > self.feasible
            && self.feasible > self.moderately_feasible
            && self.moderately_feasible > 0.0
            && self.highly_feasible < 1.0;
        if !ordered {
            return Err(ConfigError::ThresholdOrder {
                highly_feasible: self.highly_feasible,
                feasible: self.feasible,
                moderately_feasible: self.moderately_feasible,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            weights: ScoringWeights::default(),
            scoring: ScoringConfig::default(),
            validator: ValidatorConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("SSO__").split("__"));
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.optimizer.validate()?;
        self.weights.validate()?;
        self.scoring.validate()?;
        self.validator.validate()?;
        Ok(())
    }
}

//! Search parameters and penalty weights.
//!
//! Only the relative order of the penalty weights matters:
//! `missed_deadline` ≫ `no_time_available` ≫ `free_time_multiplier`,
//! `module_spread` ≫ `early_finish_bonus`.

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// Parameters of the genetic search.
///
/// # Example
/// ```
/// use u_studyplan::ga::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_population_size(20)
///     .with_generations(100)
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Genomes per generation.
    pub population_size: usize,
    /// Generations to run in total.
    pub generations: usize,
    /// Generations per chunk between progress reports.
    pub chunk_size: usize,
    /// Fraction of the ranked population kept unchanged.
    pub survival_rate: f64,
    /// Fraction of the refill produced by crossover; the rest by mutation.
    pub crossover_rate: f64,
    /// Chance that a mutation offspring is actually mutated.
    pub mutation_probability: f64,
    /// RNG seed. `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 1000,
            chunk_size: 10,
            survival_rate: 0.3,
            crossover_rate: 0.3,
            mutation_probability: 0.3,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the total generation count.
    pub fn with_generations(mut self, generations: usize) -> Self {
        self.generations = generations;
        self
    }

    /// Sets the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets the survival rate.
    pub fn with_survival_rate(mut self, rate: f64) -> Self {
        self.survival_rate = rate;
        self
    }

    /// Sets the crossover rate.
    pub fn with_crossover_rate(mut self, rate: f64) -> Self {
        self.crossover_rate = rate;
        self
    }

    /// Sets the mutation probability.
    pub fn with_mutation_probability(mut self, probability: f64) -> Self {
        self.mutation_probability = probability;
        self
    }

    /// Fixes the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of genomes kept per generation (at least one).
    pub fn survivor_count(&self) -> usize {
        let n = (self.population_size as f64 * self.survival_rate).round() as usize;
        n.clamp(1, self.population_size.max(1))
    }

    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(PlanError::InvalidConfig(
                "population_size must be positive".into(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(PlanError::InvalidConfig("chunk_size must be positive".into()));
        }
        for (name, value) in [
            ("survival_rate", self.survival_rate),
            ("crossover_rate", self.crossover_rate),
            ("mutation_probability", self.mutation_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PlanError::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Score penalties and bonuses used by the evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    /// Per same-module activity out of sequence or target-week order.
    pub wrong_order: i64,
    /// Multiplier for minutes left unused when a week is closed.
    pub free_time_multiplier: i64,
    /// Per earlier activity of another module with a distant target week.
    pub module_spread: i64,
    /// Target-week distance above which `module_spread` applies.
    pub module_spread_weeks: u32,
    /// Once, when the weeks run out.
    pub no_time_available: i64,
    /// Per activity reached on or after its deadline, or never reached.
    pub missed_deadline: i64,
    /// Per activity packed before its target week.
    pub early_finish_bonus: i64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            wrong_order: 1000,
            free_time_multiplier: 100,
            module_spread: 100,
            module_spread_weeks: 2,
            no_time_available: 10_000,
            missed_deadline: 1_000_000,
            early_finish_bonus: 10,
        }
    }
}

impl PenaltyWeights {
    /// Sets the deadline penalty.
    pub fn with_missed_deadline(mut self, penalty: i64) -> Self {
        self.missed_deadline = penalty;
        self
    }

    /// Sets the free-time multiplier.
    pub fn with_free_time_multiplier(mut self, multiplier: i64) -> Self {
        self.free_time_multiplier = multiplier;
        self
    }

    /// Sets the module-spread penalty and its week threshold.
    pub fn with_module_spread(mut self, penalty: i64, weeks: u32) -> Self {
        self.module_spread = penalty;
        self.module_spread_weeks = weeks;
        self
    }

    /// Sets the early-finish bonus.
    pub fn with_early_finish_bonus(mut self, bonus: i64) -> Self {
        self.early_finish_bonus = bonus;
        self
    }
}

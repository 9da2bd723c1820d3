//! Exact-match fitness cache.
//!
//! Crossover and mutation often reproduce orderings that were already
//! scored, especially once the population converges. Scores are keyed by
//! the full gene sequence; a hit skips the evaluator entirely.

use std::collections::HashMap;

use super::PlanEvaluator;
use crate::error::Result;

/// Scores memoized by gene sequence.
#[derive(Debug, Clone, Default)]
pub struct FitnessCache {
    scores: HashMap<Vec<usize>, i64>,
    hits: u64,
    misses: u64,
}

impl FitnessCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached score, or evaluates and stores it.
    ///
    /// Evaluation errors are propagated and nothing is stored.
    pub fn score(&mut self, evaluator: &PlanEvaluator, genes: &[usize]) -> Result<i64> {
        if let Some(&score) = self.scores.get(genes) {
            self.hits += 1;
            return Ok(score);
        }
        let score = evaluator.evaluate(genes)?;
        self.misses += 1;
        self.scores.insert(genes.to_vec(), score);
        Ok(score)
    }

    /// Cached score without evaluating.
    pub fn get(&self, genes: &[usize]) -> Option<i64> {
        self.scores.get(genes).copied()
    }

    /// Number of distinct genomes scored.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether nothing was scored yet.
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Lookups that required evaluation.
    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Fraction of lookups answered from the cache.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::PenaltyWeights;
    use crate::index::ActivityIndex;
    use crate::models::{CourseModule, Horizon, ModuleActivity, Week, WeekAvailability};
    use chrono::{Duration, TimeZone, Utc};

    fn evaluator() -> PlanEvaluator {
        let start = Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap();
        let index = ActivityIndex::from_modules(&[
            CourseModule::new("M1").with_activity(ModuleActivity::new("a", 1, 60)),
            CourseModule::new("M2").with_activity(ModuleActivity::new("b", 1, 90)),
        ]);
        let horizon = Horizon::new(
            vec![Week::new(1, start, start + Duration::days(7))],
            vec![WeekAvailability::new(1, 100)],
        );
        PlanEvaluator::new(index, &horizon, start, PenaltyWeights::default()).unwrap()
    }

    #[test]
    fn test_hit_after_miss() {
        let ev = evaluator();
        let mut cache = FitnessCache::new();

        let first = cache.score(&ev, &[0, 1]).unwrap();
        let second = cache.score(&ev, &[0, 1]).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert!((cache.hit_rate() - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_order_sensitive_key() {
        let ev = evaluator();
        let mut cache = FitnessCache::new();

        cache.score(&ev, &[0, 1]).unwrap();
        cache.score(&ev, &[1, 0]).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.get(&[1, 0]), Some(ev.evaluate(&[1, 0]).unwrap()));
    }

    #[test]
    fn test_error_not_cached() {
        let ev = evaluator();
        let mut cache = FitnessCache::new();

        assert!(cache.score(&ev, &[0]).is_err());
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 0);
    }
}

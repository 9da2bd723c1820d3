//! Genetic operators for study-plan genomes.
//!
//! Wraps the genome primitives so that every produced genome gets a fresh
//! identifier and passes through [`repair`] before it is scored.
//!
//! # Usage
//!
//! ```
//! use u_studyplan::ga::GenomeOperators;
//!
//! let ops = GenomeOperators::default();
//! assert!((ops.mutation_probability - 0.3).abs() < 1e-10);
//! ```

use rand::Rng;

use super::genome::{interleave_crossover, repair, shuffled, swap_mutation, Genome, GenomeIds};
use crate::index::ActivityIndex;

/// Populate, mutation, and crossover bound to one activity set.
#[derive(Debug, Clone)]
pub struct GenomeOperators {
    /// Chance that a mutation offspring is actually mutated; otherwise it
    /// is a copy of its parent.
    pub mutation_probability: f64,
}

impl Default for GenomeOperators {
    fn default() -> Self {
        Self {
            mutation_probability: 0.3,
        }
    }
}

impl GenomeOperators {
    /// Creates operators with the given mutation probability.
    pub fn new(mutation_probability: f64) -> Self {
        Self {
            mutation_probability,
        }
    }

    /// Produces `size` shuffled and repaired genomes.
    ///
    /// Genomes are not required to be distinct.
    pub fn populate<R: Rng>(
        &self,
        size: usize,
        index: &ActivityIndex,
        ids: &mut GenomeIds,
        rng: &mut R,
    ) -> Vec<Genome> {
        (0..size)
            .map(|_| Genome::new(ids.next_id(), repair(shuffled(index.len(), rng), index)))
            .collect()
    }

    /// Swap-mutates a copy of `parent`.
    pub fn mutate<R: Rng>(
        &self,
        parent: &Genome,
        index: &ActivityIndex,
        ids: &mut GenomeIds,
        rng: &mut R,
    ) -> Genome {
        Genome::new(ids.next_id(), repair(swap_mutation(&parent.genes, rng), index))
    }

    /// Mutation offspring gated by [`mutation_probability`](Self::mutation_probability).
    pub fn offspring<R: Rng>(
        &self,
        parent: &Genome,
        index: &ActivityIndex,
        ids: &mut GenomeIds,
        rng: &mut R,
    ) -> Genome {
        if rng.random_bool(self.mutation_probability) {
            self.mutate(parent, index, ids, rng)
        } else {
            Genome::new(ids.next_id(), parent.genes.clone())
        }
    }

    /// Interleaves two parents into one child.
    pub fn crossover<R: Rng>(
        &self,
        lhs: &Genome,
        rhs: &Genome,
        index: &ActivityIndex,
        ids: &mut GenomeIds,
        rng: &mut R,
    ) -> Genome {
        Genome::new(
            ids.next_id(),
            repair(interleave_crossover(&lhs.genes, &rhs.genes, rng), index),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseModule, ModuleActivity};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn sample_index() -> ActivityIndex {
        let modules: Vec<CourseModule> = (1..=4)
            .map(|m| {
                (1..=5).fold(CourseModule::new(format!("M{m}")), |module, a| {
                    module.with_activity(ModuleActivity::new(format!("M{m}-{a}"), a, 10 * a))
                })
            })
            .collect();
        ActivityIndex::from_modules(&modules)
    }

    fn assert_valid(genome: &Genome, index: &ActivityIndex) {
        assert!(genome.is_permutation(index.len()));
        assert!(genome.respects_module_order(index));
    }

    #[test]
    fn test_populate() {
        let index = sample_index();
        let ops = GenomeOperators::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ids = GenomeIds::new();

        let population = ops.populate(30, &index, &mut ids, &mut rng);
        assert_eq!(population.len(), 30);
        for genome in &population {
            assert_valid(genome, &index);
        }
        let mut genome_ids: Vec<u64> = population.iter().map(|g| g.id).collect();
        genome_ids.dedup();
        assert_eq!(genome_ids.len(), 30);
    }

    #[test]
    fn test_mutate_keeps_parent() {
        let index = sample_index();
        let ops = GenomeOperators::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ids = GenomeIds::new();

        let parent = ops.populate(1, &index, &mut ids, &mut rng).remove(0);
        let snapshot = parent.clone();
        for _ in 0..50 {
            let child = ops.mutate(&parent, &index, &mut ids, &mut rng);
            assert_valid(&child, &index);
            assert_ne!(child.id, parent.id);
        }
        assert_eq!(parent, snapshot);
    }

    #[test]
    fn test_offspring_probability_zero_copies() {
        let index = sample_index();
        let ops = GenomeOperators::new(0.0);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ids = GenomeIds::new();

        let parent = ops.populate(1, &index, &mut ids, &mut rng).remove(0);
        let child = ops.offspring(&parent, &index, &mut ids, &mut rng);
        assert_eq!(child.genes, parent.genes);
        assert_ne!(child.id, parent.id);
    }

    #[test]
    fn test_crossover_valid() {
        let index = sample_index();
        let ops = GenomeOperators::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ids = GenomeIds::new();

        let parents = ops.populate(10, &index, &mut ids, &mut rng);
        for pair in parents.windows(2) {
            let child = ops.crossover(&pair[0], &pair[1], &index, &mut ids, &mut rng);
            assert_valid(&child, &index);
        }
    }

    #[test]
    fn test_operators_on_empty_index() {
        let index = ActivityIndex::from_modules(&[]);
        let ops = GenomeOperators::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut ids = GenomeIds::new();

        let population = ops.populate(3, &index, &mut ids, &mut rng);
        assert!(population.iter().all(|g| g.is_empty()));
        let child = ops.crossover(&population[0], &population[1], &index, &mut ids, &mut rng);
        assert!(child.is_empty());
        assert!(ops.mutate(&population[0], &index, &mut ids, &mut rng).is_empty());
    }
}

//! Chunked genetic search over study-plan genomes.
//!
//! # State machine
//!
//! ```text
//! Idle --step--> Running --step--> ... --step--> Done
//!                   |
//!                   +--(cancel token set)--> Cancelled
//! ```
//!
//! Each [`PlanSearch::step`] runs at most `chunk_size` generations and
//! returns a [`SearchProgress`] snapshot. The host decides when to call the
//! next step; nothing runs between calls.
//!
//! # Generation
//!
//! 1. Rank the population by score (descending).
//! 2. Keep the top `survival_rate` fraction unchanged.
//! 3. Refill: `crossover_rate` of the gap by crossover of two random
//!    survivors, the rest by probability-gated mutation of one survivor.
//! 4. Score the offspring through the [`FitnessCache`].
//!
//! The best genome seen so far is kept across generations.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::genome::{Genome, GenomeIds};
use super::{FitnessCache, GenomeOperators, PlanEvaluator, SearchConfig};
use crate::error::Result;
use crate::models::{Simulation, StudyPlan};

/// Lifecycle of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchState {
    /// No generation has run; the population does not exist yet.
    Idle,
    /// Between chunks.
    Running,
    /// All configured generations have run.
    Done,
    /// Stopped at a chunk boundary by a [`CancelToken`].
    Cancelled,
}

impl SearchState {
    /// Whether further steps do nothing.
    pub fn is_finished(self) -> bool {
        matches!(self, SearchState::Done | SearchState::Cancelled)
    }
}

/// Shared flag that stops a search at its next chunk boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Snapshot reported at each chunk boundary.
#[derive(Debug, Clone)]
pub struct SearchProgress {
    /// Generations completed.
    pub generation: usize,
    /// Generations configured.
    pub total_generations: usize,
    /// Score of the best genome seen.
    pub best_score: i64,
    /// Plan of the best genome seen.
    pub plan: StudyPlan,
    /// Cache lookups answered without evaluation.
    pub cache_hits: u64,
    /// Cache lookups that ran the evaluator.
    pub cache_misses: u64,
    /// State after the chunk.
    pub state: SearchState,
}

impl SearchProgress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total_generations == 0 {
            1.0
        } else {
            (self.generation as f64 / self.total_generations as f64).min(1.0)
        }
    }
}

#[derive(Debug, Clone)]
struct Scored {
    genome: Genome,
    score: i64,
}

/// Genetic search driven in bounded chunks.
pub struct PlanSearch<R: Rng = SmallRng> {
    evaluator: PlanEvaluator,
    operators: GenomeOperators,
    config: SearchConfig,
    rng: R,
    population: Vec<Scored>,
    best: Option<Scored>,
    cache: FitnessCache,
    ids: GenomeIds,
    generation: usize,
    state: SearchState,
    cancel: CancelToken,
}

impl PlanSearch<SmallRng> {
    /// Creates a search seeded from `config.seed`, or from the OS.
    pub fn new(evaluator: PlanEvaluator, config: SearchConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::with_rng(evaluator, config, rng)
    }
}

impl<R: Rng> PlanSearch<R> {
    /// Creates a search with an explicit random source.
    pub fn with_rng(evaluator: PlanEvaluator, config: SearchConfig, rng: R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            evaluator,
            operators: GenomeOperators::new(config.mutation_probability),
            config,
            rng,
            population: Vec::new(),
            best: None,
            cache: FitnessCache::new(),
            ids: GenomeIds::new(),
            generation: 0,
            state: SearchState::Idle,
            cancel: CancelToken::new(),
        })
    }

    /// Replaces the cancel token, e.g. with one shared with the host.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops this search at its next chunk boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Current state.
    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Generations completed.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The evaluator (and through it, the activity index).
    pub fn evaluator(&self) -> &PlanEvaluator {
        &self.evaluator
    }

    /// The fitness cache.
    pub fn cache(&self) -> &FitnessCache {
        &self.cache
    }

    /// Best genome seen, if the search has started.
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best.as_ref().map(|s| &s.genome)
    }

    /// Score of the best genome seen, if the search has started.
    pub fn best_score(&self) -> Option<i64> {
        self.best.as_ref().map(|s| s.score)
    }

    /// Current population ranked by score, best first.
    pub fn population(&self) -> impl Iterator<Item = (&Genome, i64)> + '_ {
        self.population.iter().map(|s| (&s.genome, s.score))
    }

    /// Simulation of the best genome, initializing the search if needed.
    pub fn best_simulation(&mut self) -> Result<Simulation> {
        self.ensure_started()?;
        match &self.best {
            Some(best) => self.evaluator.simulate(&best.genome.genes),
            None => self.evaluator.simulate(&[]),
        }
    }

    /// Projected plan of the best genome.
    pub fn best_plan(&mut self) -> Result<StudyPlan> {
        let simulation = self.best_simulation()?;
        Ok(StudyPlan::project(&simulation, self.evaluator.index()))
    }

    /// Runs one chunk of generations.
    ///
    /// Once the search is finished, further calls only report progress.
    pub fn step(&mut self) -> Result<SearchProgress> {
        let was_finished = self.state.is_finished();
        if !was_finished {
            if self.cancel.is_cancelled() {
                warn!(generation = self.generation, "plan search cancelled");
                self.state = SearchState::Cancelled;
            } else {
                self.ensure_started()?;
                let remaining = self.config.generations - self.generation;
                for _ in 0..self.config.chunk_size.min(remaining) {
                    self.advance_generation()?;
                    self.generation += 1;
                }
                if self.generation >= self.config.generations {
                    self.state = SearchState::Done;
                }
            }
        }

        let progress = self.progress()?;
        debug!(
            generation = progress.generation,
            best_score = progress.best_score,
            state = ?progress.state,
            "plan search chunk"
        );
        if !was_finished && progress.state.is_finished() {
            info!(
                generations = progress.generation,
                best_score = progress.best_score,
                cache_hits = progress.cache_hits,
                cache_misses = progress.cache_misses,
                state = ?progress.state,
                "plan search finished"
            );
        }
        Ok(progress)
    }

    /// Steps until finished, reporting every chunk.
    pub fn run<F>(&mut self, mut on_progress: F) -> Result<StudyPlan>
    where
        F: FnMut(&SearchProgress),
    {
        loop {
            let progress = self.step()?;
            on_progress(&progress);
            if progress.state.is_finished() {
                return Ok(progress.plan);
            }
        }
    }

    fn ensure_started(&mut self) -> Result<()> {
        if self.best.is_some() {
            return Ok(());
        }
        let genomes = self.operators.populate(
            self.config.population_size,
            self.evaluator.index(),
            &mut self.ids,
            &mut self.rng,
        );
        self.population = self.score_all(genomes)?;
        self.rank_and_track();
        if self.state == SearchState::Idle {
            self.state = if self.config.generations == 0 {
                SearchState::Done
            } else {
                SearchState::Running
            };
        }
        Ok(())
    }

    fn advance_generation(&mut self) -> Result<()> {
        let size = self.config.population_size;
        let survivors = self.config.survivor_count().min(self.population.len());
        let refill = size.saturating_sub(survivors);
        let crossovers = ((refill as f64) * self.config.crossover_rate).round() as usize;

        let index = self.evaluator.index();
        let parents = &self.population[..survivors];
        let mut offspring = Vec::with_capacity(refill);

        for _ in 0..crossovers.min(refill) {
            let lhs = &parents[self.rng.random_range(0..survivors)].genome;
            let rhs = &parents[self.rng.random_range(0..survivors)].genome;
            offspring.push(
                self.operators
                    .crossover(lhs, rhs, index, &mut self.ids, &mut self.rng),
            );
        }
        while offspring.len() < refill {
            let parent = &parents[self.rng.random_range(0..survivors)].genome;
            offspring.push(
                self.operators
                    .offspring(parent, index, &mut self.ids, &mut self.rng),
            );
        }

        let scored = self.score_all(offspring)?;
        self.population.truncate(survivors);
        self.population.extend(scored);
        self.rank_and_track();
        Ok(())
    }

    fn score_all(&mut self, genomes: Vec<Genome>) -> Result<Vec<Scored>> {
        genomes
            .into_iter()
            .map(|genome| -> Result<Scored> {
                let score = self.cache.score(&self.evaluator, &genome.genes)?;
                Ok(Scored { genome, score })
            })
            .collect()
    }

    fn rank_and_track(&mut self) {
        self.population.sort_by(|a, b| b.score.cmp(&a.score));
        if let Some(top) = self.population.first() {
            let improved = self.best.as_ref().map_or(true, |best| top.score > best.score);
            if improved {
                self.best = Some(top.clone());
            }
        }
    }

    fn progress(&mut self) -> Result<SearchProgress> {
        let plan = self.best_plan()?;
        Ok(SearchProgress {
            generation: self.generation,
            total_generations: self.config.generations,
            best_score: self.best_score().unwrap_or(0),
            plan,
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            state: self.state,
        })
    }
}

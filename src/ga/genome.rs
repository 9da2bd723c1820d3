//! Permutation genome for study plans.
//!
//! # Encoding
//!
//! A genome is a permutation of activity-index positions: every pending
//! activity appears exactly once. Week assignment is not stored; it is
//! derived by greedy packing in the evaluator.
//!
//! # Module order
//!
//! Within a module, activities must appear in sequence order. Every
//! operator returns its result through [`repair`], so a genome that reaches
//! the evaluator always satisfies this invariant.
//!
//! Operators never touch their parents; each returns a fresh gene vector.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::Result;
use crate::index::ActivityIndex;

/// A candidate ordering of all pending activities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genome {
    /// Identifier, unique within a search run.
    pub id: u64,
    /// Activity-index positions in study order.
    pub genes: Vec<usize>,
}

impl Genome {
    /// Wraps a gene vector.
    pub fn new(id: u64, genes: Vec<usize>) -> Self {
        Self { id, genes }
    }

    /// Builds a genome from activity identifiers.
    ///
    /// The order is taken as given; call [`repair`] to enforce module order.
    pub fn from_ids<S: AsRef<str>>(id: u64, ids: &[S], index: &ActivityIndex) -> Result<Self> {
        Ok(Self::new(id, index.positions_of(ids)?))
    }

    /// Number of genes.
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// Whether the genome is empty.
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Activity identifiers in genome order.
    pub fn to_ids<'a>(&self, index: &'a ActivityIndex) -> Vec<&'a str> {
        index.ids_of(&self.genes)
    }

    /// Whether the genes are a permutation of `0..n`.
    pub fn is_permutation(&self, n: usize) -> bool {
        if self.genes.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &g in &self.genes {
            if g >= n || seen[g] {
                return false;
            }
            seen[g] = true;
        }
        true
    }

    /// Whether every module's activities appear in sequence order.
    pub fn respects_module_order(&self, index: &ActivityIndex) -> bool {
        let mut last = vec![0u32; index.module_count()];
        for &g in &self.genes {
            let Some(act) = index.get(g) else {
                return false;
            };
            let slot = index.module_slot(g);
            if act.sequence < last[slot] {
                return false;
            }
            last[slot] = act.sequence;
        }
        true
    }
}

/// Hands out genome identifiers.
#[derive(Debug, Clone)]
pub struct GenomeIds {
    next: u64,
}

impl Default for GenomeIds {
    fn default() -> Self {
        Self::new()
    }
}

impl GenomeIds {
    /// Starts at 1.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns a fresh identifier.
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Restores module order without moving activities between modules.
///
/// The positions occupied by each module are kept; the module's activities
/// are rewritten into them in sequence order. Same result as swapping every
/// out-of-order same-module pair, in O(n log n).
///
/// # Panics
/// Panics if a gene is not a position of `index`.
pub fn repair(mut genes: Vec<usize>, index: &ActivityIndex) -> Vec<usize> {
    let mut slots: Vec<Vec<usize>> = vec![Vec::new(); index.module_count()];
    for (pos, &g) in genes.iter().enumerate() {
        slots[index.module_slot(g)].push(pos);
    }

    let activities = index.activities();
    for positions in slots.iter().filter(|p| p.len() > 1) {
        let mut members: Vec<usize> = positions.iter().map(|&p| genes[p]).collect();
        members.sort_by_key(|&g| activities[g].sequence);
        for (&pos, g) in positions.iter().zip(members) {
            genes[pos] = g;
        }
    }
    genes
}

/// Uniformly shuffled permutation of `0..n`.
pub fn shuffled<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    let mut genes: Vec<usize> = (0..n).collect();
    genes.shuffle(rng);
    genes
}

/// Swaps random position pairs between 1 and `len` times.
pub fn swap_mutation<R: Rng>(genes: &[usize], rng: &mut R) -> Vec<usize> {
    let mut child = genes.to_vec();
    let len = child.len();
    if len < 2 {
        return child;
    }
    let times = rng.random_range(1..=len);
    for _ in 0..times {
        let i = rng.random_range(0..len);
        let j = rng.random_range(0..len);
        child.swap(i, j);
    }
    child
}

/// Coin-flip interleaving crossover.
///
/// Repeatedly takes the next gene from one parent or the other, skipping
/// genes already taken. The child is a permutation whenever both parents
/// are permutations of the same set.
pub fn interleave_crossover<R: Rng>(lhs: &[usize], rhs: &[usize], rng: &mut R) -> Vec<usize> {
    let n = lhs.len().max(rhs.len());
    let mut taken = vec![false; lhs.iter().chain(rhs).copied().max().map_or(0, |m| m + 1)];
    let mut child = Vec::with_capacity(n);
    let (mut il, mut ir) = (0, 0);

    while il < lhs.len() || ir < rhs.len() {
        let from_lhs = if il >= lhs.len() {
            false
        } else if ir >= rhs.len() {
            true
        } else {
            rng.random_bool(0.5)
        };
        let gene = if from_lhs {
            il += 1;
            lhs[il - 1]
        } else {
            ir += 1;
            rhs[ir - 1]
        };
        if !taken[gene] {
            taken[gene] = true;
            child.push(gene);
        }
    }
    child
}

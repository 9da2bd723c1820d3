//! GA-based study-plan optimization.
//!
//! # Encoding
//!
//! A genome is a permutation of pending activities (activity-index
//! positions). Weeks are not encoded: the evaluator derives them by greedy
//! packing against the weekly budgets.
//!
//! # Submodules
//!
//! - [`genome`]: encoding, module-order repair, raw operators
//! - [`operators`]: populate/mutation/crossover producing repaired genomes
//! - [`evaluator`]: score mode and simulation mode
//! - [`search`]: chunked search loop with fitness cache and cancellation
//!
//! # Reference
//! Bierwirth (1995), "A generalized permutation approach to JSSP"

mod cache;
mod config;
pub mod evaluator;
pub mod genome;
pub mod operators;
pub mod search;

pub use cache::FitnessCache;
pub use config::{PenaltyWeights, SearchConfig};
pub use evaluator::PlanEvaluator;
pub use genome::{repair, Genome, GenomeIds};
pub use operators::GenomeOperators;
pub use search::{CancelToken, PlanSearch, SearchProgress, SearchState};

//! Error types for plan generation.
//!
//! Only structural problems are errors. An infeasible horizon or a missed
//! deadline is reported as plan data (see [`crate::models::PlanIssue`]).

use thiserror::Error;

use crate::validation::ValidationError;

/// Errors raised while building or running a plan search.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A genome does not cover the activity set it was evaluated against.
    ///
    /// This is an operator bug, never a property of the input data.
    #[error("genome length mismatch: expected {expected} activities, got {actual}")]
    GenomeLengthMismatch { expected: usize, actual: usize },

    /// A genome repeats a position or names one outside the activity index.
    #[error("genome is not a permutation: position {position} is duplicated or out of range")]
    NotAPermutation { position: usize },

    /// An identifier that is not part of the activity index.
    #[error("unknown activity '{0}'")]
    UnknownActivity(String),

    /// The reference date does not fall inside any supplied week.
    #[error("reference date is outside the planning horizon")]
    StartOutsideHorizon,

    /// A week reachable from the reference date has no availability entry.
    #[error("no availability entry for week {week}")]
    MissingAvailability { week: u32 },

    /// Search parameters out of range.
    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    /// Input records failed validation.
    #[error("input validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PlanError>;

impl From<Vec<ValidationError>> for PlanError {
    fn from(errors: Vec<ValidationError>) -> Self {
        PlanError::Validation(errors)
    }
}

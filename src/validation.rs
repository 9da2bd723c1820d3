//! Input validation for study-plan generation.
//!
//! Checks structural integrity of modules, activities, and the planning
//! horizon before a search is started. Detects:
//! - Duplicate module codes and activity IDs
//! - Pending activities without any effort estimate
//! - Week numbering gaps, duplicates, and zero week numbers
//! - Inverted or overlapping week intervals
//! - Availability entries that are duplicated or reference unknown weeks
//!
//! All problems are collected; validation never stops at the first one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{CourseModule, Horizon, Week, WeekAvailability};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A pending activity has a zero duration.
    ZeroDuration,
    /// Week numbers are not 1-based and contiguous.
    InvalidWeekNumber,
    /// A week ends before it starts, or overlaps another week.
    InvalidWeekRange,
    /// An availability entry is duplicated or points to an unknown week.
    InvalidAvailability,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates modules and horizon together.
pub fn validate_input(modules: &[CourseModule], horizon: &Horizon) -> ValidationResult {
    let mut errors = Vec::new();
    if let Err(mut e) = validate_modules(modules) {
        errors.append(&mut e);
    }
    if let Err(mut e) = validate_horizon(horizon.weeks(), horizon.availability()) {
        errors.append(&mut e);
    }
    into_result(errors)
}

/// Validates catalog records.
///
/// Checks:
/// 1. No duplicate module codes
/// 2. No duplicate activity IDs (across all modules, completed included)
/// 3. Every pending activity has a positive duration
pub fn validate_modules(modules: &[CourseModule]) -> ValidationResult {
    let mut errors = Vec::new();
    let mut codes = HashSet::new();
    let mut activity_ids = HashSet::new();

    for module in modules {
        if !codes.insert(module.code.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate module code: {}", module.code),
            ));
        }

        for act in &module.activities {
            if !activity_ids.insert(act.id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate activity ID: {}", act.id),
                ));
            }
            if !act.is_completed && act.duration == 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ZeroDuration,
                    format!(
                        "Activity '{}' in module '{}' has no duration",
                        act.id, module.code
                    ),
                ));
            }
        }
    }

    into_result(errors)
}

/// Validates the planning horizon.
///
/// Checks:
/// 1. Week numbers are unique and form `1..=n` once sorted
/// 2. Every week has `start <= end`; consecutive weeks follow calendar order
///    and do not overlap
/// 3. Availability entries are unique per week and reference existing weeks
pub fn validate_horizon(weeks: &[Week], availability: &[WeekAvailability]) -> ValidationResult {
    let mut errors = Vec::new();

    let mut sorted: Vec<&Week> = weeks.iter().collect();
    sorted.sort_by_key(|w| w.number);

    let mut numbers = HashSet::new();
    for (i, week) in sorted.iter().enumerate() {
        if !numbers.insert(week.number) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate week number: {}", week.number),
            ));
            continue;
        }
        let expected = (numbers.len()) as u32;
        if week.number != expected {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWeekNumber,
                format!(
                    "Week numbers must be contiguous from 1: expected {expected}, found {}",
                    week.number
                ),
            ));
        }
        if week.end < week.start {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidWeekRange,
                format!("Week {} ends before it starts", week.number),
            ));
        }
        if i > 0 {
            let prev = sorted[i - 1];
            if prev.number != week.number && week.start <= prev.start {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWeekRange,
                    format!("Week {} does not start after week {}", week.number, prev.number),
                ));
            } else if prev.number != week.number && prev.overlaps(week) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWeekRange,
                    format!("Week {} overlaps week {}", prev.number, week.number),
                ));
            }
        }
    }

    let mut seen = HashSet::new();
    for entry in availability {
        if !seen.insert(entry.week) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAvailability,
                format!("Duplicate availability for week {}", entry.week),
            ));
        }
        if !numbers.contains(&entry.week) {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidAvailability,
                format!("Availability references unknown week {}", entry.week),
            ));
        }
    }

    into_result(errors)
}

fn into_result(errors: Vec<ValidationError>) -> ValidationResult {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Simulated and projected study plans.
//!
//! [`Simulation`] is the evaluator's week-by-week packing of one genome,
//! expressed in activity-index positions. [`StudyPlan`] is its projection
//! into self-contained records for the presentation layer.
//!
//! # Completeness
//! Every activity of the index appears exactly once, either in some week's
//! activity list or in the unplanned list.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PlanActivity;
use crate::index::ActivityIndex;

/// A problem found while simulating a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanIssue {
    /// The weeks ran out before every activity was packed.
    NotEnoughTime {
        /// Number of unplanned activities.
        unplanned: usize,
        /// Their total duration in minutes.
        minutes: u64,
    },
    /// An activity is reached on or after its deadline, or never reached.
    MissedDeadline {
        /// Affected activity.
        activity_id: String,
        /// Week the activity was packed into; `None` if unplanned.
        week: Option<u32>,
    },
}

impl fmt::Display for PlanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanIssue::NotEnoughTime { unplanned, minutes } => write!(
                f,
                "Not enough time: {unplanned} activities ({minutes} min) could not be planned"
            ),
            PlanIssue::MissedDeadline {
                activity_id,
                week: Some(week),
            } => write!(
                f,
                "Missed deadline: '{activity_id}' is planned in week {week}, on or after its deadline"
            ),
            PlanIssue::MissedDeadline {
                activity_id,
                week: None,
            } => write!(
                f,
                "Missed deadline: '{activity_id}' could not be planned before its deadline"
            ),
        }
    }
}

/// One week of a simulated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedWeek {
    /// Week number.
    pub week: u32,
    /// Week start.
    pub start: DateTime<Utc>,
    /// Budget of the week in minutes.
    pub minutes_available: u32,
    /// Budget left after packing.
    pub time_left: u32,
    /// Packed activities (index positions) in study order.
    pub activities: Vec<usize>,
}

impl SimulatedWeek {
    /// Minutes consumed by packed activities.
    pub fn minutes_used(&self) -> u32 {
        self.minutes_available - self.time_left
    }
}

/// Week-by-week packing of a genome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    /// Visited weeks, from the week containing the reference date.
    pub weeks: Vec<SimulatedWeek>,
    /// Issues in the order they were found.
    pub issues: Vec<PlanIssue>,
    /// Activities that did not fit (index positions), in genome order.
    pub not_planned: Vec<usize>,
    /// Whether any deadline is missed.
    pub has_missed_deadlines: bool,
    /// Whether the horizon is too short for the genome.
    pub not_enough_time: bool,
    /// Total minutes of unplanned activities.
    pub unplanned_time: u64,
}

impl Simulation {
    /// Number of packed activities.
    pub fn planned_count(&self) -> usize {
        self.weeks.iter().map(|w| w.activities.len()).sum()
    }

    /// Week an activity was packed into, if any.
    pub fn week_of(&self, activity: usize) -> Option<u32> {
        self.weeks
            .iter()
            .find(|w| w.activities.contains(&activity))
            .map(|w| w.week)
    }
}

/// A week of the projected plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanWeek {
    /// Week number.
    pub week: u32,
    /// Week start.
    pub start: DateTime<Utc>,
    /// Budget of the week in minutes.
    pub minutes_available: u32,
    /// Minutes left unused.
    pub time_left: u32,
    /// Activities to study this week, in order.
    pub activities: Vec<PlanActivity>,
}

/// The schedule handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    /// Planned weeks.
    pub weeks: Vec<PlanWeek>,
    /// Activities that could not be planned.
    pub not_planned: Vec<PlanActivity>,
    /// Total minutes of unplanned activities.
    pub unplanned_time: u64,
    /// Human-readable warnings.
    pub issues: Vec<String>,
    /// Whether any deadline is missed.
    pub has_missed_deadlines: bool,
    /// Whether the horizon is too short.
    pub not_enough_time: bool,
}

impl StudyPlan {
    /// Resolves a simulation against the index it was computed from.
    pub fn project(simulation: &Simulation, index: &ActivityIndex) -> Self {
        let resolve = |positions: &[usize]| -> Vec<PlanActivity> {
            positions
                .iter()
                .filter_map(|&i| index.get(i))
                .cloned()
                .collect()
        };

        let weeks = simulation
            .weeks
            .iter()
            .map(|w| PlanWeek {
                week: w.week,
                start: w.start,
                minutes_available: w.minutes_available,
                time_left: w.time_left,
                activities: resolve(&w.activities),
            })
            .collect();

        Self {
            weeks,
            not_planned: resolve(&simulation.not_planned),
            unplanned_time: simulation.unplanned_time,
            issues: simulation.issues.iter().map(|i| i.to_string()).collect(),
            has_missed_deadlines: simulation.has_missed_deadlines,
            not_enough_time: simulation.not_enough_time,
        }
    }

    /// Whether the plan has no warnings.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of planned activities.
    pub fn planned_count(&self) -> usize {
        self.weeks.iter().map(|w| w.activities.len()).sum()
    }
}

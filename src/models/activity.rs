//! Study activity models.
//!
//! A course module groups study activities (lectures, quizzes, assignments)
//! in catalog order. The catalog order defines the precedence chain within
//! the module: activity `k+1` must not be studied before activity `k`.
//!
//! # Records
//!
//! - [`CourseModule`] / [`ModuleActivity`]: records as supplied by the
//!   catalog store, completed activities included.
//! - [`PlanActivity`]: the scheduling view, produced by
//!   [`ActivityIndex`](crate::index::ActivityIndex) for pending activities only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course module with its activities in catalog order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseModule {
    /// Module code (e.g. "TM112"). Unique per user.
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Activities in catalog order.
    pub activities: Vec<ModuleActivity>,
}

impl CourseModule {
    /// Creates an empty module.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
            activities: Vec::new(),
        }
    }

    /// Sets the module name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Appends an activity at the end of the catalog order.
    pub fn with_activity(mut self, activity: ModuleActivity) -> Self {
        self.activities.push(activity);
        self
    }

    /// Number of activities not yet completed.
    pub fn pending_count(&self) -> usize {
        self.activities.iter().filter(|a| !a.is_completed).count()
    }
}

/// A study activity as stored in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleActivity {
    /// Unique activity identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Week of the module the activity is nominally slotted into (1-based).
    pub week: u32,
    /// Estimated effort in minutes.
    pub duration: u32,
    /// Whether the student already finished this activity.
    pub is_completed: bool,
    /// Hand-in date, if any.
    pub deadline: Option<DateTime<Utc>>,
}

impl ModuleActivity {
    /// Creates a pending activity.
    pub fn new(id: impl Into<String>, week: u32, duration: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            week,
            duration,
            is_completed: false,
            deadline: None,
        }
    }

    /// Sets the activity name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets a deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Marks the activity as completed.
    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }
}

/// Scheduling view of a pending activity.
///
/// Immutable for the duration of a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanActivity {
    /// Activity identifier (unique across modules).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Owning module code.
    pub module: String,
    /// Position among the module's pending activities (1-based).
    pub sequence: u32,
    /// Estimated effort in minutes.
    pub duration: u32,
    /// Nominal target week. Only used for the early-finish bonus and
    /// the module-spread penalty.
    pub target_week: u32,
    /// Hand-in date, if any.
    pub deadline: Option<DateTime<Utc>>,
}

impl PlanActivity {
    /// Whether the activity is missed when studied at `at`.
    ///
    /// Reaching an activity on its deadline counts as missing it.
    #[inline]
    pub fn misses_deadline(&self, at: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| at >= deadline)
    }
}

//! Activity index: the flat, scheduling-ready activity set.
//!
//! Flattens modules into a single list of pending activities and numbers
//! each one within its module. Completed activities are dropped before
//! numbering, so sequence numbers of a module are always `1..=pending`.
//!
//! Genomes and simulations refer to activities by their position in this
//! index; identifiers are resolved here.

use std::collections::HashMap;

use crate::error::{PlanError, Result};
use crate::models::{CourseModule, PlanActivity};

/// Pending activities of all modules, in module then catalog order.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
    activities: Vec<PlanActivity>,
    positions: HashMap<String, usize>,
    /// Dense module number per activity, parallel to `activities`.
    module_slots: Vec<usize>,
    module_count: usize,
}

impl ActivityIndex {
    /// Builds the index from catalog records.
    ///
    /// Pure and deterministic. Duplicate identifiers resolve to their first
    /// occurrence; [`validate_modules`](crate::validation::validate_modules)
    /// reports them.
    pub fn from_modules(modules: &[CourseModule]) -> Self {
        let mut activities = Vec::new();
        let mut module_slots = Vec::new();
        let mut slot_by_code: HashMap<&str, usize> = HashMap::new();

        for module in modules {
            let next_slot = slot_by_code.len();
            let slot = *slot_by_code.entry(module.code.as_str()).or_insert(next_slot);

            let pending = module.activities.iter().filter(|a| !a.is_completed);
            for (i, activity) in pending.enumerate() {
                activities.push(PlanActivity {
                    id: activity.id.clone(),
                    name: activity.name.clone(),
                    module: module.code.clone(),
                    sequence: (i + 1) as u32,
                    duration: activity.duration,
                    target_week: activity.week,
                    deadline: activity.deadline,
                });
                module_slots.push(slot);
            }
        }

        let mut positions = HashMap::with_capacity(activities.len());
        for (i, activity) in activities.iter().enumerate() {
            positions.entry(activity.id.clone()).or_insert(i);
        }

        Self {
            activities,
            positions,
            module_slots,
            module_count: slot_by_code.len(),
        }
    }

    /// Number of schedulable activities.
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Whether nothing is left to schedule.
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// All activities in index order.
    pub fn activities(&self) -> &[PlanActivity] {
        &self.activities
    }

    /// Activity at an index position.
    pub fn get(&self, position: usize) -> Option<&PlanActivity> {
        self.activities.get(position)
    }

    /// Index position of an identifier.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Dense module number of the activity at `position`.
    ///
    /// # Panics
    /// Panics if `position` is out of range.
    #[inline]
    pub fn module_slot(&self, position: usize) -> usize {
        self.module_slots[position]
    }

    /// Number of distinct modules with pending activities or listed in input.
    pub fn module_count(&self) -> usize {
        self.module_count
    }

    /// Sum of all activity durations in minutes.
    pub fn total_minutes(&self) -> u64 {
        self.activities.iter().map(|a| a.duration as u64).sum()
    }

    /// Resolves identifiers to index positions.
    pub fn positions_of<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<usize>> {
        ids.iter()
            .map(|id| {
                self.position(id.as_ref())
                    .ok_or_else(|| PlanError::UnknownActivity(id.as_ref().to_string()))
            })
            .collect()
    }

    /// Resolves index positions to identifiers.
    pub fn ids_of(&self, positions: &[usize]) -> Vec<&str> {
        positions
            .iter()
            .filter_map(|&p| self.activities.get(p))
            .map(|a| a.id.as_str())
            .collect()
    }
}

//! Planning horizon: weeks and weekly time budgets.
//!
//! # Time Model
//! Weeks are numbered from 1 and contiguous. Each week covers the closed
//! interval `[start, end]`; a reference date on a week boundary belongs to
//! the week that starts (or ends) there, whichever is found first.
//!
//! The engine never invents weeks: packing stops at the last supplied week.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A calendar week of the planning horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Week {
    /// Week number (1-based, contiguous).
    pub number: u32,
    /// First instant of the week (inclusive).
    pub start: DateTime<Utc>,
    /// Last instant of the week (inclusive).
    pub end: DateTime<Utc>,
}

impl Week {
    /// Creates a week.
    pub fn new(number: u32, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { number, start, end }
    }

    /// Whether an instant falls within this week (both ends inclusive).
    #[inline]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Whether two weeks share any instant.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Study time budget of one week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekAvailability {
    /// Week number.
    pub week: u32,
    /// Minutes the student can spend studying.
    pub minutes_available: u32,
}

impl WeekAvailability {
    /// Creates an availability entry.
    pub fn new(week: u32, minutes_available: u32) -> Self {
        Self {
            week,
            minutes_available,
        }
    }
}

/// Availability as entered by the student: hours per week starting at a date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableTimeWeek {
    /// First day of the week.
    pub week_start: DateTime<Utc>,
    /// Study hours available that week.
    pub hours_available: f64,
}

/// Weeks plus their budgets, ordered by week number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Horizon {
    weeks: Vec<Week>,
    availability: Vec<WeekAvailability>,
}

impl Horizon {
    /// Creates a horizon. Both lists are sorted by week number.
    ///
    /// No integrity checks are made here; see
    /// [`validate_horizon`](crate::validation::validate_horizon).
    pub fn new(mut weeks: Vec<Week>, mut availability: Vec<WeekAvailability>) -> Self {
        weeks.sort_by_key(|w| w.number);
        availability.sort_by_key(|a| a.week);
        Self {
            weeks,
            availability,
        }
    }

    /// Derives a horizon from per-week hour records.
    ///
    /// Records are ordered by start date and numbered from 1. Each week
    /// lasts seven days; budgets are converted to whole minutes.
    pub fn from_weekly_hours(records: &[AvailableTimeWeek]) -> Self {
        let mut sorted: Vec<&AvailableTimeWeek> = records.iter().collect();
        sorted.sort_by_key(|r| r.week_start);

        let mut weeks = Vec::with_capacity(sorted.len());
        let mut availability = Vec::with_capacity(sorted.len());
        for (i, record) in sorted.into_iter().enumerate() {
            let number = (i + 1) as u32;
            let end = record.week_start + Duration::days(7) - Duration::seconds(1);
            weeks.push(Week::new(number, record.week_start, end));
            availability.push(WeekAvailability::new(
                number,
                hours_to_minutes(record.hours_available),
            ));
        }

        Self {
            weeks,
            availability,
        }
    }

    /// Weeks ordered by number.
    pub fn weeks(&self) -> &[Week] {
        &self.weeks
    }

    /// Availability entries ordered by week number.
    pub fn availability(&self) -> &[WeekAvailability] {
        &self.availability
    }

    /// Whether the horizon has no weeks.
    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    /// Looks up a week by number.
    pub fn week(&self, number: u32) -> Option<&Week> {
        self.weeks.iter().find(|w| w.number == number)
    }

    /// Minutes available in a week, if the week has an entry.
    pub fn minutes_available(&self, week: u32) -> Option<u32> {
        self.availability
            .iter()
            .find(|a| a.week == week)
            .map(|a| a.minutes_available)
    }

    /// The week containing `at`, if any.
    pub fn week_containing(&self, at: DateTime<Utc>) -> Option<&Week> {
        self.weeks.iter().find(|w| w.contains(at))
    }

    /// Total minutes over all availability entries.
    pub fn total_minutes(&self) -> u64 {
        self.availability
            .iter()
            .map(|a| a.minutes_available as u64)
            .sum()
    }

    /// Availability as a lookup table.
    pub fn availability_map(&self) -> HashMap<u32, u32> {
        self.availability
            .iter()
            .map(|a| (a.week, a.minutes_available))
            .collect()
    }
}

fn hours_to_minutes(hours: f64) -> u32 {
    if !hours.is_finite() || hours <= 0.0 {
        return 0;
    }
    (hours * 60.0).round().min(u32::MAX as f64) as u32
}

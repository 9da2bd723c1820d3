//! Study-planning domain models.
//!
//! Provides the input records supplied by the catalog and availability
//! stores, and the plan structures handed back to the presentation layer.
//!
//! # Domain Mappings
//!
//! | u-studyplan | Job-shop analogue |
//! |-------------|-------------------|
//! | CourseModule | Task/Job |
//! | PlanActivity | Operation |
//! | Week budget | Machine capacity per period |
//! | StudyPlan | Schedule |

mod activity;
mod calendar;
mod plan;

pub use activity::{CourseModule, ModuleActivity, PlanActivity};
pub use calendar::{AvailableTimeWeek, Horizon, Week, WeekAvailability};
pub use plan::{PlanIssue, PlanWeek, SimulatedWeek, Simulation, StudyPlan};

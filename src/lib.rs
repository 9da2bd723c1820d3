//! Study-plan generation for the U-Engine ecosystem.
//!
//! Orders a student's pending course activities into calendar weeks so that
//! weekly time budgets are respected, deadlines are met where possible,
//! each module is studied in sequence, and modules are not spread thin.
//! The ordering is searched with a permutation-encoded genetic algorithm.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `CourseModule`, `ModuleActivity`, `Week`,
//!   `Horizon`, `PlanActivity`, `Simulation`, `StudyPlan`
//! - **`index`**: Immutable activity index shared by the search
//! - **`validation`**: Input integrity checks (duplicate IDs, week numbering,
//!   availability references)
//! - **`ga`**: Genome encoding, operators, evaluator, and chunked search
//! - **`planner`**: `PlanGenerator`, the end-to-end entry point
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use u_studyplan::ga::SearchConfig;
//! use u_studyplan::models::{AvailableTimeWeek, CourseModule, Horizon, ModuleActivity};
//! use u_studyplan::{PlanGenerator, PlanRequest};
//!
//! let monday = Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap();
//! let modules = vec![CourseModule::new("MATH101")
//!     .with_activity(ModuleActivity::new("intro", 1, 90))
//!     .with_activity(ModuleActivity::new("limits", 2, 120))];
//! let horizon = Horizon::from_weekly_hours(&[AvailableTimeWeek {
//!     week_start: monday,
//!     hours_available: 5.0,
//! }]);
//!
//! let generator = PlanGenerator::new(SearchConfig::default().with_seed(7));
//! let plan = generator
//!     .generate(&PlanRequest::new(modules, horizon, monday), |_| {})
//!     .unwrap();
//! assert_eq!(plan.planned_count(), 2);
//! ```
//!
//! # References
//!
//! - Bierwirth (1995), "A generalized permutation approach to JSSP"
//! - Goldberg (1989), "Genetic Algorithms in Search, Optimization and
//!   Machine Learning"

pub mod error;
pub mod ga;
pub mod index;
pub mod models;
pub mod planner;
pub mod validation;

pub use error::{PlanError, Result};
pub use planner::{PlanGenerator, PlanRequest};

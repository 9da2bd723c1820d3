//! Plan generation entry point.
//!
//! # Pipeline
//!
//! 1. Validate modules and horizon.
//! 2. Build the [`ActivityIndex`] (pending activities only).
//! 3. Capture index, horizon, and reference date in a [`PlanEvaluator`].
//! 4. Run the [`PlanSearch`] chunk by chunk, reporting progress.
//! 5. Project the best genome into a [`StudyPlan`].
//!
//! A plan is transient: nothing is kept between calls.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::ga::{CancelToken, PenaltyWeights, PlanEvaluator, PlanSearch, SearchConfig, SearchProgress};
use crate::index::ActivityIndex;
use crate::models::{CourseModule, Horizon, StudyPlan};
use crate::validation::validate_input;

/// Inputs of one plan generation.
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// The student's modules, completed activities included.
    pub modules: Vec<CourseModule>,
    /// Weeks and weekly budgets.
    pub horizon: Horizon,
    /// Reference date; packing starts in the week containing it.
    pub now: DateTime<Utc>,
}

impl PlanRequest {
    /// Creates a request starting at `now`.
    pub fn new(modules: Vec<CourseModule>, horizon: Horizon, now: DateTime<Utc>) -> Self {
        Self {
            modules,
            horizon,
            now,
        }
    }
}

/// Generates study plans with a genetic search.
///
/// # Example
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use u_studyplan::planner::{PlanGenerator, PlanRequest};
/// use u_studyplan::ga::SearchConfig;
/// use u_studyplan::models::{CourseModule, Horizon, ModuleActivity, Week, WeekAvailability};
///
/// let start = Utc.with_ymd_and_hms(2024, 9, 2, 0, 0, 0).unwrap();
/// let modules = vec![CourseModule::new("M1")
///     .with_activity(ModuleActivity::new("a1", 1, 60))
///     .with_activity(ModuleActivity::new("a2", 1, 90))];
/// let horizon = Horizon::new(
///     vec![Week::new(1, start, start + Duration::days(7))],
///     vec![WeekAvailability::new(1, 200)],
/// );
///
/// let generator = PlanGenerator::new(
///     SearchConfig::default().with_population_size(10).with_generations(20).with_seed(1),
/// );
/// let plan = generator
///     .generate(&PlanRequest::new(modules, horizon, start), |_| {})
///     .unwrap();
/// assert_eq!(plan.weeks[0].time_left, 50);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlanGenerator {
    config: SearchConfig,
    weights: PenaltyWeights,
}

impl PlanGenerator {
    /// Creates a generator with default penalty weights.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            weights: PenaltyWeights::default(),
        }
    }

    /// Sets penalty weights.
    pub fn with_weights(mut self, weights: PenaltyWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Validates the request and sets up a search without running it.
    ///
    /// Every search gets its own [`CancelToken`]; cancel it through
    /// [`PlanSearch::cancel_token`].
    pub fn prepare(&self, request: &PlanRequest) -> Result<PlanSearch> {
        validate_input(&request.modules, &request.horizon)?;

        let index = ActivityIndex::from_modules(&request.modules);
        let evaluator = PlanEvaluator::new(
            index,
            &request.horizon,
            request.now,
            self.weights.clone(),
        )?;

        info!(
            activities = evaluator.index().len(),
            modules = evaluator.index().module_count(),
            total_duration = evaluator.index().total_minutes(),
            total_availability = evaluator.available_minutes(),
            weeks = evaluator.week_count(),
            "starting plan search"
        );

        PlanSearch::new(evaluator, self.config.clone())
    }

    /// Runs a complete search, calling `on_progress` after every chunk.
    pub fn generate<F>(&self, request: &PlanRequest, on_progress: F) -> Result<StudyPlan>
    where
        F: FnMut(&SearchProgress),
    {
        self.prepare(request)?.run(on_progress)
    }

    /// Like [`generate`](Self::generate), stopping at the next chunk
    /// boundary once `cancel` is set. The best plan found so far is returned.
    pub fn generate_with_cancel<F>(
        &self,
        request: &PlanRequest,
        cancel: &CancelToken,
        on_progress: F,
    ) -> Result<StudyPlan>
    where
        F: FnMut(&SearchProgress),
    {
        self.prepare(request)?
            .with_cancel_token(cancel.clone())
            .run(on_progress)
    }

    /// Like [`generate_with_cancel`](Self::generate_with_cancel), yielding
    /// to the tokio scheduler between chunks.
    #[cfg(feature = "async")]
    pub async fn generate_async<F>(
        &self,
        request: &PlanRequest,
        cancel: &CancelToken,
        mut on_progress: F,
    ) -> Result<StudyPlan>
    where
        F: FnMut(&SearchProgress),
    {
        let mut search = self.prepare(request)?.with_cancel_token(cancel.clone());
        loop {
            tokio::task::yield_now().await;
            let progress = search.step()?;
            on_progress(&progress);
            if progress.state.is_finished() {
                return Ok(progress.plan);
            }
        }
    }
}

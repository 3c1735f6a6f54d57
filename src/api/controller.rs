//! Controller Module
//!
//! This module defines the mutating APIs of the application: driving a timer through
//! its lifecycle, recording workouts for progression tracking, managing templates
//! and programs, and remembering rest times. The implementations live in
//! `components` and talk to the injected services.
use anyhow::Result;
use async_trait::async_trait;
use time::OffsetDateTime;

use super::model::TimerModelApi;
use crate::model::{
    catalog::Exercise,
    progression::{
        ExerciseHistory, OverallProgress, PersonalRecord, ProgressionStats, SessionOutcome,
    },
    template::{ProgramDay, ProgramGoal, WorkoutProgram, WorkoutTemplate},
    timer::TickOutcome,
    workout::{SetEntry, Workout, WorkoutExercise, WorkoutSummary},
};

/// TimerApi trait
///
/// This trait extends the `TimerModelApi` trait with the lifecycle operations of a
/// countdown or stopwatch. Lifecycle errors are `TimerError`s wrapped in `anyhow`.
#[async_trait]
pub trait TimerApi: TimerModelApi {
    /// Start the timer from setup, or continue a paused one.
    async fn start(&mut self) -> Result<()>;

    /// Pause a running timer.
    async fn pause(&mut self) -> Result<()>;

    /// Resume a paused timer.
    async fn resume(&mut self) -> Result<()>;

    /// Shift the remaining time of a started countdown.
    ///
    /// # Arguments
    ///
    /// * `delta` - Seconds to add, negative to subtract.
    ///
    /// # Returns
    ///
    /// The new remaining time in seconds.
    async fn adjust(&mut self, delta: i64) -> Result<u32>;

    /// Return to setup with the configured duration.
    async fn reset(&mut self) -> Result<()>;

    /// Tear the timer down.
    async fn close(&mut self) -> Result<()>;

    /// Advance the timer by one second.
    fn tick(&mut self) -> TickOutcome;
}

/// ProgressionApi trait
///
/// This trait defines the asynchronous API of the progression tracker of one user.
/// It records exercise sessions, keeps personal records up to date and answers
/// history and progress queries.
#[async_trait]
pub trait ProgressionApi: Send + Sync {
    /// Record one exercise of a finished workout.
    ///
    /// Only completed sets are taken into account. A session without completed sets
    /// writes nothing and yields an empty outcome.
    ///
    /// # Arguments
    ///
    /// * `workout_id` - Workout the session belongs to.
    /// * `exercise_id` - Catalog id of the exercise.
    /// * `exercise_name` - Display name stored with the history row and record.
    /// * `sets` - All sets of the session.
    /// * `date` - Date of the workout.
    async fn log_exercise_history(
        &self,
        workout_id: &str,
        exercise_id: &str,
        exercise_name: &str,
        sets: &[SetEntry],
        date: OffsetDateTime,
    ) -> Result<SessionOutcome>;

    /// Store a finished workout and record every exercise of it.
    ///
    /// Invalid sets anywhere in the workout reject it before anything is written.
    async fn log_workout(&self, workout: &Workout) -> Result<Vec<SessionOutcome>>;

    /// Stored workouts, newest first (default limit 10).
    async fn recent_workouts(&self, limit: Option<usize>) -> Result<Vec<Workout>>;

    /// Totals and training streak over all stored workouts.
    async fn workout_summary(&self) -> Result<WorkoutSummary>;

    /// Workouts, volume and improved records of the last `days` days.
    async fn overall_progress(&self, days: u32) -> Result<OverallProgress>;

    /// History of an exercise, newest first.
    async fn exercise_history(
        &self,
        exercise_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ExerciseHistory>>;

    /// The most recent session of an exercise.
    async fn last_exercise_workout(&self, exercise_id: &str) -> Result<Option<ExerciseHistory>>;

    /// Personal record of an exercise.
    async fn exercise_record(&self, exercise_id: &str) -> Result<Option<PersonalRecord>>;

    /// All personal records, most recently improved first.
    async fn user_records(&self) -> Result<Vec<PersonalRecord>>;

    /// Progress of an exercise over the last `days` days.
    async fn progression_stats(&self, exercise_id: &str, days: u32) -> Result<ProgressionStats>;
}

/// TemplateApi trait
///
/// This trait defines the API for reusable workout templates and multi-week
/// programs of one user. Missing ids are reported as `PlanError`s.
#[async_trait]
pub trait TemplateApi: Send + Sync {
    /// Save the shape of a workout as a private template.
    ///
    /// # Returns
    ///
    /// The stored template.
    async fn save_as_template(
        &self,
        name: &str,
        description: &str,
        exercises: &[WorkoutExercise],
        tags: Vec<String>,
    ) -> Result<WorkoutTemplate>;

    /// Templates of the user, newest first.
    async fn user_templates(&self) -> Result<Vec<WorkoutTemplate>>;

    /// Public templates by use count, then newest first.
    async fn popular_templates(&self, limit: Option<usize>) -> Result<Vec<WorkoutTemplate>>;

    /// Count a use of a template and return it.
    async fn use_template(&self, template_id: &str) -> Result<WorkoutTemplate>;

    async fn delete_template(&self, template_id: &str) -> Result<()>;

    /// Create an inactive program.
    async fn create_program(
        &self,
        name: &str,
        description: &str,
        duration_weeks: u32,
        days_per_week: u32,
        goal: ProgramGoal,
    ) -> Result<WorkoutProgram>;

    /// Append a scheduled day to a program.
    async fn add_program_day(&self, program_id: &str, day: ProgramDay) -> Result<WorkoutProgram>;

    /// Programs of the user, newest first.
    async fn user_programs(&self) -> Result<Vec<WorkoutProgram>>;

    /// The program currently followed, if any.
    async fn active_program(&self) -> Result<Option<WorkoutProgram>>;

    /// Activate a program. Any other active program of the user is deactivated.
    async fn start_program(&self, program_id: &str) -> Result<WorkoutProgram>;

    /// Count a finished training day of an active program.
    async fn advance_program(&self, program_id: &str) -> Result<WorkoutProgram>;
}

/// SettingsApi trait
///
/// Per-exercise rest times remembered for one user.
#[async_trait]
pub trait SettingsApi: Send + Sync {
    /// The remembered rest time of an exercise, else its catalog recommendation.
    async fn rest_seconds(&self, exercise: &Exercise) -> u32;

    /// Remember the rest time the user adjusted to. Zero is ignored.
    async fn remember_rest(&self, exercise_id: &str, seconds: u32) -> Result<()>;
}

//! Service Module
//!
//! This module defines the seams to the outside world: the document store holding
//! workouts, exercise history, personal records, templates and programs, and the
//! platform facility that delivers a notification after a delay. Both are injected into the components so they can
//! be swapped for mocks in tests.
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use time::OffsetDateTime;

use crate::model::{
    progression::{ExerciseHistory, PersonalRecord, RecordKey},
    template::{WorkoutProgram, WorkoutTemplate},
    workout::{RestSetting, Workout},
};

/// A notification to be delivered after `after` has elapsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reminder {
    pub title: String,
    pub body: String,
    pub after: Duration,
}

/// Opaque handle of a scheduled reminder.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderHandle(pub String);

/// ReminderScheduler trait
///
/// Schedules and cancels delayed notifications. Delivery is best effort; callers
/// log failures and carry on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Schedule a reminder.
    ///
    /// # Returns
    /// A handle that can be passed to [`ReminderScheduler::cancel`].
    async fn schedule(&self, reminder: Reminder) -> Result<ReminderHandle>;

    /// Cancel a pending reminder. Cancelling a reminder that already fired is not an error.
    async fn cancel(&self, handle: ReminderHandle) -> Result<()>;
}

/// Sort order of a history query, by date.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Filter for exercise history rows.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryQuery {
    pub user_id: String,
    pub exercise_id: String,
    /// Only rows dated at or after this instant.
    pub since: Option<OffsetDateTime>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// All rows of a user's exercise, newest first.
    pub fn new(user_id: &str, exercise_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            exercise_id: exercise_id.to_string(),
            since: None,
            order: SortOrder::NewestFirst,
            limit: None,
        }
    }

    pub fn since(mut self, since: OffsetDateTime) -> Self {
        self.since = Some(since);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// `true` if `row` passes the user, exercise and date filters.
    pub fn matches(&self, row: &ExerciseHistory) -> bool {
        row.user_id == self.user_id
            && row.exercise_id == self.exercise_id
            && self.since.map_or(true, |since| row.date >= since)
    }
}

/// Filter for stored workouts. Results are always newest first.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutQuery {
    pub user_id: String,
    /// Only workouts dated at or after this instant.
    pub since: Option<OffsetDateTime>,
    pub limit: Option<usize>,
}

impl WorkoutQuery {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            since: None,
            limit: None,
        }
    }

    pub fn since(mut self, since: OffsetDateTime) -> Self {
        self.since = Some(since);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, workout: &Workout) -> bool {
        workout.user_id == self.user_id && self.since.map_or(true, |since| workout.date >= since)
    }
}

/// WorkoutStore trait
///
/// Persistence of workouts, exercise history, personal records, templates,
/// programs and remembered rest times. Every call may fail; queries without
/// matches return an empty result rather than an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkoutStore: Send + Sync {
    /// Append a history row.
    async fn append_history(&self, history: ExerciseHistory) -> Result<()>;

    /// Query history rows.
    async fn query_history(&self, query: HistoryQuery) -> Result<Vec<ExerciseHistory>>;

    /// Fetch the personal record of a user and exercise, if one exists.
    async fn get_record(&self, key: RecordKey) -> Result<Option<PersonalRecord>>;

    /// Insert or replace a personal record.
    async fn put_record(&self, record: PersonalRecord) -> Result<()>;

    /// All personal records of a user, in no particular order.
    async fn list_records(&self, user_id: String) -> Result<Vec<PersonalRecord>>;

    /// Insert or replace a workout, keyed by its id.
    async fn save_workout(&self, workout: Workout) -> Result<()>;

    async fn get_workout(&self, workout_id: String) -> Result<Option<Workout>>;

    /// Workouts of a user, newest first.
    async fn query_workouts(&self, query: WorkoutQuery) -> Result<Vec<Workout>>;

    /// Insert or replace a template, keyed by its id.
    async fn put_template(&self, template: WorkoutTemplate) -> Result<()>;

    async fn get_template(&self, template_id: String) -> Result<Option<WorkoutTemplate>>;

    /// Templates of a user, in no particular order.
    async fn list_templates(&self, user_id: String) -> Result<Vec<WorkoutTemplate>>;

    /// Templates shared by any user, in no particular order.
    async fn public_templates(&self) -> Result<Vec<WorkoutTemplate>>;

    /// Remove a template. Removing a missing template is not an error.
    async fn delete_template(&self, template_id: String) -> Result<()>;

    /// Insert or replace programs, keyed by their ids, in one write.
    async fn put_programs(&self, programs: Vec<WorkoutProgram>) -> Result<()>;

    async fn get_program(&self, program_id: String) -> Result<Option<WorkoutProgram>>;

    /// Programs of a user, in no particular order.
    async fn list_programs(&self, user_id: String) -> Result<Vec<WorkoutProgram>>;

    async fn get_rest_setting(
        &self,
        user_id: String,
        exercise_id: String,
    ) -> Result<Option<RestSetting>>;

    /// Insert or replace the rest time of a user and exercise.
    async fn put_rest_setting(&self, setting: RestSetting) -> Result<()>;

    /// Persist the outcome of one exercise session.
    ///
    /// The default writes the history row first and the record second, stopping at
    /// the first failure. Stores that can write both at once should override it.
    ///
    /// # Arguments
    /// - `history`: The new history row.
    /// - `record`: The updated personal record, `None` if no metric improved.
    async fn commit_session(
        &self,
        history: ExerciseHistory,
        record: Option<PersonalRecord>,
    ) -> Result<()> {
        self.append_history(history).await?;
        if let Some(record) = record {
            self.put_record(record).await?;
        }
        Ok(())
    }
}

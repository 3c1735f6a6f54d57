//! Progression Component
//!
//! This module records finished workouts and exercise sessions for one user. A
//! session becomes a history row, and every metric it improves on becomes a
//! [`RecordUpdate`] applied to the stored personal record. Both are handed to the
//! store in a single commit.

use std::{fmt::Debug, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use time::{Date, Duration, OffsetDateTime};
use tokio::sync::broadcast::Sender;

use crate::{
    api::{
        controller::ProgressionApi,
        service::{HistoryQuery, SortOrder, WorkoutQuery, WorkoutStore},
    },
    core::{
        constants::{DEFAULT_HISTORY_LIMIT, RECENT_WORKOUTS_LIMIT},
        events::AppEvent,
    },
    model::{
        progression::{
            ExerciseHistory, OverallProgress, PersonalRecord, ProgressionStats, RecordKey,
            RecordUpdate, SessionOutcome, SessionStats,
        },
        workout::{SetEntry, Workout, WorkoutSummary},
    },
};

/// Progression tracking of a single user on top of a workout store.
///
/// # Type Parameters
/// * `S` - The store holding history and records.
pub struct ProgressionComponent<S: WorkoutStore + ?Sized> {
    store: Arc<S>,
    user_id: String,
    event_bus: Option<Sender<AppEvent>>,
}

impl<S: WorkoutStore + ?Sized> Debug for ProgressionComponent<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressionComponent")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl<S: WorkoutStore + ?Sized> ProgressionComponent<S> {
    /// Creates a new `ProgressionComponent`.
    ///
    /// # Arguments
    /// - `store`: Persistence of history and records.
    /// - `user_id`: The user all sessions are recorded for.
    pub fn new(store: Arc<S>, user_id: &str) -> Self {
        Self {
            store,
            user_id: user_id.to_string(),
            event_bus: None,
        }
    }

    /// Announce new personal records on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: Sender<AppEvent>) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Progress of an exercise in the `days` days before `now`.
    pub async fn progression_stats_until(
        &self,
        exercise_id: &str,
        days: u32,
        now: OffsetDateTime,
    ) -> Result<ProgressionStats> {
        let since = now - Duration::days(i64::from(days));
        let query = HistoryQuery::new(&self.user_id, exercise_id)
            .since(since)
            .order(SortOrder::OldestFirst);
        let history = self
            .store
            .query_history(query)
            .await
            .inspect_err(|e| error!("Failed to load history of {}: {:?}", exercise_id, e))?;
        Ok(ProgressionStats::from_history(
            exercise_id,
            &history,
            days,
            (since, now),
        ))
    }

    /// Summary of all stored workouts, with the streak counted back from `today`.
    pub async fn workout_summary_on(&self, today: Date) -> Result<WorkoutSummary> {
        let workouts = self
            .store
            .query_workouts(WorkoutQuery::new(&self.user_id))
            .await
            .inspect_err(|e| error!("Failed to load workouts of {}: {:?}", self.user_id, e))?;
        Ok(WorkoutSummary::from_workouts(&workouts, today))
    }

    /// Overall progress in the `days` days before `now`.
    pub async fn overall_progress_until(
        &self,
        days: u32,
        now: OffsetDateTime,
    ) -> Result<OverallProgress> {
        let since = now - Duration::days(i64::from(days));
        let workouts = self
            .store
            .query_workouts(WorkoutQuery::new(&self.user_id).since(since))
            .await
            .inspect_err(|e| error!("Failed to load workouts of {}: {:?}", self.user_id, e))?;
        let records = self
            .store
            .list_records(self.user_id.clone())
            .await
            .inspect_err(|e| error!("Failed to load records of {}: {:?}", self.user_id, e))?;
        Ok(OverallProgress::from_workouts(days, since, &workouts, records))
    }

    fn announce(&self, exercise_id: &str, exercise_name: &str, updates: &[RecordUpdate]) {
        for update in updates {
            info!(
                "New {} for {}: {:.1}",
                update.kind, exercise_name, update.value
            );
        }
        if let Some(tx) = &self.event_bus {
            let _ = tx.send(AppEvent::NewRecords {
                exercise_id: exercise_id.to_string(),
                exercise_name: exercise_name.to_string(),
                updates: updates.to_vec(),
            });
        }
    }
}

#[async_trait]
impl<S: WorkoutStore + ?Sized> ProgressionApi for ProgressionComponent<S> {
    async fn log_exercise_history(
        &self,
        workout_id: &str,
        exercise_id: &str,
        exercise_name: &str,
        sets: &[SetEntry],
        date: OffsetDateTime,
    ) -> Result<SessionOutcome> {
        sets.iter()
            .try_for_each(SetEntry::validate)
            .with_context(|| format!("invalid set of {}", exercise_name))?;
        let Some(stats) = SessionStats::from_sets(sets) else {
            debug!("No completed sets of {}, nothing to log.", exercise_name);
            return Ok(SessionOutcome::default());
        };

        let history = ExerciseHistory::from_stats(
            &self.user_id,
            workout_id,
            exercise_id,
            exercise_name,
            date,
            &stats,
        );

        let key = RecordKey::new(&self.user_id, exercise_id);
        let stored = self
            .store
            .get_record(key.clone())
            .await
            .inspect_err(|e| error!("Failed to load record {}: {:?}", key.document_id(), e))
            .with_context(|| format!("loading personal record of {}", exercise_name))?;

        let updates = PersonalRecord::candidate_updates(stored.as_ref(), &stats, date);
        let record = if updates.is_empty() {
            None
        } else {
            let mut record =
                stored.unwrap_or_else(|| PersonalRecord::new(&key, exercise_name, date));
            record.exercise_name = exercise_name.to_string();
            record.apply(&updates);
            Some(record)
        };

        self.store
            .commit_session(history.clone(), record)
            .await
            .inspect_err(|e| error!("Failed to save session of {}: {:?}", exercise_name, e))
            .with_context(|| format!("saving session of {}", exercise_name))?;

        debug!(
            "Logged {} sets of {} ({:.0} volume).",
            stats.sets.len(),
            exercise_name,
            stats.total_volume
        );
        if !updates.is_empty() {
            self.announce(exercise_id, exercise_name, &updates);
        }
        Ok(SessionOutcome {
            history: Some(history),
            updates,
        })
    }

    async fn log_workout(&self, workout: &Workout) -> Result<Vec<SessionOutcome>> {
        workout
            .validate()
            .with_context(|| format!("invalid set in workout {}", workout.name))?;
        let mut stored = workout.clone();
        stored.user_id = self.user_id.clone();
        self.store
            .save_workout(stored)
            .await
            .inspect_err(|e| error!("Failed to save workout {}: {:?}", workout.id, e))
            .with_context(|| format!("saving workout {}", workout.name))?;

        let mut outcomes = Vec::with_capacity(workout.exercises.len());
        for exercise in &workout.exercises {
            let outcome = self
                .log_exercise_history(
                    &workout.id,
                    &exercise.exercise.id,
                    &exercise.exercise.name,
                    &exercise.sets,
                    workout.date,
                )
                .await?;
            outcomes.push(outcome);
        }
        info!(
            "Logged workout {} with {} exercises.",
            workout.name,
            outcomes.iter().filter(|o| o.history.is_some()).count()
        );
        Ok(outcomes)
    }

    async fn exercise_history(
        &self,
        exercise_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ExerciseHistory>> {
        let query = HistoryQuery::new(&self.user_id, exercise_id)
            .limit(limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
        self.store
            .query_history(query)
            .await
            .inspect_err(|e| error!("Failed to load history of {}: {:?}", exercise_id, e))
    }

    async fn last_exercise_workout(&self, exercise_id: &str) -> Result<Option<ExerciseHistory>> {
        Ok(self
            .exercise_history(exercise_id, Some(1))
            .await?
            .into_iter()
            .next())
    }

    async fn exercise_record(&self, exercise_id: &str) -> Result<Option<PersonalRecord>> {
        let key = RecordKey::new(&self.user_id, exercise_id);
        self.store
            .get_record(key)
            .await
            .inspect_err(|e| error!("Failed to load record of {}: {:?}", exercise_id, e))
    }

    async fn user_records(&self) -> Result<Vec<PersonalRecord>> {
        let mut records = self
            .store
            .list_records(self.user_id.clone())
            .await
            .inspect_err(|e| error!("Failed to load records of {}: {:?}", self.user_id, e))?;
        records.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(records)
    }

    async fn progression_stats(&self, exercise_id: &str, days: u32) -> Result<ProgressionStats> {
        self.progression_stats_until(exercise_id, days, OffsetDateTime::now_utc())
            .await
    }

    async fn recent_workouts(&self, limit: Option<usize>) -> Result<Vec<Workout>> {
        let query = WorkoutQuery::new(&self.user_id).limit(limit.unwrap_or(RECENT_WORKOUTS_LIMIT));
        self.store
            .query_workouts(query)
            .await
            .inspect_err(|e| error!("Failed to load workouts of {}: {:?}", self.user_id, e))
    }

    async fn workout_summary(&self) -> Result<WorkoutSummary> {
        self.workout_summary_on(OffsetDateTime::now_utc().date()).await
    }

    async fn overall_progress(&self, days: u32) -> Result<OverallProgress> {
        self.overall_progress_until(days, OffsetDateTime::now_utc())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::service::MockWorkoutStore;
    use crate::components::store::DocumentStore;
    use crate::core::errors::SetError;
    use crate::model::{catalog::find_exercise, progression::RecordKind, workout::WorkoutExercise};
    use anyhow::anyhow;
    use time::macros::{date, datetime};

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn tracker() -> ProgressionComponent<DocumentStore> {
        ProgressionComponent::new(Arc::new(DocumentStore::in_memory()), "alice")
    }

    #[tokio::test]
    async fn test_first_session_creates_record() {
        let tracker = tracker();
        let date = datetime!(2024-03-01 18:00 UTC);
        let sets = vec![
            SetEntry::new(100.0, 5),
            SetEntry::new(110.0, 3),
            SetEntry::new(120.0, 1).pending(),
        ];

        let outcome = tracker
            .log_exercise_history("w1", "1", "Barbell Bench Press", &sets, date)
            .await
            .unwrap();
        assert!(outcome.is_new_record());
        let history = outcome.history.unwrap();
        assert_eq!(history.sets.len(), 2);
        assert!(approx_eq(history.max_weight, 110.0));

        let record = tracker.exercise_record("1").await.unwrap().unwrap();
        assert!(approx_eq(record.value(RecordKind::MaxWeight), 110.0));
        assert!(approx_eq(record.value(RecordKind::OneRepMax), 116.0 + 2.0 / 3.0));
        assert_eq!(
            record.entry(RecordKind::OneRepMax).unwrap().detail,
            Some(SetEntry::new(100.0, 5))
        );
        assert_eq!(record.last_updated, date);
    }

    #[tokio::test]
    async fn test_later_session_updates_only_improved_metrics() {
        let tracker = tracker();
        let first = datetime!(2024-03-01 18:00 UTC);
        let second = datetime!(2024-03-08 18:00 UTC);
        tracker
            .log_exercise_history("w1", "37", "Deadlift", &[SetEntry::new(180.0, 8)], first)
            .await
            .unwrap();

        let outcome = tracker
            .log_exercise_history("w2", "37", "Deadlift", &[SetEntry::new(200.0, 2)], second)
            .await
            .unwrap();
        let kinds: Vec<_> = outcome.updates.iter().map(|u| u.kind).collect();
        assert_eq!(kinds, vec![RecordKind::MaxWeight]);

        let record = tracker.exercise_record("37").await.unwrap().unwrap();
        assert_eq!(record.entry(RecordKind::MaxWeight).unwrap().date, second);
        assert_eq!(record.entry(RecordKind::MaxReps).unwrap().date, first);
        assert!(approx_eq(record.value(RecordKind::MaxReps), 8.0));
        assert_eq!(record.last_updated, second);

        let history = tracker.exercise_history("37", None).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, second);
        let last = tracker.last_exercise_workout("37").await.unwrap().unwrap();
        assert_eq!(last.workout_id, "w2");
    }

    #[tokio::test]
    async fn test_no_completed_sets_writes_nothing() {
        let mut store = MockWorkoutStore::new();
        store.expect_get_record().never();
        store.expect_commit_session().never();
        store.expect_append_history().never();
        store.expect_put_record().never();
        let tracker = ProgressionComponent::new(Arc::new(store), "alice");

        let sets = vec![SetEntry::new(100.0, 5).pending()];
        let outcome = tracker
            .log_exercise_history("w1", "1", "Bench", &sets, datetime!(2024-03-01 18:00 UTC))
            .await
            .unwrap();
        assert_eq!(outcome, SessionOutcome::default());
    }

    #[tokio::test]
    async fn test_invalid_weight_is_rejected_without_writes() {
        let mut store = MockWorkoutStore::new();
        store.expect_get_record().never();
        store.expect_commit_session().never();
        store.expect_save_workout().never();
        let tracker = ProgressionComponent::new(Arc::new(store), "alice");
        let date = datetime!(2024-03-01 18:00 UTC);

        for weight in [f64::NAN, f64::INFINITY, -5.0] {
            let sets = vec![SetEntry::new(100.0, 5), SetEntry::new(weight, 5)];
            let err = tracker
                .log_exercise_history("w1", "1", "Bench", &sets, date)
                .await
                .unwrap_err();
            assert!(matches!(
                err.downcast_ref::<SetError>(),
                Some(SetError::InvalidWeight(_))
            ));
        }

        let mut bench = WorkoutExercise::new(find_exercise("1").unwrap());
        bench.sets = vec![SetEntry::new(f64::NAN, 5).pending()];
        let workout = Workout {
            id: "w1".into(),
            user_id: "alice".into(),
            name: "Push".into(),
            date,
            exercises: vec![bench],
            duration_minutes: None,
            completed: true,
            notes: None,
        };
        assert!(tracker.log_workout(&workout).await.is_err());
    }

    #[tokio::test]
    async fn test_no_improvement_commits_history_only() {
        let mut store = MockWorkoutStore::new();
        let date = datetime!(2024-03-01 18:00 UTC);
        store.expect_get_record().times(1).returning(move |key| {
            let stats = SessionStats::from_sets(&[SetEntry::new(200.0, 10)]).unwrap();
            let mut record = PersonalRecord::new(&key, "Bench", date);
            record.apply(&PersonalRecord::candidate_updates(None, &stats, date));
            Ok(Some(record))
        });
        store
            .expect_commit_session()
            .withf(|history, record| history.exercise_id == "1" && record.is_none())
            .times(1)
            .returning(|_, _| Ok(()));
        let tracker = ProgressionComponent::new(Arc::new(store), "alice");

        let outcome = tracker
            .log_exercise_history("w1", "1", "Bench", &[SetEntry::new(100.0, 5)], date)
            .await
            .unwrap();
        assert!(outcome.history.is_some());
        assert!(!outcome.is_new_record());
    }

    #[tokio::test]
    async fn test_store_failure_is_propagated() {
        let mut store = MockWorkoutStore::new();
        store.expect_get_record().returning(|_| Ok(None));
        store
            .expect_commit_session()
            .returning(|_, _| Err(anyhow!("database unavailable")));
        let tracker = ProgressionComponent::new(Arc::new(store), "alice");

        let result = tracker
            .log_exercise_history(
                "w1",
                "1",
                "Bench",
                &[SetEntry::new(100.0, 5)],
                datetime!(2024-03-01 18:00 UTC),
            )
            .await;
        let err = result.unwrap_err();
        assert!(format!("{:?}", err).contains("database unavailable"));
    }

    #[tokio::test]
    async fn test_new_records_are_broadcast() {
        let (tx, mut rx) = tokio::sync::broadcast::channel(4);
        let tracker = tracker().with_event_bus(tx);
        tracker
            .log_exercise_history(
                "w1",
                "69",
                "Back Squat",
                &[SetEntry::new(140.0, 5)],
                datetime!(2024-03-01 18:00 UTC),
            )
            .await
            .unwrap();
        match rx.try_recv().unwrap() {
            AppEvent::NewRecords { exercise_id, updates, .. } => {
                assert_eq!(exercise_id, "69");
                assert_eq!(updates.len(), 4);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_log_workout_and_user_records() {
        let tracker = tracker();
        let exercise = |id: &str, sets: Vec<SetEntry>| {
            let mut we = WorkoutExercise::new(find_exercise(id).unwrap());
            we.sets = sets;
            we
        };
        let monday = Workout {
            id: "w1".into(),
            user_id: "alice".into(),
            name: "Push".into(),
            date: datetime!(2024-03-04 18:00 UTC),
            exercises: vec![
                exercise("1", vec![SetEntry::new(80.0, 8)]),
                exercise("44", vec![SetEntry::new(40.0, 8).pending()]),
            ],
            duration_minutes: Some(50),
            completed: true,
            notes: None,
        };
        let thursday = Workout {
            id: "w2".into(),
            date: datetime!(2024-03-07 18:00 UTC),
            exercises: vec![exercise("69", vec![SetEntry::new(120.0, 5)])],
            ..monday.clone()
        };

        let outcomes = tracker.log_workout(&monday).await.unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[1].history.is_none());
        tracker.log_workout(&thursday).await.unwrap();

        let records = tracker.user_records().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.exercise_id.as_str()).collect();
        assert_eq!(ids, vec!["69", "1"]);
        assert!(tracker.exercise_record("44").await.unwrap().is_none());

        let workouts = tracker.recent_workouts(None).await.unwrap();
        let ids: Vec<_> = workouts.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["w2", "w1"]);
        assert_eq!(tracker.recent_workouts(Some(1)).await.unwrap().len(), 1);

        let summary = tracker.workout_summary_on(date!(2024-03-08)).await.unwrap();
        assert_eq!(summary.total_workouts, 2);
        assert!(approx_eq(summary.total_volume, 640.0 + 600.0));
        assert_eq!(summary.current_streak, 1);

        let progress = tracker
            .overall_progress_until(2, datetime!(2024-03-08 12:00 UTC))
            .await
            .unwrap();
        assert_eq!(progress.total_workouts, 1);
        assert!(approx_eq(progress.average_workout_volume, 600.0));
        let recent: Vec<_> = progress
            .recent_records
            .iter()
            .map(|r| r.exercise_id.as_str())
            .collect();
        assert_eq!(recent, vec!["69"]);
    }

    #[tokio::test]
    async fn test_workout_is_stored_for_the_tracked_user() {
        let mut store = MockWorkoutStore::new();
        store
            .expect_save_workout()
            .withf(|w| w.id == "w9" && w.user_id == "alice")
            .times(1)
            .returning(|_| Ok(()));
        let tracker = ProgressionComponent::new(Arc::new(store), "alice");
        let workout = Workout {
            id: "w9".into(),
            user_id: String::new(),
            name: "Empty".into(),
            date: datetime!(2024-03-01 18:00 UTC),
            exercises: Vec::new(),
            duration_minutes: None,
            completed: true,
            notes: None,
        };
        assert!(tracker.log_workout(&workout).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progression_stats_window() {
        let tracker = tracker();
        let sessions = [
            (datetime!(2024-01-15 18:00 UTC), 90.0),
            (datetime!(2024-03-01 18:00 UTC), 100.0),
            (datetime!(2024-03-15 18:00 UTC), 110.0),
        ];
        for (date, weight) in sessions {
            tracker
                .log_exercise_history("w", "1", "Bench", &[SetEntry::new(weight, 10)], date)
                .await
                .unwrap();
        }

        let now = datetime!(2024-03-20 12:00 UTC);
        let stats = tracker.progression_stats_until("1", 30, now).await.unwrap();
        assert_eq!(stats.workout_count, 2);
        assert!(approx_eq(stats.strength_increase, 10.0));
        assert!(approx_eq(stats.volume_increase, 10.0));
        assert_eq!(stats.weight_trend.len(), 2);

        let empty = tracker.progression_stats_until("69", 30, now).await.unwrap();
        assert_eq!(empty.workout_count, 0);
        assert_eq!(empty.volume_increase, 0.0);
        assert!(empty.volume_trend.is_empty());
    }
}

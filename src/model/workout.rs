//! Workout Model
//!
//! Sets, exercises and workouts as recorded during a session, plus the aggregate
//! numbers shown on the home screen.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::catalog::Exercise;
use crate::{core::errors::SetError, math::strength::set_volume};

/// One recorded attempt within an exercise.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    #[serde(default)]
    pub reps: Option<u32>,
    /// Load in the user's preferred unit.
    #[serde(default)]
    pub weight: Option<f64>,
    /// Seconds, for time based exercises.
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub distance: Option<f64>,
    #[serde(default)]
    pub rpe: Option<f32>,
    pub completed: bool,
}

impl SetEntry {
    /// A completed weight/reps set.
    pub fn new(weight: f64, reps: u32) -> Self {
        Self {
            reps: Some(reps),
            weight: Some(weight),
            completed: true,
            ..Default::default()
        }
    }

    /// Same set, not yet ticked off.
    pub fn pending(mut self) -> Self {
        self.completed = false;
        self
    }

    pub fn reps(&self) -> u32 {
        self.reps.unwrap_or(0)
    }

    pub fn weight(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }

    /// Weight times reps, missing values counting as zero.
    pub fn volume(&self) -> f64 {
        set_volume(self.weight(), self.reps())
    }

    /// Checks the measured values. Weight and distance must be finite and not
    /// negative; non-finite numbers cannot be stored as JSON.
    pub fn validate(&self) -> Result<(), SetError> {
        if let Some(weight) = self.weight.filter(|w| !w.is_finite() || *w < 0.0) {
            return Err(SetError::InvalidWeight(weight));
        }
        if let Some(distance) = self.distance.filter(|d| !d.is_finite() || *d < 0.0) {
            return Err(SetError::InvalidDistance(distance));
        }
        if let Some(rpe) = self.rpe.filter(|r| !r.is_finite()) {
            return Err(SetError::InvalidRpe(rpe));
        }
        Ok(())
    }
}

/// An exercise performed within a workout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
    pub exercise: Exercise,
    pub sets: Vec<SetEntry>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Rest between sets in seconds.
    #[serde(default)]
    pub rest_time: Option<u32>,
}

impl WorkoutExercise {
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            sets: Vec::new(),
            notes: None,
            rest_time: None,
        }
    }

    /// Configured rest time, falling back to the catalog recommendation.
    pub fn rest_seconds(&self) -> u32 {
        self.rest_time
            .unwrap_or_else(|| self.exercise.default_rest_seconds())
    }

    /// The set recorded right before `idx`, used to prefill the next attempt.
    pub fn previous_set(&self, idx: usize) -> Option<&SetEntry> {
        idx.checked_sub(1).and_then(|prev| self.sets.get(prev))
    }

    /// Volume of the completed sets.
    pub fn completed_volume(&self) -> f64 {
        self.sets
            .iter()
            .filter(|set| set.completed)
            .map(SetEntry::volume)
            .sum()
    }
}

/// A workout session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub date: OffsetDateTime,
    pub exercises: Vec<WorkoutExercise>,
    /// Length of the session in minutes.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Workout {
    /// A finished workout recorded from a live session. The workout is dated at
    /// `end` and lasts the whole minutes between `start` and `end`.
    pub fn from_session(
        user_id: &str,
        name: &str,
        exercises: Vec<WorkoutExercise>,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Self {
        let minutes = (end - start).whole_minutes().max(0);
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            date: end,
            exercises,
            duration_minutes: Some(u32::try_from(minutes).unwrap_or(u32::MAX)),
            completed: true,
            notes: None,
        }
    }

    /// Set counts and volume of the workout.
    pub fn stats(&self) -> WorkoutStats {
        let sets = || self.exercises.iter().flat_map(|e| e.sets.iter());
        WorkoutStats {
            completed_sets: sets().filter(|s| s.completed).count(),
            total_sets: sets().count(),
            total_volume: self.total_volume(),
            exercise_count: self.exercises.len(),
        }
    }

    /// Validates every set of the workout.
    pub fn validate(&self) -> Result<(), SetError> {
        self.exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .try_for_each(SetEntry::validate)
    }

    /// Volume over all completed sets of the workout.
    pub fn total_volume(&self) -> f64 {
        self.exercises
            .iter()
            .map(WorkoutExercise::completed_volume)
            .sum()
    }

    /// Short listing of the exercise names: up to three names, otherwise two and a count.
    pub fn summary(&self) -> String {
        let names: Vec<&str> = self
            .exercises
            .iter()
            .map(|e| e.exercise.name.as_str())
            .collect();
        if names.len() <= 3 {
            names.join(", ")
        } else {
            format!("{}, +{} more", names[..2].join(", "), names.len() - 2)
        }
    }
}

/// Rest time a user settled on for an exercise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestSetting {
    pub user_id: String,
    pub exercise_id: String,
    pub rest_seconds: u32,
    pub last_used: OffsetDateTime,
}

impl RestSetting {
    /// Document id used by the store.
    pub fn document_id(user_id: &str, exercise_id: &str) -> String {
        format!("{}_{}", user_id, exercise_id)
    }
}

/// Counts of a single workout.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WorkoutStats {
    pub completed_sets: usize,
    pub total_sets: usize,
    pub total_volume: f64,
    pub exercise_count: usize,
}

/// Aggregate numbers over a user's workouts.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct WorkoutSummary {
    pub total_workouts: usize,
    pub total_volume: f64,
    /// Consecutive training days ending today or yesterday.
    pub current_streak: u32,
}

impl WorkoutSummary {
    /// `from_workouts` function.
    ///
    /// # Arguments
    /// - `workouts`: Workouts in any order.
    /// - `today`: Calendar day the streak is counted back from.
    pub fn from_workouts(workouts: &[Workout], today: Date) -> Self {
        Self {
            total_workouts: workouts.len(),
            total_volume: workouts.iter().map(Workout::total_volume).sum(),
            current_streak: current_streak(workouts, today),
        }
    }
}

/// Counts consecutive training days back from the most recent one. The streak
/// may end yesterday so a rest-day morning does not break it.
fn current_streak(workouts: &[Workout], today: Date) -> u32 {
    let mut days: Vec<Date> = workouts.iter().map(|w| w.date.date()).collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some(latest) = days.first() else {
        return 0;
    };
    let offset = (today - *latest).whole_days();
    if !(0..=1).contains(&offset) {
        return 0;
    }
    let streak = days
        .iter()
        .enumerate()
        .take_while(|(i, day)| (today - **day).whole_days() == offset + *i as i64)
        .count();
    u32::try_from(streak).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::find_exercise;
    use time::macros::{date, datetime};

    fn workout(date: OffsetDateTime, exercise_ids: &[&str]) -> Workout {
        Workout {
            id: "w".into(),
            user_id: "u".into(),
            name: "Push".into(),
            date,
            exercises: exercise_ids
                .iter()
                .map(|id| {
                    let mut we = WorkoutExercise::new(find_exercise(id).unwrap());
                    we.sets = vec![SetEntry::new(100.0, 5), SetEntry::new(100.0, 5).pending()];
                    we
                })
                .collect(),
            duration_minutes: Some(60),
            completed: true,
            notes: None,
        }
    }

    #[test]
    fn test_missing_values_count_as_zero() {
        let set = SetEntry {
            reps: Some(10),
            completed: true,
            ..Default::default()
        };
        assert_eq!(set.volume(), 0.0);
        assert_eq!(set.reps(), 10);
    }

    #[test]
    fn test_total_volume_uses_completed_sets() {
        let w = workout(datetime!(2024-05-01 10:00 UTC), &["1", "69"]);
        assert_eq!(w.total_volume(), 1000.0);
    }

    #[test]
    fn test_summary() {
        let short = workout(datetime!(2024-05-01 10:00 UTC), &["1", "69"]);
        assert_eq!(short.summary(), "Barbell Bench Press, Back Squat");
        let long = workout(datetime!(2024-05-01 10:00 UTC), &["1", "69", "37", "44"]);
        assert_eq!(long.summary(), "Barbell Bench Press, Back Squat, +2 more");
    }

    #[test]
    fn test_rest_seconds_falls_back_to_catalog() {
        let mut we = WorkoutExercise::new(find_exercise("48").unwrap());
        assert_eq!(we.rest_seconds(), 120);
        we.rest_time = Some(45);
        assert_eq!(we.rest_seconds(), 45);
    }

    #[test]
    fn test_previous_set() {
        let mut we = WorkoutExercise::new(find_exercise("1").unwrap());
        we.sets = vec![SetEntry::new(60.0, 8), SetEntry::new(70.0, 6)];
        assert!(we.previous_set(0).is_none());
        assert_eq!(we.previous_set(1).unwrap().weight(), 60.0);
    }

    #[test]
    fn test_validate_rejects_non_finite_and_negative_values() {
        assert!(SetEntry::new(0.0, 5).validate().is_ok());
        assert_eq!(
            SetEntry::new(-2.5, 5).validate(),
            Err(SetError::InvalidWeight(-2.5))
        );
        assert!(SetEntry::new(f64::NAN, 5).validate().is_err());
        assert!(SetEntry::new(f64::INFINITY, 5).validate().is_err());

        let run = SetEntry {
            distance: Some(f64::NEG_INFINITY),
            completed: true,
            ..Default::default()
        };
        assert!(matches!(run.validate(), Err(SetError::InvalidDistance(_))));

        let mut w = workout(datetime!(2024-05-01 10:00 UTC), &["1"]);
        assert!(w.validate().is_ok());
        w.exercises[0].sets.push(SetEntry::new(f64::NAN, 1).pending());
        assert!(w.validate().is_err());
    }

    #[test]
    fn test_workout_stats() {
        let w = workout(datetime!(2024-05-01 10:00 UTC), &["1", "69", "37"]);
        let stats = w.stats();
        assert_eq!(stats.completed_sets, 3);
        assert_eq!(stats.total_sets, 6);
        assert_eq!(stats.exercise_count, 3);
        assert_eq!(stats.total_volume, 1500.0);
    }

    #[test]
    fn test_from_session() {
        let start = datetime!(2024-05-01 17:58:30 UTC);
        let end = datetime!(2024-05-01 19:03:10 UTC);
        let w = Workout::from_session("u", "Legs", Vec::new(), start, end);
        assert_eq!(w.date, end);
        assert_eq!(w.duration_minutes, Some(64));
        assert!(w.completed);

        let backwards = Workout::from_session("u", "Legs", Vec::new(), end, start);
        assert_eq!(backwards.duration_minutes, Some(0));
    }

    #[test]
    fn test_streak() {
        let today = date!(2024-05-10);
        let workouts = vec![
            workout(datetime!(2024-05-09 18:00 UTC), &["1"]),
            workout(datetime!(2024-05-08 18:00 UTC), &["1"]),
            workout(datetime!(2024-05-07 18:00 UTC), &["1"]),
            workout(datetime!(2024-05-03 18:00 UTC), &["1"]),
        ];
        let summary = WorkoutSummary::from_workouts(&workouts, today);
        assert_eq!(summary.total_workouts, 4);
        assert_eq!(summary.total_volume, 2000.0);
        assert_eq!(summary.current_streak, 3);

        let from_today = vec![
            workout(datetime!(2024-05-10 08:00 UTC), &["1"]),
            workout(datetime!(2024-05-09 18:00 UTC), &["1"]),
            workout(datetime!(2024-05-08 18:00 UTC), &["1"]),
        ];
        assert_eq!(current_streak(&from_today, today), 3);
        assert_eq!(current_streak(&[], today), 0);

        let stale = vec![workout(datetime!(2024-05-07 18:00 UTC), &["1"])];
        assert_eq!(current_streak(&stale, today), 0);
    }
}

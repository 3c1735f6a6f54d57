//! Template Model
//!
//! Reusable workout templates and multi-week training programs. A template keeps
//! the shape of a workout (exercises, set counts and rep ranges) without the
//! recorded weights. A program schedules training days over a number of weeks
//! and tracks how far the user got.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use time::OffsetDateTime;
use uuid::Uuid;

use super::workout::{SetEntry, WorkoutExercise};
use crate::core::errors::PlanError;

/// Rep range of a group of sets: `"8-12"`, a single `"10"` when all sets agree,
/// or `"0"` when no set has reps.
pub fn reps_range(sets: &[SetEntry]) -> String {
    let reps = sets.iter().map(SetEntry::reps).filter(|r| *r > 0);
    let (min, max) = reps.fold(None, |range: Option<(u32, u32)>, r| match range {
        Some((min, max)) => Some((min.min(r), max.max(r))),
        None => Some((r, r)),
    })
    .unwrap_or((0, 0));
    if min == max {
        min.to_string()
    } else {
        format!("{}-{}", min, max)
    }
}

/// One exercise slot of a template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: usize,
    pub reps_range: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub rest_time: Option<u32>,
}

impl From<&WorkoutExercise> for TemplateExercise {
    fn from(exercise: &WorkoutExercise) -> Self {
        Self {
            exercise_id: exercise.exercise.id.clone(),
            exercise_name: exercise.exercise.name.clone(),
            sets: exercise.sets.len(),
            reps_range: reps_range(&exercise.sets),
            notes: exercise.notes.clone(),
            rest_time: exercise.rest_time,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutTemplate {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub exercises: Vec<TemplateExercise>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_public: bool,
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub last_used: Option<OffsetDateTime>,
    pub use_count: u32,
}

impl WorkoutTemplate {
    /// A private, unused template shaped after `exercises`.
    pub fn from_exercises(
        user_id: &str,
        name: &str,
        description: &str,
        exercises: &[WorkoutExercise],
        tags: Vec<String>,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            exercises: exercises.iter().map(TemplateExercise::from).collect(),
            tags,
            is_public: false,
            created_at: now,
            last_used: None,
            use_count: 0,
        }
    }

    /// Counts one more use of the template.
    pub fn mark_used(&mut self, now: OffsetDateTime) {
        self.use_count = self.use_count.saturating_add(1);
        self.last_used = Some(now);
    }
}

/// Focus of a training program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgramGoal {
    Strength,
    Muscle,
    Endurance,
    #[default]
    General,
}

impl Display for ProgramGoal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProgramGoal::Strength => "strength",
            ProgramGoal::Muscle => "muscle",
            ProgramGoal::Endurance => "endurance",
            ProgramGoal::General => "general",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgramExercise {
    pub exercise_id: String,
    pub exercise_name: String,
    pub sets: usize,
    pub reps_range: String,
    /// Free text such as "RPE 8" or "70% 1RM".
    #[serde(default)]
    pub intensity_note: Option<String>,
    #[serde(default)]
    pub rest_time: Option<u32>,
}

/// A scheduled training day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProgramDay {
    pub week_number: u32,
    pub day_number: u32,
    pub name: String,
    pub exercises: Vec<ProgramExercise>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A multi-week training program and the user's position in it.
///
/// `current_week` and `current_day` are 1-based once started and 0 before.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkoutProgram {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: String,
    pub duration_weeks: u32,
    pub days_per_week: u32,
    pub goal: ProgramGoal,
    #[serde(default)]
    pub days: Vec<ProgramDay>,
    pub is_active: bool,
    #[serde(default)]
    pub start_date: Option<OffsetDateTime>,
    pub current_week: u32,
    pub current_day: u32,
    pub completed_workouts: u32,
    pub total_workouts: u32,
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub completed_at: Option<OffsetDateTime>,
}

impl WorkoutProgram {
    /// An inactive program without scheduled days.
    ///
    /// # Errors
    /// [`PlanError::EmptySchedule`] if `duration_weeks` or `days_per_week` is 0.
    pub fn new(
        user_id: &str,
        name: &str,
        description: &str,
        duration_weeks: u32,
        days_per_week: u32,
        goal: ProgramGoal,
        now: OffsetDateTime,
    ) -> Result<Self, PlanError> {
        if duration_weeks == 0 || days_per_week == 0 {
            return Err(PlanError::EmptySchedule);
        }
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            duration_weeks,
            days_per_week,
            goal,
            days: Vec::new(),
            is_active: false,
            start_date: None,
            current_week: 0,
            current_day: 0,
            completed_workouts: 0,
            total_workouts: duration_weeks.saturating_mul(days_per_week),
            created_at: now,
            completed_at: None,
        })
    }

    /// Activates the program at week 1, day 1.
    pub fn start(&mut self, now: OffsetDateTime) {
        self.is_active = true;
        self.start_date = Some(now);
        self.current_week = 1;
        self.current_day = 1;
        self.completed_at = None;
    }

    /// Counts a finished training day and moves to the next one. After the last
    /// day of the last week the program is completed and deactivated.
    ///
    /// # Returns
    /// `true` if this workout completed the program.
    pub fn record_workout(&mut self, now: OffsetDateTime) -> Result<bool, PlanError> {
        if !self.is_active {
            return Err(PlanError::ProgramNotActive(self.id.clone()));
        }
        self.completed_workouts = self.completed_workouts.saturating_add(1);
        self.current_day += 1;
        if self.current_day > self.days_per_week {
            self.current_day = 1;
            self.current_week += 1;
        }
        let complete = self.current_week > self.duration_weeks;
        if complete {
            self.is_active = false;
            self.completed_at = Some(now);
        }
        Ok(complete)
    }

    /// The scheduled day at the current position, if one was added.
    pub fn today(&self) -> Option<&ProgramDay> {
        self.days
            .iter()
            .find(|d| d.week_number == self.current_week && d.day_number == self.current_day)
    }

    /// Share of the program's workouts done, in percent.
    pub fn progress_percent(&self) -> f64 {
        if self.total_workouts == 0 {
            return 0.0;
        }
        (f64::from(self.completed_workouts) / f64::from(self.total_workouts) * 100.0).min(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::find_exercise;
    use time::macros::datetime;

    #[test]
    fn test_reps_range() {
        assert_eq!(reps_range(&[]), "0");
        assert_eq!(reps_range(&[SetEntry::default()]), "0");
        assert_eq!(
            reps_range(&[SetEntry::new(60.0, 10), SetEntry::new(70.0, 10)]),
            "10"
        );
        assert_eq!(
            reps_range(&[
                SetEntry::new(60.0, 12),
                SetEntry::new(70.0, 0),
                SetEntry::new(80.0, 8),
            ]),
            "8-12"
        );
    }

    #[test]
    fn test_template_from_exercises() {
        let mut bench = WorkoutExercise::new(find_exercise("1").unwrap());
        bench.sets = vec![SetEntry::new(80.0, 8), SetEntry::new(80.0, 6).pending()];
        bench.rest_time = Some(150);
        let now = datetime!(2024-04-01 09:00 UTC);

        let mut template =
            WorkoutTemplate::from_exercises("u", "Push", "", &[bench], vec!["upper".into()], now);
        assert_eq!(template.exercises[0].exercise_name, "Barbell Bench Press");
        assert_eq!(template.exercises[0].sets, 2);
        assert_eq!(template.exercises[0].reps_range, "6-8");
        assert_eq!(template.exercises[0].rest_time, Some(150));
        assert!(!template.is_public);
        assert_eq!(template.use_count, 0);

        let later = datetime!(2024-04-03 09:00 UTC);
        template.mark_used(later);
        template.mark_used(later);
        assert_eq!(template.use_count, 2);
        assert_eq!(template.last_used, Some(later));
    }

    #[test]
    fn test_program_needs_a_schedule() {
        let now = datetime!(2024-04-01 09:00 UTC);
        assert_eq!(
            WorkoutProgram::new("u", "5x5", "", 0, 3, ProgramGoal::Strength, now),
            Err(PlanError::EmptySchedule)
        );
        let program = WorkoutProgram::new("u", "5x5", "", 4, 3, ProgramGoal::Strength, now).unwrap();
        assert_eq!(program.total_workouts, 12);
        assert_eq!((program.current_week, program.current_day), (0, 0));
        assert!(!program.is_active);
    }

    #[test]
    fn test_program_rolls_over_weeks_and_completes() {
        let now = datetime!(2024-04-01 09:00 UTC);
        let mut program =
            WorkoutProgram::new("u", "Split", "", 2, 2, ProgramGoal::Muscle, now).unwrap();
        assert!(matches!(
            program.record_workout(now),
            Err(PlanError::ProgramNotActive(_))
        ));

        program.start(now);
        assert_eq!((program.current_week, program.current_day), (1, 1));

        assert!(!program.record_workout(now).unwrap());
        assert_eq!((program.current_week, program.current_day), (1, 2));
        assert!(!program.record_workout(now).unwrap());
        assert_eq!((program.current_week, program.current_day), (2, 1));
        assert!(!program.record_workout(now).unwrap());
        assert_eq!(program.progress_percent(), 75.0);

        let done = datetime!(2024-04-14 09:00 UTC);
        assert!(program.record_workout(done).unwrap());
        assert_eq!((program.current_week, program.current_day), (3, 1));
        assert!(!program.is_active);
        assert_eq!(program.completed_at, Some(done));
        assert_eq!(program.completed_workouts, 4);
        assert_eq!(program.progress_percent(), 100.0);
    }

    #[test]
    fn test_today() {
        let now = datetime!(2024-04-01 09:00 UTC);
        let mut program =
            WorkoutProgram::new("u", "Split", "", 1, 2, ProgramGoal::General, now).unwrap();
        program.days.push(ProgramDay {
            week_number: 1,
            day_number: 2,
            name: "Legs".into(),
            exercises: Vec::new(),
            notes: None,
        });
        program.start(now);
        assert!(program.today().is_none());
        program.record_workout(now).unwrap();
        assert_eq!(program.today().unwrap().name, "Legs");
    }
}

//! Progression Model
//!
//! This module defines the derived data of the progression tracker: statistics of a
//! single exercise session, the history rows persisted per session, and the personal
//! records kept per user and exercise.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use time::OffsetDateTime;
use uuid::Uuid;

use super::workout::{SetEntry, Workout};
use crate::{
    core::constants::RECENT_RECORDS_LIMIT,
    math::strength::{epley_one_rep_max, percent_change},
};

/// Statistics over the completed sets of one exercise session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionStats {
    /// Completed sets in input order.
    pub sets: Vec<SetEntry>,
    pub max_weight: f64,
    pub max_reps: u32,
    pub total_volume: f64,
    pub total_reps: u64,
    pub avg_reps: f64,
    /// Set with the highest weight x reps; the first one wins a tie.
    pub best_set: SetEntry,
    pub estimated_one_rep_max: f64,
    /// Volume of `best_set`.
    pub max_volume_set: f64,
}

impl SessionStats {
    /// Computes the statistics of the completed sets in `sets`.
    ///
    /// # Returns
    /// `None` if no set is completed.
    pub fn from_sets(sets: &[SetEntry]) -> Option<Self> {
        let completed: Vec<SetEntry> = sets.iter().filter(|s| s.completed).cloned().collect();

        // Strict comparison keeps the first of equal sets.
        let best_set = completed.iter().fold(None::<&SetEntry>, |best, set| match best {
            Some(b) if set.volume() <= b.volume() => Some(b),
            _ => Some(set),
        })?;

        let total_reps: u64 = completed.iter().map(|s| u64::from(s.reps())).sum();
        let stats = Self {
            max_weight: completed.iter().map(SetEntry::weight).fold(0.0, f64::max),
            max_reps: completed.iter().map(SetEntry::reps).max().unwrap_or(0),
            total_volume: completed.iter().map(SetEntry::volume).sum(),
            total_reps,
            avg_reps: total_reps as f64 / completed.len() as f64,
            estimated_one_rep_max: epley_one_rep_max(best_set.weight(), best_set.reps()),
            max_volume_set: best_set.volume(),
            best_set: best_set.clone(),
            sets: completed,
        };
        Some(stats)
    }

    /// First completed set with the most reps.
    pub fn max_reps_set(&self) -> Option<&SetEntry> {
        self.sets.iter().find(|s| s.reps() == self.max_reps)
    }
}

/// One persisted row per exercise per completed workout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExerciseHistory {
    pub id: Uuid,
    pub user_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    pub workout_id: String,
    pub date: OffsetDateTime,
    /// Completed sets only.
    pub sets: Vec<SetEntry>,
    pub max_weight: f64,
    pub total_volume: f64,
    pub total_reps: u64,
    pub avg_reps: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ExerciseHistory {
    /// Builds the history row of a session from its statistics.
    pub fn from_stats(
        user_id: &str,
        workout_id: &str,
        exercise_id: &str,
        exercise_name: &str,
        date: OffsetDateTime,
        stats: &SessionStats,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            exercise_id: exercise_id.to_string(),
            exercise_name: exercise_name.to_string(),
            workout_id: workout_id.to_string(),
            date,
            sets: stats.sets.clone(),
            max_weight: stats.max_weight,
            total_volume: stats.total_volume,
            total_reps: stats.total_reps,
            avg_reps: stats.avg_reps,
            notes: None,
        }
    }
}

/// Metric tracked by a personal record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    OneRepMax,
    MaxWeight,
    MaxReps,
    MaxVolumeSet,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::OneRepMax,
        RecordKind::MaxWeight,
        RecordKind::MaxReps,
        RecordKind::MaxVolumeSet,
    ];

    /// Value of this metric in a session.
    pub fn value_in(&self, stats: &SessionStats) -> f64 {
        match self {
            RecordKind::OneRepMax => stats.estimated_one_rep_max,
            RecordKind::MaxWeight => stats.max_weight,
            RecordKind::MaxReps => f64::from(stats.max_reps),
            RecordKind::MaxVolumeSet => stats.max_volume_set,
        }
    }

    /// The set backing this metric in a session, if the metric records one.
    pub fn detail_in(&self, stats: &SessionStats) -> Option<SetEntry> {
        match self {
            RecordKind::OneRepMax | RecordKind::MaxVolumeSet => Some(stats.best_set.clone()),
            RecordKind::MaxReps => stats.max_reps_set().cloned(),
            RecordKind::MaxWeight => None,
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RecordKind::OneRepMax => "estimated 1RM",
            RecordKind::MaxWeight => "max weight",
            RecordKind::MaxReps => "max reps",
            RecordKind::MaxVolumeSet => "best set volume",
        };
        f.write_str(label)
    }
}

/// A record value together with when and how it was achieved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordEntry {
    pub value: f64,
    pub date: OffsetDateTime,
    #[serde(default)]
    pub detail: Option<SetEntry>,
}

/// A single improved metric, produced by comparing a session with the stored record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub kind: RecordKind,
    pub value: f64,
    pub date: OffsetDateTime,
    pub detail: Option<SetEntry>,
}

/// Identity of a personal record document.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub user_id: String,
    pub exercise_id: String,
}

impl RecordKey {
    pub fn new(user_id: &str, exercise_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            exercise_id: exercise_id.to_string(),
        }
    }

    /// Document id used by the store.
    pub fn document_id(&self) -> String {
        format!("{}_{}", self.user_id, self.exercise_id)
    }
}

/// Best-ever values of a user for one exercise.
///
/// Every metric only grows: it is replaced only by a strictly greater value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonalRecord {
    pub user_id: String,
    pub exercise_id: String,
    pub exercise_name: String,
    #[serde(default)]
    pub one_rep_max: Option<RecordEntry>,
    #[serde(default)]
    pub max_weight: Option<RecordEntry>,
    #[serde(default)]
    pub max_reps: Option<RecordEntry>,
    #[serde(default)]
    pub max_volume_set: Option<RecordEntry>,
    pub last_updated: OffsetDateTime,
}

impl PersonalRecord {
    /// An empty record, every metric absent.
    pub fn new(key: &RecordKey, exercise_name: &str, date: OffsetDateTime) -> Self {
        Self {
            user_id: key.user_id.clone(),
            exercise_id: key.exercise_id.clone(),
            exercise_name: exercise_name.to_string(),
            one_rep_max: None,
            max_weight: None,
            max_reps: None,
            max_volume_set: None,
            last_updated: date,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.user_id, &self.exercise_id)
    }

    pub fn entry(&self, kind: RecordKind) -> Option<&RecordEntry> {
        match kind {
            RecordKind::OneRepMax => self.one_rep_max.as_ref(),
            RecordKind::MaxWeight => self.max_weight.as_ref(),
            RecordKind::MaxReps => self.max_reps.as_ref(),
            RecordKind::MaxVolumeSet => self.max_volume_set.as_ref(),
        }
    }

    fn entry_mut(&mut self, kind: RecordKind) -> &mut Option<RecordEntry> {
        match kind {
            RecordKind::OneRepMax => &mut self.one_rep_max,
            RecordKind::MaxWeight => &mut self.max_weight,
            RecordKind::MaxReps => &mut self.max_reps,
            RecordKind::MaxVolumeSet => &mut self.max_volume_set,
        }
    }

    /// Stored value of a metric, 0 when absent.
    pub fn value(&self, kind: RecordKind) -> f64 {
        self.entry(kind).map_or(0.0, |e| e.value)
    }

    /// Lists the metrics a session improves on.
    ///
    /// # Arguments
    /// - `record`: Stored record, `None` if the exercise has none yet.
    /// - `stats`: Statistics of the session.
    /// - `date`: Date of the session.
    pub fn candidate_updates(
        record: Option<&PersonalRecord>,
        stats: &SessionStats,
        date: OffsetDateTime,
    ) -> Vec<RecordUpdate> {
        RecordKind::ALL
            .iter()
            .filter_map(|kind| {
                let value = kind.value_in(stats);
                let current = record.map_or(0.0, |r| r.value(*kind));
                (value > current).then(|| RecordUpdate {
                    kind: *kind,
                    value,
                    date,
                    detail: kind.detail_in(stats),
                })
            })
            .collect()
    }

    /// Applies a list of updates. Updates that do not beat the stored value are skipped.
    ///
    /// # Returns
    /// `true` if any metric changed.
    pub fn apply(&mut self, updates: &[RecordUpdate]) -> bool {
        let mut changed = false;
        for update in updates {
            if update.value <= self.value(update.kind) {
                continue;
            }
            *self.entry_mut(update.kind) = Some(RecordEntry {
                value: update.value,
                date: update.date,
                detail: update.detail.clone(),
            });
            if update.date > self.last_updated {
                self.last_updated = update.date;
            }
            changed = true;
        }
        changed
    }
}

/// What logging one exercise session produced.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionOutcome {
    /// The stored history row, `None` if the session had no completed set.
    pub history: Option<ExerciseHistory>,
    /// Metrics the session improved on.
    pub updates: Vec<RecordUpdate>,
}

impl SessionOutcome {
    pub fn is_new_record(&self) -> bool {
        !self.updates.is_empty()
    }
}

/// A dated value of a chart series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: OffsetDateTime,
    pub value: f64,
}

/// Progress of one exercise over a time window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressionStats {
    pub exercise_id: String,
    pub period_days: u32,
    pub start_date: OffsetDateTime,
    pub end_date: OffsetDateTime,
    pub workout_count: usize,
    /// Change of session volume from the first to the last session, in percent.
    pub volume_increase: f64,
    /// Change of max weight from the first to the last session, in percent.
    pub strength_increase: f64,
    pub volume_trend: Vec<TrendPoint>,
    pub weight_trend: Vec<TrendPoint>,
    pub reps_trend: Vec<TrendPoint>,
}

impl ProgressionStats {
    /// `from_history` function.
    ///
    /// # Arguments
    /// - `exercise_id`: Exercise the history belongs to.
    /// - `history`: Rows inside the window, oldest first.
    /// - `period_days`: Length of the window.
    /// - `window`: Cutoff and end of the window, used when there is too little data.
    pub fn from_history(
        exercise_id: &str,
        history: &[ExerciseHistory],
        period_days: u32,
        window: (OffsetDateTime, OffsetDateTime),
    ) -> Self {
        let (first, last) = match (history.first(), history.last()) {
            (Some(first), Some(last)) if history.len() >= 2 => (first, last),
            _ => {
                return Self {
                    exercise_id: exercise_id.to_string(),
                    period_days,
                    start_date: window.0,
                    end_date: window.1,
                    workout_count: history.len(),
                    volume_increase: 0.0,
                    strength_increase: 0.0,
                    volume_trend: Vec::new(),
                    weight_trend: Vec::new(),
                    reps_trend: Vec::new(),
                }
            }
        };

        let trend = |value: fn(&ExerciseHistory) -> f64| -> Vec<TrendPoint> {
            history
                .iter()
                .map(|h| TrendPoint {
                    date: h.date,
                    value: value(h),
                })
                .collect()
        };

        Self {
            exercise_id: exercise_id.to_string(),
            period_days,
            start_date: first.date,
            end_date: last.date,
            workout_count: history.len(),
            volume_increase: percent_change(first.total_volume, last.total_volume),
            strength_increase: percent_change(first.max_weight, last.max_weight),
            volume_trend: trend(|h| h.total_volume),
            weight_trend: trend(|h| h.max_weight),
            reps_trend: trend(|h| h.avg_reps),
        }
    }
}

/// Training over all exercises in a time window.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverallProgress {
    pub period_days: u32,
    pub total_workouts: usize,
    /// Volume of the completed sets of every workout in the window.
    pub total_volume: f64,
    /// 0 without workouts.
    pub average_workout_volume: f64,
    /// Records improved inside the window, most recent first.
    pub recent_records: Vec<PersonalRecord>,
}

impl OverallProgress {
    /// `from_workouts` function.
    ///
    /// # Arguments
    /// - `period_days`: Length of the window.
    /// - `since`: Start of the window.
    /// - `workouts`: Workouts inside the window.
    /// - `records`: All personal records of the user.
    pub fn from_workouts(
        period_days: u32,
        since: OffsetDateTime,
        workouts: &[Workout],
        records: Vec<PersonalRecord>,
    ) -> Self {
        let total_volume: f64 = workouts.iter().map(Workout::total_volume).sum();
        let average_workout_volume = if workouts.is_empty() {
            0.0
        } else {
            total_volume / workouts.len() as f64
        };
        let mut recent_records: Vec<PersonalRecord> = records
            .into_iter()
            .filter(|r| r.last_updated >= since)
            .collect();
        recent_records.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        recent_records.truncate(RECENT_RECORDS_LIMIT);
        Self {
            period_days,
            total_workouts: workouts.len(),
            total_volume,
            average_workout_volume,
            recent_records,
        }
    }
}

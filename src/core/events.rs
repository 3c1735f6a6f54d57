//! Core Events
//!
//! This module defines the events broadcast between components on the application's
//! `tokio::sync::broadcast` bus. Front ends subscribe to render timers and announce
//! reminders and new personal records.

use crate::model::{progression::RecordUpdate, timer::TimerSnapshot};

/// Enumeration of all application-level events.
#[derive(Clone, Debug, PartialEq)]
pub enum AppEvent {
    /// A running timer advanced by one second.
    TimerTick(TimerSnapshot),

    /// A countdown reached zero. Sent once per run.
    TimerCompleted(TimerSnapshot),

    /// A scheduled reminder fired.
    Reminder { title: String, body: String },

    /// A logged session improved on the personal record of an exercise.
    ///
    /// # Fields
    /// - `exercise_name`: Display name of the exercise.
    /// - `updates`: The improved metrics.
    NewRecords {
        exercise_id: String,
        exercise_name: String,
        updates: Vec<RecordUpdate>,
    },
}

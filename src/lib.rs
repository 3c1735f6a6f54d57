//! Lift Tracking Core
//!
//! This crate contains the logic behind a workout tracker: a rest/workout timer
//! driven by an explicit state machine, a progression calculator that derives
//! session statistics and keeps personal records up to date, and workout
//! templates and training programs.

/// Traits describing models, controllers and external services.
pub mod api {
    /// Mutating APIs for timers and progression tracking.
    pub mod controller;
    /// Read only model APIs.
    pub mod model;
    /// External collaborators: persistence and reminder scheduling.
    pub mod service;
}

/// Core utilities used throughout the crate.
pub mod core {
    /// Environment driven configuration.
    pub mod config;
    /// Application-wide constants.
    pub mod constants;
    /// Domain error types.
    pub mod errors;
    /// Event system for inter-component communication.
    pub mod events;
    /// Formatting helpers for clocks, durations and volume.
    pub mod format;
}

/// Strength formulas.
pub mod math {
    /// Set volume and one-rep-max estimation.
    pub mod strength;
}

/// Data models representing the application's domain.
pub mod model {
    /// Static exercise catalog.
    pub mod catalog;
    /// Session statistics, history rows and personal records.
    pub mod progression;
    /// Workout templates and training programs.
    pub mod template;
    /// Timer and stopwatch state machine.
    pub mod timer;
    /// Sets, exercises and workouts.
    pub mod workout;
}

/// Components combining models with external services.
pub mod components {
    /// Progression tracking on top of a workout store.
    pub mod progression;
    /// Tokio based reminder scheduler.
    pub mod reminder;
    /// Remembered per-exercise rest times.
    pub mod settings;
    /// Document store for workouts, history, records and plans.
    pub mod store;
    /// Template and program management.
    pub mod template;
    /// Timer with reminder side effects and the ticking task.
    pub mod timer;
}

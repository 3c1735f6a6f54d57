//! Domain Errors
//!
//! Typed errors of the timer, of set input and of training plans. Components
//! return `anyhow::Result`, so these can be recovered with `downcast_ref` by
//! callers that need to tell a user error from an infrastructure failure.

use thiserror::Error;

use crate::model::timer::{TimerInput, TimerPhase};

/// Errors raised by the timer state machine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimerError {
    /// A countdown cannot start with nothing to count down.
    #[error("please set a time greater than 0")]
    ZeroDuration,
    /// The requested operation is not allowed in the current phase.
    #[error("cannot {input:?} a timer that is {phase:?}")]
    InvalidTransition { phase: TimerPhase, input: TimerInput },
    /// Adjustments only apply to a running or paused countdown.
    #[error("only a started countdown can be adjusted")]
    NotAdjustable,
    /// Mode and duration can only be changed before the timer is started.
    #[error("timer settings can only be changed before starting")]
    NotInSetup,
    /// The timer was closed and can no longer be used.
    #[error("timer has been closed")]
    Closed,
}


/// Rejected user input of a recorded set.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SetError {
    #[error("weight must be a finite number of at least 0, got {0}")]
    InvalidWeight(f64),
    #[error("distance must be a finite number of at least 0, got {0}")]
    InvalidDistance(f64),
    #[error("RPE must be a finite number, got {0}")]
    InvalidRpe(f32),
}

/// Errors raised while managing templates and programs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("template {0} not found")]
    TemplateNotFound(String),
    #[error("program {0} not found")]
    ProgramNotFound(String),
    /// Programs need at least one week and one training day per week.
    #[error("a program needs at least one week with one training day")]
    EmptySchedule,
    #[error("program {0} is not active")]
    ProgramNotActive(String),
}

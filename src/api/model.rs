//! This module defines the read only API for interacting with the models.
//! It provides interfaces for inspecting timers without mutating them.
use std::fmt::Debug;

use crate::model::timer::{TimerMode, TimerPhase};

/// `TimerModelApi` trait.
///
/// Read access to a countdown/stopwatch.
pub trait TimerModelApi: Debug + Send + Sync {
    /// Retrieves the counting direction.
    fn get_mode(&self) -> TimerMode;

    /// Retrieves the current lifecycle phase.
    fn phase(&self) -> TimerPhase;

    /// Seconds left on a countdown.
    fn get_remaining(&self) -> u32;

    /// Seconds counted by a stopwatch.
    fn get_elapsed(&self) -> u32;

    /// Configured countdown length in seconds.
    fn get_duration(&self) -> u32;

    /// `true` while the timer is running.
    fn is_active(&self) -> bool;
}

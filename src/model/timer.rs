//! Timer Model
//!
//! This module defines the countdown/stopwatch used for rest periods and timed sets.
//! The lifecycle is a `rust_fsm` state machine; the time value itself is advanced by
//! calling [`TimerModel::tick`] once per second from whatever drives the timer.

use log::{debug, trace};
use rust_fsm::{StateMachine, StateMachineImpl};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::api::model::TimerModelApi;
use crate::core::constants::{MAX_SETUP_MINUTES, MAX_SETUP_SECONDS};
use crate::core::errors::TimerError;

/// Counting direction of a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Counts down from a configured duration and finishes at zero.
    Timer,
    /// Counts up until it is reset or closed.
    Stopwatch,
}

/// Lifecycle phase of a timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    /// Configured but not started.
    Setup,
    Running,
    Paused,
    /// Countdown reached zero. Never reached in stopwatch mode.
    Finished,
    /// Torn down; no further operation is accepted.
    Closed,
}

/// Inputs consumed by the lifecycle state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerInput {
    Start,
    Pause,
    Resume,
    /// Remaining time reached zero.
    Expire,
    Reset,
    Close,
}

/// One-shot events emitted by the timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    /// The countdown finished. Emitted exactly once per run.
    Completed,
}

/// Transition table of the timer lifecycle.
pub struct TimerLifecycle;

impl StateMachineImpl for TimerLifecycle {
    type Input = TimerInput;
    type State = TimerPhase;
    type Output = TimerEvent;
    const INITIAL_STATE: Self::State = TimerPhase::Setup;

    fn transition(state: &Self::State, input: &Self::Input) -> Option<Self::State> {
        use TimerInput as I;
        use TimerPhase as P;
        match (state, input) {
            (P::Setup | P::Paused, I::Start) => Some(P::Running),
            (P::Running, I::Pause) => Some(P::Paused),
            (P::Paused, I::Resume) => Some(P::Running),
            (P::Running, I::Expire) => Some(P::Finished),
            (P::Closed, _) => None,
            (_, I::Reset) => Some(P::Setup),
            (_, I::Close) => Some(P::Closed),
            _ => None,
        }
    }

    fn output(state: &Self::State, input: &Self::Input) -> Option<Self::Output> {
        match (state, input) {
            (TimerPhase::Running, TimerInput::Expire) => Some(TimerEvent::Completed),
            _ => None,
        }
    }
}

/// Point-in-time view of a timer, suitable for rendering and broadcasting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub phase: TimerPhase,
    /// Seconds left on the countdown.
    pub remaining: u32,
    /// Seconds counted by the stopwatch.
    pub elapsed: u32,
    /// Configured countdown length in seconds.
    pub duration: u32,
    pub is_active: bool,
}

impl TimerSnapshot {
    /// The value a display shows: remaining time for a countdown, elapsed time otherwise.
    pub fn display_seconds(&self) -> u32 {
        match self.mode {
            TimerMode::Timer => self.remaining,
            TimerMode::Stopwatch => self.elapsed,
        }
    }
}

/// Result of a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    /// State after the tick.
    pub snapshot: TimerSnapshot,
    /// Completion signal, present only on the tick that finished the countdown.
    pub event: Option<TimerEvent>,
}

/// Countdown/stopwatch state machine.
pub struct TimerModel {
    mode: TimerMode,
    duration: u32,
    remaining: u32,
    elapsed: u32,
    machine: StateMachine<TimerLifecycle>,
}

impl Debug for TimerModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerModel")
            .field("mode", &self.mode)
            .field("phase", self.machine.state())
            .field("duration", &self.duration)
            .field("remaining", &self.remaining)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

impl TimerModel {
    /// Creates a timer in the `Setup` phase.
    ///
    /// # Arguments
    /// - `mode`: Counting direction.
    /// - `duration`: Countdown length in seconds, ignored by a stopwatch.
    pub fn new(mode: TimerMode, duration: u32) -> Self {
        let duration = match mode {
            TimerMode::Timer => duration,
            TimerMode::Stopwatch => 0,
        };
        Self {
            mode,
            duration,
            remaining: duration,
            elapsed: 0,
            machine: StateMachine::new(),
        }
    }

    /// Creates a countdown of `seconds`.
    pub fn countdown(seconds: u32) -> Self {
        Self::new(TimerMode::Timer, seconds)
    }

    /// Creates a stopwatch.
    pub fn stopwatch() -> Self {
        Self::new(TimerMode::Stopwatch, 0)
    }

    fn consume(&mut self, input: TimerInput) -> Result<Option<TimerEvent>, TimerError> {
        let phase = self.phase();
        if phase == TimerPhase::Closed {
            return Err(TimerError::Closed);
        }
        let output = self
            .machine
            .consume(&input)
            .map_err(|_| TimerError::InvalidTransition { phase, input })?;
        trace!("timer {:?} --{:?}--> {:?}", phase, input, self.phase());
        Ok(output)
    }

    fn ensure_setup(&self) -> Result<(), TimerError> {
        match self.phase() {
            TimerPhase::Setup => Ok(()),
            TimerPhase::Closed => Err(TimerError::Closed),
            _ => Err(TimerError::NotInSetup),
        }
    }

    /// Configures the countdown length from the setup fields.
    ///
    /// Minutes are clamped to `0..=99` and seconds to `0..=59`.
    ///
    /// # Returns
    /// The resulting duration in seconds.
    pub fn set_duration(&mut self, minutes: u32, seconds: u32) -> Result<u32, TimerError> {
        self.ensure_setup()?;
        if self.mode == TimerMode::Stopwatch {
            return Err(TimerError::NotAdjustable);
        }
        let total = minutes.min(MAX_SETUP_MINUTES) * 60 + seconds.min(MAX_SETUP_SECONDS);
        self.duration = total;
        self.remaining = total;
        Ok(total)
    }

    /// Switches between countdown and stopwatch before the timer is started.
    pub fn set_mode(&mut self, mode: TimerMode) -> Result<(), TimerError> {
        self.ensure_setup()?;
        self.mode = mode;
        self.remaining = self.duration;
        self.elapsed = 0;
        Ok(())
    }

    /// Starts (or continues) the timer.
    ///
    /// A countdown started from `Setup` loads the configured duration; a zero
    /// duration is rejected without changing any state.
    pub fn start(&mut self) -> Result<(), TimerError> {
        let from_setup = self.phase() == TimerPhase::Setup;
        if from_setup && self.mode == TimerMode::Timer && self.duration == 0 {
            return Err(TimerError::ZeroDuration);
        }
        self.consume(TimerInput::Start)?;
        if from_setup {
            self.remaining = self.duration;
        }
        debug!("timer started: {:?}", self);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), TimerError> {
        self.consume(TimerInput::Pause).map(|_| ())
    }

    pub fn resume(&mut self) -> Result<(), TimerError> {
        self.consume(TimerInput::Resume).map(|_| ())
    }

    /// Shifts the remaining time of a started countdown by `delta` seconds.
    ///
    /// The result never drops below zero. The phase is left untouched; a running
    /// countdown adjusted to zero finishes on its next tick.
    ///
    /// # Returns
    /// The new remaining time.
    pub fn adjust(&mut self, delta: i64) -> Result<u32, TimerError> {
        match self.phase() {
            TimerPhase::Closed => return Err(TimerError::Closed),
            TimerPhase::Running | TimerPhase::Paused if self.mode == TimerMode::Timer => {}
            _ => return Err(TimerError::NotAdjustable),
        }
        let adjusted = (i64::from(self.remaining) + delta).clamp(0, i64::from(u32::MAX));
        self.remaining = u32::try_from(adjusted).unwrap_or(u32::MAX);
        Ok(self.remaining)
    }

    /// Returns to `Setup` with the configured duration and a zeroed stopwatch.
    pub fn reset(&mut self) -> Result<(), TimerError> {
        self.consume(TimerInput::Reset)?;
        self.remaining = self.duration;
        self.elapsed = 0;
        Ok(())
    }

    /// Tears the timer down.
    pub fn close(&mut self) -> Result<(), TimerError> {
        self.consume(TimerInput::Close).map(|_| ())
    }

    /// Advances the timer by one second.
    ///
    /// Only a running timer changes. A countdown that reaches zero moves to
    /// `Finished` and reports [`TimerEvent::Completed`]; later ticks are no-ops.
    pub fn tick(&mut self) -> TickOutcome {
        let mut event = None;
        if self.phase() == TimerPhase::Running {
            match self.mode {
                TimerMode::Timer => {
                    self.remaining = self.remaining.saturating_sub(1);
                    if self.remaining == 0 {
                        // Running --Expire--> Finished is always valid here.
                        event = self.consume(TimerInput::Expire).ok().flatten();
                    }
                }
                TimerMode::Stopwatch => {
                    self.elapsed = self.elapsed.saturating_add(1);
                }
            }
        }
        TickOutcome {
            snapshot: self.snapshot(),
            event,
        }
    }

    /// Captures the current state.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            phase: self.phase(),
            remaining: self.remaining,
            elapsed: self.elapsed,
            duration: self.duration,
            is_active: self.is_active(),
        }
    }
}

impl Default for TimerModel {
    fn default() -> Self {
        Self::countdown(crate::core::constants::DEFAULT_COUNTDOWN_SECONDS)
    }
}

impl TimerModelApi for TimerModel {
    fn get_mode(&self) -> TimerMode {
        self.mode
    }

    fn phase(&self) -> TimerPhase {
        *self.machine.state()
    }

    fn get_remaining(&self) -> u32 {
        self.remaining
    }

    fn get_elapsed(&self) -> u32 {
        self.elapsed
    }

    fn get_duration(&self) -> u32 {
        self.duration
    }

    fn is_active(&self) -> bool {
        self.phase() == TimerPhase::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(timer: &mut TimerModel, ticks: u32) -> usize {
        (0..ticks)
            .filter_map(|_| timer.tick().event)
            .filter(|e| *e == TimerEvent::Completed)
            .count()
    }

    #[test]
    fn test_new_countdown_is_in_setup() {
        let timer = TimerModel::countdown(90);
        assert_eq!(timer.phase(), TimerPhase::Setup);
        assert_eq!(timer.get_remaining(), 90);
        assert!(!timer.is_active());
    }

    #[test]
    fn test_countdown_finishes_after_duration_ticks() {
        for duration in [1, 2, 5, 60, 181] {
            let mut timer = TimerModel::countdown(duration);
            timer.start().unwrap();
            let completions = run_to_end(&mut timer, duration);
            assert_eq!(completions, 1);
            assert_eq!(timer.phase(), TimerPhase::Finished);
            assert_eq!(timer.get_remaining(), 0);
        }
    }

    #[test]
    fn test_completion_fires_only_once() {
        let mut timer = TimerModel::countdown(3);
        timer.start().unwrap();
        let completions = run_to_end(&mut timer, 10);
        assert_eq!(completions, 1);
        assert_eq!(timer.get_remaining(), 0);
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        let mut timer = TimerModel::countdown(0);
        assert_eq!(timer.start(), Err(TimerError::ZeroDuration));
        assert_eq!(timer.phase(), TimerPhase::Setup);
    }

    #[test]
    fn test_adjust_never_goes_negative() {
        let mut timer = TimerModel::countdown(30);
        timer.start().unwrap();
        for delta in [-15, -15, -15, 15, -100, 5, -6] {
            timer.adjust(delta).unwrap();
            assert!(timer.get_remaining() <= 30);
        }
        assert_eq!(timer.get_remaining(), 0);
        assert_eq!(timer.phase(), TimerPhase::Running);
    }

    #[test]
    fn test_adjust_to_zero_finishes_on_next_tick() {
        let mut timer = TimerModel::countdown(30);
        timer.start().unwrap();
        timer.adjust(-45).unwrap();
        let outcome = timer.tick();
        assert_eq!(outcome.event, Some(TimerEvent::Completed));
        assert_eq!(outcome.snapshot.phase, TimerPhase::Finished);
    }

    #[test]
    fn test_adjust_requires_started_countdown() {
        let mut timer = TimerModel::countdown(30);
        assert_eq!(timer.adjust(15), Err(TimerError::NotAdjustable));

        let mut stopwatch = TimerModel::stopwatch();
        stopwatch.start().unwrap();
        assert_eq!(stopwatch.adjust(15), Err(TimerError::NotAdjustable));
    }

    #[test]
    fn test_pause_resume_keeps_remaining() {
        let mut timer = TimerModel::countdown(45);
        timer.start().unwrap();
        timer.tick();
        for _ in 0..25 {
            timer.pause().unwrap();
            assert_eq!(timer.phase(), TimerPhase::Paused);
            timer.resume().unwrap();
        }
        assert_eq!(timer.get_remaining(), 44);
    }

    #[test]
    fn test_paused_timer_ignores_ticks() {
        let mut timer = TimerModel::countdown(10);
        timer.start().unwrap();
        timer.pause().unwrap();
        let outcome = timer.tick();
        assert_eq!(outcome.snapshot.remaining, 10);
        assert!(outcome.event.is_none());
        timer.start().unwrap();
        assert!(timer.is_active());
        assert_eq!(timer.get_remaining(), 10);
    }

    #[test]
    fn test_stopwatch_counts_up_without_finishing() {
        let mut stopwatch = TimerModel::stopwatch();
        stopwatch.start().unwrap();
        let completions = run_to_end(&mut stopwatch, 500);
        assert_eq!(completions, 0);
        assert_eq!(stopwatch.get_elapsed(), 500);
        assert_eq!(stopwatch.phase(), TimerPhase::Running);
        assert_eq!(stopwatch.snapshot().display_seconds(), 500);
    }

    #[test]
    fn test_reset_restores_setup() {
        let mut timer = TimerModel::countdown(20);
        timer.start().unwrap();
        run_to_end(&mut timer, 20);
        timer.reset().unwrap();
        assert_eq!(timer.phase(), TimerPhase::Setup);
        assert_eq!(timer.get_remaining(), 20);

        let mut stopwatch = TimerModel::stopwatch();
        stopwatch.start().unwrap();
        stopwatch.tick();
        stopwatch.reset().unwrap();
        assert_eq!(stopwatch.get_elapsed(), 0);
    }

    #[test]
    fn test_closed_timer_rejects_operations() {
        let mut timer = TimerModel::countdown(20);
        timer.start().unwrap();
        timer.close().unwrap();
        assert_eq!(timer.phase(), TimerPhase::Closed);
        assert_eq!(timer.start(), Err(TimerError::Closed));
        assert_eq!(timer.reset(), Err(TimerError::Closed));
        assert_eq!(timer.close(), Err(TimerError::Closed));
        assert!(timer.tick().event.is_none());
    }

    #[test]
    fn test_invalid_transition() {
        let mut timer = TimerModel::countdown(20);
        assert_eq!(
            timer.pause(),
            Err(TimerError::InvalidTransition {
                phase: TimerPhase::Setup,
                input: TimerInput::Pause
            })
        );
    }

    #[test]
    fn test_set_duration_clamps_fields() {
        let mut timer = TimerModel::default();
        assert_eq!(timer.set_duration(150, 75), Ok(99 * 60 + 59));
        assert_eq!(timer.set_duration(1, 30), Ok(90));
        timer.start().unwrap();
        assert_eq!(timer.set_duration(2, 0), Err(TimerError::NotInSetup));
    }

    #[test]
    fn test_set_mode_only_in_setup() {
        let mut timer = TimerModel::default();
        timer.set_mode(TimerMode::Stopwatch).unwrap();
        timer.start().unwrap();
        timer.tick();
        assert_eq!(timer.get_elapsed(), 1);
        assert_eq!(timer.set_mode(TimerMode::Timer), Err(TimerError::NotInSetup));
    }
}

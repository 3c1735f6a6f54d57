//! Timer Component
//!
//! This module couples the timer state machine with the reminder service. The
//! component keeps at most one pending reminder per timer and moves it along with
//! the lifecycle; [`spawn_ticker`] drives the one-second tick on the tokio runtime.

use std::{fmt::Debug, sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, trace, warn};
use tokio::{
    sync::{broadcast::Sender, RwLock},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    api::{
        controller::TimerApi,
        model::TimerModelApi,
        service::{Reminder, ReminderHandle, ReminderScheduler},
    },
    core::{
        constants::{REMINDER_TITLE, TICK_PERIOD, TIMER_REMINDER_TITLE},
        events::AppEvent,
        format::format_countdown,
    },
    model::timer::{TickOutcome, TimerEvent, TimerMode, TimerModel, TimerPhase, TimerSnapshot},
};

/// What the reminder of a timer says.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReminderLabel {
    /// Rest between two sets of an exercise.
    Rest { exercise_name: String },
    /// A free standing countdown.
    Timer,
}

impl ReminderLabel {
    fn reminder(&self, duration: u32, after: u32) -> Reminder {
        let (title, body) = match self {
            ReminderLabel::Rest { exercise_name } => (
                REMINDER_TITLE,
                format!("Time for your next set of {}", exercise_name),
            ),
            ReminderLabel::Timer => (
                TIMER_REMINDER_TITLE,
                format!("Your {} timer has finished.", format_countdown(duration)),
            ),
        };
        Reminder {
            title: title.to_string(),
            body,
            after: Duration::from_secs(u64::from(after)),
        }
    }
}

/// A timer with a best-effort reminder at the end of the countdown.
///
/// # Type Parameters
/// * `R` - The reminder service.
pub struct TimerComponent<R: ReminderScheduler + ?Sized> {
    model: TimerModel,
    scheduler: Arc<R>,
    reminder: Option<ReminderHandle>,
    label: ReminderLabel,
}

impl<R: ReminderScheduler + ?Sized> Debug for TimerComponent<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerComponent")
            .field("model", &self.model)
            .field("reminder", &self.reminder)
            .field("label", &self.label)
            .finish()
    }
}

impl<R: ReminderScheduler + ?Sized> TimerComponent<R> {
    /// Creates a new `TimerComponent`.
    ///
    /// # Arguments
    /// - `model`: The timer to drive, usually still in setup.
    /// - `scheduler`: Service delivering the completion reminder.
    pub fn new(model: TimerModel, scheduler: Arc<R>) -> Self {
        Self {
            model,
            scheduler,
            reminder: None,
            label: ReminderLabel::Timer,
        }
    }

    /// A countdown resting between sets of `exercise_name`.
    pub fn rest(seconds: u32, exercise_name: &str, scheduler: Arc<R>) -> Self {
        Self::new(TimerModel::countdown(seconds), scheduler).with_label(ReminderLabel::Rest {
            exercise_name: exercise_name.to_string(),
        })
    }

    pub fn with_label(mut self, label: ReminderLabel) -> Self {
        self.label = label;
        self
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.model.snapshot()
    }

    /// Handle of the reminder currently scheduled, if any.
    pub fn pending_reminder(&self) -> Option<&ReminderHandle> {
        self.reminder.as_ref()
    }

    /// Configures the countdown length, see [`TimerModel::set_duration`].
    pub fn set_duration(&mut self, minutes: u32, seconds: u32) -> Result<u32> {
        Ok(self.model.set_duration(minutes, seconds)?)
    }

    pub fn set_mode(&mut self, mode: TimerMode) -> Result<()> {
        Ok(self.model.set_mode(mode)?)
    }

    /// Replaces any pending reminder with one firing when the countdown runs out.
    async fn schedule_reminder(&mut self) {
        self.cancel_reminder().await;
        let remaining = self.model.get_remaining();
        if self.model.get_mode() != TimerMode::Timer || remaining == 0 {
            return;
        }
        let reminder = self.label.reminder(self.model.get_duration(), remaining);
        match self.scheduler.schedule(reminder).await {
            Ok(handle) => {
                debug!("Reminder {:?} scheduled in {}s.", handle, remaining);
                self.reminder = Some(handle);
            }
            Err(e) => warn!("Failed to schedule reminder: {:?}", e),
        }
    }

    async fn cancel_reminder(&mut self) {
        if let Some(handle) = self.reminder.take() {
            debug!("Cancelling reminder {:?}.", handle);
            if let Err(e) = self.scheduler.cancel(handle).await {
                warn!("Failed to cancel reminder: {:?}", e);
            }
        }
    }
}

#[async_trait]
impl<R: ReminderScheduler + ?Sized> TimerApi for TimerComponent<R> {
    async fn start(&mut self) -> Result<()> {
        self.model.start()?;
        self.schedule_reminder().await;
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.model.pause()?;
        self.cancel_reminder().await;
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.model.resume()?;
        self.schedule_reminder().await;
        Ok(())
    }

    async fn adjust(&mut self, delta: i64) -> Result<u32> {
        let remaining = self.model.adjust(delta)?;
        if self.model.phase() == TimerPhase::Running {
            self.schedule_reminder().await;
        }
        Ok(remaining)
    }

    async fn reset(&mut self) -> Result<()> {
        self.model.reset()?;
        self.cancel_reminder().await;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.model.close()?;
        self.cancel_reminder().await;
        Ok(())
    }

    fn tick(&mut self) -> TickOutcome {
        let outcome = self.model.tick();
        if outcome.event == Some(TimerEvent::Completed) {
            // The reminder delivers itself.
            self.reminder = None;
            info!("Timer of {}s completed.", outcome.snapshot.duration);
        }
        outcome
    }
}

impl<R: ReminderScheduler + ?Sized> TimerModelApi for TimerComponent<R> {
    fn get_mode(&self) -> TimerMode {
        self.model.get_mode()
    }

    fn phase(&self) -> TimerPhase {
        self.model.phase()
    }

    fn get_remaining(&self) -> u32 {
        self.model.get_remaining()
    }

    fn get_elapsed(&self) -> u32 {
        self.model.get_elapsed()
    }

    fn get_duration(&self) -> u32 {
        self.model.get_duration()
    }

    fn is_active(&self) -> bool {
        self.model.is_active()
    }
}

/// Spawns the task that ticks `timer` once per second.
///
/// Every tick of a running timer is broadcast as [`AppEvent::TimerTick`], the
/// completion as [`AppEvent::TimerCompleted`]. The task ends once the timer is
/// finished or closed; a paused timer keeps the task waiting.
///
/// # Arguments
/// - `timer`: The shared timer.
/// - `event_bus`: The event bus for broadcasting application events.
///
/// # Returns
/// The handle of the spawned task. Aborting it stops the ticking.
pub fn spawn_ticker<T: TimerApi + 'static>(
    timer: Arc<RwLock<T>>,
    event_bus: Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let outcome = timer.write().await.tick();
            let snapshot = outcome.snapshot;
            trace!("tick: {:?}", snapshot);
            if outcome.event == Some(TimerEvent::Completed) {
                let _ = event_bus.send(AppEvent::TimerCompleted(snapshot));
                break;
            }
            match snapshot.phase {
                TimerPhase::Running => {
                    let _ = event_bus.send(AppEvent::TimerTick(snapshot));
                }
                TimerPhase::Setup | TimerPhase::Paused => {}
                TimerPhase::Finished | TimerPhase::Closed => break,
            }
        }
        trace!("Ticker stopped.");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::service::MockReminderScheduler;
    use crate::core::errors::TimerError;
    use anyhow::anyhow;

    fn handle_after(reminder: Reminder) -> Result<ReminderHandle> {
        Ok(ReminderHandle(reminder.after.as_secs().to_string()))
    }

    fn component(
        model: TimerModel,
        scheduler: MockReminderScheduler,
    ) -> TimerComponent<MockReminderScheduler> {
        TimerComponent::new(model, Arc::new(scheduler))
    }

    #[tokio::test]
    async fn test_start_schedules_reminder() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler
            .expect_schedule()
            .withf(|r| r.after == Duration::from_secs(90) && r.title == REMINDER_TITLE)
            .times(1)
            .returning(handle_after);
        let mut timer = TimerComponent::rest(90, "Deadlift", Arc::new(scheduler));

        timer.start().await.unwrap();
        assert_eq!(timer.phase(), TimerPhase::Running);
        assert_eq!(timer.pending_reminder(), Some(&ReminderHandle("90".into())));
    }

    #[tokio::test]
    async fn test_failed_schedule_still_runs() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler
            .expect_schedule()
            .times(1)
            .returning(|_| Err(anyhow!("notifications denied")));
        let mut timer = component(TimerModel::countdown(2), scheduler);

        timer.start().await.unwrap();
        assert_eq!(timer.phase(), TimerPhase::Running);
        assert!(timer.pending_reminder().is_none());
        timer.tick();
        assert_eq!(timer.tick().event, Some(TimerEvent::Completed));
    }

    #[tokio::test]
    async fn test_zero_duration_schedules_nothing() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().never();
        let mut timer = component(TimerModel::countdown(0), scheduler);

        let err = timer.start().await.unwrap_err();
        assert_eq!(err.downcast_ref::<TimerError>(), Some(&TimerError::ZeroDuration));
        assert_eq!(timer.phase(), TimerPhase::Setup);
    }

    #[tokio::test]
    async fn test_pause_cancels_and_resume_reschedules() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().times(2).returning(handle_after);
        scheduler
            .expect_cancel()
            .withf(|h| h.0 == "60")
            .times(1)
            .returning(|_| Ok(()));
        let mut timer = component(TimerModel::countdown(60), scheduler);

        timer.start().await.unwrap();
        for _ in 0..15 {
            timer.tick();
        }
        timer.pause().await.unwrap();
        assert!(timer.pending_reminder().is_none());
        timer.resume().await.unwrap();
        assert_eq!(timer.pending_reminder(), Some(&ReminderHandle("45".into())));
    }

    #[tokio::test]
    async fn test_adjust_reschedules_while_running() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().times(2).returning(handle_after);
        scheduler
            .expect_cancel()
            .withf(|h| h.0 == "90")
            .times(1)
            .returning(|_| Ok(()));
        let mut timer = component(TimerModel::countdown(90), scheduler);

        timer.start().await.unwrap();
        assert_eq!(timer.adjust(15).await.unwrap(), 105);
        assert_eq!(timer.pending_reminder(), Some(&ReminderHandle("105".into())));
    }

    #[tokio::test]
    async fn test_adjust_while_paused_waits_for_resume() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().times(2).returning(handle_after);
        scheduler.expect_cancel().times(1).returning(|_| Ok(()));
        let mut timer = component(TimerModel::countdown(90), scheduler);

        timer.start().await.unwrap();
        timer.pause().await.unwrap();
        timer.adjust(-15).await.unwrap();
        assert!(timer.pending_reminder().is_none());
        timer.resume().await.unwrap();
        assert_eq!(timer.pending_reminder(), Some(&ReminderHandle("75".into())));
    }

    #[tokio::test]
    async fn test_reset_and_close_cancel_reminder() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().times(2).returning(handle_after);
        scheduler
            .expect_cancel()
            .times(2)
            .returning(|_| Err(anyhow!("already delivered")));
        let mut timer = component(TimerModel::countdown(30), scheduler);

        timer.start().await.unwrap();
        timer.reset().await.unwrap();
        assert!(timer.pending_reminder().is_none());
        assert_eq!(timer.get_remaining(), 30);

        timer.start().await.unwrap();
        timer.close().await.unwrap();
        assert!(timer.pending_reminder().is_none());
        assert!(timer.start().await.is_err());
    }

    #[tokio::test]
    async fn test_completion_drops_handle_without_cancel() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().times(1).returning(handle_after);
        scheduler.expect_cancel().never();
        let mut timer = component(TimerModel::countdown(2), scheduler);

        timer.start().await.unwrap();
        assert!(timer.tick().event.is_none());
        assert_eq!(timer.tick().event, Some(TimerEvent::Completed));
        assert!(timer.pending_reminder().is_none());
        assert_eq!(timer.phase(), TimerPhase::Finished);
    }

    #[tokio::test]
    async fn test_stopwatch_never_schedules() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().never();
        scheduler.expect_cancel().never();
        let mut timer = component(TimerModel::stopwatch(), scheduler);

        timer.start().await.unwrap();
        timer.pause().await.unwrap();
        timer.resume().await.unwrap();
        assert!(timer.adjust(10).await.is_err());
        timer.tick();
        assert_eq!(timer.get_elapsed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_runs_countdown_to_completion() {
        let mut scheduler = MockReminderScheduler::new();
        scheduler.expect_schedule().returning(handle_after);
        let timer = Arc::new(RwLock::new(component(TimerModel::countdown(3), scheduler)));
        timer.write().await.start().await.unwrap();

        let (tx, mut rx) = tokio::sync::broadcast::channel(16);
        spawn_ticker(timer.clone(), tx).await.unwrap();

        let mut remaining = Vec::new();
        let mut completions = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::TimerTick(s) => remaining.push(s.remaining),
                AppEvent::TimerCompleted(s) => {
                    assert_eq!(s.remaining, 0);
                    completions += 1;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(remaining, vec![2, 1]);
        assert_eq!(completions, 1);
        assert_eq!(timer.read().await.phase(), TimerPhase::Finished);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_stops_when_closed() {
        let scheduler = MockReminderScheduler::new();
        let timer = Arc::new(RwLock::new(component(TimerModel::stopwatch(), scheduler)));
        timer.write().await.start().await.unwrap();

        let (tx, _rx) = tokio::sync::broadcast::channel(16);
        let handle = spawn_ticker(timer.clone(), tx);
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(timer.read().await.get_elapsed(), 3);

        timer.write().await.close().await.unwrap();
        handle.await.unwrap();
        assert_eq!(timer.read().await.get_elapsed(), 3);
    }
}

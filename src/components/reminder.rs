//! Reminder Component
//!
//! An in-process [`ReminderScheduler`]: every reminder is a sleeping tokio task that
//! logs the notification and broadcasts it on the event bus when it wakes up.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use tokio::{
    sync::{broadcast::Sender, Mutex},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    api::service::{Reminder, ReminderHandle, ReminderScheduler},
    core::events::AppEvent,
};

/// Schedules reminders as tasks on the current tokio runtime.
#[derive(Debug)]
pub struct TokioReminderScheduler {
    event_bus: Sender<AppEvent>,
    pending: Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>,
}

impl TokioReminderScheduler {
    /// Creates a new `TokioReminderScheduler`.
    ///
    /// # Arguments
    /// - `event_bus`: Fired reminders are sent here as [`AppEvent::Reminder`].
    pub fn new(event_bus: Sender<AppEvent>) -> Self {
        Self {
            event_bus,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of reminders that have neither fired nor been cancelled.
    pub async fn pending_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

impl Drop for TokioReminderScheduler {
    fn drop(&mut self) {
        if let Ok(mut pending) = self.pending.try_lock() {
            for (_, handle) in pending.drain() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl ReminderScheduler for TokioReminderScheduler {
    async fn schedule(&self, reminder: Reminder) -> Result<ReminderHandle> {
        let id = Uuid::new_v4();
        let tx = self.event_bus.clone();
        let pending = self.pending.clone();

        // Held until the handle is registered so the task cannot finish first.
        let mut guard = self.pending.lock().await;
        let task = tokio::spawn(async move {
            tokio::time::sleep(reminder.after).await;
            pending.lock().await.remove(&id);
            info!("{} {}", reminder.title, reminder.body);
            let _ = tx.send(AppEvent::Reminder {
                title: reminder.title,
                body: reminder.body,
            });
        });
        guard.insert(id, task);
        Ok(ReminderHandle(id.to_string()))
    }

    async fn cancel(&self, handle: ReminderHandle) -> Result<()> {
        let id = Uuid::parse_str(&handle.0)
            .with_context(|| format!("invalid reminder handle {:?}", handle.0))?;
        match self.pending.lock().await.remove(&id) {
            Some(task) => task.abort(),
            None => debug!("Reminder {} already delivered.", id),
        }
        Ok(())
    }
}

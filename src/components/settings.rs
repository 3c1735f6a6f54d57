//! Settings Component
//!
//! Remembers the rest time a user adjusted to for each exercise. Lookups never
//! fail: a store error is logged and the catalog recommendation is used.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, error, warn};
use time::OffsetDateTime;

use crate::{
    api::{controller::SettingsApi, service::WorkoutStore},
    model::{catalog::Exercise, workout::RestSetting},
};

pub struct SettingsComponent<S: WorkoutStore + ?Sized> {
    store: Arc<S>,
    user_id: String,
}

impl<S: WorkoutStore + ?Sized> SettingsComponent<S> {
    pub fn new(store: Arc<S>, user_id: &str) -> Self {
        Self {
            store,
            user_id: user_id.to_string(),
        }
    }
}

#[async_trait]
impl<S: WorkoutStore + ?Sized> SettingsApi for SettingsComponent<S> {
    async fn rest_seconds(&self, exercise: &Exercise) -> u32 {
        match self
            .store
            .get_rest_setting(self.user_id.clone(), exercise.id.clone())
            .await
        {
            Ok(Some(setting)) if setting.rest_seconds > 0 => setting.rest_seconds,
            Ok(_) => exercise.default_rest_seconds(),
            Err(e) => {
                warn!("Failed to load rest time of {}: {:?}", exercise.name, e);
                exercise.default_rest_seconds()
            }
        }
    }

    async fn remember_rest(&self, exercise_id: &str, seconds: u32) -> Result<()> {
        if seconds == 0 {
            return Ok(());
        }
        let setting = RestSetting {
            user_id: self.user_id.clone(),
            exercise_id: exercise_id.to_string(),
            rest_seconds: seconds,
            last_used: OffsetDateTime::now_utc(),
        };
        self.store
            .put_rest_setting(setting)
            .await
            .inspect_err(|e| error!("Failed to save rest time of {}: {:?}", exercise_id, e))
            .with_context(|| format!("saving rest time of {}", exercise_id))?;
        debug!("Remembered {}s rest for {}.", seconds, exercise_id);
        Ok(())
    }
}

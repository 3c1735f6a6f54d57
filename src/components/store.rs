//! Document Store
//!
//! A [`WorkoutStore`] keeping workouts, exercise history, personal records,
//! templates, programs and rest times in memory, optionally mirrored to a JSON
//! file. Every change is written to a temporary file
//! which then replaces the previous one, so the file always holds a complete
//! snapshot. The in-memory state only changes once the file was written.

use std::{collections::BTreeMap, io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::RwLock};

use crate::{
    api::service::{HistoryQuery, SortOrder, WorkoutQuery, WorkoutStore},
    model::{
        progression::{ExerciseHistory, PersonalRecord, RecordKey},
        template::{WorkoutProgram, WorkoutTemplate},
        workout::{RestSetting, Workout},
    },
};

/// Everything the store holds, as written to disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub history: Vec<ExerciseHistory>,
    /// Personal records by document id.
    #[serde(default)]
    pub records: BTreeMap<String, PersonalRecord>,
    /// Workouts by id.
    #[serde(default)]
    pub workouts: BTreeMap<String, Workout>,
    #[serde(default)]
    pub templates: BTreeMap<String, WorkoutTemplate>,
    #[serde(default)]
    pub programs: BTreeMap<String, WorkoutProgram>,
    /// Remembered rest times by document id.
    #[serde(default)]
    pub rest_settings: BTreeMap<String, RestSetting>,
}

#[derive(Debug)]
pub struct DocumentStore {
    data: RwLock<StoreSnapshot>,
    path: Option<PathBuf>,
}

impl DocumentStore {
    /// A store that lives as long as the process.
    pub fn in_memory() -> Self {
        Self {
            data: RwLock::new(StoreSnapshot::default()),
            path: None,
        }
    }

    /// Opens a file backed store. A missing file is an empty store.
    ///
    /// # Arguments
    /// - `path`: The JSON file holding the store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match fs::read_to_string(&path).await {
            Ok(json) => tokio::task::spawn_blocking(move || {
                serde_json::from_str::<StoreSnapshot>(json.as_str())
            })
            .await?
            .with_context(|| format!("corrupt store file {}", path.display()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No store at {}, starting empty.", path.display());
                StoreSnapshot::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };
        debug!(
            "Opened store {} with {} history rows and {} records.",
            path.display(),
            data.history.len(),
            data.records.len()
        );
        Ok(Self {
            data: RwLock::new(data),
            path: Some(path),
        })
    }

    /// Copy of the current contents.
    pub async fn snapshot(&self) -> StoreSnapshot {
        self.data.read().await.clone()
    }

    async fn persist(&self, data: &StoreSnapshot) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot = data.clone();
        let json =
            tokio::task::spawn_blocking(move || serde_json::to_string_pretty(&snapshot)).await??;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)
            .await
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .await
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Applies `change` to a copy of the data and swaps it in once persisted.
    async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreSnapshot) + Send,
    {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        change(&mut next);
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }
}

#[async_trait]
impl WorkoutStore for DocumentStore {
    async fn append_history(&self, history: ExerciseHistory) -> Result<()> {
        self.update(|data| data.history.push(history)).await
    }

    async fn query_history(&self, query: HistoryQuery) -> Result<Vec<ExerciseHistory>> {
        let data = self.data.read().await;
        let mut rows: Vec<ExerciseHistory> = data
            .history
            .iter()
            .filter(|row| query.matches(row))
            .cloned()
            .collect();
        match query.order {
            SortOrder::NewestFirst => rows.sort_by(|a, b| b.date.cmp(&a.date)),
            SortOrder::OldestFirst => rows.sort_by(|a, b| a.date.cmp(&b.date)),
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn get_record(&self, key: RecordKey) -> Result<Option<PersonalRecord>> {
        Ok(self.data.read().await.records.get(&key.document_id()).cloned())
    }

    async fn put_record(&self, record: PersonalRecord) -> Result<()> {
        self.update(|data| {
            data.records.insert(record.key().document_id(), record);
        })
        .await
    }

    async fn list_records(&self, user_id: String) -> Result<Vec<PersonalRecord>> {
        Ok(self
            .data
            .read()
            .await
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_workout(&self, workout: Workout) -> Result<()> {
        self.update(|data| {
            data.workouts.insert(workout.id.clone(), workout);
        })
        .await
    }

    async fn get_workout(&self, workout_id: String) -> Result<Option<Workout>> {
        Ok(self.data.read().await.workouts.get(&workout_id).cloned())
    }

    async fn query_workouts(&self, query: WorkoutQuery) -> Result<Vec<Workout>> {
        let data = self.data.read().await;
        let mut workouts: Vec<Workout> = data
            .workouts
            .values()
            .filter(|w| query.matches(w))
            .cloned()
            .collect();
        workouts.sort_by(|a, b| b.date.cmp(&a.date));
        if let Some(limit) = query.limit {
            workouts.truncate(limit);
        }
        Ok(workouts)
    }

    async fn put_template(&self, template: WorkoutTemplate) -> Result<()> {
        self.update(|data| {
            data.templates.insert(template.id.clone(), template);
        })
        .await
    }

    async fn get_template(&self, template_id: String) -> Result<Option<WorkoutTemplate>> {
        Ok(self.data.read().await.templates.get(&template_id).cloned())
    }

    async fn list_templates(&self, user_id: String) -> Result<Vec<WorkoutTemplate>> {
        Ok(self
            .data
            .read()
            .await
            .templates
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn public_templates(&self) -> Result<Vec<WorkoutTemplate>> {
        Ok(self
            .data
            .read()
            .await
            .templates
            .values()
            .filter(|t| t.is_public)
            .cloned()
            .collect())
    }

    async fn delete_template(&self, template_id: String) -> Result<()> {
        if !self.data.read().await.templates.contains_key(&template_id) {
            return Ok(());
        }
        self.update(|data| {
            data.templates.remove(&template_id);
        })
        .await
    }

    async fn put_programs(&self, programs: Vec<WorkoutProgram>) -> Result<()> {
        self.update(|data| {
            for program in programs {
                data.programs.insert(program.id.clone(), program);
            }
        })
        .await
    }

    async fn get_program(&self, program_id: String) -> Result<Option<WorkoutProgram>> {
        Ok(self.data.read().await.programs.get(&program_id).cloned())
    }

    async fn list_programs(&self, user_id: String) -> Result<Vec<WorkoutProgram>> {
        Ok(self
            .data
            .read()
            .await
            .programs
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_rest_setting(
        &self,
        user_id: String,
        exercise_id: String,
    ) -> Result<Option<RestSetting>> {
        let id = RestSetting::document_id(&user_id, &exercise_id);
        Ok(self.data.read().await.rest_settings.get(&id).cloned())
    }

    async fn put_rest_setting(&self, setting: RestSetting) -> Result<()> {
        self.update(|data| {
            let id = RestSetting::document_id(&setting.user_id, &setting.exercise_id);
            data.rest_settings.insert(id, setting);
        })
        .await
    }

    async fn commit_session(
        &self,
        history: ExerciseHistory,
        record: Option<PersonalRecord>,
    ) -> Result<()> {
        self.update(|data| {
            data.history.push(history);
            if let Some(record) = record {
                data.records.insert(record.key().document_id(), record);
            }
        })
        .await
    }
}

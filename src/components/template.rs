//! Template Component
//!
//! Manages workout templates and training programs of one user on top of a
//! [`WorkoutStore`]. At most one program of a user is active at a time.

use std::{fmt::Debug, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{error, info};
use time::OffsetDateTime;

use crate::{
    api::{controller::TemplateApi, service::WorkoutStore},
    core::{constants::POPULAR_TEMPLATES_LIMIT, errors::PlanError},
    model::{
        template::{ProgramDay, ProgramGoal, WorkoutProgram, WorkoutTemplate},
        workout::WorkoutExercise,
    },
};

/// Templates and programs of a single user.
///
/// # Type Parameters
/// * `S` - The store holding templates and programs.
pub struct TemplateComponent<S: WorkoutStore + ?Sized> {
    store: Arc<S>,
    user_id: String,
}

impl<S: WorkoutStore + ?Sized> Debug for TemplateComponent<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateComponent")
            .field("user_id", &self.user_id)
            .finish()
    }
}

impl<S: WorkoutStore + ?Sized> TemplateComponent<S> {
    pub fn new(store: Arc<S>, user_id: &str) -> Self {
        Self {
            store,
            user_id: user_id.to_string(),
        }
    }

    async fn load_program(&self, program_id: &str) -> Result<WorkoutProgram> {
        self.store
            .get_program(program_id.to_string())
            .await
            .inspect_err(|e| error!("Failed to load program {}: {:?}", program_id, e))?
            .ok_or_else(|| PlanError::ProgramNotFound(program_id.to_string()).into())
    }

    async fn save_programs(&self, programs: Vec<WorkoutProgram>) -> Result<()> {
        self.store
            .put_programs(programs)
            .await
            .inspect_err(|e| error!("Failed to save programs of {}: {:?}", self.user_id, e))
            .context("saving programs")
    }

    /// Activates a program at `now`, deactivating the others.
    pub async fn start_program_at(
        &self,
        program_id: &str,
        now: OffsetDateTime,
    ) -> Result<WorkoutProgram> {
        let mut program = self.load_program(program_id).await?;
        let mut changed: Vec<WorkoutProgram> = self
            .user_programs()
            .await?
            .into_iter()
            .filter(|p| p.is_active && p.id != program.id)
            .map(|mut p| {
                info!("Deactivating program {}.", p.name);
                p.is_active = false;
                p
            })
            .collect();
        program.start(now);
        changed.push(program.clone());
        self.save_programs(changed).await?;
        info!("Started program {}.", program.name);
        Ok(program)
    }

    /// Counts a finished training day at `now`.
    pub async fn advance_program_at(
        &self,
        program_id: &str,
        now: OffsetDateTime,
    ) -> Result<WorkoutProgram> {
        let mut program = self.load_program(program_id).await?;
        if program.record_workout(now)? {
            info!(
                "Completed program {} after {} workouts.",
                program.name, program.completed_workouts
            );
        }
        self.save_programs(vec![program.clone()]).await?;
        Ok(program)
    }

    /// Counts a use of a template at `now`.
    pub async fn use_template_at(
        &self,
        template_id: &str,
        now: OffsetDateTime,
    ) -> Result<WorkoutTemplate> {
        let mut template = self
            .store
            .get_template(template_id.to_string())
            .await
            .inspect_err(|e| error!("Failed to load template {}: {:?}", template_id, e))?
            .ok_or_else(|| PlanError::TemplateNotFound(template_id.to_string()))?;
        template.mark_used(now);
        self.store
            .put_template(template.clone())
            .await
            .inspect_err(|e| error!("Failed to save template {}: {:?}", template_id, e))
            .context("saving template")?;
        Ok(template)
    }
}

#[async_trait]
impl<S: WorkoutStore + ?Sized> TemplateApi for TemplateComponent<S> {
    async fn save_as_template(
        &self,
        name: &str,
        description: &str,
        exercises: &[WorkoutExercise],
        tags: Vec<String>,
    ) -> Result<WorkoutTemplate> {
        let template = WorkoutTemplate::from_exercises(
            &self.user_id,
            name,
            description,
            exercises,
            tags,
            OffsetDateTime::now_utc(),
        );
        self.store
            .put_template(template.clone())
            .await
            .inspect_err(|e| error!("Failed to save template {}: {:?}", name, e))
            .with_context(|| format!("saving template {}", name))?;
        info!("Saved template {} with {} exercises.", name, exercises.len());
        Ok(template)
    }

    async fn user_templates(&self) -> Result<Vec<WorkoutTemplate>> {
        let mut templates = self
            .store
            .list_templates(self.user_id.clone())
            .await
            .inspect_err(|e| error!("Failed to load templates of {}: {:?}", self.user_id, e))?;
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(templates)
    }

    async fn popular_templates(&self, limit: Option<usize>) -> Result<Vec<WorkoutTemplate>> {
        let mut templates = self
            .store
            .public_templates()
            .await
            .inspect_err(|e| error!("Failed to load public templates: {:?}", e))?;
        templates.sort_by(|a, b| {
            b.use_count
                .cmp(&a.use_count)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        templates.truncate(limit.unwrap_or(POPULAR_TEMPLATES_LIMIT));
        Ok(templates)
    }

    async fn use_template(&self, template_id: &str) -> Result<WorkoutTemplate> {
        self.use_template_at(template_id, OffsetDateTime::now_utc())
            .await
    }

    async fn delete_template(&self, template_id: &str) -> Result<()> {
        self.store
            .delete_template(template_id.to_string())
            .await
            .inspect_err(|e| error!("Failed to delete template {}: {:?}", template_id, e))
    }

    async fn create_program(
        &self,
        name: &str,
        description: &str,
        duration_weeks: u32,
        days_per_week: u32,
        goal: ProgramGoal,
    ) -> Result<WorkoutProgram> {
        let program = WorkoutProgram::new(
            &self.user_id,
            name,
            description,
            duration_weeks,
            days_per_week,
            goal,
            OffsetDateTime::now_utc(),
        )?;
        self.save_programs(vec![program.clone()]).await?;
        info!(
            "Created program {} ({} weeks, {} days per week).",
            name, duration_weeks, days_per_week
        );
        Ok(program)
    }

    async fn add_program_day(&self, program_id: &str, day: ProgramDay) -> Result<WorkoutProgram> {
        let mut program = self.load_program(program_id).await?;
        program.days.push(day);
        self.save_programs(vec![program.clone()]).await?;
        Ok(program)
    }

    async fn user_programs(&self) -> Result<Vec<WorkoutProgram>> {
        let mut programs = self
            .store
            .list_programs(self.user_id.clone())
            .await
            .inspect_err(|e| error!("Failed to load programs of {}: {:?}", self.user_id, e))?;
        programs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(programs)
    }

    async fn active_program(&self) -> Result<Option<WorkoutProgram>> {
        Ok(self.user_programs().await?.into_iter().find(|p| p.is_active))
    }

    async fn start_program(&self, program_id: &str) -> Result<WorkoutProgram> {
        self.start_program_at(program_id, OffsetDateTime::now_utc())
            .await
    }

    async fn advance_program(&self, program_id: &str) -> Result<WorkoutProgram> {
        self.advance_program_at(program_id, OffsetDateTime::now_utc())
            .await
    }
}

//! Turns task templates into persisted rows.
//!
//! A recurring template becomes one parent row (`is_main_task = true`) plus one
//! child row per occurrence of its rule, except the occurrence at the parent's
//! own anchor. Expansion happens once, here; later edits to the rule go
//! through [`TaskRepository::update_task`] and never regenerate children.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::code::task_code;
use crate::error::CoreError;
use crate::models::{
    FailedOccurrence, MaterializationConfig, NewTaskData, RecurrenceOutcome, Task, TaskDraft,
};
use crate::recurrence::RecurrenceExpander;
use crate::repository::TaskRepository;
use crate::timezone::{self, truncate_to_seconds};

pub struct TaskMaterializer<R: TaskRepository> {
    repository: Arc<R>,
    config: MaterializationConfig,
    expander: RecurrenceExpander,
}

impl<R: TaskRepository> Clone for TaskMaterializer<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            config: self.config.clone(),
            expander: self.expander,
        }
    }
}

impl<R: TaskRepository> TaskMaterializer<R> {
    pub fn new(repository: Arc<R>, config: MaterializationConfig) -> Self {
        let expander = RecurrenceExpander::new(config.max_occurrences);
        Self {
            repository,
            config,
            expander,
        }
    }

    pub fn with_defaults(repository: Arc<R>) -> Self {
        Self::new(repository, MaterializationConfig::default())
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Creates a single task row, honouring the template's own `is_main_task`.
    #[instrument(skip_all, fields(title = %template.title))]
    pub async fn create_task(&self, template: NewTaskData) -> Result<Task, CoreError> {
        validate(&template)?;
        let draft = TaskDraft::from_template(&template, timezone::now());
        let task = self.persist(&draft).await?;
        info!(task_id = task.task_id, "created task");
        Ok(task)
    }

    /// Creates the parent and its children, returning only the parent.
    pub async fn create_with_recurrence(&self, template: NewTaskData) -> Result<Task, CoreError> {
        self.materialize(template).await.map(|outcome| outcome.parent)
    }

    /// Creates the parent and its children and reports what happened.
    ///
    /// # Behavior
    /// - Validation errors and a failed parent insert are returned to the caller
    /// - A malformed rule keeps the parent and skips children
    /// - Child failures are collected, or abort the loop when
    ///   `continue_on_child_failure` is off
    #[instrument(skip_all, fields(title = %template.title))]
    pub async fn materialize(&self, template: NewTaskData) -> Result<RecurrenceOutcome, CoreError> {
        validate(&template)?;
        let now = timezone::now();

        let mut parent_draft = TaskDraft::from_template(&template, now);
        parent_draft.is_main_task = true;
        parent_draft.parent_task_id = None;

        let recurrence = template.recurrence().map(|(rule, until)| {
            let anchor = truncate_to_seconds(template.due_date.unwrap_or(now));
            parent_draft.due_date = Some(anchor);
            (rule, until, anchor)
        });

        let parent = self.persist(&parent_draft).await?;
        info!(task_id = parent.task_id, code = ?parent.code, "created parent task");

        let mut outcome = RecurrenceOutcome {
            parent,
            children: Vec::new(),
            failed: Vec::new(),
            skipped_parent_occurrence: false,
            expansion_error: None,
        };

        let Some((rule, until, anchor)) = recurrence else {
            debug!(task_id = outcome.parent.task_id, "no recurrence requested");
            return Ok(outcome);
        };

        let occurrences = match self.expander.expand(anchor, rule, until) {
            Ok(occurrences) => occurrences,
            Err(e) => {
                warn!(
                    task_id = outcome.parent.task_id,
                    rule,
                    error = %e,
                    "recurrence expansion failed; keeping parent only"
                );
                outcome.expansion_error = Some(e.to_string());
                return Ok(outcome);
            }
        };
        debug!(
            task_id = outcome.parent.task_id,
            occurrences = occurrences.len(),
            "expanded recurrence"
        );

        let parent_id = outcome.parent.task_id;
        for due_date in occurrences {
            if due_date == anchor {
                outcome.skipped_parent_occurrence = true;
                continue;
            }

            let child_draft = parent_draft.child_of(parent_id, due_date);
            match self.persist(&child_draft).await {
                Ok(child) => outcome.children.push(child),
                Err(e) if self.config.continue_on_child_failure => {
                    warn!(task_id = parent_id, %due_date, error = %e, "failed to create child task");
                    outcome.failed.push(FailedOccurrence {
                        due_date,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            task_id = parent_id,
            children = outcome.children.len(),
            failed = outcome.failed.len(),
            "materialized recurring task"
        );
        Ok(outcome)
    }

    /// Insert, assign the id-derived code, then re-read the row.
    async fn persist(&self, draft: &TaskDraft) -> Result<Task, CoreError> {
        let id = self.repository.insert_task(draft).await?;
        self.repository.assign_code(id, &task_code(id)).await?;
        self.repository
            .find_task_by_id(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Task {} vanished after insert", id)))
    }
}

fn validate(template: &NewTaskData) -> Result<(), CoreError> {
    if template.title.trim().is_empty() {
        return Err(CoreError::Validation("title must not be blank".to_string()));
    }
    if template.status.trim().is_empty() {
        return Err(CoreError::Validation("status must not be blank".to_string()));
    }
    Ok(())
}

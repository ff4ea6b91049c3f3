use crate::error::CoreError;
use crate::models::{Page, PageRequest, Task, TaskDraft, TaskListQuery, UpdateTaskData};
use crate::repository::query_builder::SqlQueryBuilder;
use crate::repository::SqliteRepository;
use crate::timezone;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn insert_task(&self, draft: &TaskDraft) -> Result<i64, CoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO tasks (
                title, description, priority_level, status, assigned_to, manager_id,
                due_date, related_vendor, completion_notes, completion_date, project_id,
                event_id, tenant_id, event_phase, recurrence_rule, recurrence_end_date,
                parent_task_id, is_main_task, user_group_id, space_id, asset_id,
                is_archived, archived_at, created_by, updated_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            RETURNING task_id
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(&draft.priority_level)
        .bind(&draft.status)
        .bind(draft.assigned_to)
        .bind(draft.manager_id)
        .bind(draft.due_date)
        .bind(draft.related_vendor)
        .bind(&draft.completion_notes)
        .bind(draft.completion_date)
        .bind(draft.project_id)
        .bind(draft.event_id)
        .bind(draft.tenant_id)
        .bind(&draft.event_phase)
        .bind(&draft.recurrence_rule)
        .bind(draft.recurrence_end_date)
        .bind(draft.parent_task_id)
        .bind(draft.is_main_task)
        .bind(draft.user_group_id)
        .bind(draft.space_id)
        .bind(draft.asset_id)
        .bind(draft.is_archived)
        .bind(draft.archived_at)
        .bind(draft.created_by)
        .bind(draft.updated_by)
        .bind(draft.created_at)
        .bind(draft.updated_at)
        .fetch_one(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => CoreError::Validation(
                "parent_task_id does not reference an existing task".to_string(),
            ),
            e => CoreError::from(e),
        })?;

        debug!(task_id = id, parent_task_id = ?draft.parent_task_id, "inserted task");
        Ok(id)
    }

    async fn assign_code(&self, id: i64, code: &str) -> Result<(), CoreError> {
        let result = sqlx::query("UPDATE tasks SET code = $1 WHERE task_id = $2")
            .bind(code)
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }

    async fn update_task(&self, id: i64, data: &UpdateTaskData) -> Result<Option<Task>, CoreError> {
        if let Some(title) = &data.title {
            if title.trim().is_empty() {
                return Err(CoreError::Validation("title must not be blank".to_string()));
            }
        }
        if let Some(status) = &data.status {
            if status.trim().is_empty() {
                return Err(CoreError::Validation("status must not be blank".to_string()));
            }
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
        SqlQueryBuilder::push_update_assignments(data, timezone::now(), &mut qb);
        qb.push(" WHERE task_id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        let task = qb.build_query_as::<Task>().fetch_optional(self.pool()).await?;
        Ok(task)
    }

    async fn find_task_by_id(&self, id: i64) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as::<_, Task>("SELECT * FROM tasks WHERE task_id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn delete_task(&self, id: i64) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE task_id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_tasks(&self, query: &TaskListQuery) -> Result<Page<Task>, CoreError> {
        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM tasks");
        SqlQueryBuilder::push_list_filters(query, &mut count_qb);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(self.pool())
            .await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM tasks");
        SqlQueryBuilder::push_list_filters(query, &mut qb);
        qb.push(" ORDER BY updated_at DESC, task_id DESC");
        push_page(&mut qb, query.page);

        let items = qb.build_query_as::<Task>().fetch_all(self.pool()).await?;
        Ok(page_of(items, total, query.page))
    }

    async fn list_all_tasks(&self) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks ORDER BY updated_at DESC, task_id DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn list_tasks_by_tenant(&self, tenant_id: i64) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as::<_, Task>(
            "SELECT * FROM tasks WHERE tenant_id = $1 ORDER BY updated_at DESC, task_id DESC",
        )
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn list_child_tasks(
        &self,
        tenant_id: i64,
        parent_task_id: i64,
        page: PageRequest,
    ) -> Result<Page<Task>, CoreError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tasks WHERE tenant_id = $1 AND parent_task_id = $2",
        )
        .bind(tenant_id)
        .bind(parent_task_id)
        .fetch_one(self.pool())
        .await?;

        let items = sqlx::query_as::<_, Task>(
            r#"
            SELECT * FROM tasks
            WHERE tenant_id = $1 AND parent_task_id = $2
            ORDER BY due_date ASC, task_id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(parent_task_id)
        .bind(page.page_size())
        .bind(page.offset())
        .fetch_all(self.pool())
        .await?;

        Ok(page_of(items, total, page))
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Sqlite>, page: PageRequest) {
    qb.push(" LIMIT ");
    qb.push_bind(page.page_size());
    qb.push(" OFFSET ");
    qb.push_bind(page.offset());
}

fn page_of(items: Vec<Task>, total: i64, page: PageRequest) -> Page<Task> {
    Page {
        total,
        page: page.page(),
        page_size: page.page_size(),
        items,
    }
}

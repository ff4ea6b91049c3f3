use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{Page, PageRequest, Task, TaskDraft, TaskListQuery, UpdateTaskData};
use async_trait::async_trait;

pub mod query_builder;
pub mod tasks;

/// Persistence interface for task rows.
///
/// Lookups return `Ok(None)` for missing rows; errors are reserved for the
/// backend actually failing.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a row and returns its generated id. The code column is left null.
    async fn insert_task(&self, draft: &TaskDraft) -> Result<i64, CoreError>;
    async fn assign_code(&self, id: i64, code: &str) -> Result<(), CoreError>;
    /// Writes only the fields present in `data` and refreshes `updated_at`.
    async fn update_task(&self, id: i64, data: &UpdateTaskData) -> Result<Option<Task>, CoreError>;
    async fn find_task_by_id(&self, id: i64) -> Result<Option<Task>, CoreError>;
    /// Returns whether a row was deleted.
    async fn delete_task(&self, id: i64) -> Result<bool, CoreError>;
    async fn list_tasks(&self, query: &TaskListQuery) -> Result<Page<Task>, CoreError>;
    /// Every row of every tenant, most recently updated first.
    async fn list_all_tasks(&self) -> Result<Vec<Task>, CoreError>;
    /// Every row of one tenant, unpaginated, most recently updated first.
    async fn list_tasks_by_tenant(&self, tenant_id: i64) -> Result<Vec<Task>, CoreError>;
    async fn list_child_tasks(
        &self,
        tenant_id: i64,
        parent_task_id: i64,
        page: PageRequest,
    ) -> Result<Page<Task>, CoreError>;
}

/// SQLite implementation of the repository pattern
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database pool for internal use across modules
    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

//! Task API routes.
//!
//! ## Routes
//!
//! - `POST   /tasks` - Create a single task
//! - `POST   /tasks/recurrence` - Create a parent task and its generated occurrences
//! - `GET    /tasks/single/:task_id` - Get task by id
//! - `PUT    /tasks/:task_id` - Partially update a task
//! - `DELETE /tasks/:task_id` - Delete a task (children cascade)
//! - `GET    /tasks/list-paginated` - Tenant-scoped filtered listing
//! - `GET    /tasks/list-child-tasks` - Children of one recurring parent
//! - `GET    /tasks/all` - Every task, unpaginated
//! - `GET    /tasks/tenant/all/:tenant_id` - Every task of one tenant, unpaginated

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use venueops_core::models::{
    MainTaskSelector, NewTaskData, Page, PageRequest, Task, TaskListQuery, UpdateTaskData,
};
use venueops_core::repository::TaskRepository;

use crate::auth::AuthContext;
use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

const TASK_NOT_FOUND: &str = "Task not found";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(create_task))
        .route("/tasks/recurrence", post(create_recurring_task))
        .route("/tasks/single/:task_id", get(get_task))
        .route("/tasks/:task_id", put(update_task).delete(delete_task))
        .route("/tasks/list-paginated", get(list_tasks))
        .route("/tasks/list-child-tasks", get(list_child_tasks))
        .route("/tasks/all", get(list_all_tasks))
        .route("/tasks/tenant/all/:tenant_id", get(list_tenant_tasks))
}

/// Query string of `GET /tasks/list-paginated`.
#[derive(Debug, Deserialize)]
pub struct ListTasksParams {
    pub tenant_id: i64,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub priority_level: Option<String>,
    pub event_phase: Option<String>,
    pub assigned_to: Option<i64>,
    pub manager_id: Option<i64>,
    pub project_id: Option<i64>,
    pub event_id: Option<i64>,
    pub related_vendor: Option<i64>,
    pub space_id: Option<i64>,
    pub asset_id: Option<i64>,
    pub is_archived: Option<bool>,
    /// `"true"`, `"false"`, or anything else for both; absent means children only
    pub is_main_task: Option<String>,
    pub user_group_id: Option<i64>,
}

impl ListTasksParams {
    fn into_query(self) -> ApiResult<TaskListQuery> {
        let page = page_request(self.page, self.page_size)?;
        let main_task = self
            .is_main_task
            .as_deref()
            .and_then(|raw| raw.parse::<MainTaskSelector>().ok())
            .unwrap_or_default();

        Ok(TaskListQuery {
            tenant_id: self.tenant_id,
            status: non_blank(self.status),
            priority_level: non_blank(self.priority_level),
            event_phase: non_blank(self.event_phase),
            assigned_to: self.assigned_to,
            manager_id: self.manager_id,
            project_id: self.project_id,
            event_id: self.event_id,
            related_vendor: self.related_vendor,
            space_id: self.space_id,
            asset_id: self.asset_id,
            is_archived: self.is_archived,
            user_group_id: self.user_group_id,
            main_task,
            page,
        })
    }
}

/// Query string of `GET /tasks/list-child-tasks`.
#[derive(Debug, Deserialize)]
pub struct ChildTasksParams {
    pub tenant_id: i64,
    pub parent_task_id: i64,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct DeletedTask {
    pub task_id: i64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn page_request(page: Option<i64>, page_size: Option<i64>) -> ApiResult<PageRequest> {
    PageRequest::new(page, page_size).map_err(|e| ApiError::unprocessable(e.to_string()))
}

async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<NewTaskData>, JsonRejection>,
) -> ApiResult<Envelope<Task>> {
    let Json(template) = payload?;
    let task = state.materializer.create_task(template).await?;

    info!(
        request_id = %auth.request_id,
        subject = ?auth.subject(),
        task_id = task.task_id,
        "task created"
    );
    Ok(Envelope::created(task, "Task created successfully"))
}

async fn create_recurring_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<NewTaskData>, JsonRejection>,
) -> ApiResult<Envelope<Task>> {
    let Json(template) = payload?;
    let outcome = state.materializer.materialize(template).await?;

    if let Some(error) = &outcome.expansion_error {
        warn!(
            request_id = %auth.request_id,
            task_id = outcome.parent.task_id,
            %error,
            "recurrence rule rejected; created parent only"
        );
    }
    if !outcome.failed.is_empty() {
        warn!(
            request_id = %auth.request_id,
            task_id = outcome.parent.task_id,
            failed = outcome.failed.len(),
            "some occurrences were not created"
        );
    }
    info!(
        request_id = %auth.request_id,
        subject = ?auth.subject(),
        task_id = outcome.parent.task_id,
        children = outcome.children.len(),
        "recurring task created"
    );

    Ok(Envelope::created(
        outcome.parent,
        "Recurring task(s) created successfully.",
    ))
}

async fn get_task(
    State(state): State<AppState>,
    task_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Envelope<Task>> {
    let Path(task_id) = task_id?;
    let task = state
        .repository()
        .find_task_by_id(task_id)
        .await?
        .ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))?;

    Ok(Envelope::ok(task, "Task fetched successfully"))
}

async fn update_task(
    State(state): State<AppState>,
    task_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTaskData>, JsonRejection>,
) -> ApiResult<Envelope<Task>> {
    let Path(task_id) = task_id?;
    let Json(data) = payload?;
    let task = state
        .repository()
        .update_task(task_id, &data)
        .await?
        .ok_or_else(|| ApiError::not_found(TASK_NOT_FOUND))?;

    Ok(Envelope::ok(task, "Task updated successfully"))
}

async fn delete_task(
    State(state): State<AppState>,
    task_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Envelope<DeletedTask>> {
    let Path(task_id) = task_id?;
    if !state.repository().delete_task(task_id).await? {
        return Err(ApiError::not_found(TASK_NOT_FOUND));
    }

    Ok(Envelope::ok(DeletedTask { task_id }, "Task deleted successfully"))
}

async fn list_tasks(
    State(state): State<AppState>,
    params: Result<Query<ListTasksParams>, QueryRejection>,
) -> ApiResult<Envelope<Page<Task>>> {
    let Query(params) = params?;
    let page = state.repository().list_tasks(&params.into_query()?).await?;

    Ok(Envelope::ok(page, "Paginated tasks fetched successfully."))
}

async fn list_child_tasks(
    State(state): State<AppState>,
    params: Result<Query<ChildTasksParams>, QueryRejection>,
) -> ApiResult<Envelope<Page<Task>>> {
    let Query(params) = params?;
    let page = page_request(params.page, params.page_size)?;
    let page = state
        .repository()
        .list_child_tasks(params.tenant_id, params.parent_task_id, page)
        .await?;

    Ok(Envelope::ok(page, "Paginated tasks fetched successfully."))
}

async fn list_all_tasks(State(state): State<AppState>) -> ApiResult<Envelope<Vec<Task>>> {
    let tasks = state.repository().list_all_tasks().await?;
    Ok(Envelope::ok(tasks, "Tasks fetched successfully"))
}

async fn list_tenant_tasks(
    State(state): State<AppState>,
    tenant_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Envelope<Vec<Task>>> {
    let Path(tenant_id) = tenant_id?;
    let tasks = state.repository().list_tasks_by_tenant(tenant_id).await?;
    Ok(Envelope::ok(tasks, "Tasks fetched."))
}

//! Task procedures: queries, the upsert, field mutations, and delete.
//!
//! Mutations are last-write-wins and answer `{"success": true}` whether or
//! not a row matched; clients treat unknown ids as already-gone. Every
//! mutation invalidates the caller's board session so the next board load
//! re-reconciles from the store.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{AppState, Identity};
use crate::error::{ApiError, ApiResult};
use crate::types::{Task, TaskUpsert};

/// GET /rpc/getUsersTasks
///
/// The caller's top-level tasks, unordered with respect to the board; the
/// client merges these with getTaskOrder.
pub async fn get_users_tasks(
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.db.get_users_tasks(&user_id)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTasksQuery {
    pub task_id: String,
}

/// GET /rpc/getSubTasks?taskId=...
pub async fn get_sub_tasks(
    State(state): State<AppState>,
    Identity(_user_id): Identity,
    Query(query): Query<SubTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    Ok(Json(state.db.get_sub_tasks(&query.task_id)?))
}

/// POST /rpc/upsertTask
///
/// Create-or-save with a client-supplied id. Ownership comes from the
/// identity header, never from the payload.
pub async fn upsert_task(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(mut input): Json<TaskUpsert>,
) -> ApiResult<Json<Value>> {
    if input.id.trim().is_empty() {
        return Err(ApiError::missing_field("id"));
    }
    input.created_by_id = user_id.clone();
    state.db.ensure_user(&user_id)?;
    state.db.upsert_task(&input)?;
    state.sessions.invalidate(&user_id);
    info!(user_id = %user_id, task_id = %input.id, "task upserted");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct DeleteTaskInput {
    pub id: String,
}

/// POST /rpc/deleteTask
///
/// Deletes the task and its whole sub-task tree, and scrubs the id from the
/// owner's order field. Unknown ids succeed without effect.
pub async fn delete_task(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<DeleteTaskInput>,
) -> ApiResult<Json<Value>> {
    let deleted = state.db.delete_task(&input.id)?;
    state.sessions.invalidate(&user_id);
    info!(user_id = %user_id, task_id = %input.id, deleted, "task deleted");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTitleInput {
    pub task_id: String,
    pub title: String,
}

/// POST /rpc/updateTitle
pub async fn update_title(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<UpdateTitleInput>,
) -> ApiResult<Json<Value>> {
    let updated = state.db.update_title(&input.task_id, &input.title)?;
    state.sessions.invalidate(&user_id);
    debug!(task_id = %input.task_id, updated, "title update");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusInput {
    pub task_id: String,
    pub status: String,
}

/// POST /rpc/updateStatus
pub async fn update_status(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<UpdateStatusInput>,
) -> ApiResult<Json<Value>> {
    let updated = state.db.update_status(&input.task_id, &input.status)?;
    state.sessions.invalidate(&user_id);
    debug!(task_id = %input.task_id, status = %input.status, updated, "status update");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriorityInput {
    pub task_id: String,
    pub priority: String,
}

/// POST /rpc/updatePriority
pub async fn update_priority(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<UpdatePriorityInput>,
) -> ApiResult<Json<Value>> {
    let updated = state.db.update_priority(&input.task_id, &input.priority)?;
    state.sessions.invalidate(&user_id);
    debug!(task_id = %input.task_id, updated, "priority update");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDescriptionInput {
    pub task_id: String,
    pub description: String,
}

/// POST /rpc/updateDescription
pub async fn update_description(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<UpdateDescriptionInput>,
) -> ApiResult<Json<Value>> {
    let updated = state
        .db
        .update_description(&input.task_id, &input.description)?;
    state.sessions.invalidate(&user_id);
    debug!(task_id = %input.task_id, updated, "description update");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDueDateInput {
    pub task_id: String,
    pub due_date: i64,
}

/// POST /rpc/updateDueDate
///
/// Due dates travel as epoch milliseconds and are stored verbatim; the
/// value just has to name a representable instant.
pub async fn update_due_date(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<UpdateDueDateInput>,
) -> ApiResult<Json<Value>> {
    if chrono::DateTime::from_timestamp_millis(input.due_date).is_none() {
        return Err(ApiError::invalid_value(
            "dueDate",
            "not a representable timestamp",
        ));
    }
    let updated = state.db.update_due_date(&input.task_id, input.due_date)?;
    state.sessions.invalidate(&user_id);
    debug!(task_id = %input.task_id, due_date = input.due_date, updated, "due date update");
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTotalTimeInput {
    pub task_id: String,
    pub total_time: f64,
}

/// POST /rpc/updateTotalTime
///
/// The payload carries the absolute accumulated seconds, not a delta.
pub async fn update_total_time(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<UpdateTotalTimeInput>,
) -> ApiResult<Json<Value>> {
    if !input.total_time.is_finite() || input.total_time < 0.0 {
        return Err(ApiError::invalid_value(
            "totalTime",
            "must be a non-negative number of seconds",
        ));
    }
    let updated = state
        .db
        .update_total_time(&input.task_id, input.total_time)?;
    state.sessions.invalidate(&user_id);
    debug!(task_id = %input.task_id, total_time = input.total_time, updated, "total time update");
    Ok(Json(json!({ "success": true })))
}

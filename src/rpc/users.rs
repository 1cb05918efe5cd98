//! User-facing procedures: identity bootstrap and the task order field.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{AppState, Identity};
use crate::error::ApiResult;

/// GET /rpc/authCallback
///
/// Called once per login by the auth layer. Creates the user row on first
/// sight; subsequent calls are no-ops.
pub async fn auth_callback(
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> ApiResult<Json<Value>> {
    let created = state.db.ensure_user(&user_id)?;
    if created {
        info!(user_id = %user_id, "created user");
    }
    Ok(Json(json!({ "success": true })))
}

/// GET /rpc/getTaskOrder
///
/// The user's persisted board order, or null when none was ever saved.
pub async fn get_task_order(
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> ApiResult<Json<Option<Vec<String>>>> {
    Ok(Json(state.db.get_task_order(&user_id)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskOrderInput {
    pub sort_order: Vec<String>,
}

/// POST /rpc/updateTaskOrder
///
/// Overwrites the user's board order wholesale. The caller owns the whole
/// list; the server does not merge.
pub async fn update_task_order(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Json(input): Json<UpdateTaskOrderInput>,
) -> ApiResult<Json<Value>> {
    state.db.set_task_order(&user_id, &input.sort_order)?;
    state.sessions.invalidate(&user_id);
    debug!(user_id = %user_id, len = input.sort_order.len(), "task order updated");
    Ok(Json(json!({ "success": true })))
}

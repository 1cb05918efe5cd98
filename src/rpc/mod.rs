//! Typed RPC surface.
//!
//! Every board operation is one named procedure under `/rpc/`: queries are
//! GETs, mutations are POSTs, and every payload is JSON with camelCase
//! field names. Handlers are thin: extract identity, call the db layer,
//! map failures into [`ApiError`].

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::routing::{get, post};
use axum::Router;

use crate::board::BoardSessions;
use crate::db::Database;
use crate::error::ApiError;

pub mod tasks;
pub mod users;

/// Header carrying the authenticated user id, set by the fronting auth
/// proxy. Requests without it are rejected before any handler logic runs.
pub const IDENTITY_HEADER: &str = "x-board-user";

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub sessions: Arc<BoardSessions>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            sessions: Arc::new(BoardSessions::new()),
        }
    }
}

/// The caller's user id, taken from the identity header.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(IDENTITY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(ApiError::unauthorized)?;
        Ok(Identity(user_id.to_string()))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rpc/authCallback", get(users::auth_callback))
        .route("/rpc/getTaskOrder", get(users::get_task_order))
        .route("/rpc/updateTaskOrder", post(users::update_task_order))
        .route("/rpc/getUsersTasks", get(tasks::get_users_tasks))
        .route("/rpc/getSubTasks", get(tasks::get_sub_tasks))
        .route("/rpc/upsertTask", post(tasks::upsert_task))
        .route("/rpc/deleteTask", post(tasks::delete_task))
        .route("/rpc/updateTitle", post(tasks::update_title))
        .route("/rpc/updateStatus", post(tasks::update_status))
        .route("/rpc/updatePriority", post(tasks::update_priority))
        .route("/rpc/updateDescription", post(tasks::update_description))
        .route("/rpc/updateDueDate", post(tasks::update_due_date))
        .route("/rpc/updateTotalTime", post(tasks::update_total_time))
}

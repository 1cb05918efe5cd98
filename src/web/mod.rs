//! htmx board UI.
//!
//! Server-rendered board: the page shell is static, the board body is an
//! HTML fragment re-rendered from the user's board session after every
//! interaction. Drag events and card edits post to `/ui/` endpoints that
//! drive the session state machine and persist its effects through the
//! same db calls the RPC procedures use.

use axum::extract::{Form, Path, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::board::{BoardState, DropTarget, OrderCache};
use crate::error::ApiResult;
use crate::rpc::{AppState, Identity};
use crate::types::{Task, STATUS_COLUMNS, STATUS_LABELS};

pub mod templates;

pub fn router() -> Router<AppState> {
    Router::new()
        // Page routes
        .route("/", get(board_page))
        // htmx fragment routes
        .route("/ui/board", get(ui_board))
        .route("/ui/task/{task_id}", get(ui_task_detail))
        .route("/ui/drag/start", post(ui_drag_start))
        .route("/ui/drag/over", post(ui_drag_over))
        .route("/ui/drag/end", post(ui_drag_end))
        .route("/ui/task/create", post(ui_task_create))
        .route("/ui/task/rename", post(ui_task_rename))
        .route("/ui/task/save", post(ui_task_save))
        .route("/ui/task/delete", post(ui_task_delete))
        .route("/api/health", get(api_health))
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn api_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Root endpoint - serves the board page shell.
async fn board_page() -> Html<&'static str> {
    Html(templates::INDEX_TEMPLATE)
}

/// Make sure the user exists and has a live board session.
///
/// The session is seeded from the store's order field and task set. A user
/// with no stored order gets one bootstrapped: the local cache if one
/// survives, otherwise the task query order, persisted immediately so every
/// later load reconciles against a real order list.
fn ensure_session(state: &AppState, user_id: &str) -> ApiResult<()> {
    state.db.ensure_user(user_id)?;
    let tasks = state.db.get_users_tasks(user_id)?;
    let mut order = state.db.get_task_order(user_id)?;

    if order.is_none() {
        order = OrderCache::for_user(user_id).and_then(|c| c.load());
        if order.is_none() && !tasks.is_empty() {
            order = Some(tasks.iter().map(|t| t.id.clone()).collect());
        }
        if let Some(seeded) = &order {
            state.db.set_task_order(user_id, seeded)?;
            debug!(user_id = %user_id, len = seeded.len(), "seeded task order");
        }
    }

    state.sessions.with_state(
        user_id,
        || BoardState::from_server(order.as_deref(), &tasks),
        |_| (),
    );
    Ok(())
}

fn render_session(state: &AppState, user_id: &str) -> Html<String> {
    Html(state.sessions.with_state(user_id, BoardState::default, |s| {
        let mut html = String::from(r#"<div class="board">"#);
        for (status, label) in STATUS_COLUMNS.iter().zip(STATUS_LABELS) {
            let cards = s.column(status);
            html.push_str(&format!(
                r##"<div class="column" id="col-{status}"
                     hx-post="/ui/drag/end" hx-trigger="drop" hx-target="#board"
                     hx-vals='{{"targetType":"column","targetId":"{status}"}}'>
                    <div class="column-header"><span>{label}</span><span>{count}</span></div>"##,
                status = status,
                label = label,
                count = cards.len(),
            ));
            if cards.is_empty() {
                html.push_str(r#"<div class="empty-state">No tasks</div>"#);
            }
            for task in &cards {
                html.push_str(&render_card(task, s.is_draft(&task.id)));
            }
            html.push_str(&format!(
                r##"<button class="add-card" hx-post="/ui/task/create" hx-target="#board"
                     hx-vals='{{"status":"{status}"}}'>+ Add task</button>
                   </div>"##,
            ));
        }
        html.push_str("</div>");
        html
    }))
}

fn render_card(task: &Task, draft: bool) -> String {
    let class = if draft { "card draft" } else { "card" };
    let id = html_escape(&task.id);

    let title = if draft {
        // Drafts render as an inline title form; saving clears the draft state.
        format!(
            r##"<form hx-post="/ui/task/save" hx-target="#board">
                 <input type="hidden" name="taskId" value="{id}">
                 <input type="text" name="title" value="{title}" placeholder="Task title" autofocus>
               </form>"##,
            title = html_escape(&task.title),
        )
    } else {
        let display = if task.title.is_empty() {
            "Untitled".to_string()
        } else {
            html_escape(&task.title)
        };
        format!(
            r##"<div class="title" hx-get="/ui/task/{id}" hx-target="#board">{display}</div>"##
        )
    };

    let mut meta = String::new();
    if let Some(priority) = &task.priority {
        meta.push_str(&format!(
            r#"<span class="tag {p}">{p}</span> "#,
            p = html_escape(priority)
        ));
    }
    if let Some(due) = task.due_date {
        meta.push_str(&format!("due {}", format_due_date(due)));
    }
    let meta = if meta.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="meta">{meta}</div>"#)
    };

    format!(
        r##"<div class="{class}" id="card-{id}" draggable="true"
             hx-post="/ui/drag/start" hx-trigger="dragstart" hx-swap="none"
             hx-vals='{{"taskId":"{id}"}}'>
            {title}{meta}
            <div class="meta">
              <a href="#" hx-post="/ui/drag/over" hx-target="#board"
                 hx-vals='{{"targetType":"task","targetId":"{id}"}}'>here</a>
              <a href="#" hx-post="/ui/task/delete" hx-target="#board"
                 hx-vals='{{"taskId":"{id}"}}'>delete</a>
            </div>
           </div>"##,
    )
}

/// Board fragment, rendered from the live session.
async fn ui_board(
    State(state): State<AppState>,
    Identity(user_id): Identity,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    Ok(render_session(&state, &user_id))
}

/// Task detail fragment with fields and direct sub-tasks.
async fn ui_task_detail(
    State(state): State<AppState>,
    Identity(_user_id): Identity,
    Path(task_id): Path<String>,
) -> ApiResult<Html<String>> {
    let Some(task) = state.db.get_task(&task_id)? else {
        return Ok(Html(
            r#"<div class="empty-state">Task not found</div>"#.to_string(),
        ));
    };
    let sub_tasks = state.db.get_sub_tasks(&task_id)?;

    let subs = if sub_tasks.is_empty() {
        r#"<div class="empty-state">No sub-tasks</div>"#.to_string()
    } else {
        sub_tasks
            .iter()
            .map(|t| {
                format!(
                    r#"<div class="card"><div class="title">{}</div>
                       <div class="meta">{}</div></div>"#,
                    html_escape(&t.title),
                    html_escape(&t.status),
                )
            })
            .collect()
    };

    Ok(Html(format!(
        r##"<div class="detail">
            <a href="#" hx-get="/ui/board" hx-target="#board">&larr; Back to board</a>
            <h2>{title}</h2>
            <dl>
              <dt>Status</dt><dd>{status}</dd>
              <dt>Priority</dt><dd>{priority}</dd>
              <dt>Due</dt><dd>{due}</dd>
              <dt>Time tracked</dt><dd>{time}</dd>
              <dt>Description</dt><dd>{description}</dd>
            </dl>
            <h3>Sub-tasks</h3>
            {subs}
           </div>"##,
        title = html_escape(&task.title),
        status = html_escape(&task.status),
        priority = task.priority.as_deref().map(html_escape).unwrap_or_else(|| "-".to_string()),
        due = task.due_date.map(format_due_date).unwrap_or_else(|| "-".to_string()),
        time = format_total_time(task.total_time),
        description = task
            .description
            .as_deref()
            .map(html_escape)
            .unwrap_or_else(|| "-".to_string()),
    )))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DragStartForm {
    task_id: String,
}

async fn ui_drag_start(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Form(form): Form<DragStartForm>,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    state
        .sessions
        .with_state(&user_id, BoardState::default, |s| {
            s.drag_start(&form.task_id)
        });
    Ok(Html(String::new()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DropTargetForm {
    target_type: String,
    target_id: String,
}

impl DropTargetForm {
    fn target(&self) -> DropTarget {
        if self.target_type == "column" {
            DropTarget::Column(self.target_id.clone())
        } else {
            DropTarget::Task(self.target_id.clone())
        }
    }
}

async fn ui_drag_over(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Form(form): Form<DropTargetForm>,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    let target = form.target();
    state
        .sessions
        .with_state(&user_id, BoardState::default, |s| s.drag_over(&target));
    Ok(render_session(&state, &user_id))
}

/// Drop handler. Applies the final hover target, then persists the drag's
/// effects: the dragged task's status and the full board order.
async fn ui_drag_end(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Form(form): Form<DropTargetForm>,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    let target = form.target();
    let effects = state
        .sessions
        .with_state(&user_id, BoardState::default, |s| {
            s.drag_over(&target);
            s.drag_end()
        });

    if let Some(effects) = effects {
        state.db.update_status(&effects.task_id, &effects.status)?;
        state.db.set_task_order(&user_id, &effects.order)?;
        store_order_cache(&user_id, &effects.order);
        debug!(user_id = %user_id, task_id = %effects.task_id, status = %effects.status, "drag persisted");
    }
    Ok(render_session(&state, &user_id))
}

#[derive(Debug, Deserialize)]
struct CreateTaskForm {
    status: String,
}

async fn ui_task_create(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Form(form): Form<CreateTaskForm>,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    state
        .sessions
        .with_state(&user_id, BoardState::default, |s| {
            s.create_draft(&form.status, &user_id);
        });
    Ok(render_session(&state, &user_id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameTaskForm {
    task_id: String,
    title: String,
}

async fn ui_task_rename(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Form(form): Form<RenameTaskForm>,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    let draft = state
        .sessions
        .with_state(&user_id, BoardState::default, |s| {
            s.rename(&form.task_id, &form.title);
            s.is_draft(&form.task_id)
        });
    // Draft titles stay session-local until save; persisted cards write through.
    if !draft {
        state.db.update_title(&form.task_id, &form.title)?;
    }
    Ok(render_session(&state, &user_id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveTaskForm {
    task_id: String,
    #[serde(default)]
    title: Option<String>,
}

/// First save of a draft card: the card becomes a persisted task and the
/// board order is written in the same flow so the new id is never orphaned.
async fn ui_task_save(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Form(form): Form<SaveTaskForm>,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    let saved = state
        .sessions
        .with_state(&user_id, BoardState::default, |s| {
            if let Some(title) = &form.title {
                s.rename(&form.task_id, title);
            }
            s.save_payload(&form.task_id).map(|p| (p, s.order_ids()))
        });

    if let Some((payload, order)) = saved {
        state.db.upsert_task(&payload)?;
        state.db.set_task_order(&user_id, &order)?;
        store_order_cache(&user_id, &order);
        debug!(user_id = %user_id, task_id = %payload.id, "task saved");
    }
    Ok(render_session(&state, &user_id))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteTaskForm {
    task_id: String,
}

async fn ui_task_delete(
    State(state): State<AppState>,
    Identity(user_id): Identity,
    Form(form): Form<DeleteTaskForm>,
) -> ApiResult<Html<String>> {
    ensure_session(&state, &user_id)?;
    let was_draft = state
        .sessions
        .with_state(&user_id, BoardState::default, |s| {
            let draft = s.is_draft(&form.task_id);
            s.remove(&form.task_id);
            draft
        });

    // Drafts never reached the store, so only persisted cards generate traffic.
    if !was_draft {
        state.db.delete_task(&form.task_id)?;
        if let Some(cache) = OrderCache::for_user(&user_id) {
            if let Err(e) = cache.scrub(&form.task_id) {
                warn!(user_id = %user_id, error = %e, "order cache scrub failed");
            }
        }
    }
    Ok(render_session(&state, &user_id))
}

fn store_order_cache(user_id: &str, order: &[String]) {
    if let Some(cache) = OrderCache::for_user(user_id) {
        if let Err(e) = cache.store(order) {
            warn!(user_id = %user_id, error = %e, "order cache write failed");
        }
    }
}

fn format_due_date(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_total_time(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    if hours > 0 {
        format!("{}h {:02}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

//! Core wire and domain types.

use serde::{Deserialize, Serialize};

/// Board columns, in display order. Status is stored as free text so the
/// schema survives column renames; these are the columns the board renders.
pub const STATUS_COLUMNS: [&str; 4] = ["todo", "in-progress", "test", "complete"];

/// Human labels for the board columns, index-aligned with [`STATUS_COLUMNS`].
pub const STATUS_LABELS: [&str; 4] = ["To Do", "In Progress", "Test", "Complete"];

/// Recognized priority values, highest first. Stored as free text; anything
/// else renders unstyled.
pub const PRIORITIES: [&str; 4] = ["urgent", "high", "normal", "low"];

/// Collision-resistant id for a new task.
pub fn new_task_id() -> String {
    cuid2::create_id()
}

/// A task row as served to clients. Timestamps are unix epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: String,
    pub priority: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<i64>,
    /// Accumulated time on the task, in seconds.
    pub total_time: f64,
    pub created_by_id: String,
    pub parent_id: Option<String>,
    /// True while the task has never been saved with a title.
    pub initial: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Task {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Payload for upsertTask. The client supplies the id; on conflict only
/// title and status are refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpsert {
    pub id: String,
    pub title: String,
    pub status: String,
    pub created_by_id: String,
    #[serde(default)]
    pub initial: bool,
    #[serde(default)]
    pub total_time: f64,
    #[serde(default)]
    pub parent_id: Option<String>,
}

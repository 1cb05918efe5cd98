//! Task CRUD operations.
//!
//! Field updates are last-write-wins and silently no-op for unknown ids;
//! the database layer is the only serialization point. Deleting a task
//! cascades to its descendants and scrubs the owner's task order in the
//! same transaction.

use super::users::scrub_task_order;
use super::{Database, now_ms};
use crate::types::{Task, TaskUpsert};
use anyhow::Result;
use rusqlite::{Connection, Row, params};

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let initial: i64 = row.get("initial")?;

    Ok(Task {
        id: row.get("id")?,
        title: row.get("title")?,
        status: row.get("status")?,
        priority: row.get("priority")?,
        description: row.get("description")?,
        due_date: row.get("due_date")?,
        total_time: row.get("total_time")?,
        created_by_id: row.get("created_by")?,
        parent_id: row.get("parent_id")?,
        initial: initial != 0,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Insert a task, or on id conflict update only title and status.
    /// Everything else keeps its stored value, so repeated saves of an
    /// unchanged payload are idempotent.
    pub fn upsert_task(&self, input: &TaskUpsert) -> Result<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tasks (
                    id, title, status, total_time, created_by, parent_id, initial,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                ON CONFLICT(id) DO UPDATE SET
                    title = excluded.title,
                    status = excluded.status,
                    updated_at = excluded.updated_at",
                params![
                    &input.id,
                    &input.title,
                    &input.status,
                    input.total_time,
                    &input.created_by_id,
                    &input.parent_id,
                    input.initial,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    /// Get a task by id.
    pub fn get_task(&self, task_id: &str) -> Result<Option<Task>> {
        self.with_conn(|conn| get_task_internal(conn, task_id))
    }

    /// All top-level tasks owned by the given user, in creation order.
    /// This is the "query order" that reconciliation prepends new tasks in.
    pub fn get_users_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM tasks
                 WHERE created_by = ?1 AND parent_id IS NULL
                 ORDER BY created_at",
            )?;
            let tasks = stmt
                .query_map(params![user_id], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tasks)
        })
    }

    /// Direct sub-tasks of a task, in creation order.
    pub fn get_sub_tasks(&self, parent_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM tasks WHERE parent_id = ?1 ORDER BY created_at",
            )?;
            let tasks = stmt
                .query_map(params![parent_id], parse_task_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(tasks)
        })
    }

    /// Update a task's title.
    pub fn update_title(&self, task_id: &str, title: &str) -> Result<bool> {
        self.update_field(task_id, "title", &title)
    }

    /// Update a task's status.
    pub fn update_status(&self, task_id: &str, status: &str) -> Result<bool> {
        self.update_field(task_id, "status", &status)
    }

    /// Update a task's priority.
    pub fn update_priority(&self, task_id: &str, priority: &str) -> Result<bool> {
        self.update_field(task_id, "priority", &priority)
    }

    /// Update a task's description.
    pub fn update_description(&self, task_id: &str, description: &str) -> Result<bool> {
        self.update_field(task_id, "description", &description)
    }

    /// Update a task's due date (epoch milliseconds).
    pub fn update_due_date(&self, task_id: &str, due_date_ms: i64) -> Result<bool> {
        self.update_field(task_id, "due_date", &due_date_ms)
    }

    /// Update a task's total tracked time (seconds, absolute value).
    pub fn update_total_time(&self, task_id: &str, total_time: f64) -> Result<bool> {
        self.update_field(task_id, "total_time", &total_time)
    }

    /// Targeted single-field update. Returns false (not an error) when the
    /// id matches no row.
    fn update_field(&self, task_id: &str, column: &str, value: &dyn rusqlite::ToSql) -> Result<bool> {
        // column is always one of our own literals, never caller input
        let sql = format!("UPDATE tasks SET {} = ?1, updated_at = ?2 WHERE id = ?3", column);
        self.with_conn(|conn| {
            let updated = conn.execute(&sql, params![value, now_ms(), task_id])?;
            Ok(updated > 0)
        })
    }

    /// Delete a task and all of its descendant sub-tasks, and scrub the
    /// deleted id from the owner's task order. Unknown ids are a no-op.
    /// Returns the number of rows deleted.
    pub fn delete_task(&self, task_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(task) = get_task_internal(&tx, task_id)? else {
                return Ok(0);
            };

            // The CTE finds the task plus everything reachable via parent_id
            let deleted = tx.execute(
                "WITH RECURSIVE descendants AS (
                    SELECT ?1 AS id
                    UNION ALL
                    SELECT t.id FROM tasks t
                    INNER JOIN descendants d ON t.parent_id = d.id
                )
                DELETE FROM tasks WHERE id IN (SELECT id FROM descendants)",
                params![task_id],
            )?;

            // Only top-level ids appear in the order list
            if task.parent_id.is_none() {
                scrub_task_order(&tx, &task.created_by_id, task_id)?;
            }

            tx.commit()?;
            Ok(deleted)
        })
    }
}

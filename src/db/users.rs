//! User rows and the per-user task order.
//!
//! Users mirror the external identity provider: the row's id IS the
//! provider's user id, created on first authenticated visit. The board
//! ordering lives here as a JSON array column, owned wholesale by the
//! updateTaskOrder procedure.

use super::{Database, now_ms};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

impl Database {
    /// Ensure a user row exists for the given identity.
    /// Returns true if the row was created, false if it already existed.
    pub fn ensure_user(&self, user_id: &str) -> Result<bool> {
        let now = now_ms();
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, created_at, updated_at) VALUES (?1, ?2, ?2)
                 ON CONFLICT(id) DO NOTHING",
                params![user_id, now],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Get the user's persisted task order, or None when the user has never
    /// saved one (or does not exist).
    pub fn get_task_order(&self, user_id: &str) -> Result<Option<Vec<String>>> {
        self.with_conn(|conn| get_task_order_internal(conn, user_id))
    }

    /// Overwrite the user's task order wholesale.
    /// Silent no-op for unknown users, matching the update semantics of the
    /// rest of the store.
    pub fn set_task_order(&self, user_id: &str, order: &[String]) -> Result<()> {
        let json = serde_json::to_string(order)?;
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET task_order = ?1, updated_at = ?2 WHERE id = ?3",
                params![json, now, user_id],
            )?;
            Ok(())
        })
    }
}

/// Read a user's task order using an existing connection.
pub(super) fn get_task_order_internal(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<Vec<String>>> {
    let json: Option<Option<String>> = conn
        .query_row(
            "SELECT task_order FROM users WHERE id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    match json.flatten() {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

/// Remove a task id from a user's persisted order, if present.
/// Used by delete to keep the order free of stale ids.
pub(super) fn scrub_task_order(conn: &Connection, user_id: &str, task_id: &str) -> Result<bool> {
    let Some(order) = get_task_order_internal(conn, user_id)? else {
        return Ok(false);
    };

    if !order.iter().any(|id| id == task_id) {
        return Ok(false);
    }

    let scrubbed: Vec<&String> = order.iter().filter(|id| id.as_str() != task_id).collect();
    conn.execute(
        "UPDATE users SET task_order = ?1, updated_at = ?2 WHERE id = ?3",
        params![serde_json::to_string(&scrubbed)?, now_ms(), user_id],
    )?;
    Ok(true)
}

//! File-backed order cache.
//!
//! Keeps the last known board order per user on local disk so a board can
//! paint before the server round-trip completes. The server order field is
//! always authoritative; this cache is read only as a fallback and rewritten
//! after every persisted reorder.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

pub struct OrderCache {
    path: PathBuf,
}

impl OrderCache {
    /// Cache under the platform data directory, one file per user.
    /// Returns `None` when the platform has no data directory.
    pub fn for_user(user_id: &str) -> Option<Self> {
        let dir = dirs::data_local_dir()?.join("taskboard");
        Some(Self {
            path: dir.join(format!("order-{}.json", sanitize(user_id))),
        })
    }

    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Last cached order, if any. Unreadable or corrupt files read as
    /// absent; the cache never fails a board load.
    pub fn load(&self) -> Option<Vec<String>> {
        let raw = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(order) => Some(order),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "discarding corrupt order cache");
                None
            }
        }
    }

    pub fn store(&self, order: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating cache directory {}", parent.display()))?;
        }
        let json = serde_json::to_string(order)?;
        fs::write(&self.path, json)
            .with_context(|| format!("writing order cache {}", self.path.display()))
    }

    /// Drop one task id from the cached order, typically after a delete.
    pub fn scrub(&self, task_id: &str) -> Result<()> {
        let Some(mut order) = self.load() else {
            return Ok(());
        };
        let before = order.len();
        order.retain(|id| id != task_id);
        if order.len() != before {
            self.store(&order)?;
        }
        Ok(())
    }
}

fn sanitize(user_id: &str) -> String {
    user_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

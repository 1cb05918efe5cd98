//! SQLite-backed store for the board.
//!
//! One connection behind a mutex; every RPC mutation and board flow
//! funnels through it, so single-field updates serialize without version
//! tokens.

pub mod tasks;
pub mod users;

use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Cloneable handle to the board store.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the store at `path` and bring the schema up to date.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        // WAL keeps board loads from blocking behind mutations
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;
        Self::migrate(conn)
    }

    /// In-memory store for tests. No WAL here; foreign keys are still
    /// needed for the parent_id self-reference.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::migrate(conn)
    }

    fn migrate(mut conn: Connection) -> Result<Self> {
        embedded::migrations::runner().run(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with shared access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().unwrap();
        f(&conn)
    }

    /// Run `f` with exclusive access, for multi-statement transactions
    /// (delete-with-order-scrub is the one flow that needs this).
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().unwrap();
        f(&mut conn)
    }
}

/// Current time as unix epoch milliseconds, the timestamp unit used across
/// the schema and the wire.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

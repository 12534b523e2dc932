//! Thin `Arc<Mutex<Connection>>` wrapper. `rusqlite::Connection` is `Send`
//! but not `Sync`, and is not safe to share without one guard per access,
//! so every backend type keeps its own clone of this handle rather than
//! holding a raw `Connection`.

use placemark_core::error::CoreError;
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct SqliteHandle {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteHandle {
    pub fn open(dsn: &str) -> Result<Self, CoreError> {
        let conn = if dsn == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(dsn)
        }
        .map_err(|e| CoreError::Persistence(format!("failed to open sqlite database: {e}")))?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|e| CoreError::Persistence(format!("failed to set journal_mode: {e}")))?;

        let handle = SqliteHandle { conn: Arc::new(Mutex::new(conn)) };
        handle.run_migrations()?;
        Ok(handle)
    }

    fn run_migrations(&self) -> Result<(), CoreError> {
        // Safe to assume uncontended: this handle is freshly constructed
        // and not yet shared.
        let conn = self.conn.try_lock().expect("freshly opened connection is uncontended");
        crate::schema::create_tables(&conn)
    }
}

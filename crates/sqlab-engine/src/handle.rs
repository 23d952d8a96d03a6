//! Database handle and runtime loading
//!
//! The handle wraps the session's only connection. It is created by a
//! [`RuntimeLoader`], owned by the engine and closed when the engine closes.

use crate::config::EngineConfig;
use crate::error::EngineError;
use rusqlite::{Connection, InterruptHandle};
use std::time::Instant;

/// The live in-memory database of one session
#[derive(Debug)]
pub struct DatabaseHandle {
    conn: Connection,
    opened_at: Instant,
}

impl DatabaseHandle {
    /// Open a fresh in-memory database configured for the sandbox
    ///
    /// # Errors
    /// `EngineError::Runtime` if the engine cannot open or configure the database.
    pub fn open_in_memory(config: &EngineConfig) -> Result<Self, EngineError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", config.enforce_foreign_keys)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn,
            opened_at: Instant::now(),
        }
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub(crate) fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Time since the database was opened
    #[must_use]
    pub fn age(&self) -> std::time::Duration {
        self.opened_at.elapsed()
    }

    /// Close the connection, reporting engine errors
    ///
    /// # Errors
    /// `EngineError::Runtime` if SQLite refuses to close; the connection is
    /// still released when the returned value drops.
    pub fn close(self) -> Result<(), EngineError> {
        self.conn
            .close()
            .map_err(|(_, err)| EngineError::Runtime(err.to_string()))
    }
}

/// Loads the embedded runtime and opens a database
///
/// Loading is the only asynchronous step of the engine lifecycle.
#[async_trait::async_trait]
pub trait RuntimeLoader: Send + Sync {
    /// Open a fresh, empty database
    async fn open(&self, config: &EngineConfig) -> Result<DatabaseHandle, EngineError>;
}

/// Bundled SQLite, in memory
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryRuntime;

#[async_trait::async_trait]
impl RuntimeLoader for InMemoryRuntime {
    async fn open(&self, config: &EngineConfig) -> Result<DatabaseHandle, EngineError> {
        let config = config.clone();
        tokio::task::spawn_blocking(move || DatabaseHandle::open_in_memory(&config))
            .await
            .map_err(|e| EngineError::Runtime(format!("runtime loader task failed: {e}")))?
    }
}

//! The sandbox query engine
//!
//! One engine owns one in-memory database for the life of a session.
//! Lifecycle state lives behind an `RwLock`, the database behind a `Mutex`
//! that doubles as the single-flight queue. The state lock is never held
//! while waiting for the database lock.

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::executor;
use crate::handle::{DatabaseHandle, InMemoryRuntime, RuntimeLoader};
use crate::state_machine;
use crate::types::{EngineState, EngineStats, QueryResult, SessionId};
use parking_lot::{Mutex, RwLock};
use rusqlite::InterruptHandle;
use sqlab_schema::{ProvisionReport, Provisioner};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// SQL sandbox session
pub struct QueryEngine {
    session_id: SessionId,
    config: EngineConfig,
    loader: Arc<dyn RuntimeLoader>,
    provisioner: Provisioner,
    state: RwLock<EngineState>,
    db: Mutex<Option<DatabaseHandle>>,
    interrupt: Mutex<Option<InterruptHandle>>,
    cancel: Arc<AtomicBool>,
    stats: Mutex<EngineStats>,
}

impl QueryEngine {
    /// Engine over bundled in-memory SQLite and the standard datasets
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_loader(config, Arc::new(InMemoryRuntime))
    }

    /// Engine with a custom runtime loader
    #[must_use]
    pub fn with_loader(config: EngineConfig, loader: Arc<dyn RuntimeLoader>) -> Self {
        Self {
            session_id: SessionId::new(),
            config,
            loader,
            provisioner: Provisioner::standard(),
            state: RwLock::new(EngineState::Uninitialized),
            db: Mutex::new(None),
            interrupt: Mutex::new(None),
            cancel: Arc::new(AtomicBool::new(false)),
            stats: Mutex::new(EngineStats::default()),
        }
    }

    /// Replace the dataset registry used at startup
    #[must_use]
    pub fn with_provisioner(mut self, provisioner: Provisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Load the runtime, provision the datasets and become `Ready`
    ///
    /// # Errors
    /// - `Config` if the configuration is out of range (state unchanged)
    /// - `Unavailable` if called twice, or if `close` ran while loading
    /// - `Runtime` / `Provisioning` on startup failure; the engine is then `Closed`
    pub async fn start(&self) -> Result<ProvisionReport, EngineError> {
        self.config.validate()?;
        self.advance(EngineState::Uninitialized, EngineState::Loading)?;
        tracing::info!("Session {} loading", self.session_id);

        match self.load_and_provision().await {
            Ok((handle, report)) => self.install(handle).map(|()| report),
            Err(err) => {
                tracing::warn!("Session {} failed to start: {}", self.session_id, err);
                self.close();
                Err(err)
            }
        }
    }

    async fn load_and_provision(&self) -> Result<(DatabaseHandle, ProvisionReport), EngineError> {
        let handle = self.loader.open(&self.config).await?;
        let provisioner = self.provisioner;

        let (handle, outcome) = tokio::task::spawn_blocking(move || {
            let mut handle = handle;
            let outcome = provisioner.provision(handle.connection_mut());
            (handle, outcome)
        })
        .await
        .map_err(|e| EngineError::Runtime(format!("provisioning task failed: {e}")))?;

        // `handle` drops here on failure
        let report = outcome?;
        Ok((handle, report))
    }

    fn install(&self, handle: DatabaseHandle) -> Result<(), EngineError> {
        *self.interrupt.lock() = Some(handle.interrupt_handle());
        *self.db.lock() = Some(handle);

        if let Err(err) = self.advance(EngineState::Loading, EngineState::Ready) {
            // closed while loading
            self.interrupt.lock().take();
            self.db.lock().take();
            return Err(err);
        }
        tracing::info!("Session {} ready", self.session_id);
        Ok(())
    }

    /// Run one submission, queueing behind any in-flight one
    ///
    /// SQL problems come back as `Ok(QueryResult::Failure(_))`.
    ///
    /// # Errors
    /// `Unavailable` outside `Ready`, including when `close` interrupts the call.
    pub fn execute(&self, query: &str) -> Result<QueryResult, EngineError> {
        let slot = self.db.lock();
        self.run_locked(slot.as_ref(), query)
    }

    /// Run one submission, refusing if another is in flight
    ///
    /// # Errors
    /// `Busy` when a submission holds the database, `Unavailable` once closing
    /// has begun; otherwise as [`Self::execute`].
    pub fn try_execute(&self, query: &str) -> Result<QueryResult, EngineError> {
        let Some(slot) = self.db.try_lock() else {
            // `close` may be the holder
            let state = self.state();
            if state.is_terminal() {
                return Err(EngineError::Unavailable { state });
            }
            self.stats.lock().rejected += 1;
            tracing::debug!("Submission rejected: engine busy");
            return Err(EngineError::Busy);
        };
        self.run_locked(slot.as_ref(), query)
    }

    fn run_locked(
        &self,
        handle: Option<&DatabaseHandle>,
        query: &str,
    ) -> Result<QueryResult, EngineError> {
        let Some(handle) = handle else {
            return Err(EngineError::Unavailable {
                state: self.state(),
            });
        };

        self.advance(EngineState::Ready, EngineState::Executing)?;
        tracing::debug!("Executing: {}", query.trim());
        let result = executor::execute_query(handle.connection(), query, &self.config, &self.cancel);
        self.advance(EngineState::Executing, EngineState::Ready)?;

        let mut stats = self.stats.lock();
        stats.executions += 1;
        if let Some(err) = result.error() {
            stats.failures += 1;
            if err.is_timeout() {
                stats.timeouts += 1;
            }
        }
        Ok(result)
    }

    /// Release the database and enter `Closed`
    ///
    /// Interrupts an in-flight submission. Idempotent.
    pub fn close(&self) {
        {
            let mut state = self.state.write();
            if state.is_terminal() {
                return;
            }
            if let Err(err) = state_machine::validate_transition(*state, EngineState::Closed) {
                tracing::warn!("{}", err);
            }
            *state = EngineState::Closed;
        }

        self.cancel.store(true, Ordering::SeqCst);
        if let Some(interrupt) = self.interrupt.lock().take() {
            interrupt.interrupt();
        }
        if let Some(handle) = self.db.lock().take() {
            if let Err(err) = handle.close() {
                tracing::warn!("Session {}: {}", self.session_id, err);
            }
        }
        tracing::info!("Session {} closed", self.session_id);
    }

    /// Move `expected -> to`, or report the actual state as unavailable
    fn advance(&self, expected: EngineState, to: EngineState) -> Result<(), EngineError> {
        let mut state = self.state.write();
        if *state != expected {
            return Err(EngineError::Unavailable { state: *state });
        }
        state_machine::validate_transition(*state, to)?;
        *state = to;
        Ok(())
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.state.read()
    }

    /// Whether submissions are currently accepted
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state().accepts_queries()
    }

    /// Snapshot of execution counters
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats.lock().clone()
    }

    /// Session identifier
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("session_id", &self.session_id)
            .field("state", &self.state())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Drop for QueryEngine {
    fn drop(&mut self) {
        self.close();
    }
}

//! Error types for the sandbox engine
//!
//! Two layers:
//! - [`QueryError`]: per-submission failures, carried inside
//!   `QueryResult::Failure`; the engine stays `Ready`
//! - [`EngineError`]: lifecycle and programming errors returned as `Err`

use crate::types::EngineState;
use sqlab_schema::ProvisionError;

/// Message shown to the user when startup fails
pub const INIT_FAILURE_MESSAGE: &str = "database failed to initialize";

/// Per-submission failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Blank submission
    #[error("please enter a SQL query")]
    EmptyQuery,

    /// Engine rejected the SQL; message preserved from the engine
    #[error("{message}")]
    Sql {
        /// Engine message text
        message: String,
    },

    /// Evaluation exceeded the configured wall-clock limit
    #[error("query timed out after {limit_ms}ms")]
    Timeout {
        /// Configured limit
        limit_ms: u64,
    },

    /// More than one statement while multi-statement input is rejected
    #[error("only one statement may be submitted at a time")]
    MultipleStatements,
}

impl QueryError {
    /// Convert an engine error, keeping its message text
    #[must_use]
    pub fn from_engine(err: &rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::MultipleStatement => Self::MultipleStatements,
            rusqlite::Error::SqliteFailure(_, Some(message)) => Self::Sql {
                message: message.clone(),
            },
            other => Self::Sql {
                message: other.to_string(),
            },
        }
    }

    /// Message text for inline display
    #[inline]
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the failure came from the time limit
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Engine lifecycle error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Provisioning failed; fatal for the session
    #[error("provisioning failed: {0}")]
    Provisioning(#[from] ProvisionError),

    /// Embedded runtime could not be loaded or released
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Operation attempted outside `Ready`
    #[error("engine unavailable in state {state}")]
    Unavailable {
        /// State at the time of the call
        state: EngineState,
    },

    /// Another submission is in flight
    #[error("engine busy: a query is already executing")]
    Busy,

    /// Lifecycle transition not permitted
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition {
        /// Current state
        from: EngineState,
        /// Requested state
        to: EngineState,
    },

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Export could not be written
    #[error("export failed: {0}")]
    Export(#[from] std::io::Error),
}

impl EngineError {
    /// Whether the session cannot continue
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Provisioning(_) | Self::Runtime(_))
    }

    /// Whether the error is meant for the end user rather than a UI-state bug
    #[inline]
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Provisioning(_) | Self::Runtime(_) | Self::Busy | Self::Export(_)
        )
    }

    /// Text to show the end user
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Provisioning(_) | Self::Runtime(_) => INIT_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Runtime(value.to_string())
    }
}

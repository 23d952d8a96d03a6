//! Core types for the sandbox engine
//!
//! Defines:
//! - Engine lifecycle states and session identity
//! - Cell values and result sets
//! - The tagged `QueryResult` returned by every execution

use crate::error::QueryError;
use rusqlite::types::ValueRef;
use serde::{Serialize, Serializer};
use std::fmt;
use ulid::Ulid;

/// Lifecycle state of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EngineState {
    /// Constructed, nothing loaded
    Uninitialized,
    /// Runtime loading and provisioning in progress
    Loading,
    /// Accepting submissions
    Ready,
    /// A submission is running
    Executing,
    /// Handle released; terminal
    Closed,
}

impl EngineState {
    /// Whether submissions are accepted
    #[inline]
    #[must_use]
    pub fn accepts_queries(self) -> bool {
        self == Self::Ready
    }

    /// Whether the state can never be left
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Identifier of one sandbox session (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionId(pub Ulid);

impl SessionId {
    /// Generate new session ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One value of a result row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// SQL `NULL`
    Null,
    /// Integer
    Integer(i64),
    /// Real
    Real(f64),
    /// Text
    Text(String),
    /// Blob, serialized as lowercase hex
    #[serde(serialize_with = "serialize_blob")]
    Blob(Vec<u8>),
}

fn serialize_blob<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

impl CellValue {
    /// Plain text form used for export: `NULL` becomes the empty string
    #[must_use]
    pub fn to_field(&self) -> String {
        match self {
            Self::Null => String::new(),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Blob(v) => f.write_str(&hex::encode(v)),
        }
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(v) => Self::Integer(v),
            ValueRef::Real(v) => Self::Real(v),
            ValueRef::Text(text) => Self::Text(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(bytes) => Self::Blob(bytes.to_vec()),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Columns and rows produced by one statement
///
/// Column order is the engine's order and names may repeat. Every row holds
/// exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    /// Column names
    pub columns: Vec<String>,
    /// Row tuples
    pub rows: Vec<Vec<CellValue>>,
}

impl ResultSet {
    /// Build a result set
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    #[inline]
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Whether the statement returned no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Successful execution output
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutput {
    /// A statement exposed a result set (possibly with zero rows)
    ResultSet(ResultSet),
    /// No statement produced a result set
    NoOutput {
        /// Statements executed
        statements: usize,
        /// Rows changed by DML
        rows_affected: usize,
    },
}

/// Outcome of one submission: success or failure, never both
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Executed
    Success(QueryOutput),
    /// Rejected or failed; the engine stays usable
    Failure(QueryError),
}

impl QueryResult {
    /// Whether the submission succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Result set, when the submission produced one
    #[must_use]
    pub fn result_set(&self) -> Option<&ResultSet> {
        match self {
            Self::Success(QueryOutput::ResultSet(set)) => Some(set),
            _ => None,
        }
    }

    /// Error, when the submission failed
    #[must_use]
    pub fn error(&self) -> Option<&QueryError> {
        match self {
            Self::Failure(err) => Some(err),
            Self::Success(_) => None,
        }
    }

    /// One-line status for display
    ///
    /// Keeps "executed, no output" apart from "0 rows returned".
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Success(QueryOutput::ResultSet(set)) => match set.row_count() {
                1 => "1 row returned".to_string(),
                n => format!("{n} rows returned"),
            },
            Self::Success(QueryOutput::NoOutput { rows_affected, .. }) => {
                format!("Query executed successfully, no output ({rows_affected} rows affected)")
            }
            Self::Failure(err) => err.to_string(),
        }
    }
}

/// Execution counters for one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Submissions that reached the engine
    pub executions: u64,
    /// Submissions that ended in a failure result
    pub failures: u64,
    /// Failures caused by the wall-clock limit
    pub timeouts: u64,
    /// Submissions turned away because another was in flight
    pub rejected: u64,
}

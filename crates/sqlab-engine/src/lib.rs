//! SQLab Query Execution Engine (sqlab-engine)
//!
//! Embeds SQLite in memory, provisions the sample datasets and runs
//! user-typed SQL one submission at a time:
//! 1. **Start**: load the runtime, provision, enter `Ready`
//! 2. **Execute**: every outcome normalized into a [`QueryResult`]
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use sqlab_engine::prelude::*;
//!
//! let engine = QueryEngine::new(EngineConfig::default());
//! engine.start().await?;
//!
//! let result = engine.execute("SELECT * FROM employees;")?;
//! if let Some(set) = result.result_set() {
//!     println!("{}", to_csv(set));
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod handle;
pub mod render;
pub mod state_machine;
pub mod types;

mod executor;

// Re-exports
pub use config::*;
pub use engine::QueryEngine;
pub use error::*;
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::config::{EngineConfig, MultiStatementPolicy};
    pub use crate::engine::QueryEngine;
    pub use crate::error::{EngineError, QueryError};
    pub use crate::export::{to_csv, to_csv_quoted, to_json, write_csv};
    pub use crate::handle::{DatabaseHandle, InMemoryRuntime, RuntimeLoader};
    pub use crate::render::render_table;
    pub use crate::types::{CellValue, EngineState, QueryOutput, QueryResult, ResultSet};
    pub use sqlab_schema::ProvisionReport;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Check if running with strict debugging enabled
#[must_use]
pub const fn strict_debug() -> bool {
    cfg!(feature = "strict-debug")
}

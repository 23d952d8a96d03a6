//! SQLab Schema Provisioner
//!
//! Compiled-in sample datasets and the provisioning pass that materializes
//! them into a fresh SQLite connection.
//!
//! # Datasets
//!
//! - **basic_employee**: a single `employees` table
//! - **ecommerce**: `users`, `products` and `orders` (orders reference users)
//! - **library**: `authors`, `members`, `books` and `borrowings`
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlab_schema::provision;
//!
//! let mut conn = rusqlite::Connection::open_in_memory()?;
//! let report = provision(&mut conn)?;
//! assert_eq!(report.datasets, 3);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod ddl;
pub mod error;
pub mod provisioner;
pub mod registry;
pub mod types;

pub use error::ProvisionError;
pub use provisioner::{provision, ProvisionReport, Provisioner};
pub use registry::{
    dataset, find_table, sample_query, standard_registry, validate_registry, BASIC_EMPLOYEE,
    DATASETS, ECOMMERCE, LIBRARY,
};
pub use types::{ColumnDef, ColumnType, Difficulty, SampleDataset, SeedValue, TableDefinition};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the provisioner
    pub use crate::error::ProvisionError;
    pub use crate::provisioner::{provision, ProvisionReport, Provisioner};
    pub use crate::registry::{dataset, sample_query, standard_registry};
    pub use crate::types::{Difficulty, SampleDataset, TableDefinition};
}

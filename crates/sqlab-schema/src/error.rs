//! Error types for the Schema Provisioner
//!
//! Every variant is fatal for sandbox startup: provisioning aborts on the
//! first problem and nothing is retried.

/// Provisioning failure
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Two datasets share an id
    #[error("duplicate dataset id: {0}")]
    DuplicateDataset(String),

    /// Two tables share a name
    #[error("duplicate table name: {0}")]
    DuplicateTable(String),

    /// Seed row does not have one value per declared column
    #[error("seed row {row} of table {table} has {found} values, expected {expected}")]
    RowArity {
        /// Table holding the row
        table: String,
        /// Zero-based row index
        row: usize,
        /// Declared column count
        expected: usize,
        /// Values present in the row
        found: usize,
    },

    /// Seed value kind does not match the column type
    #[error("seed row {row} of table {table}: column {column} cannot hold {value}")]
    SeedType {
        /// Table holding the row
        table: String,
        /// Zero-based row index
        row: usize,
        /// Offending column
        column: String,
        /// Description of the rejected value
        value: String,
    },

    /// Tables of a dataset reference each other in a loop
    #[error("reference cycle among tables of dataset {dataset}")]
    ReferenceCycle {
        /// Dataset id
        dataset: String,
    },

    /// A creation or insertion statement was rejected by the engine
    #[error("statement failed in {dataset}.{table}: {source} [{statement}]")]
    Statement {
        /// Dataset id
        dataset: String,
        /// Table being created or seeded
        table: String,
        /// Failing statement text
        statement: String,
        /// Engine error
        source: rusqlite::Error,
    },

    /// Opening or committing the seeding transaction failed
    #[error("seeding transaction failed: {0}")]
    Transaction(#[source] rusqlite::Error),
}

impl ProvisionError {
    /// Build a statement failure
    #[must_use]
    pub fn statement(
        dataset: &str,
        table: &str,
        statement: &str,
        source: rusqlite::Error,
    ) -> Self {
        Self::Statement {
            dataset: dataset.to_string(),
            table: table.to_string(),
            statement: statement.to_string(),
            source,
        }
    }

    /// Failing statement text, if the error came from the engine
    #[must_use]
    pub fn failing_statement(&self) -> Option<&str> {
        match self {
            Self::Statement { statement, .. } => Some(statement),
            _ => None,
        }
    }

    /// True when the registry itself is malformed (caught before any SQL runs)
    #[inline]
    #[must_use]
    pub fn is_registry_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateDataset(_)
                | Self::DuplicateTable(_)
                | Self::RowArity { .. }
                | Self::SeedType { .. }
                | Self::ReferenceCycle { .. }
        )
    }
}

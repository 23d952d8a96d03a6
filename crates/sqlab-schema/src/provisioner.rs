//! Provisioning pass
//!
//! Creates and seeds every dataset of a registry inside one transaction on a
//! fresh connection. The first failing statement aborts the whole pass.

use crate::ddl::{create_table_sql, creation_order, insert_sql};
use crate::error::ProvisionError;
use crate::registry::{standard_registry, validate_registry};
use crate::types::SampleDataset;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Summary of a completed provisioning pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvisionReport {
    /// Datasets materialized
    pub datasets: usize,
    /// Tables created
    pub tables: usize,
    /// Seed rows inserted
    pub rows: usize,
    /// Wall-clock time spent
    pub elapsed: Duration,
}

/// Materializes a dataset registry into a connection
#[derive(Debug, Clone, Copy)]
pub struct Provisioner {
    registry: &'static [SampleDataset],
}

impl Provisioner {
    /// Provisioner over a custom registry
    #[inline]
    #[must_use]
    pub const fn new(registry: &'static [SampleDataset]) -> Self {
        Self { registry }
    }

    /// Provisioner over the standard datasets
    #[inline]
    #[must_use]
    pub fn standard() -> Self {
        Self::new(standard_registry())
    }

    /// Registry this provisioner materializes
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &'static [SampleDataset] {
        self.registry
    }

    /// Create and seed every dataset
    ///
    /// Declared references are enforced only if `conn` has `foreign_keys`
    /// switched on; the pass leaves that pragma as it finds it.
    ///
    /// # Arguments
    /// * `conn` - An open, empty connection
    ///
    /// # Errors
    /// - registry errors from [`validate_registry`], before any SQL runs
    /// - `ProvisionError::Statement` naming the first statement the engine rejected
    /// - `ProvisionError::Transaction` if the seeding transaction cannot open or commit
    ///
    /// On error the transaction is rolled back.
    pub fn provision(&self, conn: &mut Connection) -> Result<ProvisionReport, ProvisionError> {
        validate_registry(self.registry)?;

        let started = Instant::now();
        let mut report = ProvisionReport::default();
        let tx = conn.transaction().map_err(ProvisionError::Transaction)?;

        for dataset in self.registry {
            for table in creation_order(dataset)? {
                let ddl = create_table_sql(table);
                tracing::debug!("Creating {}.{}", dataset.id, table.name);
                tx.execute(&ddl, [])
                    .map_err(|e| ProvisionError::statement(dataset.id, table.name, &ddl, e))?;

                let insert = insert_sql(table);
                let mut stmt = tx
                    .prepare(&insert)
                    .map_err(|e| ProvisionError::statement(dataset.id, table.name, &insert, e))?;
                for row in table.rows {
                    stmt.execute(params_from_iter(row.iter()))
                        .map_err(|e| ProvisionError::statement(dataset.id, table.name, &insert, e))?;
                    report.rows += 1;
                }
                report.tables += 1;
            }
            report.datasets += 1;
        }

        tx.commit().map_err(ProvisionError::Transaction)?;
        report.elapsed = started.elapsed();

        tracing::info!(
            "Provisioned {} datasets ({} tables, {} rows) in {:?}",
            report.datasets,
            report.tables,
            report.rows,
            report.elapsed
        );
        Ok(report)
    }
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::standard()
    }
}

/// Provision the standard datasets into `conn`
///
/// # Errors
/// See [`Provisioner::provision`].
pub fn provision(conn: &mut Connection) -> Result<ProvisionReport, ProvisionError> {
    Provisioner::standard().provision(conn)
}

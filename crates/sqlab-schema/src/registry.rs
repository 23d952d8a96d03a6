//! Static dataset registry
//!
//! Registry order is provisioning order. Seed data is literal and never
//! changes, so every fresh database is seeded identically.

use crate::error::ProvisionError;
use crate::types::SeedValue::{Integer, Null, Real, Text};
use crate::types::{ColumnDef, Difficulty, SampleDataset, TableDefinition};
use std::collections::HashSet;

const EMPLOYEES: TableDefinition = TableDefinition {
    name: "employees",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::text("name"),
        ColumnDef::text("department"),
        ColumnDef::integer("salary"),
    ],
    rows: &[
        &[Integer(1), Text("John Smith"), Text("IT"), Integer(60000)],
        &[Integer(2), Text("Mary Johnson"), Text("HR"), Integer(55000)],
        &[Integer(3), Text("Bob Wilson"), Text("IT"), Integer(65000)],
    ],
};

const USERS: TableDefinition = TableDefinition {
    name: "users",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::text("name"),
        ColumnDef::text("email"),
        ColumnDef::integer("age"),
    ],
    rows: &[
        &[Integer(1), Text("John Doe"), Text("john@example.com"), Integer(30)],
        &[Integer(2), Text("Jane Smith"), Text("jane@example.com"), Integer(25)],
        &[Integer(3), Text("Bob Johnson"), Text("bob@example.com"), Integer(35)],
    ],
};

const ORDERS: TableDefinition = TableDefinition {
    name: "orders",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::integer("user_id").references("users"),
        ColumnDef::text("product"),
        ColumnDef::real("amount"),
        ColumnDef::text("date"),
    ],
    rows: &[
        &[Integer(1), Integer(1), Text("Laptop"), Real(999.99), Text("2024-01-15")],
        &[Integer(2), Integer(2), Text("Phone"), Real(699.99), Text("2024-01-16")],
        &[Integer(3), Integer(1), Text("Headphones"), Real(99.99), Text("2024-01-17")],
    ],
};

const PRODUCTS: TableDefinition = TableDefinition {
    name: "products",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::text("name"),
        ColumnDef::real("price"),
        ColumnDef::integer("stock"),
    ],
    rows: &[
        &[Integer(1), Text("Laptop"), Real(999.99), Integer(50)],
        &[Integer(2), Text("Phone"), Real(699.99), Integer(100)],
        &[Integer(3), Text("Headphones"), Real(99.99), Integer(200)],
    ],
};

const BOOKS: TableDefinition = TableDefinition {
    name: "books",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::text("title"),
        ColumnDef::integer("author_id").references("authors"),
        ColumnDef::text("genre"),
        ColumnDef::text("isbn"),
        ColumnDef::integer("published_year"),
    ],
    rows: &[
        &[
            Integer(1),
            Text("SQL Basics"),
            Integer(1),
            Text("Education"),
            Text("123-456-789"),
            Integer(2020),
        ],
        &[
            Integer(2),
            Text("Web Development"),
            Integer(2),
            Text("Technology"),
            Text("234-567-890"),
            Integer(2021),
        ],
        &[
            Integer(3),
            Text("Data Science"),
            Integer(1),
            Text("Education"),
            Text("345-678-901"),
            Integer(2022),
        ],
    ],
};

const AUTHORS: TableDefinition = TableDefinition {
    name: "authors",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::text("name"),
        ColumnDef::text("country"),
        ColumnDef::integer("books_written"),
    ],
    rows: &[
        &[Integer(1), Text("Alice Brown"), Text("USA"), Integer(10)],
        &[Integer(2), Text("Charlie Davis"), Text("UK"), Integer(5)],
    ],
};

const BORROWINGS: TableDefinition = TableDefinition {
    name: "borrowings",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::integer("book_id").references("books"),
        ColumnDef::integer("member_id").references("members"),
        ColumnDef::text("borrow_date"),
        ColumnDef::nullable_text("return_date"),
    ],
    rows: &[
        &[Integer(1), Integer(1), Integer(1), Text("2024-01-01"), Text("2024-01-15")],
        &[Integer(2), Integer(2), Integer(2), Text("2024-01-10"), Null],
    ],
};

const MEMBERS: TableDefinition = TableDefinition {
    name: "members",
    columns: &[
        ColumnDef::primary_key("id"),
        ColumnDef::text("name"),
        ColumnDef::text("membership_type"),
        ColumnDef::text("join_date"),
    ],
    rows: &[
        &[Integer(1), Text("David Wilson"), Text("Premium"), Text("2023-01-01")],
        &[Integer(2), Text("Emma Davis"), Text("Standard"), Text("2023-06-15")],
    ],
};

/// Single-table employee records
pub const BASIC_EMPLOYEE: SampleDataset = SampleDataset {
    id: "basic_employee",
    name: "Basic Employee Database",
    difficulty: Difficulty::Beginner,
    description: "Simple database for learning basic SQL queries",
    tables: &[EMPLOYEES],
};

/// Users, orders and products
pub const ECOMMERCE: SampleDataset = SampleDataset {
    id: "ecommerce",
    name: "E-commerce Database",
    difficulty: Difficulty::Intermediate,
    description: "Intermediate database with multiple related tables",
    tables: &[USERS, ORDERS, PRODUCTS],
};

/// Books, authors, borrowings and members
pub const LIBRARY: SampleDataset = SampleDataset {
    id: "library",
    name: "Library Management Database",
    difficulty: Difficulty::Advanced,
    description: "Advanced database with complex relationships",
    tables: &[BOOKS, AUTHORS, BORROWINGS, MEMBERS],
};

/// Every dataset, in provisioning order
pub static DATASETS: &[SampleDataset] = &[BASIC_EMPLOYEE, ECOMMERCE, LIBRARY];

/// The standard registry
#[inline]
#[must_use]
pub fn standard_registry() -> &'static [SampleDataset] {
    DATASETS
}

/// Look up a dataset by id
#[must_use]
pub fn dataset(id: &str) -> Option<&'static SampleDataset> {
    DATASETS.iter().find(|d| d.id == id)
}

/// Look up a table anywhere in the registry
#[must_use]
pub fn find_table(name: &str) -> Option<(&'static SampleDataset, &'static TableDefinition)> {
    DATASETS
        .iter()
        .find_map(|d| d.table(name).map(|table| (d, table)))
}

/// Query pre-filled by the explorer's table shortcut
///
/// Returns `None` for tables the registry does not declare.
#[must_use]
pub fn sample_query(table: &str) -> Option<String> {
    find_table(table).map(|(_, t)| format!("SELECT * FROM {};", t.name))
}

/// Check a registry before any SQL is issued
///
/// # Errors
/// - `ProvisionError::DuplicateDataset` if two datasets share an id
/// - `ProvisionError::DuplicateTable` if a table name repeats, across datasets too,
///   since every dataset lands in the same database
/// - seed layout errors from [`TableDefinition::validate`]
pub fn validate_registry(registry: &[SampleDataset]) -> Result<(), ProvisionError> {
    let mut ids = HashSet::new();
    let mut tables = HashSet::new();
    for dataset in registry {
        if !ids.insert(dataset.id) {
            return Err(ProvisionError::DuplicateDataset(dataset.id.to_string()));
        }
        for table in dataset.tables {
            if !tables.insert(table.name) {
                return Err(ProvisionError::DuplicateTable(table.name.to_string()));
            }
            table.validate()?;
        }
    }
    Ok(())
}

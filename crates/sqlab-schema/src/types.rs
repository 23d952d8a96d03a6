//! Dataset and table definitions
//!
//! All definitions are `&'static` constants so the registry can live in a
//! `static` and never changes at runtime.

use crate::error::ProvisionError;
use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use serde::Serialize;
use std::fmt;

/// Human difficulty label, ordered from easiest to hardest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Difficulty {
    /// Single table, basic queries
    Beginner,
    /// A few related tables
    Intermediate,
    /// Several tables with chained relationships
    Advanced,
}

impl Difficulty {
    /// Display label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Column storage type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 64-bit integer
    Integer,
    /// Double precision float
    Real,
    /// Text, always present in seed data
    Text,
    /// Text that may be `NULL` in seed data (e.g. a return date)
    NullableText,
}

impl ColumnType {
    /// SQL type name used in `CREATE TABLE`
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text | Self::NullableText => "TEXT",
        }
    }

    /// Whether a seed value of this kind may be stored in the column
    #[must_use]
    pub fn accepts(self, value: &SeedValue) -> bool {
        matches!(
            (self, value),
            (Self::Integer, SeedValue::Integer(_))
                | (Self::Real, SeedValue::Real(_))
                | (Self::Text | Self::NullableText, SeedValue::Text(_))
                | (Self::NullableText, SeedValue::Null)
        )
    }
}

/// Column declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnDef {
    /// Column name
    pub name: &'static str,
    /// Storage type
    #[serde(rename = "type")]
    pub ty: ColumnType,
    /// `INTEGER PRIMARY KEY` column
    pub primary_key: bool,
    /// Table this column points at, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<&'static str>,
}

impl ColumnDef {
    const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            primary_key: false,
            references: None,
        }
    }

    /// Integer primary key column
    #[must_use]
    pub const fn primary_key(name: &'static str) -> Self {
        Self {
            primary_key: true,
            ..Self::new(name, ColumnType::Integer)
        }
    }

    /// Integer column
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    /// Real column
    #[must_use]
    pub const fn real(name: &'static str) -> Self {
        Self::new(name, ColumnType::Real)
    }

    /// Text column
    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Text column allowing `NULL` seeds
    #[must_use]
    pub const fn nullable_text(name: &'static str) -> Self {
        Self::new(name, ColumnType::NullableText)
    }

    /// Mark the column as pointing at `table`
    #[must_use]
    pub const fn references(self, table: &'static str) -> Self {
        Self {
            references: Some(table),
            ..self
        }
    }

    /// Column clause for `CREATE TABLE`
    #[must_use]
    pub fn definition_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.ty.sql_type());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if let Some(target) = self.references {
            sql.push_str(&format!(" REFERENCES {target}(id)"));
        }
        sql
    }
}

/// Literal seed value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeedValue {
    /// Integer literal
    Integer(i64),
    /// Real literal
    Real(f64),
    /// Text literal
    Text(&'static str),
    /// SQL `NULL`
    Null,
}

impl SeedValue {
    /// Short kind name for error messages
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::Text(_) => "text",
            Self::Null => "null",
        }
    }
}

impl ToSql for SeedValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Self::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            Self::Real(v) => ToSqlOutput::Owned(Value::Real(*v)),
            Self::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Self::Null => ToSqlOutput::Owned(Value::Null),
        })
    }
}

/// Table with its literal seed rows
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TableDefinition {
    /// Table name
    pub name: &'static str,
    /// Columns in declaration order
    pub columns: &'static [ColumnDef],
    /// Seed rows, one value per column in declaration order
    #[serde(skip)]
    pub rows: &'static [&'static [SeedValue]],
}

impl TableDefinition {
    /// Column names in declaration order
    #[must_use]
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    /// Number of seed rows
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Tables this one points at, in column order, without repeats
    pub fn referenced_tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns
            .iter()
            .enumerate()
            .filter_map(|(idx, col)| {
                let target = col.references?;
                let seen = self.columns[..idx]
                    .iter()
                    .any(|prev| prev.references == Some(target));
                (!seen && target != self.name).then_some(target)
            })
    }

    /// Check every seed row against the column layout
    ///
    /// # Errors
    /// - `ProvisionError::RowArity` for a row with the wrong number of values
    /// - `ProvisionError::SeedType` for a value the column cannot hold
    pub fn validate(&self) -> Result<(), ProvisionError> {
        for (row_idx, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(ProvisionError::RowArity {
                    table: self.name.to_string(),
                    row: row_idx,
                    expected: self.columns.len(),
                    found: row.len(),
                });
            }
            for (column, value) in self.columns.iter().zip(row.iter()) {
                if !column.ty.accepts(value) {
                    return Err(ProvisionError::SeedType {
                        table: self.name.to_string(),
                        row: row_idx,
                        column: column.name.to_string(),
                        value: value.kind().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Named collection of tables offered for practice
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SampleDataset {
    /// Stable key
    pub id: &'static str,
    /// Display name
    pub name: &'static str,
    /// Difficulty label
    pub difficulty: Difficulty,
    /// Free-text description
    pub description: &'static str,
    /// Tables in declaration order
    pub tables: &'static [TableDefinition],
}

impl SampleDataset {
    /// Look up a table of this dataset by name
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&'static TableDefinition> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_definition_sql() {
        assert_eq!(
            ColumnDef::primary_key("id").definition_sql(),
            "id INTEGER PRIMARY KEY"
        );
        assert_eq!(ColumnDef::real("amount").definition_sql(), "amount REAL");
        assert_eq!(
            ColumnDef::integer("user_id")
                .references("users")
                .definition_sql(),
            "user_id INTEGER REFERENCES users(id)"
        );
        assert_eq!(
            ColumnDef::nullable_text("return_date").definition_sql(),
            "return_date TEXT"
        );
    }

    #[test]
    fn null_only_in_nullable_text() {
        assert!(ColumnType::NullableText.accepts(&SeedValue::Null));
        assert!(ColumnType::NullableText.accepts(&SeedValue::Text("2024-01-01")));
        assert!(!ColumnType::Text.accepts(&SeedValue::Null));
        assert!(!ColumnType::Integer.accepts(&SeedValue::Real(1.5)));
    }

    #[test]
    fn validate_rejects_short_row() {
        static COLUMNS: &[ColumnDef] = &[ColumnDef::primary_key("id"), ColumnDef::text("name")];
        static ROWS: &[&[SeedValue]] = &[&[SeedValue::Integer(1)]];
        let table = TableDefinition {
            name: "broken",
            columns: COLUMNS,
            rows: ROWS,
        };

        let err = table.validate().unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::RowArity {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn referenced_tables_skip_repeats_and_self() {
        static COLUMNS: &[ColumnDef] = &[
            ColumnDef::primary_key("id"),
            ColumnDef::integer("a").references("left"),
            ColumnDef::integer("b").references("left"),
            ColumnDef::integer("parent").references("node"),
            ColumnDef::integer("c").references("right"),
        ];
        let table = TableDefinition {
            name: "node",
            columns: COLUMNS,
            rows: &[],
        };

        let refs: Vec<_> = table.referenced_tables().collect();
        assert_eq!(refs, vec!["left", "right"]);
    }

    #[test]
    fn difficulty_is_ordered() {
        assert!(Difficulty::Beginner < Difficulty::Intermediate);
        assert!(Difficulty::Intermediate < Difficulty::Advanced);
        assert_eq!(Difficulty::Advanced.to_string(), "Advanced");
    }
}

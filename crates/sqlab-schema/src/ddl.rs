//! Statement generation and table creation order

use crate::error::ProvisionError;
use crate::types::{SampleDataset, TableDefinition};
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;

/// `CREATE TABLE` statement for a table definition
#[must_use]
pub fn create_table_sql(table: &TableDefinition) -> String {
    let columns: Vec<String> = table.columns.iter().map(|c| c.definition_sql()).collect();
    format!("CREATE TABLE {} ({})", table.name, columns.join(", "))
}

/// Parameterized `INSERT` statement with one numbered placeholder per column
#[must_use]
pub fn insert_sql(table: &TableDefinition) -> String {
    let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name,
        table.column_names().join(", "),
        placeholders.join(", ")
    )
}

/// Stable creation order for the tables of a dataset
///
/// Referenced tables come before the tables pointing at them. Tables are
/// placed in waves: every table whose references are satisfied goes out
/// before any table unblocked by that wave, in declaration order within a
/// wave, so the result is identical on every run. References to tables
/// outside the dataset are ignored.
///
/// # Errors
/// `ProvisionError::ReferenceCycle` if the references loop.
pub fn creation_order(
    dataset: &SampleDataset,
) -> Result<Vec<&'static TableDefinition>, ProvisionError> {
    let tables = dataset.tables;
    let graph = reference_graph(tables);

    if let Err(cycle) = toposort(&graph, None) {
        tracing::warn!(
            "Reference cycle in {} through {}",
            dataset.id,
            tables[cycle.node_id()].name
        );
        return Err(ProvisionError::ReferenceCycle {
            dataset: dataset.id.to_string(),
        });
    }

    let mut placed = vec![false; tables.len()];
    let mut order = Vec::with_capacity(tables.len());
    while order.len() < tables.len() {
        // graph map nodes iterate in insertion order
        let wave: Vec<usize> = graph
            .nodes()
            .filter(|&idx| !placed[idx])
            .filter(|&idx| {
                graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .all(|dep| placed[dep])
            })
            .collect();
        for idx in wave {
            placed[idx] = true;
            order.push(&tables[idx]);
        }
    }
    Ok(order)
}

/// Edge `a -> b` when table `b` references table `a`; nodes are table indices
fn reference_graph(tables: &[TableDefinition]) -> DiGraphMap<usize, ()> {
    let mut graph = DiGraphMap::with_capacity(tables.len(), tables.len());
    for idx in 0..tables.len() {
        graph.add_node(idx);
    }
    for (idx, table) in tables.iter().enumerate() {
        for dep in table.referenced_tables() {
            if let Some(dep) = tables.iter().position(|t| t.name == dep) {
                graph.add_edge(dep, idx, ());
            }
        }
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BASIC_EMPLOYEE, ECOMMERCE, LIBRARY};
    use crate::types::{ColumnDef, Difficulty};
    use pretty_assertions::assert_eq;

    fn names(order: &[&TableDefinition]) -> Vec<&'static str> {
        order.iter().map(|t| t.name).collect()
    }

    #[test]
    fn create_statement_for_employees() {
        let table = BASIC_EMPLOYEE.table("employees").unwrap();
        assert_eq!(
            create_table_sql(table),
            "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, department TEXT, salary INTEGER)"
        );
    }

    #[test]
    fn insert_statement_is_parameterized() {
        let table = ECOMMERCE.table("orders").unwrap();
        assert_eq!(
            insert_sql(table),
            "INSERT INTO orders (id, user_id, product, amount, date) VALUES (?1, ?2, ?3, ?4, ?5)"
        );
    }

    #[test]
    fn referenced_tables_created_first() {
        assert_eq!(
            names(&creation_order(&ECOMMERCE).unwrap()),
            vec!["users", "products", "orders"]
        );
        assert_eq!(
            names(&creation_order(&LIBRARY).unwrap()),
            vec!["authors", "members", "books", "borrowings"]
        );
    }

    #[test]
    fn creation_order_is_stable() {
        let first = names(&creation_order(&LIBRARY).unwrap());
        for _ in 0..10 {
            assert_eq!(names(&creation_order(&LIBRARY).unwrap()), first);
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_order_respects_references(seed in proptest::collection::vec(0usize..4, 4)) {
            // shuffle the library declaration order
            let mut tables = LIBRARY.tables.to_vec();
            for (i, j) in seed.into_iter().enumerate() {
                tables.swap(i, j);
            }
            let tables: &'static [TableDefinition] = Box::leak(tables.into_boxed_slice());
            let shuffled = SampleDataset { tables, ..LIBRARY };

            let order = names(&creation_order(&shuffled).unwrap());
            proptest::prop_assert_eq!(order.len(), 4);
            for table in tables {
                let at = order.iter().position(|n| *n == table.name).unwrap();
                for dep in table.referenced_tables() {
                    let dep_at = order.iter().position(|n| *n == dep).unwrap();
                    proptest::prop_assert!(dep_at < at, "{} before {}", dep, table.name);
                }
            }
        }
    }

    #[test]
    fn cycle_is_reported() {
        const A: TableDefinition = TableDefinition {
            name: "a",
            columns: &[ColumnDef::primary_key("id"), ColumnDef::integer("b_id").references("b")],
            rows: &[],
        };
        const B: TableDefinition = TableDefinition {
            name: "b",
            columns: &[ColumnDef::primary_key("id"), ColumnDef::integer("a_id").references("a")],
            rows: &[],
        };
        let looped = SampleDataset {
            id: "looped",
            name: "Looped",
            difficulty: Difficulty::Advanced,
            description: "",
            tables: &[A, B],
        };

        let err = creation_order(&looped).unwrap_err();
        assert!(matches!(err, ProvisionError::ReferenceCycle { dataset } if dataset == "looped"));
    }

    #[test]
    fn self_reference_is_not_a_cycle() {
        const NODE: TableDefinition = TableDefinition {
            name: "node",
            columns: &[ColumnDef::primary_key("id"), ColumnDef::integer("parent_id").references("node")],
            rows: &[],
        };
        let tree = SampleDataset {
            id: "tree",
            name: "Tree",
            difficulty: Difficulty::Advanced,
            description: "",
            tables: &[NODE],
        };
        assert_eq!(names(&creation_order(&tree).unwrap()), vec!["node"]);
    }
}

//! Testing utilities for SQLab workspace
//!
//! Shared engine fixtures and result assertions.

#![allow(missing_docs)]

use sqlab_engine::{CellValue, EngineConfig, QueryEngine, QueryError, QueryResult, ResultSet};
use sqlab_schema::TableDefinition;

/// Started engine with default configuration
pub async fn ready_engine() -> QueryEngine {
    ready_engine_with(EngineConfig::default()).await
}

pub async fn ready_engine_with(config: EngineConfig) -> QueryEngine {
    let engine = QueryEngine::new(config);
    engine.start().await.unwrap();
    engine
}

/// Run `query`, panicking unless it produced a result set
pub fn expect_rows(engine: &QueryEngine, query: &str) -> ResultSet {
    match engine.execute(query).unwrap() {
        QueryResult::Success(output) => match output {
            sqlab_engine::QueryOutput::ResultSet(set) => set,
            other => panic!("expected result set for {query:?}, got {other:?}"),
        },
        QueryResult::Failure(err) => panic!("query {query:?} failed: {err}"),
    }
}

/// Run `query`, panicking unless it failed
pub fn expect_failure(engine: &QueryEngine, query: &str) -> QueryError {
    match engine.execute(query).unwrap() {
        QueryResult::Failure(err) => err,
        success => panic!("expected failure for {query:?}, got {success:?}"),
    }
}

pub fn count_rows(engine: &QueryEngine, table: &str) -> i64 {
    let set = expect_rows(engine, &format!("SELECT COUNT(*) FROM {table}"));
    match set.rows.first().and_then(|row| row.first()) {
        Some(CellValue::Integer(n)) => *n,
        other => panic!("unexpected count cell {other:?}"),
    }
}

/// All rows of `table` ordered by primary key
pub fn dump_table(engine: &QueryEngine, table: &str) -> ResultSet {
    expect_rows(engine, &format!("SELECT * FROM {table} ORDER BY id"))
}

/// Every table of `tables` dumped in order
pub fn snapshot(engine: &QueryEngine, tables: &[TableDefinition]) -> Vec<ResultSet> {
    tables.iter().map(|t| dump_table(engine, t.name)).collect()
}

/// Long-running recursive query for time-limit tests
pub const RUNAWAY_QUERY: &str =
    "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT COUNT(*) FROM c";

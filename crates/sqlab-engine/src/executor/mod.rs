//! Statement execution and result normalization
//!
//! Runs user text against a connection and folds whatever happens into a
//! [`QueryResult`]. Nothing in here returns `Err` or panics on bad SQL.

use crate::config::{EngineConfig, MultiStatementPolicy};
use crate::error::QueryError;
use crate::types::{CellValue, QueryOutput, QueryResult, ResultSet};
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection, Statement};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Execute `query` and normalize the outcome
///
/// Evaluation stops early once `cancel` is set or the configured time limit
/// passes.
pub(crate) fn execute_query(
    conn: &Connection,
    query: &str,
    config: &EngineConfig,
    cancel: &Arc<AtomicBool>,
) -> QueryResult {
    if query.trim().is_empty() {
        return QueryResult::Failure(QueryError::EmptyQuery);
    }

    let watchdog = Watchdog::arm(
        conn,
        config.query_timeout(),
        config.progress_interval,
        Arc::clone(cancel),
    );

    let outcome = match config.multi_statement {
        MultiStatementPolicy::FirstResult => run_batch(conn, query),
        MultiStatementPolicy::Reject => run_single(conn, query),
    };

    let timed_out = watchdog.disarm(conn);

    match outcome {
        Ok(Some(output)) => QueryResult::Success(output),
        Ok(None) => QueryResult::Failure(QueryError::EmptyQuery),
        Err(_) if timed_out => {
            let limit_ms = config.query_timeout_ms.unwrap_or_default();
            tracing::warn!("Query aborted after {}ms limit", limit_ms);
            QueryResult::Failure(QueryError::Timeout { limit_ms })
        }
        Err(err) => {
            tracing::debug!("Query failed: {}", err);
            QueryResult::Failure(QueryError::from_engine(&err))
        }
    }
}

/// Run every statement; the first one exposing columns supplies the result set
///
/// `None` when the text holds no statement at all, e.g. only comments.
fn run_batch(conn: &Connection, query: &str) -> rusqlite::Result<Option<QueryOutput>> {
    let mut batch = Batch::new(conn, query);
    let mut first: Option<ResultSet> = None;
    let mut statements = 0;
    let mut rows_affected = 0;

    while let Some(mut stmt) = batch.next()? {
        statements += 1;
        if stmt.column_count() == 0 {
            rows_affected += stmt.execute([])?;
        } else if first.is_none() {
            first = Some(collect_rows(&mut stmt)?);
        } else {
            let dropped = drain_rows(&mut stmt)?;
            tracing::debug!("Discarded result set #{} ({} rows)", statements, dropped);
        }
    }

    if statements == 0 {
        return Ok(None);
    }
    Ok(Some(match first {
        Some(set) => QueryOutput::ResultSet(set),
        None => QueryOutput::NoOutput {
            statements,
            rows_affected,
        },
    }))
}

/// Run exactly one statement; trailing statements are refused by `prepare`
fn run_single(conn: &Connection, query: &str) -> rusqlite::Result<Option<QueryOutput>> {
    // `prepare` reports API misuse for comment-only text
    if Batch::new(conn, query).next()?.is_none() {
        return Ok(None);
    }
    let mut stmt = conn.prepare(query)?;
    if stmt.column_count() == 0 {
        let rows_affected = stmt.execute([])?;
        return Ok(Some(QueryOutput::NoOutput {
            statements: 1,
            rows_affected,
        }));
    }
    collect_rows(&mut stmt).map(|set| Some(QueryOutput::ResultSet(set)))
}

fn collect_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<ResultSet> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
    let width = columns.len();

    let mut rows = stmt.query([])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let mut tuple = Vec::with_capacity(width);
        for idx in 0..width {
            tuple.push(CellValue::from(row.get_ref(idx)?));
        }
        values.push(tuple);
    }
    Ok(ResultSet::new(columns, values))
}

fn drain_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<usize> {
    let mut rows = stmt.query([])?;
    let mut count = 0;
    while rows.next()?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Progress handler enforcing the time limit and cancellation
struct Watchdog {
    tripped: Arc<AtomicBool>,
}

impl Watchdog {
    fn arm(
        conn: &Connection,
        limit: Option<Duration>,
        interval: i32,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        let tripped = Arc::new(AtomicBool::new(false));
        let deadline = limit.map(|limit| Instant::now() + limit);
        let flag = Arc::clone(&tripped);
        let _ = conn.progress_handler(
            interval,
            Some(move || {
                if cancel.load(Ordering::SeqCst) {
                    return true;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    flag.store(true, Ordering::SeqCst);
                    return true;
                }
                false
            }),
        );
        Self { tripped }
    }

    /// Remove the handler; true if the time limit aborted the query
    fn disarm(self, conn: &Connection) -> bool {
        let _ = conn.progress_handler(0, None::<fn() -> bool>);
        self.tripped.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RUNAWAY: &str =
        "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT COUNT(*) FROM c";

    fn run(conn: &Connection, query: &str, config: &EngineConfig) -> QueryResult {
        execute_query(conn, query, config, &Arc::new(AtomicBool::new(false)))
    }

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, label TEXT);
             INSERT INTO t VALUES (1, 'a'), (2, NULL);",
        )
        .unwrap();
        conn
    }

    #[test]
    fn projection_maps_columns_and_values() {
        let result = run(&conn(), "SELECT id, label FROM t", &EngineConfig::default());
        let set = result.result_set().expect("result set");
        assert_eq!(set.columns, vec!["id", "label"]);
        assert_eq!(
            set.rows,
            vec![
                vec![CellValue::Integer(1), CellValue::from("a")],
                vec![CellValue::Integer(2), CellValue::Null],
            ]
        );
    }

    #[test]
    fn duplicate_column_names_kept() {
        let result = run(&conn(), "SELECT id, id FROM t", &EngineConfig::default());
        assert_eq!(result.result_set().unwrap().columns, vec!["id", "id"]);
    }

    #[test]
    fn dml_reports_no_output() {
        let result = run(&conn(), "DELETE FROM t", &EngineConfig::default());
        assert_eq!(
            result,
            QueryResult::Success(QueryOutput::NoOutput {
                statements: 1,
                rows_affected: 2
            })
        );
    }

    #[test]
    fn empty_projection_is_still_a_result_set() {
        let result = run(&conn(), "SELECT * FROM t WHERE id > 10", &EngineConfig::default());
        let set = result.result_set().expect("descriptor without rows");
        assert!(set.is_empty());
        assert_eq!(set.column_count(), 2);
    }

    #[test]
    fn blank_input_rejected() {
        let result = run(&conn(), "  \n\t", &EngineConfig::default());
        assert_eq!(result, QueryResult::Failure(QueryError::EmptyQuery));
    }

    #[test]
    fn comment_only_input_is_empty_under_both_policies() {
        let c = conn();
        let reject = EngineConfig::new().with_multi_statement(MultiStatementPolicy::Reject);
        for config in [EngineConfig::default(), reject] {
            for text in ["-- only a comment", "/* block */", ";;", "-- a\n/* b */ ;"] {
                assert_eq!(
                    run(&c, text, &config),
                    QueryResult::Failure(QueryError::EmptyQuery),
                    "{text:?} under {:?}",
                    config.multi_statement
                );
            }
        }
    }

    #[test]
    fn reject_policy_runs_single_statement() {
        let config = EngineConfig::new().with_multi_statement(MultiStatementPolicy::Reject);
        let result = run(&conn(), "-- leading comment\nSELECT label FROM t WHERE id = 1", &config);
        assert_eq!(
            result.result_set().unwrap().rows,
            vec![vec![CellValue::from("a")]]
        );
    }

    #[test]
    fn batch_surfaces_first_result_set() {
        let c = conn();
        let result = run(
            &c,
            "INSERT INTO t VALUES (3, 'c'); SELECT COUNT(*) AS n FROM t; SELECT 'ignored'",
            &EngineConfig::default(),
        );
        let set = result.result_set().unwrap();
        assert_eq!(set.columns, vec!["n"]);
        assert_eq!(set.rows, vec![vec![CellValue::Integer(3)]]);
    }

    #[test]
    fn reject_policy_refuses_batches() {
        let c = conn();
        let config = EngineConfig::new().with_multi_statement(MultiStatementPolicy::Reject);
        let result = run(&c, "DELETE FROM t; SELECT 1", &config);
        assert_eq!(result, QueryResult::Failure(QueryError::MultipleStatements));

        let count: i64 = c.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn runaway_query_times_out() {
        let config = EngineConfig::new().with_query_timeout(Duration::from_millis(50));
        let result = run(
            &conn(),
            RUNAWAY,
            &config,
        );
        assert_eq!(result, QueryResult::Failure(QueryError::Timeout { limit_ms: 50 }));
    }

    #[test]
    fn handler_removed_after_timeout() {
        let c = conn();
        let config = EngineConfig::new().with_query_timeout(Duration::from_millis(20));
        let _ = run(
            &c,
            RUNAWAY,
            &config,
        );
        let next = run(&c, "SELECT COUNT(*) FROM t", &EngineConfig::default());
        assert!(next.is_success());
    }

    #[test]
    fn cancelled_before_start_aborts() {
        let cancel = Arc::new(AtomicBool::new(true));
        let result = execute_query(&conn(), RUNAWAY, &EngineConfig::default(), &cancel);
        assert!(matches!(result, QueryResult::Failure(QueryError::Sql { .. })));
    }
}

use pretty_assertions::assert_eq;
use sqlab_engine::prelude::*;
use sqlab_engine::EngineStats;
use sqlab_schema::{Provisioner, SampleDataset, BASIC_EMPLOYEE};
use sqlab_test_utils::{
    count_rows, dump_table, expect_failure, expect_rows, ready_engine, ready_engine_with,
    RUNAWAY_QUERY,
};
use std::sync::Arc;
use std::time::Duration;

static BROKEN_REGISTRY: &[SampleDataset] = &[BASIC_EMPLOYEE, BASIC_EMPLOYEE];

#[tokio::test]
async fn select_one() {
    let engine = ready_engine().await;
    let set = expect_rows(&engine, "SELECT 1");
    assert_eq!(set.columns, vec!["1"]);
    assert_eq!(set.rows, vec![vec![CellValue::Integer(1)]]);
}

#[tokio::test]
async fn seeded_employees_visible() {
    let engine = ready_engine().await;
    let set = dump_table(&engine, "employees");
    assert_eq!(set.columns, vec!["id", "name", "department", "salary"]);
    assert_eq!(set.row_count(), 3);
    assert_eq!(
        set.rows[0],
        vec![
            CellValue::Integer(1),
            CellValue::from("John Smith"),
            CellValue::from("IT"),
            CellValue::Integer(60000),
        ]
    );
}

#[tokio::test]
async fn missing_table_is_a_failure_result() {
    let engine = ready_engine().await;
    let err = expect_failure(&engine, "SELECT * FROM nonexistent_table");
    assert_eq!(err.message(), "no such table: nonexistent_table");
    assert!(engine.is_ready());
}

#[tokio::test]
async fn drop_table_persists_for_session() {
    let engine = ready_engine().await;
    let result = engine.execute("DROP TABLE employees").unwrap();
    assert!(matches!(
        result,
        QueryResult::Success(QueryOutput::NoOutput { statements: 1, .. })
    ));

    let err = expect_failure(&engine, "SELECT * FROM employees");
    assert!(err.message().contains("no such table"));
}

#[tokio::test]
async fn zero_rows_differs_from_no_output() {
    let engine = ready_engine().await;

    let empty = engine
        .execute("SELECT * FROM employees WHERE salary > 1000000")
        .unwrap();
    let set = empty.result_set().expect("descriptor with zero rows");
    assert!(set.is_empty());
    assert_eq!(set.column_count(), 4);
    assert_eq!(empty.summary(), "0 rows returned");

    let update = engine
        .execute("UPDATE employees SET salary = salary + 1 WHERE department = 'IT'")
        .unwrap();
    assert_eq!(
        update,
        QueryResult::Success(QueryOutput::NoOutput {
            statements: 1,
            rows_affected: 2
        })
    );
}

#[tokio::test]
async fn multi_statement_surfaces_first_result_set() {
    let engine = ready_engine().await;
    let set = expect_rows(
        &engine,
        "INSERT INTO employees VALUES (4, 'Ann Lee', 'Sales', 50000);
         SELECT name FROM employees WHERE id = 4;
         SELECT COUNT(*) FROM employees;",
    );
    assert_eq!(set.rows, vec![vec![CellValue::from("Ann Lee")]]);
    assert_eq!(count_rows(&engine, "employees"), 4);
}

#[tokio::test]
async fn reject_policy_runs_nothing() {
    let config = EngineConfig::new().with_multi_statement(MultiStatementPolicy::Reject);
    let engine = ready_engine_with(config).await;
    let err = expect_failure(&engine, "DELETE FROM employees; SELECT 1;");
    assert_eq!(err, QueryError::MultipleStatements);
    assert_eq!(count_rows(&engine, "employees"), 3);
}

#[tokio::test]
async fn comment_only_submission_is_empty() {
    for policy in [MultiStatementPolicy::FirstResult, MultiStatementPolicy::Reject] {
        let engine = ready_engine_with(EngineConfig::new().with_multi_statement(policy)).await;
        let err = expect_failure(&engine, "-- only a comment");
        assert_eq!(err, QueryError::EmptyQuery);
        assert!(engine.is_ready());
    }
}

#[tokio::test]
async fn runaway_query_times_out_and_engine_recovers() {
    let config = EngineConfig::new().with_query_timeout(Duration::from_millis(50));
    let engine = ready_engine_with(config).await;

    let err = expect_failure(&engine, RUNAWAY_QUERY);
    assert!(err.is_timeout());
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(count_rows(&engine, "users"), 3);
    assert_eq!(engine.stats().timeouts, 1);
}

#[tokio::test]
async fn unavailable_before_start_and_after_close() {
    let engine = QueryEngine::new(EngineConfig::default());
    assert!(matches!(
        engine.execute("SELECT 1"),
        Err(EngineError::Unavailable {
            state: EngineState::Uninitialized
        })
    ));

    engine.start().await.unwrap();
    engine.close();
    assert!(matches!(
        engine.execute("SELECT 1"),
        Err(EngineError::Unavailable {
            state: EngineState::Closed
        })
    ));
    assert!(!engine.is_ready());
}

#[tokio::test]
async fn provisioning_failure_closes_engine() {
    let engine = QueryEngine::new(EngineConfig::default())
        .with_provisioner(Provisioner::new(BROKEN_REGISTRY));

    let err = engine.start().await.unwrap_err();
    assert!(matches!(err, EngineError::Provisioning(_)));
    assert!(err.is_fatal());
    assert_eq!(err.user_message(), "database failed to initialize");
    assert_eq!(engine.state(), EngineState::Closed);
    assert!(engine.execute("SELECT 1").is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submitters_never_interleave() {
    let engine = Arc::new(ready_engine().await);
    engine
        .execute("CREATE TABLE log (seq INTEGER PRIMARY KEY AUTOINCREMENT, writer INTEGER, step INTEGER)")
        .unwrap();

    let mut tasks = Vec::new();
    for writer in 0..4 {
        let engine = Arc::clone(&engine);
        tasks.push(tokio::task::spawn_blocking(move || {
            for step in 0..25 {
                let sql = format!("INSERT INTO log (writer, step) VALUES ({writer}, {step})");
                assert!(engine.execute(&sql).unwrap().is_success());
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(count_rows(&engine, "log"), 100);
    // each writer's own submissions land in submission order
    for writer in 0..4 {
        let set = expect_rows(
            &engine,
            &format!("SELECT step FROM log WHERE writer = {writer} ORDER BY seq"),
        );
        let steps: Vec<CellValue> = set.rows.into_iter().flatten().collect();
        let expected: Vec<CellValue> = (0..25).map(CellValue::Integer).collect();
        assert_eq!(steps, expected);
    }
    assert_eq!(engine.state(), EngineState::Ready);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn try_execute_reports_busy() {
    let config = EngineConfig::new().with_query_timeout(Duration::from_millis(500));
    let engine = Arc::new(ready_engine_with(config).await);

    let runner = {
        let engine = Arc::clone(&engine);
        tokio::task::spawn_blocking(move || engine.execute(RUNAWAY_QUERY))
    };

    let mut saw_busy = false;
    for _ in 0..200 {
        if engine.state() == EngineState::Executing {
            saw_busy = matches!(engine.try_execute("SELECT 1"), Err(EngineError::Busy));
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let outcome = runner.await.unwrap().unwrap();
    assert!(outcome.error().is_some_and(QueryError::is_timeout));
    assert!(saw_busy);
    assert_eq!(engine.stats().rejected, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn close_interrupts_running_query() {
    let engine = Arc::new(ready_engine().await);

    let runner = {
        let engine = Arc::clone(&engine);
        tokio::task::spawn_blocking(move || engine.execute(RUNAWAY_QUERY))
    };

    for _ in 0..200 {
        if engine.state() == EngineState::Executing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    engine.close();

    let outcome = runner.await.unwrap();
    assert!(matches!(
        outcome,
        Err(EngineError::Unavailable {
            state: EngineState::Closed
        })
    ));
}

#[tokio::test]
async fn stats_start_empty() {
    let engine = ready_engine().await;
    assert_eq!(engine.stats(), EngineStats::default());
}

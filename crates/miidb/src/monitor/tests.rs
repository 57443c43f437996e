use super::*;
use crate::client::{CompiledQuery, DatabaseClient, QueryOutput};
use crate::dialect::{Dialect, MySql};
use crate::error::{OrmError, OrmResult};
use crate::qb::{self, StatementKind};
use crate::row::{ResultSet, Row};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Shared stub client for tests ──

#[derive(Default)]
struct StubClient {
    dialect: MySql,
    seen: Mutex<Vec<String>>,
    fail: bool,
    delay: Duration,
}

impl DatabaseClient for StubClient {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn execute(&self, query: &CompiledQuery) -> OrmResult<QueryOutput> {
        self.seen.lock().unwrap().push(query.sql.clone());
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail {
            return Err(OrmError::execution("connection reset"));
        }
        Ok(match query.kind {
            StatementKind::Select => QueryOutput::Rows(ResultSet::new(vec![
                Row::from_pairs([("id", 1)]),
                Row::from_pairs([("id", 2)]),
            ])),
            StatementKind::Insert => QueryOutput::Inserted {
                last_insert_id: Some(7),
                affected_rows: 1,
            },
            _ => QueryOutput::Affected(3),
        })
    }
}

fn ctx_for(sql: &str, kind: StatementKind) -> QueryContext {
    QueryContext::new(&CompiledQuery {
        kind,
        sql: sql.to_string(),
        template: sql.to_string(),
        params: Vec::new(),
        result_mapping: None,
    })
}

#[test]
fn test_logging_monitor_truncation() {
    let monitor = LoggingMonitor::new().max_sql_length(10);
    assert_eq!(monitor.truncate_sql("SELECT * FROM users"), "SELECT * F...");
    assert_eq!(monitor.truncate_sql("SELECT 1"), "SELECT 1");
}

#[test]
fn test_truncate_respects_char_boundary() {
    // 'é' is two bytes; cutting at byte 2 would split it.
    assert_eq!(truncate_sql_bytes("aé", 2), "a");
    assert_eq!(truncate_sql_bytes("abc", 10), "abc");
}

#[test]
fn test_query_result_error_truncation() {
    let long = "x".repeat(600);
    match QueryResult::error(long) {
        QueryResult::Error(msg) => {
            assert_eq!(msg.len(), 515);
            assert!(msg.ends_with("..."));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(QueryResult::error("short".into()), QueryResult::Error("short".into()));
}

#[test]
fn test_query_result_from_output() {
    let inserted = QueryOutput::Inserted {
        last_insert_id: Some(1),
        affected_rows: 2,
    };
    assert_eq!(QueryResult::from(&inserted), QueryResult::Affected(2));
    assert_eq!(QueryResult::from(&QueryOutput::Affected(4)), QueryResult::Affected(4));
    assert_eq!(QueryResult::Rows(3).to_string(), "3 rows");
}

#[test]
fn test_stats_monitor() {
    let monitor = StatsMonitor::new();
    let select = ctx_for("SELECT * FROM `users`", StatementKind::Select);
    let delete = ctx_for("DELETE FROM `users`", StatementKind::Delete);

    monitor.on_query_complete(&select, Duration::from_millis(10), &QueryResult::Rows(5));
    monitor.on_query_complete(&select, Duration::from_millis(20), &QueryResult::Rows(3));
    monitor.on_query_complete(&delete, Duration::from_millis(5), &QueryResult::error("boom".into()));

    let stats = monitor.stats();
    assert_eq!(stats.total_queries, 3);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.delete_count, 1);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.total_duration, Duration::from_millis(35));
    assert_eq!(stats.max_duration, Duration::from_millis(20));
    assert_eq!(stats.slowest_query.as_deref(), Some("SELECT * FROM `users`"));

    monitor.reset();
    assert_eq!(monitor.stats(), QueryStats::default());
}

#[test]
fn test_composite_hook_chains_modifications() {
    struct Comment;
    impl QueryHook for Comment {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            HookAction::ModifySql {
                exec_sql: format!("/* app */ {}", ctx.exec_sql),
                canonical_sql: None,
            }
        }
    }

    let hook = CompositeHook::new().add(Comment).add(Comment);
    let ctx = ctx_for("SELECT 1", StatementKind::Select);
    assert_eq!(
        hook.before_query(&ctx),
        HookAction::ModifySql {
            exec_sql: "/* app */ /* app */ SELECT 1".into(),
            canonical_sql: None,
        }
    );
}

#[test]
fn test_composite_hook_abort_short_circuits() {
    struct Deny;
    impl QueryHook for Deny {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            if ctx.query_type == StatementKind::Delete {
                HookAction::Abort("DELETE is not allowed".into())
            } else {
                HookAction::Continue
            }
        }
    }

    let hook = CompositeHook::new().add(Deny).add(TracingSqlHook::new());
    assert_eq!(
        hook.before_query(&ctx_for("DELETE FROM `t`", StatementKind::Delete)),
        HookAction::Abort("DELETE is not allowed".into())
    );
    assert_eq!(
        hook.before_query(&ctx_for("SELECT 1", StatementKind::Select)),
        HookAction::Continue
    );
}

#[test]
fn test_instrumented_client_reports_when_enabled() {
    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(StubClient::default())
        .with_monitor_arc(stats.clone())
        .enable_monitoring();

    let rows = qb::select(["id"]).from("users").all(&client).unwrap();
    assert_eq!(rows.len(), 2);
    qb::delete("users").execute(&client).unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 2);
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.delete_count, 1);
}

#[test]
fn test_instrumented_client_silent_when_disabled() {
    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(StubClient::default()).with_monitor_arc(stats.clone());

    qb::select(["id"]).from("users").all(&client).unwrap();
    assert_eq!(stats.stats().total_queries, 0);
    assert!(!client.config().monitoring_enabled);
}

#[test]
fn test_instrumented_client_counts_failures() {
    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(StubClient {
        fail: true,
        ..StubClient::default()
    })
    .with_monitor_arc(stats.clone())
    .enable_monitoring();

    let err = qb::select(["id"]).from("users").all(&client).unwrap_err();
    assert!(err.is_execution());
    assert_eq!(stats.stats().failed_queries, 1);
}

#[test]
fn test_instrumented_client_applies_hook_rewrite() {
    struct Tag;
    impl QueryHook for Tag {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            HookAction::ModifySql {
                exec_sql: format!("{} /* tagged */", ctx.exec_sql),
                canonical_sql: None,
            }
        }
    }

    let client = InstrumentedClient::new(StubClient::default()).with_hook(Tag);
    qb::update("users")
        .set([("name", "x")])
        .and_where("id", "=", 1)
        .execute(&client)
        .unwrap();

    let seen = client.inner().seen.lock().unwrap();
    assert_eq!(
        seen.as_slice(),
        ["UPDATE `users` SET `name` = 'x' WHERE `id` = 1 /* tagged */"]
    );
}

#[test]
fn test_instrumented_client_hook_abort() {
    struct Deny;
    impl QueryHook for Deny {
        fn before_query(&self, _ctx: &QueryContext) -> HookAction {
            HookAction::Abort("read only".into())
        }
    }

    let client = InstrumentedClient::new(StubClient::default())
        .add_hook(TracingSqlHook::new())
        .add_hook(Deny);
    let err = qb::delete("users").execute(&client).unwrap_err();
    assert!(matches!(err, OrmError::Validation(ref m) if m.contains("read only")));
    assert!(client.inner().seen.lock().unwrap().is_empty());
}

#[test]
fn test_slow_query_callback() {
    #[derive(Default)]
    struct SlowCounter(Mutex<usize>);
    impl QueryMonitor for SlowCounter {
        fn on_query_complete(&self, _: &QueryContext, _: Duration, _: &QueryResult) {}
        fn on_slow_query(&self, _: &QueryContext, _: Duration) {
            *self.0.lock().unwrap() += 1;
        }
    }

    let slow = Arc::new(SlowCounter::default());
    let client = InstrumentedClient::new(StubClient {
        delay: Duration::from_millis(5),
        ..StubClient::default()
    })
    .with_config(
        MonitorConfig::new()
            .with_slow_query_threshold(Duration::from_millis(1))
            .enable_monitoring(),
    )
    .with_monitor_arc(slow.clone());

    qb::select(["id"]).from("users").all(&client).unwrap();
    assert_eq!(*slow.0.lock().unwrap(), 1);
}

#[test]
fn test_tracing_hook_truncation() {
    let hook = TracingSqlHook::new().max_sql_length(6);
    assert_eq!(hook.truncate_sql("SELECT 1"), "SELEC...");
    assert_eq!(TracingSqlHook::new().no_truncate().truncate_sql(&"a".repeat(300)).len(), 300);
}

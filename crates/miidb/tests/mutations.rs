mod common;

use common::RecordingClient;
use miidb::model::{only_deleted, soft_delete_scope};
use miidb::monitor::{InstrumentedClient, StatsMonitor};
use miidb::{DatabaseConfig, OrmError, QueryOutput, Record, Row, StatementKind, Value, qb};
use std::sync::Arc;

fn write_client() -> RecordingClient {
    RecordingClient::new(|query| {
        Ok(match query.kind {
            StatementKind::Insert => QueryOutput::Inserted {
                last_insert_id: Some(11),
                affected_rows: 1,
            },
            _ => QueryOutput::Affected(1),
        })
    })
}

#[test]
fn insert_update_delete_round() {
    let client = write_client();

    let out = qb::insert("users")
        .columns(["name", "email"])
        .values(["alice", "alice@example.com"])
        .unwrap()
        .execute(&client)
        .unwrap();
    assert_eq!(out.last_insert_id(), Some(11));

    let out = qb::update("users")
        .set([("name", "alice2")])
        .and_where("id", "=", 11)
        .execute(&client)
        .unwrap();
    assert_eq!(out.affected_rows(), 1);

    qb::delete("users").and_where("id", "=", 11).execute(&client).unwrap();

    assert_eq!(
        client.sql(),
        vec![
            "INSERT INTO `users` (`name`, `email`) VALUES ('alice', 'alice@example.com')",
            "UPDATE `users` SET `name` = 'alice2' WHERE `id` = 11",
            "DELETE FROM `users` WHERE `id` = 11",
        ]
    );
}

#[test]
fn record_lifecycle() {
    let client = write_client();
    let mut user = Record::new("users", ["id", "name", "deleted"]);
    user.set("name", "alice");

    user.create(&client).unwrap();
    assert!(user.is_loaded());
    assert_eq!(user.get("id").unwrap(), &Value::Int(11));

    // Nothing changed yet: no statement is sent.
    assert_eq!(user.update(&client).unwrap(), 0);

    user.set("name", "alicia");
    assert_eq!(user.update(&client).unwrap(), 1);
    assert!(user.changed().is_empty());

    assert_eq!(user.delete(&client).unwrap(), 1);
    assert!(!user.is_loaded());
    assert!(matches!(user.delete(&client), Err(OrmError::Validation(_))));

    assert_eq!(
        client.sql(),
        vec![
            "INSERT INTO `users` (`id`, `name`, `deleted`) VALUES (NULL, 'alice', NULL)",
            "UPDATE `users` SET `name` = 'alicia' WHERE `id` = 11",
            "DELETE FROM `users` WHERE `id` = 11",
        ]
    );
}

#[test]
fn record_soft_delete_and_restore() {
    let client = write_client();
    let mut post = Record::from_row(
        "posts",
        &Row::from_pairs([("id", Value::Int(4)), ("deleted", Value::Null)]),
    );

    post.soft_delete(&client).unwrap();
    assert!(!post.is_loaded());
    assert!(post.get_as::<i64>("deleted").unwrap() > 0);

    post.restore(&client).unwrap();
    assert!(post.get("deleted").unwrap().is_null());

    let sql = client.sql();
    assert!(sql[0].starts_with("UPDATE `posts` SET `deleted` = "));
    assert!(sql[0].ends_with(" WHERE `id` = 4"));
    assert_eq!(sql[1], "UPDATE `posts` SET `deleted` = NULL WHERE `id` = 4");
}

#[test]
fn soft_delete_scopes_compose_with_queries() {
    let client = RecordingClient::with_rows(Vec::new());
    let posts = Record::new("posts", ["id", "title"]);

    let mut live = posts.find_by("title", "LIKE", "%rust%");
    soft_delete_scope(&mut live).all(&client).unwrap();

    let mut trash = posts.query();
    only_deleted(&mut trash).all(&client).unwrap();

    assert_eq!(
        client.sql(),
        vec![
            "SELECT `posts`.`id`, `posts`.`title` FROM `posts` WHERE `title` LIKE '%rust%' AND `deleted` IS NULL",
            "SELECT `posts`.`id`, `posts`.`title` FROM `posts` WHERE `deleted` IS NOT NULL",
        ]
    );
}

#[test]
fn instrumented_client_from_config() {
    let config = DatabaseConfig::from_toml_str(
        r#"
        [monitor]
        enabled = true
        slow_query_ms = 1000
        "#,
    )
    .unwrap();

    let stats = Arc::new(StatsMonitor::new());
    let client = InstrumentedClient::new(write_client())
        .with_config(config.monitor_config())
        .with_monitor_arc(stats.clone());

    let mut user = Record::new("users", ["name"]);
    user.set("name", "bob");
    user.create(&client).unwrap();
    qb::delete("users").execute(&client).unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 2);
    assert_eq!(snapshot.insert_count, 1);
    assert_eq!(snapshot.delete_count, 1);
    assert_eq!(client.inner().sql().len(), 2);
}

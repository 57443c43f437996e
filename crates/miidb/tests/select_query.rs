mod common;

use common::{RecordingClient, user_rows};
use miidb::{FromRow, OrmError, OrmResult, QueryOutput, ResultSet, Row, SortDir, Value, qb};
use serde::Deserialize;

#[derive(Debug, PartialEq)]
struct User {
    id: i64,
    name: String,
}

impl FromRow for User {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}

#[derive(Debug, PartialEq, Deserialize)]
struct UserJson {
    id: i64,
    name: String,
}

#[test]
fn fetch_all_maps_rows() {
    let client = RecordingClient::with_rows(user_rows());
    let mut q = qb::select(["id", "name"]);
    q.from("users").order_by("id", SortDir::Asc);

    let users = q.fetch_all::<User>(&client).unwrap();
    assert_eq!(
        users,
        vec![
            User { id: 1, name: "alice".into() },
            User { id: 2, name: "bob".into() },
        ]
    );
    assert_eq!(
        client.sql(),
        vec!["SELECT `id`, `name` FROM `users` ORDER BY `id` ASC"]
    );
}

#[test]
fn rows_deserialize_through_serde() {
    let client = RecordingClient::with_rows(user_rows());
    let rows = qb::select(["id", "name"]).from("users").all(&client).unwrap();
    let first: UserJson = rows[0].deserialize().unwrap();
    assert_eq!(first, UserJson { id: 1, name: "alice".into() });
}

#[test]
fn one_sets_limit() {
    let client = RecordingClient::with_rows(user_rows());
    let mut q = qb::select(["id"]);
    q.from("users");

    let row = q.one(&client).unwrap().unwrap();
    assert_eq!(row.get("id"), Some(&Value::Int(1)));
    assert_eq!(client.last_sql().as_deref(), Some("SELECT `id` FROM `users` LIMIT 1"));
}

#[test]
fn fetch_one_reports_not_found() {
    let client = RecordingClient::with_rows(Vec::new());
    let err = qb::select(["id"])
        .from("users")
        .fetch_one::<User>(&client)
        .unwrap_err();
    assert!(err.is_not_found());

    let none = qb::select(["id"]).from("users").fetch_opt::<User>(&client).unwrap();
    assert!(none.is_none());
}

#[test]
fn index_by_keys_result_rows() {
    let client = RecordingClient::with_rows(user_rows());
    let mut q = qb::select(["id", "name"]);
    q.from("users").index_by("name");

    let rows = q.execute(&client).unwrap().into_rows().unwrap();
    let indexed = rows.indexed().unwrap();
    assert_eq!(indexed.keys().collect::<Vec<_>>(), vec!["alice", "bob"]);
    assert_eq!(indexed["bob"].get("id"), Some(&Value::Int(2)));
}

#[test]
fn parameters_reach_the_client() {
    let client = RecordingClient::with_rows(Vec::new());
    let mut q = qb::select(["id"]);
    q.from("users").and_where("name", "=", ":name").param(":name", "o'hara");
    q.execute(&client).unwrap();

    let seen = client.seen.borrow();
    assert_eq!(seen[0].sql, "SELECT `id` FROM `users` WHERE `name` = 'o\\'hara'");
    assert_eq!(seen[0].template, "SELECT `id` FROM `users` WHERE `name` = :name");
    assert_eq!(seen[0].params, vec![(":name".to_string(), Value::from("o'hara"))]);
}

#[test]
fn client_errors_pass_through() {
    let client = RecordingClient::new(|_| Err(OrmError::execution("server has gone away")));
    let err = qb::select(["id"]).from("users").all(&client).unwrap_err();
    assert!(err.is_execution());
    assert_eq!(err.to_string(), "Execution error: server has gone away");
}

#[test]
fn compile_errors_never_reach_the_client() {
    let client = RecordingClient::with_rows(Vec::new());
    let mut q = qb::select(["id"]);
    q.from("users").where_open();
    assert!(q.execute(&client).unwrap_err().is_compile());
    assert!(client.seen.borrow().is_empty());
}

#[test]
fn non_row_output_is_rejected_for_fetch() {
    let client = RecordingClient::new(|_| Ok(QueryOutput::Affected(1)));
    let err = qb::select(["id"]).from("users").all(&client).unwrap_err();
    assert!(matches!(err, OrmError::Other(_)));
}

#[test]
fn result_set_column_default() {
    let rows = ResultSet::new(Vec::new());
    assert_eq!(rows.column("count", 0), Value::Int(0));
}

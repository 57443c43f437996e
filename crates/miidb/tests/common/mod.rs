#![allow(dead_code)]

use miidb::{CompiledQuery, DatabaseClient, Dialect, MySql, OrmResult, QueryOutput, ResultSet, Row};
use std::cell::RefCell;

type Responder = Box<dyn Fn(&CompiledQuery) -> OrmResult<QueryOutput>>;

/// In-memory client that records every statement it receives and answers
/// with a canned response.
pub struct RecordingClient {
    dialect: MySql,
    respond: Responder,
    pub seen: RefCell<Vec<CompiledQuery>>,
}

impl RecordingClient {
    pub fn new(respond: impl Fn(&CompiledQuery) -> OrmResult<QueryOutput> + 'static) -> Self {
        Self {
            dialect: MySql::new(),
            respond: Box::new(respond),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// Answers every statement with the same rows.
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self::new(move |_| Ok(QueryOutput::Rows(ResultSet::new(rows.clone()))))
    }

    pub fn sql(&self) -> Vec<String> {
        self.seen.borrow().iter().map(|q| q.sql.clone()).collect()
    }

    pub fn last_sql(&self) -> Option<String> {
        self.seen.borrow().last().map(|q| q.sql.clone())
    }
}

impl DatabaseClient for RecordingClient {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn execute(&self, query: &CompiledQuery) -> OrmResult<QueryOutput> {
        self.seen.borrow_mut().push(query.clone());
        (self.respond)(query)
    }
}

pub fn user_rows() -> Vec<Row> {
    vec![
        Row::from_pairs([("id", miidb::Value::Int(1)), ("name", "alice".into())]),
        Row::from_pairs([("id", miidb::Value::Int(2)), ("name", "bob".into())]),
    ]
}

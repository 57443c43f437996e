//! Database client seam.
//!
//! The builder never talks to a database directly. It compiles a statement
//! into a [`CompiledQuery`] and hands it to a [`DatabaseClient`], which runs
//! it and reports what happened.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::qb::StatementKind;
use crate::row::ResultSet;
use crate::value::Value;

/// A compiled statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub kind: StatementKind,
    /// Final SQL with parameters substituted.
    pub sql: String,
    /// SQL before parameter substitution.
    pub template: String,
    /// Parameter values at compile time, ordered by name.
    pub params: Vec<(String, Value)>,
    /// Record type requested for result rows.
    pub result_mapping: Option<String>,
}

/// What a client returns for an executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// SELECT results.
    Rows(ResultSet),
    /// INSERT outcome.
    Inserted {
        last_insert_id: Option<i64>,
        affected_rows: u64,
    },
    /// UPDATE / DELETE outcome.
    Affected(u64),
}

impl QueryOutput {
    /// The result set, or an error if the statement did not return rows.
    pub fn into_rows(self) -> OrmResult<ResultSet> {
        match self {
            QueryOutput::Rows(rows) => Ok(rows),
            other => Err(OrmError::Other(format!(
                "expected a result set, got {}",
                other.describe()
            ))),
        }
    }

    pub fn rows(&self) -> Option<&ResultSet> {
        match self {
            QueryOutput::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Number of rows returned or affected.
    pub fn affected_rows(&self) -> u64 {
        match self {
            QueryOutput::Rows(rows) => rows.len() as u64,
            QueryOutput::Inserted { affected_rows, .. } => *affected_rows,
            QueryOutput::Affected(n) => *n,
        }
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        match self {
            QueryOutput::Inserted { last_insert_id, .. } => *last_insert_id,
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            QueryOutput::Rows(rows) => format!("{} rows", rows.len()),
            QueryOutput::Inserted { affected_rows, .. } => format!("{affected_rows} inserted"),
            QueryOutput::Affected(n) => format!("{n} affected"),
        }
    }
}

/// A synchronous database connection (or anything that looks like one).
///
/// Errors returned from [`DatabaseClient::execute`] are propagated to the
/// caller unchanged; wrap driver errors with [`OrmError::execution`].
pub trait DatabaseClient {
    /// Quoting rules used to compile statements for this client.
    fn dialect(&self) -> &dyn Dialect;

    /// Run a compiled statement.
    fn execute(&self, query: &CompiledQuery) -> OrmResult<QueryOutput>;
}

impl<C: DatabaseClient + ?Sized> DatabaseClient for &C {
    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    fn execute(&self, query: &CompiledQuery) -> OrmResult<QueryOutput> {
        (**self).execute(query)
    }
}

impl<C: DatabaseClient + ?Sized> DatabaseClient for Box<C> {
    fn dialect(&self) -> &dyn Dialect {
        (**self).dialect()
    }

    fn execute(&self, query: &CompiledQuery) -> OrmResult<QueryOutput> {
        (**self).execute(query)
    }
}

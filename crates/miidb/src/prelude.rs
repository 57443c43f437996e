//! Convenient imports for typical `miidb` usage.
//!
//! ```ignore
//! use miidb::prelude::*;
//! ```

pub use crate::qb;
pub use crate::{
    Column, DatabaseClient, Dialect, Expression, FromRow, JoinType, MySql, OrmError, OrmResult,
    Postgres, Record, Row, SortDir, Statement, TableRef, Value, expr,
};

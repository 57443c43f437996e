//! # miidb
//!
//! A fluent SQL statement builder and compiler.
//!
//! ## Features
//!
//! - **One builder, four statements**: SELECT, INSERT, UPDATE and DELETE share a
//!   single [`Statement`] type
//! - **Nested conditions**: AND/OR groups for WHERE and HAVING, with empty
//!   groups dropped on request
//! - **Named parameters**: `:name` placeholders substituted at compile time,
//!   including shared bindings read when the statement compiles
//! - **Dialects**: MySQL and PostgreSQL quoting with optional table prefixes
//! - **Pluggable execution**: any [`DatabaseClient`] runs compiled statements
//! - **Query monitoring**: timing, logging and hooks via [`monitor`]
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use miidb::{qb, MySql, SortDir};
//!
//! // SELECT
//! let mut q = qb::select(["id", "name"]);
//! q.from("users")
//!     .and_where("status", "=", "active")
//!     .order_by("created_at", SortDir::Desc)
//!     .limit(10);
//! let users = q.fetch_all::<User>(&client)?;
//!
//! // INSERT
//! qb::insert("users")
//!     .columns(["username", "email"])
//!     .values(["alice", "alice@example.com"])?
//!     .execute(&client)?;
//!
//! // UPDATE
//! qb::update("users")
//!     .set([("status", "inactive")])
//!     .and_where("id", "=", user_id)
//!     .execute(&client)?;
//!
//! // DELETE
//! qb::delete("users")
//!     .and_where("id", "=", user_id)
//!     .execute(&client)?;
//!
//! // Compile without executing
//! let sql = q.compile(&MySql::new())?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod model;
pub mod monitor;
pub mod prelude;
pub mod qb;
pub mod row;
pub mod value;

pub use client::{CompiledQuery, DatabaseClient, QueryOutput};
pub use condition::{Condition, ConditionTree, Connective};
pub use config::DatabaseConfig;
pub use dialect::{AnyDialect, Dialect, MySql, Postgres};
pub use error::{OrmError, OrmResult};
pub use ident::{Column, TableRef};
pub use model::Record;
pub use monitor::{
    HookAction, InstrumentedClient, LoggingMonitor, MonitorConfig, QueryHook, QueryMonitor,
    StatsMonitor, TracingSqlHook,
};
pub use qb::{JoinType, SortDir, Statement, StatementKind};
pub use row::{FromRow, FromValue, ResultSet, Row};
pub use value::{Expression, Value, expr};

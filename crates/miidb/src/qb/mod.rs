//! Statement builder and compiler.
//!
//! A [`Statement`] accumulates the parts of one SELECT, INSERT, UPDATE or
//! DELETE through chained `&mut self` calls, then compiles to SQL text for a
//! given [`Dialect`].
//!
//! # Usage
//!
//! ```ignore
//! use miidb::qb;
//! use miidb::{JoinType, MySql, SortDir};
//!
//! let mut q = qb::select(["id", "name"]);
//! q.from("users")
//!     .join("roles", JoinType::Left)
//!     .on("roles.user_id", "=", "users.id")?;
//! q.and_where("status", "=", "active")
//!     .or_where_open()
//!     .and_where("age", ">", 18)
//!     .and_where("age", "<", 65)
//!     .where_close()
//!     .order_by("name", SortDir::Asc)
//!     .limit(20);
//!
//! let sql = q.compile(&MySql::new())?;
//!
//! // INSERT
//! let mut ins = qb::insert("users");
//! ins.columns(["name", "email"]).values(["alice", "alice@example.com"])?;
//!
//! // UPDATE
//! let mut upd = qb::update("users");
//! upd.set([("status", "inactive")]).and_where("id", "=", 7);
//!
//! // DELETE
//! let mut del = qb::delete("users");
//! del.and_where("id", "=", 7);
//! ```

mod clause;
mod delete;
mod exec;
mod insert;
mod param;
mod select;
mod update;

pub use clause::{Join, JoinType};
pub use insert::InsertSource;
pub use param::{ParamValue, Parameters};
pub use select::UnionSource;

use crate::condition::{Connective, ConditionTree};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::{Column, TableRef};
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

/// Kind of SQL statement; selects which compiler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
        }
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }

    /// Parse `asc`/`desc` in any case.
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDir::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDir::Desc)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupTarget {
    Where,
    Having,
}

/// One SQL statement under construction.
#[derive(Debug, Clone, Default)]
pub struct Statement {
    kind: Option<StatementKind>,
    /// Target table for INSERT / UPDATE / DELETE
    table: Option<TableRef>,
    /// INSERT column list
    columns: Vec<Column>,
    /// SELECT projection
    select: Vec<Column>,
    distinct: bool,
    from: Vec<TableRef>,
    joins: Vec<clause::Join>,
    last_join: Option<usize>,
    where_tree: ConditionTree,
    having_tree: ConditionTree,
    /// Trees with a group opened through the builder, innermost last
    open_groups: Vec<GroupTarget>,
    group_by: Vec<Column>,
    order_by: Vec<(Column, Option<SortDir>)>,
    limit: Option<u64>,
    offset: Option<u64>,
    unions: Vec<(Statement, bool)>,
    set: Vec<(Column, Value)>,
    insert_source: Option<InsertSource>,
    parameters: Parameters,
    result_mapping: Option<String>,
    index_by: Option<String>,
    for_update: bool,
    last_sql: RefCell<Option<String>>,
}

/// Create a SELECT statement with the given projection (empty means `*`).
///
/// # Example
/// ```ignore
/// let q = miidb::qb::select(["id", "name"]);
/// ```
pub fn select<I, C>(columns: I) -> Statement
where
    I: IntoIterator<Item = C>,
    C: Into<Column>,
{
    let mut stmt = Statement::new();
    stmt.select(columns);
    stmt
}

/// Create an INSERT statement for the given table.
pub fn insert(table: impl Into<TableRef>) -> Statement {
    let mut stmt = Statement::new();
    stmt.insert_into(table);
    stmt
}

/// Create an UPDATE statement for the given table.
pub fn update(table: impl Into<TableRef>) -> Statement {
    let mut stmt = Statement::new();
    stmt.update(table);
    stmt
}

/// Create a DELETE statement for the given table.
pub fn delete(table: impl Into<TableRef>) -> Statement {
    let mut stmt = Statement::new();
    stmt.delete_from(table);
    stmt
}

impl Statement {
    /// Create an empty statement with no kind.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty statement of the given kind.
    pub fn of_kind(kind: StatementKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn kind(&self) -> Option<StatementKind> {
        self.kind
    }

    pub fn table_ref(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }

    pub fn projection(&self) -> &[Column] {
        &self.select
    }

    pub fn ordering(&self) -> &[(Column, Option<SortDir>)] {
        &self.order_by
    }

    pub fn limit_value(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<u64> {
        self.offset
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn where_conditions(&self) -> &ConditionTree {
        &self.where_tree
    }

    pub fn having_conditions(&self) -> &ConditionTree {
        &self.having_tree
    }

    pub fn params(&self) -> &Parameters {
        &self.parameters
    }

    /// Record type requested for result rows, if any.
    pub fn result_mapping(&self) -> Option<&str> {
        self.result_mapping.as_deref()
    }

    /// SQL produced by the most recent compilation.
    pub fn last_sql(&self) -> Option<String> {
        self.last_sql.borrow().clone()
    }

    // ==================== Table / target ====================

    /// Set the target table for INSERT / UPDATE / DELETE.
    pub fn table(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Make this an INSERT into `table`.
    pub fn insert_into(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.kind = Some(StatementKind::Insert);
        self.table(table)
    }

    /// Make this an UPDATE of `table`.
    pub fn update(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.kind = Some(StatementKind::Update);
        self.table(table)
    }

    /// Make this a DELETE from `table`.
    pub fn delete_from(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.kind = Some(StatementKind::Delete);
        self.table(table)
    }

    // ==================== WHERE ====================

    /// Add `column op value`, joined with AND.
    pub fn and_where(
        &mut self,
        column: impl Into<Column>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_tree.push(Connective::And, column, op, value);
        self
    }

    /// Add `column op value`, joined with OR.
    pub fn or_where(
        &mut self,
        column: impl Into<Column>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.where_tree.push(Connective::Or, column, op, value);
        self
    }

    /// AND every `(column, op, value)` triple in order.
    pub fn where_all<I, C, O, V>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, O, V)>,
        C: Into<Column>,
        O: Into<String>,
        V: Into<Value>,
    {
        for (column, op, value) in conditions {
            self.where_tree.push(Connective::And, column, op, value);
        }
        self
    }

    /// Open a `(` group joined with AND.
    pub fn where_open(&mut self) -> &mut Self {
        self.where_tree.open(Connective::And);
        self.open_groups.push(GroupTarget::Where);
        self
    }

    /// Open a `(` group joined with OR.
    pub fn or_where_open(&mut self) -> &mut Self {
        self.where_tree.open(Connective::Or);
        self.open_groups.push(GroupTarget::Where);
        self
    }

    /// Close the innermost WHERE group.
    pub fn where_close(&mut self) -> &mut Self {
        self.where_tree.close(Connective::And);
        self.forget_group(GroupTarget::Where);
        self
    }

    /// Close the innermost WHERE group, dropping it if it holds no conditions.
    pub fn where_close_empty(&mut self) -> &mut Self {
        self.where_tree.close_empty(Connective::And);
        self.forget_group(GroupTarget::Where);
        self
    }

    /// Close the most recently opened group, whether WHERE or HAVING.
    pub fn end(&mut self) -> OrmResult<&mut Self> {
        match self.open_groups.pop() {
            Some(GroupTarget::Where) => self.where_tree.close(Connective::And),
            Some(GroupTarget::Having) => self.having_tree.close(Connective::And),
            None => return Err(OrmError::usage("end() called with no open group")),
        }
        Ok(self)
    }

    fn forget_group(&mut self, target: GroupTarget) {
        if let Some(pos) = self.open_groups.iter().rposition(|t| *t == target) {
            self.open_groups.remove(pos);
        }
    }

    // ==================== ORDER / LIMIT ====================

    /// Append an ORDER BY entry.
    pub fn order_by(
        &mut self,
        column: impl Into<Column>,
        direction: impl Into<Option<SortDir>>,
    ) -> &mut Self {
        self.order_by.push((column.into(), direction.into()));
        self
    }

    /// Replace the ORDER BY list.
    pub fn order_by_all<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, Option<SortDir>)>,
        C: Into<Column>,
    {
        self.order_by = columns
            .into_iter()
            .map(|(c, dir)| (c.into(), dir))
            .collect();
        self
    }

    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    /// Remove LIMIT.
    pub fn clear_limit(&mut self) -> &mut Self {
        self.limit = None;
        self
    }

    // ==================== Parameters / results ====================

    /// Register a parameter value, substituted when the statement compiles.
    pub fn param(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.parameters.set(name, value);
        self
    }

    /// Register a shared parameter; its value is read at compile time.
    pub fn bind(&mut self, name: impl Into<String>, cell: Rc<RefCell<Value>>) -> &mut Self {
        self.parameters.bind(name, cell);
        self
    }

    /// Merge several parameters; new names replace existing ones.
    pub fn parameters<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.parameters.merge(params.into_iter().collect());
        self
    }

    /// Ask the client to materialize rows as the named record type.
    pub fn as_object(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.result_mapping = Some(type_name.into());
        self
    }

    /// Return plain rows.
    pub fn as_array(&mut self) -> &mut Self {
        self.result_mapping = None;
        self
    }

    /// Key result rows by `column`.
    pub fn index_by(&mut self, column: impl Into<String>) -> &mut Self {
        self.index_by = Some(column.into());
        self
    }

    /// Clear all clause state, parameters and result options. The kind is kept.
    pub fn reset(&mut self) -> &mut Self {
        let kind = self.kind;
        *self = Self::default();
        self.kind = kind;
        self
    }

    // ==================== Compile ====================

    /// Compile to SQL with parameter names still in place.
    pub fn compile_template(&self, dialect: &dyn Dialect) -> OrmResult<String> {
        let sql = match self.kind {
            Some(StatementKind::Select) => self.compile_select(dialect)?,
            Some(StatementKind::Insert) => self.compile_insert(dialect)?,
            Some(StatementKind::Update) => self.compile_update(dialect)?,
            Some(StatementKind::Delete) => self.compile_delete(dialect)?,
            None => return Err(OrmError::compile("statement kind is not set")),
        };
        *self.last_sql.borrow_mut() = Some(sql.clone());
        Ok(sql)
    }

    /// Compile to final SQL, with every registered parameter replaced by its
    /// quoted value.
    pub fn compile(&self, dialect: &dyn Dialect) -> OrmResult<String> {
        let template = self.compile_template(dialect)?;
        Ok(self.parameters.substitute(&template, dialect))
    }

    /// Compile into the form handed to a database client.
    pub fn build(&self, dialect: &dyn Dialect) -> OrmResult<crate::client::CompiledQuery> {
        let kind = self
            .kind
            .ok_or_else(|| OrmError::compile("statement kind is not set"))?;
        let template = self.compile_template(dialect)?;
        let sql = self.parameters.substitute(&template, dialect);
        Ok(crate::client::CompiledQuery {
            kind,
            sql,
            template,
            params: self.parameters.snapshot(),
            result_mapping: self.result_mapping.clone(),
        })
    }

    /// Render WHERE, ORDER BY and LIMIT, shared by UPDATE and DELETE.
    fn compile_filter_tail(&self, dialect: &dyn Dialect, sql: &mut String) -> OrmResult<()> {
        if !self.where_tree.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause::compile_conditions(
                &self.where_tree,
                &self.parameters,
                dialect,
            )?);
        }
        if !self.order_by.is_empty() {
            sql.push(' ');
            sql.push_str(&clause::compile_order_by(&self.order_by, dialect));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        Ok(())
    }

    fn require_table(&self) -> OrmResult<&TableRef> {
        self.table.as_ref().ok_or_else(|| {
            let kind = self.kind.map(StatementKind::as_str).unwrap_or("statement");
            OrmError::compile(format!("{kind} requires a target table"))
        })
    }
}

use super::clause::{self, Join, JoinType, dedup_in_order};
use super::{GroupTarget, Statement, StatementKind};
use crate::condition::Connective;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::{Column, TableRef};
use crate::value::Value;

/// Argument accepted by [`Statement::union`].
#[derive(Debug, Clone)]
pub enum UnionSource {
    /// Shorthand for `SELECT * FROM table`.
    Table(String),
    Statement(Statement),
}

impl From<&str> for UnionSource {
    fn from(v: &str) -> Self {
        UnionSource::Table(v.to_string())
    }
}

impl From<String> for UnionSource {
    fn from(v: String) -> Self {
        UnionSource::Table(v)
    }
}

impl From<Statement> for UnionSource {
    fn from(v: Statement) -> Self {
        UnionSource::Statement(v)
    }
}

impl Statement {
    // ==================== Projection ====================

    /// Make this a SELECT. A non-empty list replaces the projection.
    pub fn select<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.kind = Some(StatementKind::Select);
        let columns: Vec<Column> = columns.into_iter().map(Into::into).collect();
        if !columns.is_empty() {
            self.select = columns;
        }
        self
    }

    /// Make this a SELECT without touching the projection (`*` when empty).
    pub fn select_star(&mut self) -> &mut Self {
        self.kind = Some(StatementKind::Select);
        self
    }

    /// Append columns to the projection.
    pub fn select_also<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.kind = Some(StatementKind::Select);
        self.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Toggle `SELECT DISTINCT`.
    pub fn distinct(&mut self, value: bool) -> &mut Self {
        self.distinct = value;
        self
    }

    /// Append a FROM source.
    pub fn from(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.from.push(table.into());
        self
    }

    // ==================== JOIN ====================

    /// Append a join and make it current for [`Statement::on`] / [`Statement::using`].
    pub fn join(
        &mut self,
        table: impl Into<TableRef>,
        join_type: impl Into<Option<JoinType>>,
    ) -> &mut Self {
        self.joins.push(Join::new(table.into(), join_type.into()));
        self.last_join = Some(self.joins.len() - 1);
        self
    }

    /// Append an `INNER JOIN`.
    pub fn inner_join(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.join(table, JoinType::Inner)
    }

    /// Append a `LEFT JOIN`.
    pub fn left_join(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.join(table, JoinType::Left)
    }

    /// Append a `RIGHT JOIN`.
    pub fn right_join(&mut self, table: impl Into<TableRef>) -> &mut Self {
        self.join(table, JoinType::Right)
    }

    fn current_join(&mut self, call: &str) -> OrmResult<&mut Join> {
        let idx = self
            .last_join
            .ok_or_else(|| OrmError::usage(format!("{call}() requires a preceding join()")))?;
        self.joins
            .get_mut(idx)
            .ok_or_else(|| OrmError::usage(format!("{call}(): current join no longer exists")))
    }

    /// Add `left op right` to the current join's ON list.
    pub fn on(
        &mut self,
        left: impl Into<Column>,
        op: impl Into<String>,
        right: impl Into<Column>,
    ) -> OrmResult<&mut Self> {
        let join = self.current_join("on")?;
        join.on.push((left.into(), op.into(), right.into()));
        Ok(self)
    }

    /// Add USING columns to the current join.
    pub fn using<I, C>(&mut self, columns: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        let join = self.current_join("using")?;
        join.using.extend(columns.into_iter().map(Into::into));
        Ok(self)
    }

    // ==================== GROUP BY / HAVING ====================

    /// Append a GROUP BY column. Aliased columns group by their alias.
    pub fn group_by(&mut self, column: impl Into<Column>) -> &mut Self {
        self.group_by.push(column.into());
        self
    }

    /// Alias for [`Statement::and_having`].
    pub fn having(
        &mut self,
        column: impl Into<Column>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.and_having(column, op, value)
    }

    /// Add a HAVING condition joined with AND.
    pub fn and_having(
        &mut self,
        column: impl Into<Column>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.having_tree.push(Connective::And, column, op, value);
        self
    }

    /// Add a HAVING condition joined with OR.
    pub fn or_having(
        &mut self,
        column: impl Into<Column>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.having_tree.push(Connective::Or, column, op, value);
        self
    }

    /// AND every `(column, op, value)` triple into HAVING, in order.
    pub fn having_all<I, C, O, V>(&mut self, conditions: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, O, V)>,
        C: Into<Column>,
        O: Into<String>,
        V: Into<Value>,
    {
        for (column, op, value) in conditions {
            self.having_tree.push(Connective::And, column, op, value);
        }
        self
    }

    /// Open a HAVING `(` group joined with AND.
    pub fn having_open(&mut self) -> &mut Self {
        self.having_tree.open(Connective::And);
        self.open_groups.push(GroupTarget::Having);
        self
    }

    /// Open a HAVING `(` group joined with OR.
    pub fn or_having_open(&mut self) -> &mut Self {
        self.having_tree.open(Connective::Or);
        self.open_groups.push(GroupTarget::Having);
        self
    }

    /// Close the innermost HAVING group.
    pub fn having_close(&mut self) -> &mut Self {
        self.having_tree.close(Connective::And);
        self.forget_group(GroupTarget::Having);
        self
    }

    /// Close the innermost HAVING group, dropping it if it holds no conditions.
    pub fn having_close_empty(&mut self) -> &mut Self {
        self.having_tree.close_empty(Connective::And);
        self.forget_group(GroupTarget::Having);
        self
    }

    // ==================== UNION / paging ====================

    /// Append `UNION [ALL] <select>`.
    pub fn union(&mut self, source: impl Into<UnionSource>, all: bool) -> OrmResult<&mut Self> {
        let stmt = match source.into() {
            UnionSource::Table(table) => {
                if table.trim().is_empty() {
                    return Err(OrmError::usage("union() requires a table name or a SELECT"));
                }
                let mut stmt = Statement::new();
                stmt.select_star().from(table);
                stmt
            }
            UnionSource::Statement(stmt) => {
                if stmt.kind != Some(StatementKind::Select) {
                    return Err(OrmError::usage("union() only accepts SELECT statements"));
                }
                stmt
            }
        };
        self.unions.push((stmt, all));
        Ok(self)
    }

    /// Skip `n` rows.
    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Remove OFFSET.
    pub fn clear_offset(&mut self) -> &mut Self {
        self.offset = None;
        self
    }

    /// Set LIMIT and OFFSET for a 1-based page number.
    pub fn paginate(&mut self, page: u64, per_page: u64) -> &mut Self {
        let per_page = per_page.max(1);
        let page = page.max(1);
        self.limit = Some(per_page);
        self.offset = Some((page - 1).saturating_mul(per_page));
        self
    }

    /// Append `FOR UPDATE` to the SELECT.
    pub fn for_update(&mut self, value: bool) -> &mut Self {
        self.for_update = value;
        self
    }

    // ==================== Compile ====================

    pub(crate) fn compile_select(&self, dialect: &dyn Dialect) -> OrmResult<String> {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.select.is_empty() {
            sql.push('*');
        } else {
            let cols = self.select.iter().map(|c| dialect.quote_column(c)).collect();
            sql.push_str(&dedup_in_order(cols).join(", "));
        }

        sql.push_str(" FROM");
        if !self.from.is_empty() {
            let tables = self.from.iter().map(|t| dialect.quote_table(t)).collect();
            sql.push(' ');
            sql.push_str(&dedup_in_order(tables).join(", "));
        }

        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&clause::compile_join(&self.joins, dialect));
        }

        if !self.where_tree.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause::compile_conditions(
                &self.where_tree,
                &self.parameters,
                dialect,
            )?);
        }

        if !self.group_by.is_empty() {
            sql.push(' ');
            sql.push_str(&clause::compile_group_by(&self.group_by, dialect));
        }

        if !self.having_tree.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&clause::compile_conditions(
                &self.having_tree,
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

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        if self.for_update {
            sql.push_str(" FOR UPDATE");
        }

        for (stmt, all) in &self.unions {
            sql.push_str(if *all { " UNION ALL " } else { " UNION " });
            sql.push_str(&stmt.compile(dialect)?);
        }

        Ok(sql)
    }
}

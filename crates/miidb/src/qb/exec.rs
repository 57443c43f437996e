use super::{SortDir, Statement, StatementKind};
use crate::client::{DatabaseClient, QueryOutput};
use crate::error::{OrmError, OrmResult};
use crate::ident::Column;
use crate::row::{FromRow, Row};
use crate::value::expr;

/// Fields `count()` overwrites and puts back afterwards.
struct CountSnapshot {
    kind: Option<StatementKind>,
    select: Vec<Column>,
    distinct: bool,
    order_by: Vec<(Column, Option<SortDir>)>,
    limit: Option<u64>,
    offset: Option<u64>,
    result_mapping: Option<String>,
    last_sql: Option<String>,
}

impl CountSnapshot {
    fn take(stmt: &mut Statement) -> Self {
        Self {
            kind: stmt.kind,
            select: std::mem::take(&mut stmt.select),
            distinct: stmt.distinct,
            order_by: std::mem::take(&mut stmt.order_by),
            limit: stmt.limit.take(),
            offset: stmt.offset.take(),
            result_mapping: stmt.result_mapping.take(),
            last_sql: stmt.last_sql.borrow().clone(),
        }
    }

    fn restore(self, stmt: &mut Statement) {
        stmt.kind = self.kind;
        stmt.select = self.select;
        stmt.distinct = self.distinct;
        stmt.order_by = self.order_by;
        stmt.limit = self.limit;
        stmt.offset = self.offset;
        stmt.result_mapping = self.result_mapping;
        *stmt.last_sql.borrow_mut() = self.last_sql;
    }
}

impl Statement {
    /// Compile with the client's dialect and run the statement.
    ///
    /// Client errors are returned unchanged.
    pub fn execute(&self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<QueryOutput> {
        let dialect = client.dialect();
        let query = match self.build(dialect) {
            Ok(query) => query,
            Err(err) => {
                tracing::debug!(target: "miidb.sql", dialect = dialect.name(), error = %err, "compile failed");
                return Err(err);
            }
        };

        tracing::debug!(
            target: "miidb.sql",
            kind = query.kind.as_str(),
            dialect = dialect.name(),
            param_count = query.params.len(),
            sql = %query.sql,
        );

        let mut output = client.execute(&query)?;
        if let (QueryOutput::Rows(rows), Some(column)) = (&mut output, &self.index_by) {
            rows.set_index_by(column.clone());
        }
        Ok(output)
    }

    /// Alias for [`Statement::execute`].
    pub fn get(&self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<QueryOutput> {
        self.execute(client)
    }

    /// Set LIMIT 1 and return the first row, if any.
    pub fn one(&mut self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<Option<Row>> {
        self.limit(1);
        let rows = self.execute(client)?.into_rows()?;
        Ok(rows.into_rows().into_iter().next())
    }

    /// Return every row.
    pub fn all(&self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<Vec<Row>> {
        Ok(self.execute(client)?.into_rows()?.into_rows())
    }

    /// Execute and map all rows to `T`.
    pub fn fetch_all<T: FromRow>(&self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<Vec<T>> {
        self.execute(client)?.into_rows()?.decode()
    }

    /// Execute and map the first row to `T`, if any.
    pub fn fetch_opt<T: FromRow>(&self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<Option<T>> {
        let rows = self.execute(client)?.into_rows()?;
        rows.first().map(T::from_row).transpose()
    }

    /// Execute and map the first row to `T`.
    ///
    /// Returns `OrmError::NotFound` if no rows are returned.
    pub fn fetch_one<T: FromRow>(&self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<T> {
        self.fetch_opt::<T>(client)?
            .ok_or_else(|| OrmError::not_found("Expected 1 row, got 0"))
    }

    /// Number of rows the SELECT would return.
    ///
    /// The projection becomes `COUNT(*)` (or `COUNT(DISTINCT first_column)`
    /// for DISTINCT selects) and ordering, paging and result mapping are
    /// dropped for the query. All of them are put back afterwards, whether
    /// or not execution succeeded.
    pub fn count(&mut self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<i64> {
        let dialect = client.dialect();
        let alias = dialect.quote_identifier("count");
        let projection = match self.select.first() {
            Some(first) if self.distinct => expr(format!(
                "COUNT(DISTINCT {}) AS {alias}",
                dialect.quote_column(&first.without_alias())
            )),
            _ => expr(format!("COUNT(*) AS {alias}")),
        };

        let snapshot = CountSnapshot::take(self);
        self.kind = Some(StatementKind::Select);
        self.distinct = false;
        self.select = vec![Column::Expr(projection)];

        tracing::trace!(target: "miidb.sql", "count: projection rewritten");
        let result = self.execute(client);
        snapshot.restore(self);
        tracing::trace!(target: "miidb.sql", ok = result.is_ok(), "count: state restored");

        let rows = result?.into_rows()?;
        let count = rows.column("count", 0);
        count
            .as_i64()
            .ok_or_else(|| OrmError::decode("count", format!("not an integer: {count:?}")))
    }
}

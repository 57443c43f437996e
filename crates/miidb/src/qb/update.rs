use super::Statement;
use super::clause;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Column;
use crate::value::Value;

impl Statement {
    /// Append `column = value` assignments.
    ///
    /// ```ignore
    /// qb::update("users").set([("status", "inactive"), ("score", "0")]);
    /// ```
    pub fn set<I, C, V>(&mut self, pairs: I) -> &mut Self
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<Column>,
        V: Into<Value>,
    {
        self.set
            .extend(pairs.into_iter().map(|(c, v)| (c.into(), v.into())));
        self
    }

    /// Append a single assignment.
    pub fn set_value(&mut self, column: impl Into<Column>, value: impl Into<Value>) -> &mut Self {
        self.set.push((column.into(), value.into()));
        self
    }

    pub(crate) fn compile_update(&self, dialect: &dyn Dialect) -> OrmResult<String> {
        let table = self.require_table()?;
        if self.set.is_empty() {
            return Err(OrmError::compile("UPDATE requires at least one SET column"));
        }

        let mut sql = format!("UPDATE {}", dialect.quote_table(table));

        if !self.joins.is_empty() {
            sql.push(' ');
            sql.push_str(&clause::compile_join(&self.joins, dialect));
        }

        sql.push_str(" SET ");
        sql.push_str(&clause::compile_set(&self.set, &self.parameters, dialect));

        self.compile_filter_tail(dialect, &mut sql)?;
        Ok(sql)
    }
}

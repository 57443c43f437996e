use super::clause::render_value;
use super::{Statement, StatementKind};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::Column;
use crate::value::Value;

/// Where INSERT rows come from. Literal rows and a nested SELECT are
/// mutually exclusive.
#[derive(Debug, Clone)]
pub enum InsertSource {
    Rows(Vec<Vec<Value>>),
    Select(Box<Statement>),
}

impl Statement {
    /// Set the INSERT column list.
    pub fn columns<I, C>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append one row of values.
    ///
    /// Fails if a nested SELECT source was already set.
    pub fn values<I, V>(&mut self, row: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        match self
            .insert_source
            .get_or_insert_with(|| InsertSource::Rows(Vec::new()))
        {
            InsertSource::Select(_) => {
                return Err(OrmError::usage(
                    "INSERT INTO ... SELECT statements cannot be combined with INSERT INTO ... VALUES",
                ));
            }
            InsertSource::Rows(rows) => rows.push(row),
        }
        Ok(self)
    }

    /// Use a SELECT as the INSERT source.
    ///
    /// Fails if `query` is not a SELECT or literal rows were already added.
    pub fn subselect(&mut self, query: Statement) -> OrmResult<&mut Self> {
        if query.kind != Some(StatementKind::Select) {
            return Err(OrmError::usage("Only SELECT queries can be combined with INSERT queries"));
        }
        if let Some(InsertSource::Rows(rows)) = &self.insert_source {
            if !rows.is_empty() {
                return Err(OrmError::usage(
                    "INSERT INTO ... VALUES rows cannot be combined with INSERT INTO ... SELECT",
                ));
            }
        }
        self.insert_source = Some(InsertSource::Select(Box::new(query)));
        Ok(self)
    }

    /// INSERT a single `column => value` row into `table`.
    ///
    /// The column list is taken from the first call; later calls only add rows.
    pub fn insert_row<I, C, V>(
        &mut self,
        table: impl Into<crate::ident::TableRef>,
        pairs: I,
    ) -> OrmResult<&mut Self>
    where
        I: IntoIterator<Item = (C, V)>,
        C: Into<Column>,
        V: Into<Value>,
    {
        self.insert_into(table);
        let (columns, row): (Vec<Column>, Vec<Value>) =
            pairs.into_iter().map(|(c, v)| (c.into(), v.into())).unzip();
        if self.columns.is_empty() {
            self.columns = columns;
        }
        self.values(row)
    }

    pub(crate) fn compile_insert(&self, dialect: &dyn Dialect) -> OrmResult<String> {
        let table = self.require_table()?;
        let mut sql = format!("INSERT INTO {}", dialect.quote_table(table));

        if !self.columns.is_empty() {
            let cols: Vec<String> = self.columns.iter().map(|c| dialect.quote_column(c)).collect();
            sql.push_str(&format!(" ({})", cols.join(", ")));
        }

        match &self.insert_source {
            Some(InsertSource::Rows(rows)) if !rows.is_empty() => {
                let groups: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        let values: Vec<String> = row
                            .iter()
                            .map(|v| render_value(v, &self.parameters, dialect))
                            .collect();
                        format!("({})", values.join(", "))
                    })
                    .collect();
                sql.push_str(" VALUES ");
                sql.push_str(&groups.join(", "));
            }
            Some(InsertSource::Select(query)) => {
                sql.push(' ');
                sql.push_str(&query.compile(dialect)?);
            }
            _ => return Err(OrmError::compile("INSERT has no values and no SELECT source")),
        }

        Ok(sql)
    }
}

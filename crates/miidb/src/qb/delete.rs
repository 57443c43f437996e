use super::Statement;
use crate::dialect::Dialect;
use crate::error::OrmResult;

impl Statement {
    pub(crate) fn compile_delete(&self, dialect: &dyn Dialect) -> OrmResult<String> {
        let table = self.require_table()?;
        let mut sql = format!("DELETE FROM {}", dialect.quote_table(table));
        self.compile_filter_tail(dialect, &mut sql)?;
        Ok(sql)
    }
}

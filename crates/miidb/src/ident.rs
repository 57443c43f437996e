//! Column and table references.
//!
//! Both come in three shapes: a plain (possibly dotted) name, a name with an
//! alias, or a raw [`Expression`] that is emitted verbatim.
//!
//! ```ignore
//! use miidb::{Column, TableRef, expr};
//!
//! let c: Column = "users.id".into();
//! let a: Column = ("users.name", "author").into();
//! let t: TableRef = ("users", "u").into();
//! let raw: Column = expr("COUNT(*)").into();
//! ```

use crate::value::Expression;

/// A column reference.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// `name` or `table.name`.
    Name(String),
    /// `name AS alias`.
    Aliased { name: String, alias: String },
    /// Raw SQL.
    Expr(Expression),
}

impl Column {
    pub fn name(name: impl Into<String>) -> Self {
        Column::Name(name.into())
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Column::Aliased {
            name: name.into(),
            alias: alias.into(),
        }
    }

    /// The reference without its alias, as used inside conditions.
    pub(crate) fn without_alias(&self) -> Column {
        match self {
            Column::Aliased { name, .. } => Column::Name(name.clone()),
            other => other.clone(),
        }
    }

    /// The alias if present, otherwise the reference itself (GROUP BY / ORDER BY).
    pub(crate) fn alias_or_self(&self) -> Column {
        match self {
            Column::Aliased { alias, .. } => Column::Name(alias.clone()),
            other => other.clone(),
        }
    }
}

impl From<&str> for Column {
    fn from(v: &str) -> Self {
        Column::Name(v.to_string())
    }
}

impl From<String> for Column {
    fn from(v: String) -> Self {
        Column::Name(v)
    }
}

impl From<&String> for Column {
    fn from(v: &String) -> Self {
        Column::Name(v.clone())
    }
}

impl From<(&str, &str)> for Column {
    fn from((name, alias): (&str, &str)) -> Self {
        Column::aliased(name, alias)
    }
}

impl From<(String, String)> for Column {
    fn from((name, alias): (String, String)) -> Self {
        Column::aliased(name, alias)
    }
}

impl From<Expression> for Column {
    fn from(v: Expression) -> Self {
        Column::Expr(v)
    }
}

impl From<&Column> for Column {
    fn from(v: &Column) -> Self {
        v.clone()
    }
}

/// A table reference.
#[derive(Debug, Clone, PartialEq)]
pub enum TableRef {
    /// `table` or `schema.table`.
    Name(String),
    /// `table AS alias`.
    Aliased { name: String, alias: String },
    /// Raw SQL (e.g. a derived table).
    Expr(Expression),
}

impl TableRef {
    pub fn name(name: impl Into<String>) -> Self {
        TableRef::Name(name.into())
    }

    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        TableRef::Aliased {
            name: name.into(),
            alias: alias.into(),
        }
    }

    /// The underlying table name, if this is not a raw expression.
    pub fn table_name(&self) -> Option<&str> {
        match self {
            TableRef::Name(name) | TableRef::Aliased { name, .. } => Some(name),
            TableRef::Expr(_) => None,
        }
    }
}

impl From<&str> for TableRef {
    fn from(v: &str) -> Self {
        TableRef::Name(v.to_string())
    }
}

impl From<String> for TableRef {
    fn from(v: String) -> Self {
        TableRef::Name(v)
    }
}

impl From<&String> for TableRef {
    fn from(v: &String) -> Self {
        TableRef::Name(v.clone())
    }
}

impl From<(&str, &str)> for TableRef {
    fn from((name, alias): (&str, &str)) -> Self {
        TableRef::aliased(name, alias)
    }
}

impl From<(String, String)> for TableRef {
    fn from((name, alias): (String, String)) -> Self {
        TableRef::aliased(name, alias)
    }
}

impl From<Expression> for TableRef {
    fn from(v: Expression) -> Self {
        TableRef::Expr(v)
    }
}

impl From<&TableRef> for TableRef {
    fn from(v: &TableRef) -> Self {
        v.clone()
    }
}

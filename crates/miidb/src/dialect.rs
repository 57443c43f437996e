//! Quoting rules for identifiers and literals.
//!
//! The compiler never formats a name or a value itself; it always asks the
//! [`Dialect`] passed to `compile`/`execute`.

use crate::ident::{Column, TableRef};
use crate::value::Value;

/// Identifier and literal quoting for one SQL flavour.
///
/// Implementors provide the quote character, string escaping and boolean
/// rendering; the remaining methods have defaults built on top of those.
pub trait Dialect {
    /// Short name, used in logs.
    fn name(&self) -> &'static str;

    /// Character wrapped around identifiers.
    fn identifier_quote(&self) -> char;

    /// Prefix prepended to every table name.
    fn table_prefix(&self) -> &str {
        ""
    }

    /// Quote and escape a string literal.
    fn quote_string(&self, s: &str) -> String;

    /// Whether a backslash escapes the next character inside a string literal.
    fn backslash_escapes(&self) -> bool {
        false
    }

    /// Render a boolean literal.
    fn quote_bool(&self, b: bool) -> String;

    /// Wrap a single identifier part, doubling embedded quote characters.
    fn wrap_identifier(&self, part: &str) -> String {
        let q = self.identifier_quote();
        let mut out = String::with_capacity(part.len() + 2);
        out.push(q);
        for ch in part.chars() {
            if ch == q {
                out.push(q);
            }
            out.push(ch);
        }
        out.push(q);
        out
    }

    /// Quote a possibly dotted identifier without applying the table prefix.
    ///
    /// `*` parts are left as-is.
    fn quote_identifier(&self, name: &str) -> String {
        if name == "*" {
            return name.to_string();
        }
        name.split('.')
            .map(|part| {
                if part == "*" {
                    part.to_string()
                } else {
                    self.wrap_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a column name; in `table.column` the table part receives the prefix.
    fn quote_column_name(&self, name: &str) -> String {
        if name == "*" {
            return name.to_string();
        }
        let mut parts: Vec<String> = name.split('.').map(str::to_string).collect();
        let prefix = self.table_prefix();
        if !prefix.is_empty() && parts.len() >= 2 {
            let table = parts.len() - 2;
            parts[table] = format!("{prefix}{}", parts[table]);
        }
        parts
            .iter()
            .map(|part| {
                if part == "*" {
                    part.clone()
                } else {
                    self.wrap_identifier(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a column reference, including its alias.
    fn quote_column(&self, column: &Column) -> String {
        match column {
            Column::Name(name) => self.quote_column_name(name),
            Column::Aliased { name, alias } => format!(
                "{} AS {}",
                self.quote_column_name(name),
                self.wrap_identifier(alias)
            ),
            Column::Expr(e) => e.as_str().to_string(),
        }
    }

    /// Quote a table name; in `schema.table` the table part receives the prefix.
    fn quote_table_name(&self, name: &str) -> String {
        let prefix = self.table_prefix();
        match name.rsplit_once('.') {
            Some((schema, table)) => format!(
                "{}.{}",
                self.quote_identifier(schema),
                self.wrap_identifier(&format!("{prefix}{table}"))
            ),
            None => self.wrap_identifier(&format!("{prefix}{name}")),
        }
    }

    /// Quote a table reference. Aliases are prefixed like table names so that
    /// `alias.column` resolves the same way.
    fn quote_table(&self, table: &TableRef) -> String {
        match table {
            TableRef::Name(name) => self.quote_table_name(name),
            TableRef::Aliased { name, alias } => format!(
                "{} AS {}",
                self.quote_table_name(name),
                self.wrap_identifier(&format!("{}{alias}", self.table_prefix()))
            ),
            TableRef::Expr(e) => e.as_str().to_string(),
        }
    }

    /// Render a value as an SQL literal.
    fn quote_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => self.quote_bool(*b),
            Value::Int(n) => n.to_string(),
            Value::Float(n) if n.is_finite() => n.to_string(),
            Value::Float(_) => "NULL".to_string(),
            Value::Text(s) => self.quote_string(s),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|v| self.quote_literal(v)).collect();
                format!("({})", items.join(","))
            }
            Value::Expr(e) => e.as_str().to_string(),
        }
    }
}

/// MySQL / MariaDB quoting: backtick identifiers, backslash-escaped strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MySql {
    pub table_prefix: String,
}

impl MySql {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> char {
        '`'
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn quote_string(&self, s: &str) -> String {
        let mut out = String::with_capacity(s.len() + 2);
        out.push('\'');
        for ch in s.chars() {
            match ch {
                '\0' => out.push_str("\\0"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\\' => out.push_str("\\\\"),
                '\'' => out.push_str("\\'"),
                '"' => out.push_str("\\\""),
                '\x1a' => out.push_str("\\Z"),
                c => out.push(c),
            }
        }
        out.push('\'');
        out
    }

    fn backslash_escapes(&self) -> bool {
        true
    }

    fn quote_bool(&self, b: bool) -> String {
        let lit = if b { "'1'" } else { "'0'" };
        lit.to_string()
    }
}

/// PostgreSQL quoting: double-quoted identifiers, standard-conforming strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Postgres {
    pub table_prefix: String,
}

impl Postgres {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.table_prefix = prefix.into();
        self
    }
}

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn identifier_quote(&self) -> char {
        '"'
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn quote_string(&self, s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    fn quote_bool(&self, b: bool) -> String {
        let lit = if b { "TRUE" } else { "FALSE" };
        lit.to_string()
    }
}

/// A dialect chosen at runtime (e.g. from configuration).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyDialect {
    MySql(MySql),
    Postgres(Postgres),
}

impl Default for AnyDialect {
    fn default() -> Self {
        AnyDialect::MySql(MySql::default())
    }
}

impl AnyDialect {
    fn inner(&self) -> &dyn Dialect {
        match self {
            AnyDialect::MySql(d) => d,
            AnyDialect::Postgres(d) => d,
        }
    }
}

impl Dialect for AnyDialect {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn identifier_quote(&self) -> char {
        self.inner().identifier_quote()
    }

    fn table_prefix(&self) -> &str {
        self.inner().table_prefix()
    }

    fn quote_string(&self, s: &str) -> String {
        self.inner().quote_string(s)
    }

    fn backslash_escapes(&self) -> bool {
        self.inner().backslash_escapes()
    }

    fn quote_bool(&self, b: bool) -> String {
        self.inner().quote_bool(b)
    }
}

impl From<MySql> for AnyDialect {
    fn from(d: MySql) -> Self {
        AnyDialect::MySql(d)
    }
}

impl From<Postgres> for AnyDialect {
    fn from(d: Postgres) -> Self {
        AnyDialect::Postgres(d)
    }
}

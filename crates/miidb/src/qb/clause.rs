//! Clause compilers shared by all statement kinds.
//!
//! Each function renders one part of a statement from accumulated state and
//! a dialect; none of them touch the statement itself.

use super::SortDir;
use super::param::Parameters;
use crate::condition::{ConditionNode, ConditionTree};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::ident::{Column, TableRef};
use crate::value::Value;

/// Join flavour. `None` on a [`Join`] renders a bare `JOIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    pub fn to_sql(self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::Full => "FULL OUTER",
            JoinType::Cross => "CROSS",
        }
    }
}

/// One JOIN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableRef,
    pub join_type: Option<JoinType>,
    pub on: Vec<(Column, String, Column)>,
    pub using: Vec<Column>,
}

impl Join {
    pub fn new(table: TableRef, join_type: Option<JoinType>) -> Self {
        Self {
            table,
            join_type,
            on: Vec::new(),
            using: Vec::new(),
        }
    }
}

/// Render a value: registered parameter names stay bare, lists are rendered
/// element by element, everything else is quoted by the dialect.
pub(crate) fn render_value(value: &Value, params: &Parameters, dialect: &dyn Dialect) -> String {
    match value {
        Value::Text(s) if params.contains(s) => s.clone(),
        Value::List(items) => {
            let items: Vec<String> = items
                .iter()
                .map(|v| render_value(v, params, dialect))
                .collect();
            format!("({})", items.join(","))
        }
        other => dialect.quote_literal(other),
    }
}

/// Compile a WHERE/HAVING tree.
pub(crate) fn compile_conditions(
    tree: &ConditionTree,
    params: &Parameters,
    dialect: &dyn Dialect,
) -> OrmResult<String> {
    tree.validate()?;

    let mut sql = String::new();
    let mut after_open = false;

    for entry in tree.entries() {
        match &entry.node {
            ConditionNode::Open => {
                if !sql.is_empty() && !after_open {
                    sql.push(' ');
                    sql.push_str(entry.connective.to_sql());
                    sql.push(' ');
                }
                sql.push('(');
                after_open = true;
            }
            ConditionNode::Close => {
                if after_open {
                    return Err(OrmError::compile(
                        "condition group has no conditions; use *_close_empty() to drop it",
                    ));
                }
                sql.push(')');
                after_open = false;
            }
            ConditionNode::Leaf(cond) => {
                if !sql.is_empty() && !after_open {
                    sql.push(' ');
                    sql.push_str(entry.connective.to_sql());
                    sql.push(' ');
                }
                after_open = false;

                let mut op = cond.op.trim().to_uppercase();
                if cond.value.is_null() {
                    if op == "=" {
                        op = "IS".to_string();
                    } else if op == "!=" || op == "<>" {
                        op = "IS NOT".to_string();
                    }
                }

                let value = match (&cond.value, op.as_str()) {
                    (Value::List(bounds), "BETWEEN" | "NOT BETWEEN") => match bounds.as_slice() {
                        [min, max] => format!(
                            "{} AND {}",
                            render_value(min, params, dialect),
                            render_value(max, params, dialect)
                        ),
                        _ => {
                            return Err(OrmError::compile(format!(
                                "{op} expects exactly two values, got {}",
                                bounds.len()
                            )));
                        }
                    },
                    (value, _) => render_value(value, params, dialect),
                };

                let column = match cond.column.without_alias() {
                    Column::Name(name) if name.is_empty() => String::new(),
                    column => dialect.quote_column(&column),
                };

                sql.push_str(format!("{column} {op} {value}").trim());
            }
        }
    }

    Ok(sql)
}

pub(crate) fn compile_join(joins: &[Join], dialect: &dyn Dialect) -> String {
    joins
        .iter()
        .map(|join| {
            let mut sql = match join.join_type {
                Some(t) => format!("{} JOIN", t.to_sql()),
                None => "JOIN".to_string(),
            };
            sql.push(' ');
            sql.push_str(&dialect.quote_table(&join.table));

            if !join.using.is_empty() {
                let cols: Vec<String> = join.using.iter().map(|c| dialect.quote_column(c)).collect();
                sql.push_str(&format!(" USING ({})", cols.join(", ")));
            } else if !join.on.is_empty() {
                let conds: Vec<String> = join
                    .on
                    .iter()
                    .map(|(left, op, right)| {
                        format!(
                            "{} {} {}",
                            dialect.quote_column(left),
                            op.trim().to_uppercase(),
                            dialect.quote_column(right)
                        )
                    })
                    .collect();
                sql.push_str(&format!(" ON ({})", conds.join(" AND ")));
            }
            sql
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn compile_group_by(columns: &[Column], dialect: &dyn Dialect) -> String {
    let cols: Vec<String> = columns
        .iter()
        .map(|c| dialect.quote_column(&c.alias_or_self()))
        .collect();
    format!("GROUP BY {}", cols.join(", "))
}

pub(crate) fn compile_order_by(
    columns: &[(Column, Option<SortDir>)],
    dialect: &dyn Dialect,
) -> String {
    let cols: Vec<String> = columns
        .iter()
        .map(|(c, dir)| {
            let col = dialect.quote_column(&c.alias_or_self());
            match dir {
                Some(dir) => format!("{col} {}", dir.to_sql()),
                None => col,
            }
        })
        .collect();
    format!("ORDER BY {}", cols.join(", "))
}

/// Compile UPDATE assignments. A column assigned twice keeps its first
/// position and its last value.
pub(crate) fn compile_set(
    pairs: &[(Column, Value)],
    params: &Parameters,
    dialect: &dyn Dialect,
) -> String {
    let mut rendered: Vec<(String, String)> = Vec::with_capacity(pairs.len());
    for (column, value) in pairs {
        let column = dialect.quote_column(column);
        let assignment = format!("{column} = {}", render_value(value, params, dialect));
        match rendered.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = assignment,
            None => rendered.push((column, assignment)),
        }
    }
    rendered
        .into_iter()
        .map(|(_, a)| a)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Keep the first occurrence of each string.
pub(crate) fn dedup_in_order(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Connective;
    use crate::dialect::MySql;

    fn conditions(tree: &ConditionTree) -> String {
        compile_conditions(tree, &Parameters::new(), &MySql::new()).unwrap()
    }

    #[test]
    fn null_rewrites_to_is() {
        let mut tree = ConditionTree::new();
        tree.push(Connective::And, "c", "=", Value::Null);
        tree.push(Connective::And, "c", "!=", Value::Null);
        assert_eq!(conditions(&tree), "`c` IS NULL AND `c` IS NOT NULL");
    }

    #[test]
    fn operators_are_uppercased() {
        let mut tree = ConditionTree::new();
        tree.push(Connective::And, "name", "like", "a%");
        tree.push(Connective::Or, "id", "not in", [1, 2]);
        assert_eq!(conditions(&tree), "`name` LIKE 'a%' OR `id` NOT IN (1,2)");
    }

    #[test]
    fn between_needs_two_bounds() {
        let mut tree = ConditionTree::new();
        tree.push(Connective::And, "a", "BETWEEN", [1, 2, 3]);
        let err = compile_conditions(&tree, &Parameters::new(), &MySql::new()).unwrap_err();
        assert!(err.is_compile());
    }

    #[test]
    fn aliased_leaf_column_uses_name() {
        let mut tree = ConditionTree::new();
        tree.push(Connective::And, ("users.id", "uid"), ">", 3);
        assert_eq!(conditions(&tree), "`users`.`id` > 3");
    }

    #[test]
    fn empty_column_is_trimmed() {
        let mut tree = ConditionTree::new();
        tree.push(
            Connective::And,
            "",
            "exists",
            crate::value::expr("(SELECT 1)"),
        );
        assert_eq!(conditions(&tree), "EXISTS (SELECT 1)");
    }

    #[test]
    fn set_dedupes_by_column() {
        let pairs = vec![
            (Column::from("a"), Value::Int(1)),
            (Column::from("b"), Value::Int(2)),
            (Column::from("a"), Value::Int(3)),
        ];
        assert_eq!(
            compile_set(&pairs, &Parameters::new(), &MySql::new()),
            "`a` = 3, `b` = 2"
        );
    }

    #[test]
    fn join_using_and_bare_join() {
        let mut using = Join::new("t".into(), None);
        using.using.push("id".into());
        let cross = Join::new("u".into(), Some(JoinType::Cross));
        assert_eq!(
            compile_join(&[using, cross], &MySql::new()),
            "JOIN `t` USING (`id`) CROSS JOIN `u`"
        );
    }
}

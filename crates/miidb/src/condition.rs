//! Condition trees for WHERE and HAVING.
//!
//! A tree is a flat, ordered list of entries. Each entry carries the
//! connective that joins it to whatever precedes it, and is either a leaf
//! condition or a group marker. Parentheses come from the markers, so the
//! structure the caller built is exactly the structure that gets rendered.

use crate::error::{OrmError, OrmResult};
use crate::ident::Column;
use crate::value::Value;

/// Logical connective between adjacent entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connective {
    And,
    Or,
}

impl Connective {
    pub fn to_sql(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// A single `column OP value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: Column,
    pub op: String,
    pub value: Value,
}

/// Leaf or group marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Leaf(Condition),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionEntry {
    pub connective: Connective,
    pub node: ConditionNode,
}

/// Ordered, connective-tagged list of leaves and group markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionTree {
    entries: Vec<ConditionEntry>,
}

impl ConditionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ConditionEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn push(
        &mut self,
        connective: Connective,
        column: impl Into<Column>,
        op: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.entries.push(ConditionEntry {
            connective,
            node: ConditionNode::Leaf(Condition {
                column: column.into(),
                op: op.into(),
                value: value.into(),
            }),
        });
    }

    pub fn open(&mut self, connective: Connective) {
        self.entries.push(ConditionEntry {
            connective,
            node: ConditionNode::Open,
        });
    }

    pub fn close(&mut self, connective: Connective) {
        self.entries.push(ConditionEntry {
            connective,
            node: ConditionNode::Close,
        });
    }

    /// Close the innermost open group, or drop it entirely if it holds no leaves.
    pub fn close_empty(&mut self, connective: Connective) {
        match self.innermost_open() {
            Some(start) if !self.has_leaf_after(start) => self.entries.truncate(start),
            _ => self.close(connective),
        }
    }

    /// Number of groups opened but not yet closed.
    pub fn open_depth(&self) -> usize {
        let mut depth: usize = 0;
        for entry in &self.entries {
            match entry.node {
                ConditionNode::Open => depth += 1,
                ConditionNode::Close => depth = depth.saturating_sub(1),
                ConditionNode::Leaf(_) => {}
            }
        }
        depth
    }

    /// Check that every open marker has a matching close marker.
    pub fn validate(&self) -> OrmResult<()> {
        let mut depth: i64 = 0;
        for (i, entry) in self.entries.iter().enumerate() {
            match entry.node {
                ConditionNode::Open => depth += 1,
                ConditionNode::Close => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(OrmError::compile(format!(
                            "unmatched group close at condition {i}"
                        )));
                    }
                }
                ConditionNode::Leaf(_) => {}
            }
        }
        if depth != 0 {
            return Err(OrmError::compile(format!(
                "{depth} condition group(s) left open"
            )));
        }
        Ok(())
    }

    fn innermost_open(&self) -> Option<usize> {
        let mut depth: usize = 0;
        for (i, entry) in self.entries.iter().enumerate().rev() {
            match entry.node {
                ConditionNode::Close => depth += 1,
                ConditionNode::Open if depth == 0 => return Some(i),
                ConditionNode::Open => depth -= 1,
                ConditionNode::Leaf(_) => {}
            }
        }
        None
    }

    fn has_leaf_after(&self, start: usize) -> bool {
        self.entries[start..]
            .iter()
            .any(|e| matches!(e.node, ConditionNode::Leaf(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_empty_drops_group_without_leaves() {
        let mut tree = ConditionTree::new();
        tree.push(Connective::And, "a", "=", 1);
        tree.open(Connective::Or);
        tree.close_empty(Connective::And);
        assert_eq!(tree.len(), 1);
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn close_empty_drops_nested_empty_groups() {
        let mut tree = ConditionTree::new();
        tree.open(Connective::And);
        tree.open(Connective::And);
        tree.close(Connective::And);
        tree.close_empty(Connective::And);
        assert!(tree.is_empty());
    }

    #[test]
    fn close_empty_closes_non_empty_group() {
        let mut tree = ConditionTree::new();
        tree.open(Connective::And);
        tree.push(Connective::And, "a", "=", 1);
        tree.close_empty(Connective::And);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.open_depth(), 0);
    }

    #[test]
    fn validate_reports_unbalanced_markers() {
        let mut open = ConditionTree::new();
        open.open(Connective::And);
        assert!(open.validate().unwrap_err().is_compile());

        let mut close = ConditionTree::new();
        close.close(Connective::And);
        assert!(close.validate().unwrap_err().is_compile());
    }
}

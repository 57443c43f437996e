//! A minimal active-record layer on top of the statement builder.
//!
//! A [`Record`] holds one row of one table as an ordered field map. It knows
//! which fields changed since it was loaded and produces the SELECT, INSERT,
//! UPDATE and DELETE statements for itself. Relations are not modelled.
//!
//! # Example
//!
//! ```ignore
//! use miidb::model::Record;
//!
//! let mut user = Record::new("users", ["id", "name", "email"]);
//! user.set("name", "alice").set("email", "alice@example.com");
//! user.create(&client)?;
//!
//! user.set("email", "alice@example.org");
//! user.update(&client)?;
//! ```

use crate::client::DatabaseClient;
use crate::error::{OrmError, OrmResult};
use crate::qb::{self, SortDir, Statement};
use crate::row::{FromValue, Row};
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Primary key column used by UPDATE and DELETE statements.
pub const ID_FIELD: &str = "id";

/// Soft-delete marker column. NULL means the row is live.
pub const DELETED_FIELD: &str = "deleted";

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: String,
    fields: Vec<(String, Value)>,
    changed: BTreeSet<String>,
    loaded: bool,
    order_by: Vec<(String, SortDir)>,
}

impl Record {
    /// A new, unloaded record with every field NULL.
    pub fn new<I, S>(table: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            table: table.into(),
            fields: fields.into_iter().map(|f| (f.into(), Value::Null)).collect(),
            changed: BTreeSet::new(),
            loaded: false,
            order_by: Vec::new(),
        }
    }

    /// A loaded record built from a fetched row.
    pub fn from_row(table: impl Into<String>, row: &Row) -> Self {
        Self {
            table: table.into(),
            fields: row
                .columns()
                .iter()
                .cloned()
                .zip(row.values().iter().cloned())
                .collect(),
            changed: BTreeSet::new(),
            loaded: true,
            order_by: Vec::new(),
        }
    }

    /// Default ordering applied by [`Record::query`].
    pub fn with_order_by(mut self, column: impl Into<String>, dir: SortDir) -> Self {
        self.order_by.push((column.into(), dir));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// Value of `field`. Unknown fields are a validation error.
    pub fn get(&self, field: &str) -> OrmResult<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                OrmError::validation(format!("Field {field} does not exist in {}", self.table))
            })
    }

    /// Typed value of `field`.
    pub fn get_as<T: FromValue>(&self, field: &str) -> OrmResult<T> {
        let value = self.get(field)?;
        T::from_value(value).map_err(|message| OrmError::decode(field, message))
    }

    /// Assign `field`. Unknown fields are ignored. On a loaded record the field
    /// is marked changed when the value actually differs.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        if let Some((_, slot)) = self.fields.iter_mut().find(|(name, _)| name == field) {
            if *slot != value {
                *slot = value;
                if self.loaded {
                    self.changed.insert(field.to_string());
                }
            }
        }
        self
    }

    /// Assign every known field in `data`.
    pub fn fill_with<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (field, value) in data {
            self.set(field.as_ref(), value);
        }
        self
    }

    /// Fields changed since the record was loaded.
    pub fn changed(&self) -> &BTreeSet<String> {
        &self.changed
    }

    pub fn is_changed(&self, field: &str) -> bool {
        self.changed.contains(field)
    }

    /// Qualified `table.field` names, in field order.
    pub fn fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(name, _)| format!("{}.{name}", self.table))
            .collect()
    }

    pub fn as_map(&self) -> BTreeMap<String, Value> {
        self.fields.iter().cloned().collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    fn id(&self) -> OrmResult<&Value> {
        let id = self.get(ID_FIELD)?;
        if id.is_null() {
            return Err(OrmError::validation(format!(
                "{} record has no {ID_FIELD}",
                self.table
            )));
        }
        Ok(id)
    }

    // ==================== Statements ====================

    /// `SELECT table.field, ... FROM table`, mapped to this table's records.
    pub fn query(&self) -> Statement {
        let mut stmt = qb::select(self.fields());
        stmt.from(self.table.as_str()).as_object(self.table.as_str());
        for (column, dir) in &self.order_by {
            stmt.order_by(column.as_str(), *dir);
        }
        stmt
    }

    /// [`Record::query`] filtered by `field op value`.
    pub fn find_by(&self, field: &str, op: &str, value: impl Into<Value>) -> Statement {
        let mut stmt = self.query();
        stmt.and_where(field, op, value);
        stmt
    }

    /// The row with the given id.
    pub fn find(&self, id: impl Into<Value>) -> Statement {
        let mut stmt = self.find_by(ID_FIELD, "=", id);
        stmt.limit(1);
        stmt
    }

    /// INSERT of every field.
    pub fn create_statement(&self) -> OrmResult<Statement> {
        let mut stmt = qb::insert(self.table.as_str());
        stmt.columns(self.fields.iter().map(|(name, _)| name.as_str()))
            .values(self.fields.iter().map(|(_, value)| value.clone()))?;
        Ok(stmt)
    }

    /// UPDATE of the changed fields, or `None` when nothing changed.
    pub fn update_statement(&self) -> OrmResult<Option<Statement>> {
        if self.changed.is_empty() {
            return Ok(None);
        }
        let id = self.id()?.clone();
        let mut stmt = qb::update(self.table.as_str());
        stmt.set(
            self.fields
                .iter()
                .filter(|(name, _)| self.changed.contains(name))
                .map(|(name, value)| (name.as_str(), value.clone())),
        )
        .and_where(ID_FIELD, "=", id);
        Ok(Some(stmt))
    }

    /// DELETE of this row. The record must be loaded.
    pub fn delete_statement(&self) -> OrmResult<Statement> {
        let id = self.loaded_id("delete")?;
        let mut stmt = qb::delete(self.table.as_str());
        stmt.and_where(ID_FIELD, "=", id);
        Ok(stmt)
    }

    fn loaded_id(&self, action: &str) -> OrmResult<Value> {
        if !self.loaded {
            return Err(OrmError::validation(format!(
                "Cannot {action} a non-loaded {} record",
                self.table
            )));
        }
        self.id().cloned()
    }

    // ==================== Execution ====================

    /// INSERT the record, then mark it loaded and store the generated id.
    pub fn create(&mut self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<&mut Self> {
        let output = self.create_statement()?.execute(client)?;
        self.loaded = true;
        self.changed.clear();

        if let Some(id) = output.last_insert_id() {
            match self.fields.iter_mut().find(|(name, _)| name == ID_FIELD) {
                Some((_, slot)) => *slot = Value::Int(id),
                None => self.fields.push((ID_FIELD.to_string(), Value::Int(id))),
            }
        }
        Ok(self)
    }

    /// UPDATE the changed fields. Returns the affected row count, 0 when
    /// nothing changed.
    pub fn update(&mut self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<u64> {
        let Some(stmt) = self.update_statement()? else {
            return Ok(0);
        };
        let affected = stmt.execute(client)?.affected_rows();
        self.changed.clear();
        Ok(affected)
    }

    /// DELETE the row. The record stays readable but is no longer loaded.
    pub fn delete(&mut self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<u64> {
        let affected = self.delete_statement()?.execute(client)?.affected_rows();
        self.loaded = false;
        Ok(affected)
    }

    // ==================== Soft delete ====================

    /// `UPDATE table SET deleted = now WHERE id = ...`
    pub fn soft_delete_statement(&self, now: i64) -> OrmResult<Statement> {
        let id = self.loaded_id("delete")?;
        let mut stmt = qb::update(self.table.as_str());
        stmt.set_value(DELETED_FIELD, now).and_where(ID_FIELD, "=", id);
        Ok(stmt)
    }

    /// `UPDATE table SET deleted = NULL WHERE id = ...`
    pub fn restore_statement(&self) -> OrmResult<Statement> {
        let id = self.id()?.clone();
        let mut stmt = qb::update(self.table.as_str());
        stmt.set_value(DELETED_FIELD, Value::Null)
            .and_where(ID_FIELD, "=", id);
        Ok(stmt)
    }

    /// Mark the row deleted with the current Unix time.
    pub fn soft_delete(&mut self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<u64> {
        let now = chrono::Utc::now().timestamp();
        let affected = self.soft_delete_statement(now)?.execute(client)?.affected_rows();
        self.loaded = false;
        self.fields
            .iter_mut()
            .filter(|(name, _)| name == DELETED_FIELD)
            .for_each(|(_, slot)| *slot = Value::Int(now));
        Ok(affected)
    }

    pub fn restore(&mut self, client: &(impl DatabaseClient + ?Sized)) -> OrmResult<u64> {
        let affected = self.restore_statement()?.execute(client)?.affected_rows();
        self.fields
            .iter_mut()
            .filter(|(name, _)| name == DELETED_FIELD)
            .for_each(|(_, slot)| *slot = Value::Null);
        Ok(affected)
    }
}

/// Restrict a SELECT to live rows (`deleted IS NULL`).
pub fn soft_delete_scope(stmt: &mut Statement) -> &mut Statement {
    stmt.and_where(DELETED_FIELD, "=", Value::Null)
}

/// Restrict a SELECT to soft-deleted rows (`deleted IS NOT NULL`).
pub fn only_deleted(stmt: &mut Statement) -> &mut Statement {
    stmt.and_where(DELETED_FIELD, "!=", Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::MySql;

    fn user() -> Record {
        Record::from_row(
            "users",
            &Row::from_pairs([
                ("id", Value::Int(5)),
                ("name", Value::from("alice")),
                ("deleted", Value::Null),
            ]),
        )
    }

    #[test]
    fn get_unknown_field_is_validation_error() {
        let err = user().get("missing").unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));
        assert_eq!(user().get_as::<i64>("id").unwrap(), 5);
    }

    #[test]
    fn set_tracks_changes_only_when_loaded() {
        let mut fresh = Record::new("users", ["id", "name"]);
        fresh.set("name", "bob").set("unknown", 1);
        assert!(fresh.changed().is_empty());
        assert_eq!(fresh.get("name").unwrap(), &Value::from("bob"));
        assert!(!fresh.has_field("unknown"));

        let mut loaded = user();
        loaded.set("name", "alice");
        assert!(loaded.changed().is_empty());
        loaded.fill_with([("name", "carol")]);
        assert!(loaded.is_changed("name"));
    }

    #[test]
    fn query_selects_qualified_fields() {
        let record = user().with_order_by("name", SortDir::Asc);
        let stmt = record.find_by("name", "LIKE", "a%");
        assert_eq!(
            stmt.compile(&MySql::new()).unwrap(),
            "SELECT `users`.`id`, `users`.`name`, `users`.`deleted` FROM `users` \
             WHERE `name` LIKE 'a%' ORDER BY `name` ASC"
        );
        assert_eq!(stmt.result_mapping(), Some("users"));
    }

    #[test]
    fn find_limits_to_one() {
        let stmt = Record::new("users", ["id"]).find(3);
        assert_eq!(
            stmt.compile(&MySql::new()).unwrap(),
            "SELECT `users`.`id` FROM `users` WHERE `id` = 3 LIMIT 1"
        );
    }

    #[test]
    fn create_statement_inserts_every_field() {
        let mut record = Record::new("users", ["name", "email"]);
        record.set("name", "bob");
        assert_eq!(
            record.create_statement().unwrap().compile(&MySql::new()).unwrap(),
            "INSERT INTO `users` (`name`, `email`) VALUES ('bob', NULL)"
        );
    }

    #[test]
    fn update_statement_uses_changed_fields() {
        let mut record = user();
        assert!(record.update_statement().unwrap().is_none());

        record.set("name", "carol");
        assert_eq!(
            record.update_statement().unwrap().unwrap().compile(&MySql::new()).unwrap(),
            "UPDATE `users` SET `name` = 'carol' WHERE `id` = 5"
        );
    }

    #[test]
    fn delete_requires_loaded_record() {
        let err = Record::new("users", ["id"]).delete_statement().unwrap_err();
        assert!(matches!(err, OrmError::Validation(_)));

        assert_eq!(
            user().delete_statement().unwrap().compile(&MySql::new()).unwrap(),
            "DELETE FROM `users` WHERE `id` = 5"
        );
    }

    #[test]
    fn soft_delete_statements() {
        let record = user();
        assert_eq!(
            record.soft_delete_statement(1_700_000_000).unwrap().compile(&MySql::new()).unwrap(),
            "UPDATE `users` SET `deleted` = 1700000000 WHERE `id` = 5"
        );
        assert_eq!(
            record.restore_statement().unwrap().compile(&MySql::new()).unwrap(),
            "UPDATE `users` SET `deleted` = NULL WHERE `id` = 5"
        );
    }

    #[test]
    fn soft_delete_scopes() {
        let mut live = record_query();
        soft_delete_scope(&mut live);
        assert_eq!(
            live.compile(&MySql::new()).unwrap(),
            "SELECT `users`.`id` FROM `users` WHERE `deleted` IS NULL"
        );

        let mut gone = record_query();
        only_deleted(&mut gone);
        assert_eq!(
            gone.compile(&MySql::new()).unwrap(),
            "SELECT `users`.`id` FROM `users` WHERE `deleted` IS NOT NULL"
        );
    }

    fn record_query() -> Statement {
        Record::new("users", ["id"]).query()
    }

    #[test]
    fn to_json_keeps_values() {
        assert_eq!(
            user().to_json(),
            serde_json::json!({"id": 5, "name": "alice", "deleted": null})
        );
    }
}

//! Row mapping traits and result containers

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A single result row: column names paired with values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    /// Build a row. Missing trailing values are treated as NULL.
    pub fn new(columns: impl Into<Arc<[String]>>, values: Vec<Value>) -> Self {
        Self {
            columns: columns.into(),
            values,
        }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let (columns, values): (Vec<String>, Vec<Value>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self::new(columns, values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Value of `column`, if the row has it.
    pub fn get(&self, column: &str) -> Option<&Value> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.values.get(idx).unwrap_or(&Value::Null))
    }

    /// Typed access; a missing column or a failed conversion is `OrmError::Decode`.
    pub fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| OrmError::decode(column, "no such column"))?;
        T::from_value(value).map_err(|message| OrmError::decode(column, message))
    }

    /// Row as a JSON object, in column order.
    pub fn to_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let v = self.values.get(i).map(Value::to_json);
                (c.clone(), v.unwrap_or(serde_json::Value::Null))
            })
            .collect()
    }

    /// Decode the row into any `serde` deserializable type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> OrmResult<T> {
        Ok(serde_json::from_value(serde_json::Value::Object(
            self.to_json(),
        ))?)
    }
}

/// Trait for converting a database row into a Rust type.
///
/// # Example
///
/// ```ignore
/// use miidb::{FromRow, OrmResult, Row};
///
/// struct User {
///     id: i64,
///     username: String,
///     email: Option<String>,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> OrmResult<Self> {
///         Ok(Self {
///             id: row.try_get("id")?,
///             username: row.try_get("username")?,
///             email: row.try_get("email")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

impl FromRow for BTreeMap<String, Value> {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row
            .columns()
            .iter()
            .cloned()
            .zip(row.values().iter().cloned())
            .collect())
    }
}

impl FromRow for serde_json::Value {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(serde_json::Value::Object(row.to_json()))
    }
}

/// Conversion from a single [`Value`]. Errors are plain messages; the caller
/// attaches the column name.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, got {value:?}")
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value.as_i64().ok_or_else(|| mismatch("integer", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let n = i64::from_value(value)?;
        i32::try_from(n).map_err(|e| e.to_string())
    }
}

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => s.trim().parse().map_err(|_| mismatch("unsigned integer", value)),
            _ => {
                let n = i64::from_value(value)?;
                u64::try_from(n).map_err(|e| e.to_string())
            }
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value.as_f64().ok_or_else(|| mismatch("float", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        value.as_bool().ok_or_else(|| mismatch("boolean", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Int(n) => Ok(n.to_string()),
            Value::Float(n) => Ok(n.to_string()),
            Value::Expr(e) => Ok(e.as_str().to_string()),
            _ => Err(mismatch("text", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.to_json())
    }
}

impl FromValue for chrono::NaiveDate {
    fn from_value(value: &Value) -> Result<Self, String> {
        let s = value.as_text().ok_or_else(|| mismatch("date", value))?;
        chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string())
    }
}

impl FromValue for chrono::NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        let s = value.as_text().ok_or_else(|| mismatch("datetime", value))?;
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map_err(|e| e.to_string())
    }
}

impl FromValue for uuid::Uuid {
    fn from_value(value: &Value) -> Result<Self, String> {
        let s = value.as_text().ok_or_else(|| mismatch("uuid", value))?;
        uuid::Uuid::parse_str(s).map_err(|e| e.to_string())
    }
}

#[cfg(feature = "rust_decimal")]
impl FromValue for rust_decimal::Decimal {
    fn from_value(value: &Value) -> Result<Self, String> {
        use std::str::FromStr;
        match value {
            Value::Int(n) => Ok(rust_decimal::Decimal::from(*n)),
            Value::Text(s) => rust_decimal::Decimal::from_str(s).map_err(|e| e.to_string()),
            _ => Err(mismatch("decimal", value)),
        }
    }
}

/// Rows returned by a SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<Row>,
    index_by: Option<String>,
}

impl ResultSet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            index_by: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Value of `column` in the first row, or `default` when there is no row
    /// or no such column.
    pub fn column(&self, column: &str, default: impl Into<Value>) -> Value {
        self.first()
            .and_then(|row| row.get(column))
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Column used as the key by [`ResultSet::indexed`].
    pub fn index_column(&self) -> Option<&str> {
        self.index_by.as_deref()
    }

    pub fn set_index_by(&mut self, column: impl Into<String>) {
        self.index_by = Some(column.into());
    }

    /// Rows keyed by the index column. Later rows win on duplicate keys.
    pub fn indexed(&self) -> OrmResult<BTreeMap<String, &Row>> {
        let column = self
            .index_by
            .as_deref()
            .ok_or_else(|| OrmError::validation("result set has no index column"))?;
        let mut out = BTreeMap::new();
        for row in &self.rows {
            let key = row
                .get(column)
                .ok_or_else(|| OrmError::decode(column, "no such column"))?;
            out.insert(index_key(key), row);
        }
        Ok(out)
    }

    /// Map every row through `FromRow`.
    pub fn decode<T: FromRow>(&self) -> OrmResult<Vec<T>> {
        self.rows.iter().map(T::from_row).collect()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn index_key(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Int(n) => n.to_string(),
        other => other.to_json().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn user_row(id: i64, name: &str) -> Row {
        Row::from_pairs([("id", Value::Int(id)), ("name", Value::from(name))])
    }

    #[test]
    fn try_get_reports_column_on_failure() {
        let row = user_row(1, "alice");
        assert_eq!(row.try_get::<i64>("id").unwrap(), 1);
        assert_eq!(row.try_get::<String>("name").unwrap(), "alice");
        let err = row.try_get::<i64>("name").unwrap_err();
        assert!(matches!(err, OrmError::Decode { ref column, .. } if column == "name"));
        assert!(row.try_get::<i64>("missing").is_err());
    }

    #[test]
    fn deserialize_via_serde() {
        #[derive(Deserialize)]
        struct User {
            id: i64,
            name: String,
        }
        let user: User = user_row(7, "bob").deserialize().unwrap();
        assert_eq!(user.id, 7);
        assert_eq!(user.name, "bob");
    }

    #[test]
    fn column_falls_back_to_default() {
        let empty = ResultSet::default();
        assert_eq!(empty.column("count", 0), Value::Int(0));

        let rs = ResultSet::new(vec![Row::from_pairs([("count", 12)])]);
        assert_eq!(rs.column("count", 0), Value::Int(12));
    }

    #[test]
    fn indexed_keys_rows_by_column() {
        let mut rs = ResultSet::new(vec![user_row(1, "a"), user_row(2, "b")]);
        assert!(rs.indexed().is_err());
        rs.set_index_by("id");
        let by_id = rs.indexed().unwrap();
        assert_eq!(by_id["2"].try_get::<String>("name").unwrap(), "b");
    }
}

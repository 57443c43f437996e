//! TOML configuration for dialect selection and monitoring.
//!
//! ```toml
//! dialect = "postgres"
//! table_prefix = "${APP_TABLE_PREFIX}"
//!
//! [monitor]
//! enabled = true
//! slow_query_ms = 250
//! ```

use crate::dialect::{AnyDialect, MySql, Postgres};
use crate::error::{OrmError, OrmResult};
use crate::monitor::MonitorConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    MySql,
    Postgres,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub dialect: DialectKind,
    /// Prepended to every table name. `${VAR}` references are expanded.
    pub table_prefix: String,
    pub monitor: MonitorSection,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorSection {
    pub enabled: bool,
    /// Statements slower than this are reported as slow. Unset disables it.
    pub slow_query_ms: Option<u64>,
}

impl DatabaseConfig {
    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            OrmError::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text and expand environment references.
    pub fn from_toml_str(raw: &str) -> OrmResult<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.table_prefix = expand_env_vars(&config.table_prefix, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> OrmResult<()> {
        if let Some(bad) = self
            .table_prefix
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_'))
        {
            return Err(OrmError::Config(format!(
                "table_prefix may only contain ASCII letters, digits and '_' (found {bad:?})"
            )));
        }
        Ok(())
    }

    pub fn build_dialect(&self) -> AnyDialect {
        match self.dialect {
            DialectKind::MySql => MySql::new().with_table_prefix(&self.table_prefix).into(),
            DialectKind::Postgres => Postgres::new().with_table_prefix(&self.table_prefix).into(),
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new();
        if let Some(ms) = self.monitor.slow_query_ms {
            config = config.with_slow_query_threshold(Duration::from_millis(ms));
        }
        if self.monitor.enabled {
            config = config.enable_monitoring();
        }
        config
    }
}

/// Replace `${NAME}` with the value `lookup` returns for `NAME`.
fn expand_env_vars(input: &str, lookup: impl Fn(&str) -> Option<String>) -> OrmResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                return Err(OrmError::Config(format!(
                    "unterminated env var reference: ${{{key}"
                )));
            }
            if key.is_empty() {
                return Err(OrmError::Config("invalid env var reference: ${}".into()));
            }

            let value = lookup(&key)
                .ok_or_else(|| OrmError::Config(format!("missing env var for config expansion: {key}")))?;
            out.push_str(&value);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::ident::TableRef;

    #[test]
    fn defaults_when_empty() {
        let config = DatabaseConfig::from_toml_str("").unwrap();
        assert_eq!(config, DatabaseConfig::default());
        assert_eq!(config.build_dialect().name(), "mysql");
        assert_eq!(config.monitor_config(), MonitorConfig::default());
    }

    #[test]
    fn parses_full_config() {
        let config = DatabaseConfig::from_toml_str(
            r#"
            dialect = "postgres"
            table_prefix = "app_"

            [monitor]
            enabled = true
            slow_query_ms = 250
            "#,
        )
        .unwrap();

        let dialect = config.build_dialect();
        assert_eq!(dialect.name(), "postgres");
        assert_eq!(dialect.quote_table(&TableRef::from("users")), "\"app_users\"");

        let monitor = config.monitor_config();
        assert!(monitor.monitoring_enabled);
        assert_eq!(monitor.slow_query_threshold, Some(Duration::from_millis(250)));
    }

    #[test]
    fn rejects_unknown_dialect() {
        let err = DatabaseConfig::from_toml_str(r#"dialect = "oracle""#).unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn rejects_bad_prefix() {
        let err = DatabaseConfig::from_toml_str(r#"table_prefix = "a`b""#).unwrap_err();
        assert!(matches!(err, OrmError::Config(_)));
    }

    #[test]
    fn expands_env_references() {
        let lookup = |key: &str| (key == "PREFIX").then(|| "tenant1_".to_string());
        assert_eq!(expand_env_vars("${PREFIX}", lookup).unwrap(), "tenant1_");
        assert_eq!(expand_env_vars("x_${PREFIX}y", lookup).unwrap(), "x_tenant1_y");
        assert_eq!(expand_env_vars("plain", lookup).unwrap(), "plain");
    }

    #[test]
    fn env_reference_errors() {
        let lookup = |_: &str| None;
        assert!(expand_env_vars("${MISSING}", lookup).is_err());
        assert!(expand_env_vars("${", lookup).is_err());
        assert!(expand_env_vars("${}", lookup).is_err());
    }
}

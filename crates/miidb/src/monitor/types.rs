use crate::client::{CompiledQuery, QueryOutput};
use crate::qb::StatementKind;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Context information about the statement being executed.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// SQL before parameter substitution; stable across parameter values,
    /// so it is used as the aggregation key.
    pub canonical_sql: String,
    /// The SQL actually sent to the client.
    pub exec_sql: String,
    /// Number of registered parameters.
    pub param_count: usize,
    /// Statement kind.
    pub query_type: StatementKind,
    /// Optional structured fields for observability (low-cardinality).
    pub fields: BTreeMap<String, String>,
}

impl QueryContext {
    /// Create a context for a compiled statement.
    pub fn new(query: &CompiledQuery) -> Self {
        Self {
            canonical_sql: query.template.clone(),
            exec_sql: query.sql.clone(),
            param_count: query.params.len(),
            query_type: query.kind,
            fields: BTreeMap::new(),
        }
    }

    /// Add a structured field (low-cardinality).
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Result of a statement execution for monitoring purposes.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// Statement returned rows.
    Rows(usize),
    /// Statement affected rows.
    Affected(u64),
    /// Statement failed (message truncated to 512 bytes).
    Error(String),
}

impl QueryResult {
    /// Create an error result, truncating the message.
    pub fn error(msg: String) -> Self {
        if msg.len() > MAX_ERROR_LEN {
            let truncated = super::truncate_sql_bytes(&msg, MAX_ERROR_LEN);
            Self::Error(format!("{truncated}..."))
        } else {
            Self::Error(msg)
        }
    }
}

impl From<&QueryOutput> for QueryResult {
    fn from(output: &QueryOutput) -> Self {
        match output {
            QueryOutput::Rows(rows) => QueryResult::Rows(rows.len()),
            QueryOutput::Inserted { affected_rows, .. } => QueryResult::Affected(*affected_rows),
            QueryOutput::Affected(n) => QueryResult::Affected(*n),
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Trait for monitoring statement execution.
///
/// Implement this trait to collect metrics, log statements, or integrate
/// with observability systems.
pub trait QueryMonitor: Send + Sync {
    /// Called before a statement is executed.
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes (success or failure).
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called when a slow statement is detected.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}

/// Action to take after a hook processes a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum HookAction {
    /// Continue with the original SQL.
    Continue,
    /// Continue with a modified SQL statement.
    ModifySql {
        /// SQL to send to the client.
        exec_sql: String,
        /// Optional override for canonical SQL (metrics key).
        canonical_sql: Option<String>,
    },
    /// Abort with an error.
    Abort(String),
}

/// Trait for hooking into the execution lifecycle.
///
/// Hooks can inspect, modify, or abort statements before they run.
pub trait QueryHook: Send + Sync {
    /// Called before a statement is executed.
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called after a statement completes.
    ///
    /// This is called before monitors receive the completion event.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}

use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook};
use tracing::Level;

/// A hook that emits the SQL about to be executed as a `tracing` event.
///
/// It fires from [`QueryHook::before_query`], so it logs even when
/// monitoring is disabled on the [`InstrumentedClient`](super::InstrumentedClient).
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Event level.
    pub level: Level,
    /// Truncate long SQL (in bytes, on a char boundary). `None` disables truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub(crate) fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }

    fn emit(&self, ctx: &QueryContext, sql: &str) {
        macro_rules! emit_at_level {
            ($level:expr, $($field:tt)*) => {
                match $level {
                    Level::ERROR => tracing::error!($($field)*),
                    Level::WARN  => tracing::warn!($($field)*),
                    Level::INFO  => tracing::info!($($field)*),
                    Level::DEBUG => tracing::debug!($($field)*),
                    Level::TRACE => tracing::trace!($($field)*),
                }
            };
        }

        let dialect = ctx.fields.get("dialect").map(String::as_str).unwrap_or("-");
        emit_at_level!(
            self.level,
            target: "miidb.sql",
            kind = ctx.query_type.as_str(),
            dialect,
            param_count = ctx.param_count,
            sql = %sql,
        );
    }
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        self.emit(ctx, &self.truncate_sql(&ctx.exec_sql));
        HookAction::Continue
    }
}

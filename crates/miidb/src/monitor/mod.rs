//! Query monitoring and hooks for statement execution.
//!
//! This module provides traits and utilities for:
//! - Timing every statement sent to a [`DatabaseClient`](crate::DatabaseClient)
//! - Hooking into execution to rewrite or abort SQL before it runs
//! - Logging through `tracing` and collecting simple statistics
//!
//! # Example
//!
//! ```rust,ignore
//! use miidb::monitor::{InstrumentedClient, LoggingMonitor, MonitorConfig, TracingSqlHook};
//! use std::time::Duration;
//!
//! let config = MonitorConfig::new()
//!     .with_slow_query_threshold(Duration::from_millis(200))
//!     .enable_monitoring();
//!
//! let client = InstrumentedClient::new(db_client)
//!     .with_config(config)
//!     .with_monitor(LoggingMonitor::new())
//!     .with_hook(TracingSqlHook::new());
//!
//! let rows = miidb::qb::select(["id"]).from("users").all(&client)?;
//! ```

mod config;
mod instrumented;
mod monitors;
mod tracing_hook;
mod types;

#[cfg(test)]
mod tests;

pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;
pub use monitors::{
    CompositeHook, CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor,
};
pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

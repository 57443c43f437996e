use super::config::MonitorConfig;
use super::monitors::{CompositeHook, NoopMonitor};
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult};
use crate::client::{CompiledQuery, DatabaseClient, QueryOutput};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A [`DatabaseClient`] wrapper that runs hooks and reports timings to a monitor.
///
/// Hooks always run. Monitors only see statements once monitoring is
/// enabled via [`MonitorConfig::enable_monitoring`].
pub struct InstrumentedClient<C> {
    client: C,
    monitor: Arc<dyn QueryMonitor>,
    hook: Option<Arc<dyn QueryHook>>,
    config: MonitorConfig,
}

impl<C: DatabaseClient> InstrumentedClient<C> {
    /// Wrap a client with no monitor and no hook.
    pub fn new(client: C) -> Self {
        Self {
            client,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Replace the hook.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Add a hook, running after any hook already set.
    pub fn add_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        let hook: Arc<dyn QueryHook> = Arc::new(hook);
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = true;
        self
    }

    pub fn disable_monitoring(mut self) -> Self {
        self.config.monitoring_enabled = false;
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn inner(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn apply_hook(&self, ctx: &mut QueryContext) -> OrmResult<()> {
        let Some(hook) = &self.hook else {
            return Ok(());
        };

        match hook.before_query(ctx) {
            HookAction::Continue => Ok(()),
            HookAction::ModifySql {
                exec_sql,
                canonical_sql,
            } => {
                ctx.exec_sql = exec_sql;
                if let Some(canonical_sql) = canonical_sql {
                    ctx.canonical_sql = canonical_sql;
                }
                Ok(())
            }
            HookAction::Abort(reason) => Err(OrmError::validation(format!(
                "Statement aborted by hook: {reason}"
            ))),
        }
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if !self.config.monitoring_enabled {
            return;
        }

        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }

        self.monitor.on_query_complete(ctx, duration, result);

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }
}

impl<C: DatabaseClient> DatabaseClient for InstrumentedClient<C> {
    fn dialect(&self) -> &dyn Dialect {
        self.client.dialect()
    }

    fn execute(&self, query: &CompiledQuery) -> OrmResult<QueryOutput> {
        let mut ctx = QueryContext::new(query).with_field("dialect", self.client.dialect().name());
        self.apply_hook(&mut ctx)?;

        let query = if ctx.exec_sql == query.sql {
            Cow::Borrowed(query)
        } else {
            let mut rewritten = query.clone();
            rewritten.sql = ctx.exec_sql.clone();
            Cow::Owned(rewritten)
        };

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = self.client.execute(&query);
        let duration = start.elapsed();

        let reported = match &result {
            Ok(output) => QueryResult::from(output),
            Err(err) => QueryResult::error(err.to_string()),
        };
        self.report_result(&ctx, duration, &reported);

        result
    }
}

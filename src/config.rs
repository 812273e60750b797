//! Configuration for tracing behavior.

use std::time::Duration;

/// Configuration options for driver tracing.
///
/// # Example
///
/// ```rust
/// use dbal_tracing::TracingConfig;
/// use std::time::Duration;
///
/// let config = TracingConfig::default()
///     .with_statement_logging(true)
///     .with_slow_query_threshold(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Whether to include the SQL statement in spans as `db.statement`.
    /// Default: `false`. Span names only ever carry the operation and table.
    pub log_statements: bool,

    /// Operations exceeding this duration are flagged `slow_query` and logged at WARN.
    /// Default: 500ms
    pub slow_query_threshold: Duration,

    /// Whether to record the number of rows affected/returned.
    /// Default: `true`
    pub record_row_counts: bool,

    /// Whether to record the connecting user as `db.user`.
    /// Default: `true`
    pub record_user: bool,

    /// Only open spans when there is a parent span to attach them to.
    /// Default: `true`, so connections used outside a traced request stay silent.
    pub require_parent_span: bool,

    /// Database name recorded as `db.name`, overriding the `dbname` connect parameter.
    /// Default: `None`
    pub database_name: Option<String>,

    /// Value for `peer.service`, naming the database node in service maps.
    /// Default: `None`
    pub peer_service: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            log_statements: false,
            slow_query_threshold: Duration::from_millis(500),
            record_row_counts: true,
            record_user: true,
            require_parent_span: true,
            database_name: None,
            peer_service: None,
        }
    }
}

impl TracingConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable SQL statement logging in spans.
    ///
    /// **Security Warning**: statements may carry credentials or PII inline.
    pub fn with_statement_logging(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = threshold;
        self
    }

    pub fn with_row_count_recording(mut self, enabled: bool) -> Self {
        self.record_row_counts = enabled;
        self
    }

    pub fn with_user_recording(mut self, enabled: bool) -> Self {
        self.record_user = enabled;
        self
    }

    /// Allow spans without a parent; they become trace roots.
    pub fn with_parent_span_required(mut self, required: bool) -> Self {
        self.require_parent_span = required;
        self
    }

    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    pub fn with_peer_service(mut self, service: impl Into<String>) -> Self {
        self.peer_service = Some(service.into());
        self
    }

    /// Full visibility, including SQL text and root spans.
    ///
    /// **Warning**: Do not use in production as it logs all SQL.
    pub fn development() -> Self {
        Self {
            log_statements: true,
            slow_query_threshold: Duration::from_millis(100),
            require_parent_span: false,
            ..Self::default()
        }
    }

    /// Production-safe configuration with minimal overhead.
    pub fn production() -> Self {
        Self {
            log_statements: false,
            slow_query_threshold: Duration::from_secs(1),
            record_user: false,
            ..Self::default()
        }
    }
}

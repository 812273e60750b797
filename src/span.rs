//! Span construction and result recording shared by connections and statements.

use std::future::Future;
use std::net::IpAddr;
use std::time::Instant;

use tracing::{field, Instrument, Span};

use crate::config::TracingConfig;
use crate::driver::ConnectionParams;
use crate::error::DriverError;
use crate::hub::Hub;
use crate::parser::ParsedSql;

/// Operation recorded as `db.op` on every database span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanOp {
    Prepare,
    Query,
    Exec,
    BeginTransaction,
    Commit,
    Rollback,
    StatementExecute,
}

impl SpanOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpanOp::Prepare => "db.sql.prepare",
            SpanOp::Query => "db.sql.query",
            SpanOp::Exec => "db.sql.exec",
            SpanOp::BeginTransaction => "db.sql.transaction.begin",
            SpanOp::Commit => "db.sql.transaction.commit",
            SpanOp::Rollback => "db.sql.transaction.rollback",
            SpanOp::StatementExecute => "db.sql.execute",
        }
    }
}

/// Connection-level span attributes, computed once per connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpanData {
    pub system: String,
    pub user: Option<String>,
    pub database: Option<String>,
    pub server_address: Option<String>,
    pub server_socket_address: Option<String>,
    pub server_port: Option<u16>,
    pub transport: Option<&'static str>,
    pub peer_service: Option<String>,
}

impl SpanData {
    pub fn new(platform: &str, params: &ConnectionParams, config: &TracingConfig) -> Self {
        let mut data = SpanData {
            system: platform.to_string(),
            peer_service: config.peer_service.clone(),
            ..Default::default()
        };

        if config.record_user {
            data.user = params.get("user").cloned();
        }

        data.database = config
            .database_name
            .clone()
            .or_else(|| params.get("dbname").cloned());

        let in_memory = params.contains_key("memory");
        if let Some(host) = params.get("host").filter(|h| !h.is_empty() && !in_memory) {
            if host.parse::<IpAddr>().is_ok() {
                data.server_socket_address = Some(host.clone());
            } else {
                data.server_address = Some(host.clone());
            }
        }

        data.server_port = params.get("port").and_then(|p| p.parse().ok());

        if params.contains_key("unix_socket") {
            data.transport = Some("unix");
        } else if in_memory {
            data.transport = Some("inproc");
        }

        data
    }
}

/// Open a child span for `op` running `sql`, or `None` when the hub has nowhere to attach it.
pub(crate) fn open(hub: &Hub, data: &SpanData, op: SpanOp, sql: &str) -> Option<Span> {
    let parent = hub.child_parent()?;
    let parsed = ParsedSql::parse(sql);

    let span = tracing::info_span!(
        parent: parent,
        "db.sql",
        otel.name = %parsed.span_name(),
        otel.kind = "client",
        db.op = op.as_str(),
        db.system = %data.system,
        db.operation = %parsed.operation,
        db.sql.table = field::Empty,
        db.statement = field::Empty,
        db.user = field::Empty,
        db.name = field::Empty,
        db.rows_affected = field::Empty,
        db.duration_ms = field::Empty,
        server.address = field::Empty,
        server.socket.address = field::Empty,
        server.port = field::Empty,
        network.transport = field::Empty,
        peer.service = field::Empty,
        otel.status_code = field::Empty,
        error.message = field::Empty,
        slow_query = field::Empty,
    );

    if let Some(table) = &parsed.table {
        span.record("db.sql.table", table.as_str());
    }
    if hub.config().log_statements {
        span.record("db.statement", sql);
    }
    if let Some(user) = &data.user {
        span.record("db.user", user.as_str());
    }
    if let Some(name) = &data.database {
        span.record("db.name", name.as_str());
    }
    if let Some(addr) = &data.server_address {
        span.record("server.address", addr.as_str());
    }
    if let Some(addr) = &data.server_socket_address {
        span.record("server.socket.address", addr.as_str());
    }
    if let Some(port) = data.server_port {
        span.record("server.port", port as i64);
    }
    if let Some(transport) = data.transport {
        span.record("network.transport", transport);
    }
    if let Some(peer) = &data.peer_service {
        span.record("peer.service", peer.as_str());
    }

    Some(span)
}

/// Record the outcome of an operation in its span.
pub(crate) fn record_result<T>(
    config: &TracingConfig,
    span: &Span,
    result: &Result<T, DriverError>,
    start: Instant,
    row_count: Option<u64>,
) {
    let elapsed = start.elapsed();
    let duration_ms = elapsed.as_millis() as i64;
    span.record("db.duration_ms", duration_ms);

    if config.record_row_counts {
        if let Some(count) = row_count {
            span.record("db.rows_affected", count);
        }
    }

    if elapsed > config.slow_query_threshold {
        span.record("slow_query", true);
        let threshold_ms = config.slow_query_threshold.as_millis() as i64;
        tracing::warn!(
            parent: span,
            duration_ms = duration_ms,
            threshold_ms = threshold_ms,
            "Slow query detected"
        );
    }

    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(e) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", e.to_string().as_str());
            tracing::error!(
                parent: span,
                error = %e,
                "Database operation failed"
            );
        }
    }
}

/// Run `operation` inside a child span for `op`, recording its outcome.
///
/// `rows` extracts the affected row count from a successful result.
pub(crate) async fn traced<T, F>(
    hub: &Hub,
    data: &SpanData,
    op: SpanOp,
    sql: &str,
    rows: impl FnOnce(&T) -> Option<u64>,
    operation: F,
) -> Result<T, DriverError>
where
    F: Future<Output = Result<T, DriverError>>,
{
    let Some(span) = open(hub, data, op, sql) else {
        return operation.await;
    };

    let start = Instant::now();
    let result = operation.instrument(span.clone()).await;
    let row_count = result.as_ref().ok().and_then(rows);
    record_result(hub.config(), &span, &result, start, row_count);

    result
}

//! Traced driver connection wrapper.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::driver::{ConnectionParams, DriverConnection, DriverStatement, ServerInfoAwareConnection};
use crate::error::DriverError;
use crate::hub::Hub;
use crate::span::{self, SpanData, SpanOp};
use crate::statement::TracingStatement;

/// A traced wrapper around a raw [`DriverConnection`].
///
/// `prepare`, `query`, `exec` and the transaction methods each run inside a
/// `db.sql` span whose `db.op` names the operation (`db.sql.query`,
/// `db.sql.transaction.commit`, ...). Statements handed out by `prepare` and
/// `query` are wrapped in a [`TracingStatement`]. Everything else is forwarded
/// untouched, and errors are returned exactly as the wrapped connection raised them.
///
/// # Span Nesting
///
/// Spans attach to the span the [`Hub`] resolves: its bound span, or the span current
/// when the operation starts. With no parent and `require_parent_span` set (the
/// default), operations run without a span.
#[derive(Debug, Clone)]
pub struct TracingDriverConnection {
    hub: Arc<Hub>,
    inner: Arc<dyn DriverConnection>,
    params: ConnectionParams,
    span_data: Arc<SpanData>,
}

impl TracingDriverConnection {
    /// Wrap `inner`, opened against a `platform` database with `params`.
    pub fn new(
        hub: Arc<Hub>,
        inner: Arc<dyn DriverConnection>,
        platform: &str,
        params: ConnectionParams,
    ) -> Self {
        let span_data = Arc::new(SpanData::new(platform, &params, hub.config()));
        Self {
            hub,
            inner,
            params,
            span_data,
        }
    }

    /// The wrapped raw connection.
    pub fn inner(&self) -> &Arc<dyn DriverConnection> {
        &self.inner
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Parameters the connection was opened with.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    pub fn platform_name(&self) -> &str {
        &self.span_data.system
    }

    pub fn span_data(&self) -> &SpanData {
        &self.span_data
    }

    fn wrap_statement(&self, statement: Box<dyn DriverStatement>, sql: &str) -> Box<dyn DriverStatement> {
        Box::new(TracingStatement::new(
            self.hub.clone(),
            statement,
            sql,
            self.span_data.clone(),
        ))
    }

    async fn trace_transaction<F>(&self, op: SpanOp, sql: &str, operation: F) -> Result<(), DriverError>
    where
        F: Future<Output = Result<(), DriverError>> + Send,
    {
        span::traced(&self.hub, &self.span_data, op, sql, |_| None, operation).await
    }
}

#[async_trait]
impl DriverConnection for TracingDriverConnection {
    async fn prepare(&self, sql: &str) -> Result<Box<dyn DriverStatement>, DriverError> {
        let statement = span::traced(
            &self.hub,
            &self.span_data,
            SpanOp::Prepare,
            sql,
            |_| None,
            self.inner.prepare(sql),
        )
        .await?;

        Ok(self.wrap_statement(statement, sql))
    }

    async fn query(&self, sql: &str) -> Result<Box<dyn DriverStatement>, DriverError> {
        let statement = span::traced(
            &self.hub,
            &self.span_data,
            SpanOp::Query,
            sql,
            |stmt: &Box<dyn DriverStatement>| Some(stmt.row_count()),
            self.inner.query(sql),
        )
        .await?;

        Ok(self.wrap_statement(statement, sql))
    }

    fn quote(&self, value: &str) -> String {
        self.inner.quote(value)
    }

    async fn exec(&self, sql: &str) -> Result<u64, DriverError> {
        span::traced(
            &self.hub,
            &self.span_data,
            SpanOp::Exec,
            sql,
            |affected| Some(*affected),
            self.inner.exec(sql),
        )
        .await
    }

    async fn last_insert_id(&self, name: Option<&str>) -> Result<Option<String>, DriverError> {
        self.inner.last_insert_id(name).await
    }

    async fn begin_transaction(&self) -> Result<(), DriverError> {
        self.trace_transaction(
            SpanOp::BeginTransaction,
            "BEGIN TRANSACTION",
            self.inner.begin_transaction(),
        )
        .await
    }

    async fn commit(&self) -> Result<(), DriverError> {
        self.trace_transaction(SpanOp::Commit, "COMMIT", self.inner.commit())
            .await
    }

    async fn roll_back(&self) -> Result<(), DriverError> {
        self.trace_transaction(SpanOp::Rollback, "ROLLBACK", self.inner.roll_back())
            .await
    }

    fn error_code(&self) -> Option<String> {
        self.inner.error_code()
    }

    fn as_server_info_aware(&self) -> Option<&dyn ServerInfoAwareConnection> {
        self.inner
            .as_server_info_aware()
            .map(|_| self as &dyn ServerInfoAwareConnection)
    }
}

impl ServerInfoAwareConnection for TracingDriverConnection {
    fn server_version(&self) -> Result<String, DriverError> {
        match self.inner.as_server_info_aware() {
            Some(connection) => connection.server_version(),
            None => Err(DriverError::new(
                "the wrapped connection does not report its server version",
            )),
        }
    }

    fn requires_query_for_server_version(&self) -> bool {
        self.inner
            .as_server_info_aware()
            .is_some_and(|connection| connection.requires_query_for_server_version())
    }
}

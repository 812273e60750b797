//! Traced statement wrapper.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Value;

use crate::driver::{DriverStatement, ParamKey, Row};
use crate::error::DriverError;
use crate::hub::Hub;
use crate::span::{self, SpanData, SpanOp};

/// Wraps a statement handed out by a [`TracingDriverConnection`](crate::TracingDriverConnection)
/// so that each `execute` runs in a `db.sql.execute` span.
#[derive(Debug)]
pub struct TracingStatement {
    hub: Arc<Hub>,
    inner: Box<dyn DriverStatement>,
    sql: String,
    span_data: Arc<SpanData>,
}

impl TracingStatement {
    pub fn new(
        hub: Arc<Hub>,
        inner: Box<dyn DriverStatement>,
        sql: impl Into<String>,
        span_data: Arc<SpanData>,
    ) -> Self {
        Self {
            hub,
            inner,
            sql: sql.into(),
            span_data,
        }
    }

    /// SQL the statement was prepared from.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn into_inner(self) -> Box<dyn DriverStatement> {
        self.inner
    }
}

#[async_trait]
impl DriverStatement for TracingStatement {
    fn bind_value(&mut self, key: ParamKey, value: Value) -> Result<(), DriverError> {
        self.inner.bind_value(key, value)
    }

    async fn execute(&mut self, params: Option<Vec<Value>>) -> Result<(), DriverError> {
        let inner = &mut self.inner;
        let operation = async move {
            inner.execute(params).await?;
            Ok::<u64, DriverError>(inner.row_count())
        };

        span::traced(
            &self.hub,
            &self.span_data,
            SpanOp::StatementExecute,
            &self.sql,
            |rows| Some(*rows),
            operation,
        )
        .await
        .map(|_| ())
    }

    fn row_count(&self) -> u64 {
        self.inner.row_count()
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, DriverError> {
        self.inner.fetch_all().await
    }

    fn close_cursor(&mut self) -> bool {
        self.inner.close_cursor()
    }
}

//! Basic example showing how to wrap a driver with tracing.
//!
//! Run with: cargo run --example basic

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dbal_tracing::prelude::*;
use dbal_tracing::{
    BackendPlatform, ConnectionParams, DatabasePlatform, DriverError, DriverOptions, ParamKey,
    Row, SchemaManager,
};
use sea_orm::sea_query::Value;
use sea_orm::DbBackend;
use tracing::Instrument;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A pretend driver that accepts every statement.
#[derive(Debug, Default)]
struct InMemoryDriver;

#[derive(Debug, Default)]
struct InMemoryConnection {
    inserted: AtomicU64,
}

#[derive(Debug, Default)]
struct InMemoryStatement {
    executed: bool,
}

#[derive(Debug)]
struct NoTables;

#[async_trait]
impl SchemaManager for NoTables {
    async fn list_table_names(&self) -> Result<Vec<String>, DriverError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl Driver for InMemoryDriver {
    async fn connect(
        &self,
        _params: &ConnectionParams,
        _username: Option<&str>,
        _password: Option<&str>,
        _driver_options: &DriverOptions,
    ) -> Result<Arc<dyn DriverConnection>, DriverError> {
        Ok(Arc::new(InMemoryConnection::default()))
    }

    fn database_platform(&self) -> Arc<dyn DatabasePlatform> {
        Arc::new(BackendPlatform::new(DbBackend::Sqlite))
    }

    fn schema_manager(
        &self,
        _connection: &Arc<dyn DriverConnection>,
        _platform: Option<Arc<dyn DatabasePlatform>>,
    ) -> Arc<dyn SchemaManager> {
        Arc::new(NoTables)
    }

    fn name(&self) -> &str {
        "in_memory"
    }

    fn database(&self, _connection: &Arc<dyn DriverConnection>) -> Option<String> {
        Some("main".to_string())
    }
}

#[async_trait]
impl DriverConnection for InMemoryConnection {
    async fn prepare(&self, _sql: &str) -> Result<Box<dyn DriverStatement>, DriverError> {
        Ok(Box::new(InMemoryStatement::default()))
    }

    async fn query(&self, _sql: &str) -> Result<Box<dyn DriverStatement>, DriverError> {
        Ok(Box::new(InMemoryStatement { executed: true }))
    }

    fn quote(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    async fn exec(&self, _sql: &str) -> Result<u64, DriverError> {
        Ok(self.inserted.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn last_insert_id(&self, _name: Option<&str>) -> Result<Option<String>, DriverError> {
        Ok(Some(self.inserted.load(Ordering::SeqCst).to_string()))
    }

    async fn begin_transaction(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn commit(&self) -> Result<(), DriverError> {
        Ok(())
    }

    async fn roll_back(&self) -> Result<(), DriverError> {
        Ok(())
    }

    fn error_code(&self) -> Option<String> {
        None
    }
}

#[async_trait]
impl DriverStatement for InMemoryStatement {
    fn bind_value(&mut self, _key: ParamKey, _value: Value) -> Result<(), DriverError> {
        Ok(())
    }

    async fn execute(&mut self, _params: Option<Vec<Value>>) -> Result<(), DriverError> {
        self.executed = true;
        Ok(())
    }

    fn row_count(&self) -> u64 {
        u64::from(self.executed)
    }

    fn column_count(&self) -> usize {
        1
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, DriverError> {
        Ok(vec![vec![Value::Int(Some(1))]])
    }

    fn close_cursor(&mut self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,dbal_tracing=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Option 1: the extension trait
    let hub = Arc::new(Hub::new(TracingConfig::development()));
    let driver = InMemoryDriver.with_tracing(hub);

    // Option 2: explicit construction
    // let driver = TracingDriver::new(hub, Arc::new(InMemoryDriver));

    let params: ConnectionParams = BTreeMap::from([("memory".to_string(), "true".to_string())]);
    let connection = driver.connect(&params, None, None, &DriverOptions::new()).await?;

    async {
        connection.begin_transaction().await?;
        connection
            .exec("INSERT INTO notes (body) VALUES ('hello')")
            .await?;
        connection.commit().await?;

        let mut statement = connection.prepare("SELECT body FROM notes WHERE id = ?").await?;
        statement.execute(Some(vec![Value::Int(Some(1))])).await?;
        Ok::<(), DriverError>(())
    }
    .instrument(tracing::info_span!("request", http.route = "/notes"))
    .await?;

    let last_insert_id = connection.last_insert_id(None).await?;
    tracing::info!(last_insert_id = ?last_insert_id, "Done");

    Ok(())
}

//! Stub drivers and a span-capturing subscriber for unit tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::sea_query::Value;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::driver::{
    ConnectionParams, Driver, DriverConnection, DriverOptions, DriverStatement,
    ExceptionConverterDriver, ParamKey, Row, ServerInfoAwareConnection, VersionAwarePlatformDriver,
};
use crate::error::{DriverError, DriverException, ExceptionKind};
use crate::platform::{DatabasePlatform, SchemaManager};

pub(crate) fn params(pairs: &[(&str, &str)]) -> ConnectionParams {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Method names in call order.
#[derive(Debug, Default)]
pub(crate) struct Calls(Mutex<Vec<&'static str>>);

impl Calls {
    fn record(&self, method: &'static str) {
        self.0.lock().unwrap().push(method);
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|m| **m == method).count()
    }
}

#[derive(Debug)]
pub(crate) struct StubPlatform {
    name: String,
}

impl StubPlatform {
    pub(crate) fn named(name: &str) -> Arc<dyn DatabasePlatform> {
        Arc::new(Self {
            name: name.to_string(),
        })
    }
}

impl DatabasePlatform for StubPlatform {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub(crate) struct StubSchemaManager {
    tables: Vec<String>,
}

#[async_trait]
impl SchemaManager for StubSchemaManager {
    async fn list_table_names(&self) -> Result<Vec<String>, DriverError> {
        Ok(self.tables.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConnectArgs {
    pub params: ConnectionParams,
    pub username: Option<String>,
    pub password: Option<String>,
    pub driver_options: DriverOptions,
}

type SchemaManagerArgs = (Arc<dyn DriverConnection>, Option<Arc<dyn DatabasePlatform>>);

/// Driver that records every call. Optional capabilities are off unless enabled.
#[derive(Debug)]
pub(crate) struct StubDriver {
    pub calls: Calls,
    pub platform: Arc<dyn DatabasePlatform>,
    pub connection: Arc<StubConnection>,
    pub schema_manager: Arc<dyn SchemaManager>,
    database: Option<String>,
    connect_error: Option<DriverError>,
    version_platform: Option<Arc<dyn DatabasePlatform>>,
    converts_exceptions: bool,
    pub last_connect: Mutex<Option<ConnectArgs>>,
    pub last_schema_manager: Mutex<Option<SchemaManagerArgs>>,
    pub last_database_connection: Mutex<Option<Arc<dyn DriverConnection>>>,
    pub last_version: Mutex<Option<String>>,
    pub last_conversion: Mutex<Option<(String, DriverError)>>,
}

impl StubDriver {
    pub(crate) fn new(platform: &str) -> Self {
        Self {
            calls: Calls::default(),
            platform: StubPlatform::named(platform),
            connection: Arc::new(StubConnection::default()),
            schema_manager: Arc::new(StubSchemaManager {
                tables: vec!["users".to_string()],
            }),
            database: None,
            connect_error: None,
            version_platform: None,
            converts_exceptions: false,
            last_connect: Mutex::new(None),
            last_schema_manager: Mutex::new(None),
            last_database_connection: Mutex::new(None),
            last_version: Mutex::new(None),
            last_conversion: Mutex::new(None),
        }
    }

    pub(crate) fn with_database(mut self, name: &str) -> Self {
        self.database = Some(name.to_string());
        self
    }

    pub(crate) fn failing_connect(mut self, error: DriverError) -> Self {
        self.connect_error = Some(error);
        self
    }

    pub(crate) fn version_aware(mut self, platform: Arc<dyn DatabasePlatform>) -> Self {
        self.version_platform = Some(platform);
        self
    }

    pub(crate) fn converting(mut self) -> Self {
        self.converts_exceptions = true;
        self
    }
}

#[async_trait]
impl Driver for StubDriver {
    async fn connect(
        &self,
        params: &ConnectionParams,
        username: Option<&str>,
        password: Option<&str>,
        driver_options: &DriverOptions,
    ) -> Result<Arc<dyn DriverConnection>, DriverError> {
        self.calls.record("connect");
        *self.last_connect.lock().unwrap() = Some(ConnectArgs {
            params: params.clone(),
            username: username.map(str::to_string),
            password: password.map(str::to_string),
            driver_options: driver_options.clone(),
        });

        match &self.connect_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.connection.clone()),
        }
    }

    fn database_platform(&self) -> Arc<dyn DatabasePlatform> {
        self.calls.record("database_platform");
        self.platform.clone()
    }

    fn schema_manager(
        &self,
        connection: &Arc<dyn DriverConnection>,
        platform: Option<Arc<dyn DatabasePlatform>>,
    ) -> Arc<dyn SchemaManager> {
        self.calls.record("schema_manager");
        *self.last_schema_manager.lock().unwrap() = Some((connection.clone(), platform));
        self.schema_manager.clone()
    }

    fn name(&self) -> &str {
        self.calls.record("name");
        "stub"
    }

    fn database(&self, connection: &Arc<dyn DriverConnection>) -> Option<String> {
        self.calls.record("database");
        *self.last_database_connection.lock().unwrap() = Some(connection.clone());
        self.database.clone()
    }

    fn as_version_aware(&self) -> Option<&dyn VersionAwarePlatformDriver> {
        self.version_platform
            .as_ref()
            .map(|_| self as &dyn VersionAwarePlatformDriver)
    }

    fn as_exception_converter(&self) -> Option<&dyn ExceptionConverterDriver> {
        self.converts_exceptions
            .then_some(self as &dyn ExceptionConverterDriver)
    }
}

impl VersionAwarePlatformDriver for StubDriver {
    fn create_database_platform_for_version(&self, version: &str) -> Arc<dyn DatabasePlatform> {
        self.calls.record("create_database_platform_for_version");
        *self.last_version.lock().unwrap() = Some(version.to_string());
        self.version_platform
            .clone()
            .unwrap_or_else(|| self.platform.clone())
    }
}

impl ExceptionConverterDriver for StubDriver {
    fn convert_exception(&self, message: &str, error: DriverError) -> DriverException {
        self.calls.record("convert_exception");
        *self.last_conversion.lock().unwrap() = Some((message.to_string(), error.clone()));
        DriverException::with_kind(ExceptionKind::UniqueConstraintViolation, message, error)
    }
}

/// Raw connection that records calls and optionally fails every traced operation.
#[derive(Debug, Default)]
pub(crate) struct StubConnection {
    pub calls: Calls,
    affected_rows: u64,
    failure: Option<DriverError>,
    server_version: Option<String>,
}

impl StubConnection {
    pub(crate) fn with_affected_rows(mut self, rows: u64) -> Self {
        self.affected_rows = rows;
        self
    }

    pub(crate) fn failing_with(mut self, error: DriverError) -> Self {
        self.failure = Some(error);
        self
    }

    pub(crate) fn with_server_version(mut self, version: &str) -> Self {
        self.server_version = Some(version.to_string());
        self
    }

    fn outcome(&self, method: &'static str) -> Result<(), DriverError> {
        self.calls.record(method);
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DriverConnection for StubConnection {
    async fn prepare(&self, _sql: &str) -> Result<Box<dyn DriverStatement>, DriverError> {
        self.outcome("prepare")?;
        Ok(Box::new(StubStatement::affecting(self.affected_rows)))
    }

    async fn query(&self, _sql: &str) -> Result<Box<dyn DriverStatement>, DriverError> {
        self.outcome("query")?;
        Ok(Box::new(StubStatement::affecting(self.affected_rows).executed()))
    }

    fn quote(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    async fn exec(&self, _sql: &str) -> Result<u64, DriverError> {
        self.outcome("exec")?;
        Ok(self.affected_rows)
    }

    async fn last_insert_id(&self, _name: Option<&str>) -> Result<Option<String>, DriverError> {
        self.calls.record("last_insert_id");
        Ok(Some("42".to_string()))
    }

    async fn begin_transaction(&self) -> Result<(), DriverError> {
        self.outcome("begin_transaction")
    }

    async fn commit(&self) -> Result<(), DriverError> {
        self.outcome("commit")
    }

    async fn roll_back(&self) -> Result<(), DriverError> {
        self.outcome("roll_back")
    }

    fn error_code(&self) -> Option<String> {
        Some("00000".to_string())
    }

    fn as_server_info_aware(&self) -> Option<&dyn ServerInfoAwareConnection> {
        self.server_version
            .as_ref()
            .map(|_| self as &dyn ServerInfoAwareConnection)
    }
}

impl ServerInfoAwareConnection for StubConnection {
    fn server_version(&self) -> Result<String, DriverError> {
        self.server_version
            .clone()
            .ok_or_else(|| DriverError::new("no server version"))
    }

    fn requires_query_for_server_version(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub(crate) struct StubStatement {
    rows: Vec<Row>,
    affected: u64,
    executed: bool,
    failure: Option<DriverError>,
}

impl StubStatement {
    pub(crate) fn affecting(rows: u64) -> Self {
        Self {
            affected: rows,
            ..Default::default()
        }
    }

    pub(crate) fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            affected: rows.len() as u64,
            rows,
            executed: true,
            ..Default::default()
        }
    }

    pub(crate) fn executed(mut self) -> Self {
        self.executed = true;
        self
    }

    pub(crate) fn failing_with(mut self, error: DriverError) -> Self {
        self.failure = Some(error);
        self
    }
}

#[async_trait]
impl DriverStatement for StubStatement {
    fn bind_value(&mut self, _key: ParamKey, _value: Value) -> Result<(), DriverError> {
        Ok(())
    }

    async fn execute(&mut self, _params: Option<Vec<Value>>) -> Result<(), DriverError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.executed = true;
        Ok(())
    }

    fn row_count(&self) -> u64 {
        if self.executed {
            self.affected
        } else {
            0
        }
    }

    fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    async fn fetch_all(&mut self) -> Result<Vec<Row>, DriverError> {
        Ok(self.rows.clone())
    }

    fn close_cursor(&mut self) -> bool {
        true
    }
}

/// A span seen by the capturing subscriber.
#[derive(Debug, Clone)]
pub(crate) struct CapturedSpan {
    id: u64,
    pub name: String,
    pub parent: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl CapturedSpan {
    pub(crate) fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// An event seen by the capturing subscriber.
#[derive(Debug, Clone)]
pub(crate) struct CapturedEvent {
    pub level: Level,
    pub message: String,
    pub parent: Option<String>,
    pub fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Captured {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl Captured {
    pub(crate) fn named(&self, name: &str) -> Vec<CapturedSpan> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .filter(|span| span.name == name)
            .cloned()
            .collect()
    }

    /// The only span called `name`; panics otherwise.
    pub(crate) fn single(&self, name: &str) -> CapturedSpan {
        let mut spans = self.named(name);
        assert_eq!(spans.len(), 1, "expected one `{name}` span, got {spans:?}");
        spans.remove(0)
    }

    pub(crate) fn events_at(&self, level: Level) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.level == level)
            .cloned()
            .collect()
    }
}

struct FieldVisitor<'a>(&'a mut BTreeMap<String, String>);

impl Visit for FieldVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{value:?}"));
    }
}

struct CaptureLayer(Captured);

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        attrs.record(&mut FieldVisitor(&mut fields));
        let parent = ctx
            .span(id)
            .and_then(|span| span.parent())
            .map(|parent| parent.name().to_string());

        self.0.spans.lock().unwrap().push(CapturedSpan {
            id: id.into_u64(),
            name: attrs.metadata().name().to_string(),
            parent,
            fields,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, _ctx: Context<'_, S>) {
        let mut spans = self.0.spans.lock().unwrap();
        if let Some(span) = spans.iter_mut().rev().find(|span| span.id == id.into_u64()) {
            values.record(&mut FieldVisitor(&mut span.fields));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));
        let message = fields.remove("message").unwrap_or_default();
        let parent = ctx.event_span(event).map(|span| span.name().to_string());

        self.0.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            parent,
            fields,
        });
    }
}

/// Install a capturing subscriber on the current thread.
pub(crate) fn capture() -> (Captured, DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::registry().with(CaptureLayer(captured.clone()));
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

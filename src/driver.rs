//! The driver capability set and the connection/statement contracts it hands out.
//!
//! [`Driver`] is the base capability every backend implements. The two optional
//! capabilities, [`VersionAwarePlatformDriver`] and [`ExceptionConverterDriver`],
//! are separate traits; a driver advertises them through [`Driver::as_version_aware`]
//! and [`Driver::as_exception_converter`] so wrappers can query for them without
//! knowing the concrete type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Value;

use crate::error::{DriverError, DriverException};
use crate::platform::{DatabasePlatform, SchemaManager};

/// Parameters passed to [`Driver::connect`] (`host`, `port`, `dbname`, `user`, ...).
pub type ConnectionParams = BTreeMap<String, String>;

/// Driver specific connect options, forwarded verbatim.
pub type DriverOptions = BTreeMap<String, String>;

/// A row fetched from a statement.
pub type Row = Vec<Value>;

/// Base driver capability set.
#[async_trait]
pub trait Driver: Send + Sync + fmt::Debug {
    /// Open a raw connection.
    async fn connect(
        &self,
        params: &ConnectionParams,
        username: Option<&str>,
        password: Option<&str>,
        driver_options: &DriverOptions,
    ) -> Result<Arc<dyn DriverConnection>, DriverError>;

    fn database_platform(&self) -> Arc<dyn DatabasePlatform>;

    fn schema_manager(
        &self,
        connection: &Arc<dyn DriverConnection>,
        platform: Option<Arc<dyn DatabasePlatform>>,
    ) -> Arc<dyn SchemaManager>;

    fn name(&self) -> &str;

    /// Name of the database `connection` is attached to.
    fn database(&self, connection: &Arc<dyn DriverConnection>) -> Option<String>;

    fn as_version_aware(&self) -> Option<&dyn VersionAwarePlatformDriver> {
        None
    }

    fn as_exception_converter(&self) -> Option<&dyn ExceptionConverterDriver> {
        None
    }
}

/// Drivers that can pick a platform for a given server version.
pub trait VersionAwarePlatformDriver: Send + Sync {
    fn create_database_platform_for_version(&self, version: &str) -> Arc<dyn DatabasePlatform>;
}

/// Drivers that translate their raw errors into [`DriverException`]s.
pub trait ExceptionConverterDriver: Send + Sync {
    fn convert_exception(&self, message: &str, error: DriverError) -> DriverException;
}

/// A raw connection opened by a [`Driver`].
#[async_trait]
pub trait DriverConnection: Send + Sync + fmt::Debug {
    async fn prepare(&self, sql: &str) -> Result<Box<dyn DriverStatement>, DriverError>;

    /// Run `sql` and return the executed statement for fetching.
    async fn query(&self, sql: &str) -> Result<Box<dyn DriverStatement>, DriverError>;

    fn quote(&self, value: &str) -> String;

    /// Run `sql` and return the number of affected rows.
    async fn exec(&self, sql: &str) -> Result<u64, DriverError>;

    async fn last_insert_id(&self, name: Option<&str>) -> Result<Option<String>, DriverError>;

    async fn begin_transaction(&self) -> Result<(), DriverError>;

    async fn commit(&self) -> Result<(), DriverError>;

    async fn roll_back(&self) -> Result<(), DriverError>;

    /// SQLSTATE of the last operation, if any.
    fn error_code(&self) -> Option<String>;

    fn as_server_info_aware(&self) -> Option<&dyn ServerInfoAwareConnection> {
        None
    }
}

/// Connections that can report the server version.
pub trait ServerInfoAwareConnection: Send + Sync {
    fn server_version(&self) -> Result<String, DriverError>;

    fn requires_query_for_server_version(&self) -> bool;
}

/// Placeholder a value is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    /// One-based position of a `?` placeholder.
    Position(usize),
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Position(position)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

/// A prepared (or already executed) statement.
#[async_trait]
pub trait DriverStatement: Send + Sync + fmt::Debug {
    fn bind_value(&mut self, key: ParamKey, value: Value) -> Result<(), DriverError>;

    /// Execute with the bound values, or with `params` when given.
    async fn execute(&mut self, params: Option<Vec<Value>>) -> Result<(), DriverError>;

    fn row_count(&self) -> u64;

    fn column_count(&self) -> usize;

    async fn fetch_all(&mut self) -> Result<Vec<Row>, DriverError>;

    fn close_cursor(&mut self) -> bool;
}

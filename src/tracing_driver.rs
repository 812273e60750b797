//! The tracing decorator around a [`Driver`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::connection::TracingDriverConnection;
use crate::driver::{
    ConnectionParams, Driver, DriverConnection, DriverOptions, ExceptionConverterDriver,
    VersionAwarePlatformDriver,
};
use crate::error::{DriverError, DriverException};
use crate::hub::Hub;
use crate::platform::{DatabasePlatform, SchemaManager};

/// Decorates a driver so that every connection it opens is traced.
///
/// The decorator implements the full capability set, including the optional
/// [`VersionAwarePlatformDriver`] and [`ExceptionConverterDriver`] traits, so it can
/// stand in for any driver. When the wrapped driver lacks one of those capabilities
/// the decorator falls back instead of failing:
///
/// - `create_database_platform_for_version` returns the default platform and ignores
///   the version;
/// - `convert_exception` wraps the error in a generic [`DriverException`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use dbal_tracing::prelude::*;
///
/// let hub = Arc::new(Hub::new(TracingConfig::default()));
/// let driver = TracingDriver::new(hub, Arc::new(MySqlDriver::default()));
///
/// let connection = driver.connect(&params, Some("app"), Some("secret"), &options).await?;
/// connection.exec("DELETE FROM sessions WHERE expired = 1").await?;
/// ```
#[derive(Debug, Clone)]
pub struct TracingDriver {
    hub: Arc<Hub>,
    inner: Arc<dyn Driver>,
}

impl TracingDriver {
    pub fn new(hub: Arc<Hub>, driver: Arc<dyn Driver>) -> Self {
        Self { hub, inner: driver }
    }

    /// The decorated driver.
    pub fn inner(&self) -> &Arc<dyn Driver> {
        &self.inner
    }

    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Open a connection through the wrapped driver and wrap it for tracing.
    ///
    /// Arguments are forwarded unchanged and connect errors are returned as raised.
    pub async fn connect(
        &self,
        params: &ConnectionParams,
        username: Option<&str>,
        password: Option<&str>,
        driver_options: &DriverOptions,
    ) -> Result<TracingDriverConnection, DriverError> {
        let connection = self
            .inner
            .connect(params, username, password, driver_options)
            .await?;
        let platform = self.inner.database_platform();

        tracing::debug!(
            db.system = platform.name(),
            "Database connection opened with tracing enabled"
        );

        Ok(TracingDriverConnection::new(
            self.hub.clone(),
            connection,
            platform.name(),
            params.clone(),
        ))
    }
}

#[async_trait]
impl Driver for TracingDriver {
    async fn connect(
        &self,
        params: &ConnectionParams,
        username: Option<&str>,
        password: Option<&str>,
        driver_options: &DriverOptions,
    ) -> Result<Arc<dyn DriverConnection>, DriverError> {
        // Resolves to the inherent method.
        let connection =
            TracingDriver::connect(self, params, username, password, driver_options).await?;
        Ok(Arc::new(connection))
    }

    fn database_platform(&self) -> Arc<dyn DatabasePlatform> {
        self.inner.database_platform()
    }

    fn schema_manager(
        &self,
        connection: &Arc<dyn DriverConnection>,
        platform: Option<Arc<dyn DatabasePlatform>>,
    ) -> Arc<dyn SchemaManager> {
        self.inner.schema_manager(connection, platform)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn database(&self, connection: &Arc<dyn DriverConnection>) -> Option<String> {
        self.inner.database(connection)
    }

    fn as_version_aware(&self) -> Option<&dyn VersionAwarePlatformDriver> {
        Some(self)
    }

    fn as_exception_converter(&self) -> Option<&dyn ExceptionConverterDriver> {
        Some(self)
    }
}

impl VersionAwarePlatformDriver for TracingDriver {
    fn create_database_platform_for_version(&self, version: &str) -> Arc<dyn DatabasePlatform> {
        match self.inner.as_version_aware() {
            Some(driver) => driver.create_database_platform_for_version(version),
            None => {
                tracing::debug!(
                    version,
                    "Wrapped driver is not version aware, using its default platform"
                );
                self.inner.database_platform()
            }
        }
    }
}

impl ExceptionConverterDriver for TracingDriver {
    fn convert_exception(&self, message: &str, error: DriverError) -> DriverException {
        match self.inner.as_exception_converter() {
            Some(driver) => driver.convert_exception(message, error),
            None => DriverException::new(message, error),
        }
    }
}

/// Extension trait for wrapping a driver with tracing.
pub trait DriverTracingExt {
    fn with_tracing(self, hub: Arc<Hub>) -> TracingDriver;
}

impl<D: Driver + 'static> DriverTracingExt for D {
    fn with_tracing(self, hub: Arc<Hub>) -> TracingDriver {
        TracingDriver::new(hub, Arc::new(self))
    }
}

//! Wraps the drivers of selected named connections.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::driver::Driver;
use crate::hub::Hub;
use crate::tracing_driver::TracingDriver;

/// Decides which connections get a [`TracingDriver`].
///
/// By default every connection is traced; [`for_connections`](Self::for_connections)
/// narrows that down to an explicit list of connection names.
#[derive(Debug, Clone)]
pub struct TracingDriverMiddleware {
    hub: Arc<Hub>,
    connections: Option<BTreeSet<String>>,
}

impl TracingDriverMiddleware {
    pub fn new(hub: Arc<Hub>) -> Self {
        Self {
            hub,
            connections: None,
        }
    }

    /// Only trace the named connections.
    pub fn for_connections<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.connections = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_enabled_for(&self, connection_name: &str) -> bool {
        self.connections
            .as_ref()
            .map_or(true, |names| names.contains(connection_name))
    }

    /// Wrap `driver` when `connection_name` is traced, otherwise hand it back untouched.
    pub fn wrap(&self, connection_name: &str, driver: Arc<dyn Driver>) -> Arc<dyn Driver> {
        if !self.is_enabled_for(connection_name) {
            tracing::debug!(connection = connection_name, "Tracing disabled for connection");
            return driver;
        }

        tracing::debug!(
            connection = connection_name,
            driver = driver.name(),
            "Tracing enabled for connection"
        );
        Arc::new(TracingDriver::new(self.hub.clone(), driver))
    }
}

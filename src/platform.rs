//! Database platforms and schema managers.

use std::fmt;

use async_trait::async_trait;
use sea_orm::DbBackend;

use crate::error::DriverError;

/// Describes the SQL dialect and capabilities of a database backend.
pub trait DatabasePlatform: Send + Sync + fmt::Debug {
    /// Short platform name, recorded as `db.system` on spans.
    fn name(&self) -> &str;

    /// The SeaORM backend this platform speaks, when there is one.
    fn backend(&self) -> Option<DbBackend> {
        backend_for_name(self.name())
    }

    /// Server version the platform was created for, if known.
    fn version(&self) -> Option<&str> {
        None
    }
}

/// Introspection of schema objects for a connection.
#[async_trait]
pub trait SchemaManager: Send + Sync + fmt::Debug {
    async fn list_table_names(&self) -> Result<Vec<String>, DriverError>;
}

/// Platform backed by one of SeaORM's backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendPlatform {
    backend: DbBackend,
    version: Option<String>,
}

impl BackendPlatform {
    pub fn new(backend: DbBackend) -> Self {
        Self {
            backend,
            version: None,
        }
    }

    pub fn for_version(backend: DbBackend, version: impl Into<String>) -> Self {
        Self {
            backend,
            version: Some(version.into()),
        }
    }
}

impl DatabasePlatform for BackendPlatform {
    fn name(&self) -> &str {
        system_name(self.backend)
    }

    fn backend(&self) -> Option<DbBackend> {
        Some(self.backend)
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

/// Semantic-convention name of a backend.
pub fn system_name(backend: DbBackend) -> &'static str {
    match backend {
        DbBackend::Postgres => "postgresql",
        DbBackend::MySql => "mysql",
        DbBackend::Sqlite => "sqlite",
    }
}

fn backend_for_name(name: &str) -> Option<DbBackend> {
    match name.to_ascii_lowercase().as_str() {
        "postgresql" | "postgres" | "pgsql" => Some(DbBackend::Postgres),
        "mysql" | "mariadb" => Some(DbBackend::MySql),
        "sqlite" => Some(DbBackend::Sqlite),
        _ => None,
    }
}

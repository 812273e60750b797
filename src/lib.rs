//! # dbal-tracing
//!
//! Tracing instrumentation for database drivers.
//!
//! [`TracingDriver`] decorates any [`Driver`] and exposes the same capability set, so it
//! can replace the plain driver wherever one is expected. Connections it opens are
//! [`TracingDriverConnection`]s: queries, statements and transactions run inside
//! `db.sql` spans nested under your request spans.
//!
//! ## Capabilities
//!
//! Two driver capabilities are optional and live in their own traits:
//!
//! - [`VersionAwarePlatformDriver`]: pick a platform for a server version;
//! - [`ExceptionConverterDriver`]: translate raw [`DriverError`]s.
//!
//! The decorator always offers both. If the wrapped driver lacks one, the decorator
//! returns the default platform, or a generic [`DriverException`] wrapping the error.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dbal_tracing::prelude::*;
//!
//! let hub = Arc::new(Hub::new(TracingConfig::default()));
//! let driver = my_driver.with_tracing(hub);
//!
//! let connection = driver.connect(&params, Some("app"), Some("secret"), &options).await?;
//! let mut statement = connection.prepare("SELECT * FROM users WHERE id = ?").await?;
//! statement.execute(Some(vec![1.into()])).await?;
//! ```
//!
//! ## Span Attributes
//!
//! | Attribute | Description |
//! |-----------|-------------|
//! | `db.op` | `db.sql.query`, `db.sql.exec`, `db.sql.prepare`, `db.sql.execute`, `db.sql.transaction.*` |
//! | `db.system` | Platform name of the driver |
//! | `db.operation` | SQL operation (SELECT, INSERT, UPDATE, DELETE, ...) |
//! | `db.sql.table` | Target table name (when detectable) |
//! | `db.statement` | Full SQL (when enabled) |
//! | `db.name` / `db.user` | From the connect parameters |
//! | `server.address` / `server.socket.address` / `server.port` | From `host` and `port` |
//! | `network.transport` | `unix` or `inproc` |
//! | `db.rows_affected` | Rows returned/affected |
//! | `otel.status_code` | "OK" or "ERROR" |
//! | `error.message` | Error details (on failure) |

mod config;
mod connection;
mod driver;
mod error;
mod hub;
mod middleware;
mod parser;
mod platform;
mod span;
mod statement;
mod tracing_driver;

#[cfg(test)]
mod testing;

pub use config::TracingConfig;
pub use connection::TracingDriverConnection;
pub use driver::{
    ConnectionParams, Driver, DriverConnection, DriverOptions, DriverStatement,
    ExceptionConverterDriver, ParamKey, Row, ServerInfoAwareConnection, VersionAwarePlatformDriver,
};
pub use error::{DriverError, DriverException, ExceptionKind};
pub use hub::Hub;
pub use middleware::TracingDriverMiddleware;
pub use parser::{ParsedSql, SqlOperation};
pub use platform::{system_name, BackendPlatform, DatabasePlatform, SchemaManager};
pub use span::{SpanData, SpanOp};
pub use statement::TracingStatement;
pub use tracing_driver::{DriverTracingExt, TracingDriver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Driver, DriverConnection, DriverStatement, DriverTracingExt, ExceptionConverterDriver,
        Hub, TracingConfig, TracingDriver, TracingDriverConnection, VersionAwarePlatformDriver,
    };
}

//! Error types raised by drivers and produced by exception conversion.

use std::fmt;

use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

/// A raw error raised by a driver or one of its connections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    code: Option<i32>,
    sql_state: Option<String>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            sql_state: None,
        }
    }

    /// Attach the vendor error code.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the five character SQLSTATE.
    pub fn with_sql_state(mut self, sql_state: impl Into<String>) -> Self {
        self.sql_state = Some(sql_state.into());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }
}

/// Category a converted exception belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    /// Generic wrapper, used when no driver-specific translation exists.
    Driver,
    ConnectionFailed,
    UniqueConstraintViolation,
    ForeignKeyConstraintViolation,
    NotNullConstraintViolation,
    SyntaxError,
    TableNotFound,
    Deadlock,
    LockWaitTimeout,
}

impl ExceptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExceptionKind::Driver => "driver",
            ExceptionKind::ConnectionFailed => "connection_failed",
            ExceptionKind::UniqueConstraintViolation => "unique_constraint_violation",
            ExceptionKind::ForeignKeyConstraintViolation => "foreign_key_constraint_violation",
            ExceptionKind::NotNullConstraintViolation => "not_null_constraint_violation",
            ExceptionKind::SyntaxError => "syntax_error",
            ExceptionKind::TableNotFound => "table_not_found",
            ExceptionKind::Deadlock => "deadlock",
            ExceptionKind::LockWaitTimeout => "lock_wait_timeout",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A driver error translated into the exception taxonomy.
///
/// Converting drivers pick a specific [`ExceptionKind`]; the generic fallback
/// built by [`DriverException::new`] keeps the message and wraps the driver
/// error untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverException {
    kind: ExceptionKind,
    message: String,
    #[source]
    source: DriverError,
}

impl DriverException {
    /// Wrap `source` without translating it.
    pub fn new(message: impl Into<String>, source: DriverError) -> Self {
        Self::with_kind(ExceptionKind::Driver, message, source)
    }

    pub fn with_kind(kind: ExceptionKind, message: impl Into<String>, source: DriverError) -> Self {
        Self {
            kind,
            message: message.into(),
            source,
        }
    }

    pub fn kind(&self) -> ExceptionKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error raised by the driver.
    pub fn driver_error(&self) -> &DriverError {
        &self.source
    }

    pub fn code(&self) -> Option<i32> {
        self.source.code()
    }

    pub fn sql_state(&self) -> Option<&str> {
        self.source.sql_state()
    }
}

/// `SQLSTATE[23000] [1062] message`, omitting the parts the driver did not report.
fn runtime_text(message: &str, source: &DriverError) -> String {
    let mut text = String::new();
    if let Some(state) = source.sql_state() {
        text.push_str(&format!("SQLSTATE[{state}] "));
    }
    if let Some(code) = source.code() {
        text.push_str(&format!("[{code}] "));
    }
    text.push_str(message);
    text
}

impl From<DriverError> for DbErr {
    fn from(err: DriverError) -> Self {
        DbErr::Exec(RuntimeErr::Internal(runtime_text(err.message(), &err)))
    }
}

impl From<DriverException> for DbErr {
    fn from(err: DriverException) -> Self {
        let runtime = RuntimeErr::Internal(runtime_text(&err.message, &err.source));
        match err.kind {
            ExceptionKind::ConnectionFailed => DbErr::Conn(runtime),
            _ => DbErr::Exec(runtime),
        }
    }
}

//! The tracing context handle shared by drivers, connections and statements.

use tracing::{Id, Span};

use crate::config::TracingConfig;

/// Handle to the active tracing session.
///
/// A hub is shared behind an `Arc` and is never torn down by the objects holding it.
/// Spans opened through it become children of the bound parent span when one was
/// given with [`Hub::bind_to`], otherwise of whatever span is current at the call.
#[derive(Debug, Clone, Default)]
pub struct Hub {
    config: TracingConfig,
    parent: Option<Span>,
}

impl Hub {
    pub fn new(config: TracingConfig) -> Self {
        Self {
            config,
            parent: None,
        }
    }

    /// Pin every span opened through this hub under `span`.
    pub fn bind_to(mut self, span: Span) -> Self {
        self.parent = Some(span);
        self
    }

    pub fn config(&self) -> &TracingConfig {
        &self.config
    }

    /// The span new database spans should attach to, if any.
    pub fn span(&self) -> Option<Span> {
        let span = match &self.parent {
            Some(parent) => parent.clone(),
            None => Span::current(),
        };
        (!span.is_none()).then_some(span)
    }

    /// Where a child span goes: `Some(parent)` to nest, `Some(None)` for a new
    /// root, `None` to skip tracing.
    pub(crate) fn child_parent(&self) -> Option<Option<Id>> {
        match self.span().and_then(|span| span.id()) {
            Some(id) => Some(Some(id)),
            None if self.config.require_parent_span => None,
            None => Some(None),
        }
    }
}

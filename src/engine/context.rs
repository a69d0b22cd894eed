//! Per-invocation telemetry context.

use tokio_util::sync::CancellationToken;

use crate::observability::tracing::SpanRef;

/// Carrier threading trace identity and the cancellation signal through the
/// recursion tree.
///
/// A callee never mutates the context it was given; it derives a child
/// context scoped to its own span and passes that downward instead.
#[derive(Debug, Clone)]
pub struct TaskContext {
    span: Option<SpanRef>,
    cancel: CancellationToken,
}

impl TaskContext {
    /// Root context for a new trace.
    pub fn root(cancel: CancellationToken) -> Self {
        Self { span: None, cancel }
    }

    /// Derive a context scoped to `span`, for handing to children.
    pub fn child_of(&self, span: SpanRef) -> Self {
        Self {
            span: Some(span),
            cancel: self.cancel.clone(),
        }
    }

    /// The span this context is scoped to, if any.
    pub fn span(&self) -> Option<SpanRef> {
        self.span
    }

    /// Whether cancellation has been requested. Advisory only: spawned
    /// subtrees run to completion rather than being torn down mid-flight.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

//! Span emission.
//!
//! # Responsibilities
//! - Open one observation scope per task invocation
//! - Link child spans to their caller's span
//! - Hand completed spans to an injected exporter
//!
//! # Design Decisions
//! - Explicit emitter object, constructed once and passed by reference
//! - The closer is a guard: `finish` attaches final attributes, and Drop
//!   closes the span on any path that never reaches `finish`
//! - Export transport, batching, and retry live behind `SpanExporter`

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use uuid::Uuid;

/// Identity of an in-flight span, carried by task contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpanRef {
    pub trace_id: Uuid,
    pub span_id: Uuid,
}

/// A finished span record handed to the exporter.
#[derive(Debug, Clone)]
pub struct CompletedSpan {
    pub trace_id: Uuid,
    pub span_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub started_at: SystemTime,
    pub duration: Duration,
    pub attrs: Vec<(&'static str, i64)>,
}

/// Destination for completed spans.
pub trait SpanExporter: Send + Sync {
    /// Submit one completed span. Implementations must not panic; delivery
    /// problems are theirs to log and swallow.
    fn export(&self, span: &CompletedSpan);
}

/// Exporter that writes each completed span as one structured log event.
pub struct LogSpanExporter;

impl SpanExporter for LogSpanExporter {
    fn export(&self, span: &CompletedSpan) {
        tracing::debug!(
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            parent_id = ?span.parent_id.map(|id| id.to_string()),
            name = %span.name,
            duration_us = span.duration.as_micros() as u64,
            attrs = ?span.attrs,
            "Span completed"
        );
    }
}

/// Opens named observation scopes and delivers them to the exporter.
#[derive(Clone)]
pub struct SpanEmitter {
    exporter: Arc<dyn SpanExporter>,
}

impl SpanEmitter {
    pub fn new(exporter: Arc<dyn SpanExporter>) -> Self {
        Self { exporter }
    }

    /// Open a span under `parent` with its input attributes attached.
    ///
    /// Returns the new span's reference (for deriving child contexts) and the
    /// guard that closes it. The guard exports exactly once: either through
    /// `finish`, or on drop for paths that never get there.
    pub fn begin(
        &self,
        parent: Option<SpanRef>,
        name: impl Into<String>,
        attrs: impl IntoIterator<Item = (&'static str, i64)>,
    ) -> (SpanRef, SpanGuard) {
        let span_ref = SpanRef {
            trace_id: parent.map(|p| p.trace_id).unwrap_or_else(Uuid::new_v4),
            span_id: Uuid::new_v4(),
        };

        let guard = SpanGuard {
            exporter: Arc::clone(&self.exporter),
            started: Instant::now(),
            pending: Some(CompletedSpan {
                trace_id: span_ref.trace_id,
                span_id: span_ref.span_id,
                parent_id: parent.map(|p| p.span_id),
                name: name.into(),
                started_at: SystemTime::now(),
                duration: Duration::ZERO,
                attrs: attrs.into_iter().collect(),
            }),
        };

        (span_ref, guard)
    }
}

/// Closes its span exactly once, on every exit path.
pub struct SpanGuard {
    exporter: Arc<dyn SpanExporter>,
    started: Instant,
    pending: Option<CompletedSpan>,
}

impl SpanGuard {
    /// Attach final attributes and close the span.
    pub fn finish(mut self, attrs: impl IntoIterator<Item = (&'static str, i64)>) {
        if let Some(mut span) = self.pending.take() {
            span.attrs.extend(attrs);
            span.duration = self.started.elapsed();
            self.exporter.export(&span);
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        // Exit path that skipped finish(): the end timestamp still gets set.
        if let Some(mut span) = self.pending.take() {
            span.duration = self.started.elapsed();
            self.exporter.export(&span);
        }
    }
}

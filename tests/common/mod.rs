//! Shared utilities for integration testing.

use std::sync::{Arc, Mutex};

use fib_service::config::SamplingConfig;
use fib_service::engine::Engine;
use fib_service::observability::logging::{LogSampler, SampledLogger, TracingSink};
use fib_service::observability::metrics::Instruments;
use fib_service::observability::tracing::{CompletedSpan, SpanEmitter, SpanExporter};

/// Span exporter that records everything it receives.
#[derive(Default)]
pub struct RecordingExporter {
    spans: Mutex<Vec<CompletedSpan>>,
}

impl RecordingExporter {
    pub fn spans(&self) -> Vec<CompletedSpan> {
        self.spans.lock().unwrap().clone()
    }
}

impl SpanExporter for RecordingExporter {
    fn export(&self, span: &CompletedSpan) {
        self.spans.lock().unwrap().push(span.clone());
    }
}

/// An engine wired to fresh instruments and a recording exporter.
pub struct TestHarness {
    pub engine: Engine,
    pub instruments: Arc<Instruments>,
    pub exporter: Arc<RecordingExporter>,
    pub spans: SpanEmitter,
}

pub fn harness() -> TestHarness {
    let exporter = Arc::new(RecordingExporter::default());
    let spans = SpanEmitter::new(exporter.clone());
    let instruments = Arc::new(Instruments::new("test"));
    let sampler = LogSampler::new(&SamplingConfig::default());
    let logger = Arc::new(SampledLogger::new(sampler, Arc::new(TracingSink)));
    let engine = Engine::new(spans.clone(), instruments.clone(), logger);

    TestHarness {
        engine,
        instruments,
        exporter,
        spans,
    }
}

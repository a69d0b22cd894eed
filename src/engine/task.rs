//! The recursive fan-out/fan-in task engine.
//!
//! Each invocation runs as its own tokio task: one counter increment and one
//! span per node, two concurrently executing children for n >= 2, results
//! joined through oneshot channels. Deliberately un-memoized: the exponential
//! task tree is the behavior being demonstrated, and the parent blocks only
//! on its own two children, never on unrelated subtrees.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::engine::context::TaskContext;
use crate::observability::logging::{Level, SampledLogger};
use crate::observability::metrics::Instruments;
use crate::observability::tracing::SpanEmitter;

/// Concurrent recursive Fibonacci engine.
///
/// Cheap to clone; every spawned node carries its own handle.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    spans: SpanEmitter,
    instruments: Arc<Instruments>,
    logger: Arc<SampledLogger>,
}

impl Engine {
    pub fn new(spans: SpanEmitter, instruments: Arc<Instruments>, logger: Arc<SampledLogger>) -> Self {
        Self {
            inner: Arc::new(Inner {
                spans,
                instruments,
                logger,
            }),
        }
    }

    /// Run the full task tree for `n` and return the shifted-Fibonacci value
    /// (1 at n = 0 and n = 1).
    pub async fn invoke(&self, ctx: &TaskContext, n: u64) -> u64 {
        join_child(self.spawn(ctx.clone(), n)).await
    }

    /// Start one node as an independent task. The receiver resolves once the
    /// node and its whole subtree are done.
    fn spawn(&self, ctx: TaskContext, n: u64) -> oneshot::Receiver<u64> {
        let (tx, rx) = oneshot::channel();
        let engine = self.clone();
        tokio::spawn(async move {
            let result = engine.run_node(ctx, n).await;
            // A dropped receiver means nobody is waiting for this subtree
            // anymore; the result is not meaningful to anyone else.
            let _ = tx.send(result);
        });
        rx
    }

    async fn run_node(&self, ctx: TaskContext, n: u64) -> u64 {
        // Counted synchronously before any child exists, so the counter
        // tracks call volume node by node.
        self.inner.instruments.record_invocation();
        let _live = self.inner.instruments.live_task();

        if ctx.is_cancelled() {
            // Advisory only: a partial tree has no meaningful result, so
            // nodes already in flight run to completion.
            tracing::debug!(n, "task started after cancellation was requested");
        }

        self.inner
            .logger
            .log(Level::Debug, "engine.invoke", &format!("computing fib({n})"));

        let (span_ref, span) = self
            .inner
            .spans
            .begin(ctx.span(), format!("fibonacci({n})"), [("n", n as i64)]);

        let result = if n > 1 {
            let child_ctx = ctx.child_of(span_ref);
            let a = self.spawn(child_ctx.clone(), n - 1);
            let b = self.spawn(child_ctx, n - 2);
            // Full join: both children must land before combining.
            let (a, b) = tokio::join!(join_child(a), join_child(b));
            a + b
        } else {
            1
        };

        span.finish([("result", result as i64)]);
        result
    }
}

/// Wait for one child's result channel.
async fn join_child(rx: oneshot::Receiver<u64>) -> u64 {
    match rx.await {
        Ok(value) => value,
        Err(_) => {
            // Only reachable if the child task was torn down before sending
            // (runtime shutdown); the computation itself cannot fail.
            tracing::error!("child task ended without delivering a result");
            0
        }
    }
}

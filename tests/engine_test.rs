//! Task engine behavior: numeric results, fan-out accounting, span nesting.

mod common;

use std::collections::{HashMap, HashSet};

use fib_service::engine::TaskContext;
use tokio_util::sync::CancellationToken;

use common::harness;

/// Closed-form values of the shifted Fibonacci sequence (1 at n = 0 and 1).
const EXPECTED: [u64; 11] = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89];

fn root_ctx() -> TaskContext {
    TaskContext::root(CancellationToken::new())
}

fn attr(span: &fib_service::observability::tracing::CompletedSpan, key: &str) -> i64 {
    span.attrs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or_else(|| panic!("span {} missing attr {key}", span.name))
}

#[tokio::test]
async fn test_invoke_matches_closed_form() {
    let h = harness();
    for (n, expected) in EXPECTED.iter().enumerate() {
        let result = h.engine.invoke(&root_ctx(), n as u64).await;
        assert_eq!(result, *expected, "n = {n}");
    }
}

#[tokio::test]
async fn test_invocation_count_matches_tree_size() {
    // One invocation per node, two children per internal node, so the tree
    // for n holds 2 * fib(n) - 1 nodes.
    for n in [0u64, 1, 2, 3, 7, 10] {
        let h = harness();
        let result = h.engine.invoke(&root_ctx(), n).await;
        assert_eq!(h.instruments.invocations(), 2 * result - 1, "n = {n}");
    }
}

#[tokio::test]
async fn test_leaves_have_one_span_and_no_children() {
    for n in [0u64, 1] {
        let h = harness();
        let result = h.engine.invoke(&root_ctx(), n).await;
        assert_eq!(result, 1);
        assert_eq!(h.instruments.invocations(), 1);

        let spans = h.exporter.spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].parent_id, None);
        assert_eq!(attr(&spans[0], "n"), n as i64);
        assert_eq!(attr(&spans[0], "result"), 1);
    }
}

#[tokio::test]
async fn test_spans_close_once_and_nest_by_call_tree() {
    let h = harness();
    h.engine.invoke(&root_ctx(), 6).await;
    let spans = h.exporter.spans();

    // Every invocation closed exactly one span.
    assert_eq!(spans.len() as u64, h.instruments.invocations());

    // No span exported twice.
    let ids: HashSet<_> = spans.iter().map(|s| s.span_id).collect();
    assert_eq!(ids.len(), spans.len());

    // One root, and every span rides the root's trace.
    let roots: Vec<_> = spans.iter().filter(|s| s.parent_id.is_none()).collect();
    assert_eq!(roots.len(), 1);
    assert!(spans.iter().all(|s| s.trace_id == roots[0].trace_id));

    // A child's parent is its direct caller: the child computed either
    // parent_n - 1 or parent_n - 2.
    let by_id: HashMap<_, _> = spans.iter().map(|s| (s.span_id, s)).collect();
    let mut children_of: HashMap<_, u32> = HashMap::new();
    for span in &spans {
        if let Some(parent_id) = span.parent_id {
            let parent_n = attr(by_id[&parent_id], "n");
            let n = attr(span, "n");
            assert!(
                n == parent_n - 1 || n == parent_n - 2,
                "span fib({n}) nested under fib({parent_n})"
            );
            *children_of.entry(parent_id).or_default() += 1;
        }
    }

    // Internal nodes fan out to exactly two children; leaves to none.
    for span in &spans {
        let expected = if attr(span, "n") > 1 { 2 } else { 0 };
        assert_eq!(
            children_of.get(&span.span_id).copied().unwrap_or(0),
            expected,
            "children of {}",
            span.name
        );
    }
}

#[tokio::test]
async fn test_concurrent_roots_are_deterministic() {
    let h = harness();
    let runs = 8u64;

    let mut handles = Vec::new();
    for _ in 0..runs {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            engine.invoke(&root_ctx(), 7).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 21);
    }

    // Counter delta is the sum of each run's tree size.
    assert_eq!(h.instruments.invocations(), runs * (2 * 21 - 1));
}

#[tokio::test]
async fn test_cancelled_context_still_completes() {
    let h = harness();
    let token = CancellationToken::new();
    token.cancel();

    // Cancellation is advisory: the tree still runs to completion.
    let result = h.engine.invoke(&TaskContext::root(token), 5).await;
    assert_eq!(result, 8);
    assert_eq!(h.instruments.invocations(), 15);
}

#[tokio::test]
async fn test_live_tasks_settle_to_zero() {
    let h = harness();
    h.engine.invoke(&root_ctx(), 8).await;
    assert_eq!(h.instruments.live_tasks(), 0);
}

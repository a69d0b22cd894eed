//! Recursive task engine subsystem.
//!
//! # Data Flow
//! ```text
//! Root invocation (from the request boundary)
//!     → task.rs (spawn node: count, open span, fan out two children)
//!     → context.rs (child context derived from the node's span)
//!     → recursive fan-out down to the n <= 1 leaves
//!     → fan-in: each node joins its own two result channels
//!     → scalar result back to the boundary
//! ```
//!
//! # Design Decisions
//! - One independent task per node; the join blocks only that branch
//! - No memoization: the exponential task tree is the demonstrated behavior
//! - Telemetry problems are logged and swallowed, never affect the result

pub mod context;
pub mod task;

pub use context::TaskContext;
pub use task::Engine;

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Install recorder → Wire subsystems → Listen
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → trigger() → stop accepting → in-flight task trees drain
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then telemetry, the listener last
//! - One cancellation primitive serves the server and the recursion tree

pub mod shutdown;

pub use shutdown::Shutdown;

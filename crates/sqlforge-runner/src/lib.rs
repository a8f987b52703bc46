//! Execution orchestrator
//!
//! Walks a topologically ordered model sequence, rendering each model and
//! executing the rendered statement against a database adapter under a
//! configurable stop-on-error policy.

pub mod runner;

pub use runner::{NodeError, NodeState, RunError, Runner};

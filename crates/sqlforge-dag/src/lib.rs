//! Model dependency graph construction and scheduling
//!
//! This crate handles:
//! - The in-memory node/graph model for transformation units
//! - Extracting `{{ ref '...' }}` markers from model SQL
//! - Building a graph from a directory of model files
//! - Cycle detection and referential-integrity validation
//! - Deterministic topological ordering for execution

pub mod builder;
pub mod extract;
pub mod graph;
pub mod node;
pub mod schedule;
pub mod validate;

pub use builder::{build_from_dir, BuildError, MODEL_EXTENSION};
pub use extract::extract_refs;
pub use graph::{Graph, GraphError, NodeId};
pub use node::{ModelNode, NodeKind};
pub use schedule::{topological_sort, ScheduleError};
pub use validate::{detect_cycles, validate, ValidateError};

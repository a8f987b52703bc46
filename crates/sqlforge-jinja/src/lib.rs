//! Template rendering for SQL models
//!
//! This crate handles:
//! - Rewriting `{{ ref '...' }}` markers into engine-callable form
//! - Providing the render context (target, vars)
//! - Rendering model templates to executable SQL
//! - Mapping engine errors to diagnosable render errors

pub mod context;
pub mod renderer;

pub use context::RenderContext;
pub use renderer::{RenderError, SqlRenderer, SqlTemplate};

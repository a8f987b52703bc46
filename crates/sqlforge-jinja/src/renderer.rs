//! Model template rendering
//!
//! Model SQL uses the bare-keyword reference marker (`{{ ref 'users' }}`).
//! The engine only understands call syntax, so `parse` rewrites markers to
//! `ref("users")` before compiling; everything else in the template is
//! ordinary Jinja handled by MiniJinja.

use crate::context::RenderContext;
use minijinja::value::Value;
use minijinja::{Environment, Error as JinjaError, ErrorKind, State};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

fn bare_ref_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*ref\s+(?:'([^']*)'|"([^"]*)")\s*\}\}"#)
            .expect("ref marker pattern is valid")
    })
}

/// Error during template parsing or rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to parse template '{name}': {message}")]
    Parse { name: String, message: String },

    #[error("failed to render template '{name}': {message}")]
    Render { name: String, message: String },
}

/// A parsed model template, ready to render
#[derive(Debug, Clone)]
pub struct SqlTemplate {
    /// Template name (the model's logical name)
    pub name: String,

    /// Source after marker rewriting
    source: String,
}

/// ref() - resolves a referenced model to its relation name
///
/// Schema-qualifies the name when the render context carries a schema.
fn ref_function(state: &State, name: String) -> Result<Value, JinjaError> {
    let name = name.trim().to_string();
    match state.lookup("schema") {
        Some(schema) if !schema.is_none() => {
            let schema = schema.as_str().ok_or_else(|| {
                JinjaError::new(ErrorKind::InvalidOperation, "schema must be a string")
            })?;
            Ok(Value::from(format!("{schema}.{name}")))
        }
        _ => Ok(Value::from(name)),
    }
}

/// source() - references an external source table
fn source_function(source_name: String, table_name: String) -> Result<Value, JinjaError> {
    Ok(Value::from(format!("{source_name}.{table_name}")))
}

/// var() - project variable lookup with optional default
fn var_function(state: &State, name: String, default: Option<Value>) -> Result<Value, JinjaError> {
    if let Some(vars) = state.lookup("vars") {
        let value = vars.get_attr(&name).unwrap_or(Value::UNDEFINED);
        if !value.is_undefined() {
            return Ok(value);
        }
    }

    default.ok_or_else(|| {
        JinjaError::new(
            ErrorKind::UndefinedError,
            format!("variable '{name}' is not defined"),
        )
    })
}

/// Template renderer for model SQL
pub struct SqlRenderer {
    env: Environment<'static>,
}

impl SqlRenderer {
    /// Create a renderer with the model helper functions registered
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_function("ref", ref_function);
        env.add_function("source", source_function);
        env.add_function("var", var_function);

        Self { env }
    }

    /// Parse model source into a template handle
    ///
    /// Rewrites bare-keyword ref markers to call form, then syntax-checks
    /// the result. The raw text is never mutated on disk; extraction always
    /// works on the original markers.
    pub fn parse(&self, name: &str, source: &str) -> Result<SqlTemplate, RenderError> {
        let rewritten = bare_ref_marker()
            .replace_all(source, |caps: &regex::Captures<'_>| {
                let model = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .map(|m| m.as_str().trim())
                    .unwrap_or_default();
                format!("{{{{ ref(\"{model}\") }}}}")
            })
            .into_owned();

        self.env
            .template_from_str(&rewritten)
            .map_err(|e| RenderError::Parse {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(SqlTemplate {
            name: name.to_string(),
            source: rewritten,
        })
    }

    /// Render a template with a fresh context plus extra variables
    ///
    /// Extra variables shadow project vars of the same name.
    pub fn render(
        &self,
        template: &SqlTemplate,
        context: &RenderContext,
        extra_vars: &HashMap<String, String>,
    ) -> Result<String, RenderError> {
        let mut context = context.clone();
        context
            .vars
            .extend(extra_vars.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.env
            .render_str(&template.source, context.to_minijinja_value())
            .map_err(|e| RenderError::Render {
                name: template.name.clone(),
                message: e.to_string(),
            })
    }
}

impl Default for SqlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

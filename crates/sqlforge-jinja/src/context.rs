//! Render context for model templates
//!
//! Variables and target information accessible while rendering a model.
//! A fresh context is built per node so renders cannot leak state.

use minijinja::Value as MinijinjaValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Context available to a model template while rendering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderContext {
    /// Name of the target being executed against (dev, prod, ...)
    pub target: String,

    /// Schema models are materialized into, if the target has one
    pub schema: Option<String>,

    /// Project variables
    pub vars: HashMap<String, String>,

    /// Name of the model being rendered
    pub this: String,
}

impl RenderContext {
    /// Create a context for a target
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            schema: None,
            vars: HashMap::new(),
            this: String::new(),
        }
    }

    /// Set the materialization schema
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the project variables
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Set the model this context renders
    pub fn for_model(mut self, name: impl Into<String>) -> Self {
        self.this = name.into();
        self
    }

    /// Resolve a referenced model to its relation name
    pub fn relation(&self, model_name: &str) -> String {
        match &self.schema {
            Some(schema) => format!("{schema}.{model_name}"),
            None => model_name.to_string(),
        }
    }

    /// Convert to a MiniJinja value for rendering
    pub fn to_minijinja_value(&self) -> MinijinjaValue {
        MinijinjaValue::from_serialize(self)
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new("dev")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_is_schema_qualified_when_configured() {
        let ctx = RenderContext::new("prod").with_schema("marts");
        assert_eq!(ctx.relation("users"), "marts.users");

        let bare = RenderContext::new("dev");
        assert_eq!(bare.relation("users"), "users");
    }

    #[test]
    fn context_serializes_for_the_engine() {
        let mut vars = HashMap::new();
        vars.insert("start_date".to_string(), "2020-01-01".to_string());

        let ctx = RenderContext::new("dev").with_vars(vars).for_model("users");
        let value = ctx.to_minijinja_value();
        assert!(!value.is_undefined());
    }
}

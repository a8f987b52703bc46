//! Transformation unit nodes

use std::path::PathBuf;

/// Kind of transformation unit
///
/// Only `Model` is produced today; the identifier scheme keeps kinds in
/// separate namespaces so future kinds cannot collide with models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A SQL model file
    Model,
}

impl NodeKind {
    /// Stable type tag used as the identifier prefix
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Model => "model",
        }
    }

    /// Compute the node identifier for a logical name of this kind
    pub fn node_id(&self, name: &str) -> String {
        format!("{}.{}", self.tag(), name)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One transformation unit
///
/// The identifier is fixed at construction; the graph enforces uniqueness
/// on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNode {
    /// Unique identifier within a graph ("model.<name>")
    id: String,

    /// Logical name (source filename without extension)
    pub name: String,

    /// Unit kind
    pub kind: NodeKind,

    /// Declared dependency identifiers, kept alongside the graph edges so
    /// the validator can cross-check both
    pub depends_on: Vec<String>,

    /// Location of the source file
    pub source_path: PathBuf,

    /// Raw, unrendered source text
    pub raw_sql: String,
}

impl ModelNode {
    /// Create a node for a logical name of the given kind
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: kind.node_id(&name),
            name,
            kind,
            depends_on: Vec::new(),
            source_path: PathBuf::new(),
            raw_sql: String::new(),
        }
    }

    /// Set the declared dependency identifiers
    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Set the source location
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    /// Set the raw source text
    pub fn with_raw_sql(mut self, sql: impl Into<String>) -> Self {
        self.raw_sql = sql.into();
        self
    }

    /// The node's identifier
    pub fn id(&self) -> &str {
        &self.id
    }
}

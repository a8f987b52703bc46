//! Dependency graph for one invocation
//!
//! Edge direction is dependent -> dependency. Acyclicity is not enforced
//! here; it is a post-construction invariant checked by the validator.

use crate::node::ModelNode;
use std::collections::HashMap;

/// Node identifier ("<kind>.<name>")
pub type NodeId = String;

/// Graph mutation errors
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("duplicate node identifier '{0}'")]
    DuplicateNode(NodeId),

    #[error("unknown node '{0}'")]
    UnknownNode(NodeId),
}

/// The complete dependency structure for one invocation
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// All nodes keyed by identifier
    nodes: HashMap<NodeId, ModelNode>,

    /// Forward edges: node -> list of nodes it depends on
    edges: HashMap<NodeId, Vec<NodeId>>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, rejecting duplicate identifiers
    ///
    /// A failed insert leaves the graph untouched.
    pub fn add_node(&mut self, node: ModelNode) -> Result<(), GraphError> {
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Add a dependency edge from `from` to `to`
    ///
    /// Both endpoints must already exist. Re-adding an existing edge is a
    /// no-op success.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(from) {
            return Err(GraphError::UnknownNode(from.to_string()));
        }
        if !self.nodes.contains_key(to) {
            return Err(GraphError::UnknownNode(to.to_string()));
        }

        let deps = self.edges.entry(from.to_string()).or_default();
        if !deps.iter().any(|d| d == to) {
            deps.push(to.to_string());
        }
        Ok(())
    }

    /// Look up a node by identifier
    pub fn get_node(&self, id: &str) -> Option<&ModelNode> {
        self.nodes.get(id)
    }

    /// Identifiers a node depends on, as a defensive copy
    ///
    /// Unknown and dependency-free nodes both yield an empty list; read
    /// paths are total.
    pub fn dependencies(&self, id: &str) -> Vec<NodeId> {
        self.edges.get(id).cloned().unwrap_or_default()
    }

    /// All nodes; iteration order is unspecified
    pub fn nodes(&self) -> impl Iterator<Item = &ModelNode> {
        self.nodes.values()
    }

    /// All node identifiers; iteration order is unspecified
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Edge membership test
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges
            .get(from)
            .map(|deps| deps.iter().any(|d| d == to))
            .unwrap_or(false)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;

    fn model(name: &str) -> ModelNode {
        ModelNode::new(NodeKind::Model, name)
    }

    #[test]
    fn add_node_rejects_duplicates_without_mutating() {
        let mut graph = Graph::new();
        graph
            .add_node(model("users").with_raw_sql("select 1"))
            .unwrap();

        let err = graph.add_node(model("users")).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(id) if id == "model.users"));

        // Original node content survives the rejected insert
        assert_eq!(graph.get_node("model.users").unwrap().raw_sql, "select 1");
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn add_edge_requires_both_endpoints() {
        let mut graph = Graph::new();
        graph.add_node(model("a")).unwrap();

        let err = graph.add_edge("model.a", "model.missing").unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(id) if id == "model.missing"));

        let err = graph.add_edge("model.missing", "model.a").unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(_)));
    }

    #[test]
    fn duplicate_edges_are_absorbed() {
        let mut graph = Graph::new();
        graph.add_node(model("a")).unwrap();
        graph.add_node(model("b")).unwrap();

        graph.add_edge("model.b", "model.a").unwrap();
        graph.add_edge("model.b", "model.a").unwrap();

        assert_eq!(graph.dependencies("model.b"), vec!["model.a"]);
        assert!(graph.has_edge("model.b", "model.a"));
        assert!(!graph.has_edge("model.a", "model.b"));
    }

    #[test]
    fn reads_are_total() {
        let graph = Graph::new();
        assert!(graph.get_node("model.nope").is_none());
        assert!(graph.dependencies("model.nope").is_empty());
        assert!(!graph.has_edge("model.a", "model.b"));
    }

    #[test]
    fn nodes_yields_every_inserted_node() {
        let mut graph = Graph::new();
        graph.add_node(model("a")).unwrap();
        graph.add_node(model("b")).unwrap();

        let mut ids: Vec<&str> = graph.nodes().map(|n| n.id()).collect();
        ids.sort();
        assert_eq!(ids, vec!["model.a", "model.b"]);
        assert_eq!(graph.node_ids().count(), 2);
    }

    #[test]
    fn dependencies_returns_a_copy() {
        let mut graph = Graph::new();
        graph.add_node(model("a")).unwrap();
        graph.add_node(model("b")).unwrap();
        graph.add_edge("model.b", "model.a").unwrap();

        let mut deps = graph.dependencies("model.b");
        deps.clear();

        assert_eq!(graph.dependencies("model.b"), vec!["model.a"]);
    }
}

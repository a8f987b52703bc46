//! Cycle detection and referential-integrity validation

use crate::graph::{Graph, NodeId};
use std::collections::HashSet;

/// Validation failures
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("circular dependency detected: {}", path.join(" -> "))]
    Cycle { path: Vec<NodeId> },

    #[error("'{node}' depends on '{dependency}', which does not exist")]
    MissingDependency { node: NodeId, dependency: NodeId },
}

/// Search for a circular dependency, returning a witness path
///
/// Depth-first search from every unvisited node, keeping an active-path
/// marker set alongside the fully-visited set. Reaching a node already on
/// the active path is a back edge; the returned path runs from the search
/// entry point through the repeated node, which appears again as the final
/// element. The witness is a valid cycle container, not necessarily the
/// shortest cycle. `None` means the graph is acyclic.
pub fn detect_cycles(graph: &Graph) -> Option<Vec<NodeId>> {
    let mut visited: HashSet<NodeId> = HashSet::new();

    let mut ids: Vec<&NodeId> = graph.node_ids().collect();
    ids.sort();

    for id in ids {
        if visited.contains(id.as_str()) {
            continue;
        }

        let mut on_path: HashSet<NodeId> = HashSet::new();
        let mut path: Vec<NodeId> = Vec::new();
        if let Some(witness) = dfs(graph, id, &mut visited, &mut on_path, &mut path) {
            return Some(witness);
        }
    }

    None
}

fn dfs(
    graph: &Graph,
    id: &str,
    visited: &mut HashSet<NodeId>,
    on_path: &mut HashSet<NodeId>,
    path: &mut Vec<NodeId>,
) -> Option<Vec<NodeId>> {
    on_path.insert(id.to_string());
    path.push(id.to_string());

    let mut deps = graph.dependencies(id);
    deps.sort();

    for dep in deps {
        if on_path.contains(&dep) {
            let mut witness = path.clone();
            witness.push(dep);
            return Some(witness);
        }
        if !visited.contains(&dep) {
            if let Some(witness) = dfs(graph, &dep, visited, on_path, path) {
                return Some(witness);
            }
        }
    }

    on_path.remove(id);
    path.pop();
    visited.insert(id.to_string());
    None
}

/// Check the graph's structural invariants before scheduling
///
/// An empty graph is valid. Cycles are checked first and reported alone;
/// only an acyclic graph goes on to referential-integrity checking, where
/// both the wired edges and each node's declared dependency list must
/// resolve to existing nodes. Reporting stops at the first violation; node
/// order is sorted by identifier so "first" is reproducible.
pub fn validate(graph: &Graph) -> Result<(), ValidateError> {
    if graph.is_empty() {
        return Ok(());
    }

    if let Some(path) = detect_cycles(graph) {
        return Err(ValidateError::Cycle { path });
    }

    let mut ids: Vec<&NodeId> = graph.node_ids().collect();
    ids.sort();

    for id in ids {
        for dep in graph.dependencies(id) {
            if graph.get_node(&dep).is_none() {
                return Err(ValidateError::MissingDependency {
                    node: id.clone(),
                    dependency: dep,
                });
            }
        }

        // The declared list is checked independently of the edges: the
        // builder intentionally skips wiring unresolvable dependencies.
        if let Some(node) = graph.get_node(id) {
            for dep in &node.depends_on {
                if graph.get_node(dep).is_none() {
                    return Err(ValidateError::MissingDependency {
                        node: id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }
    }

    Ok(())
}

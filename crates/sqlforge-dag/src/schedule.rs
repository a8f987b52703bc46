//! Topological execution ordering (Kahn's algorithm)
//!
//! In-degree here is the number of dependencies a node has: a node becomes
//! ready only once everything it depends on is already scheduled. A reverse
//! index (dependency -> dependents) is built once up front, and the ready
//! set is a min-heap over identifiers so ties among simultaneously-ready
//! nodes resolve by name. Output order is reproducible for a given input.

use crate::graph::{Graph, NodeId};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Scheduling failures
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("cannot order models: {unprocessed} node(s) are part of a dependency cycle")]
    Cycle { unprocessed: usize },
}

/// Produce a dependency-respecting execution order for every node
///
/// For every edge (dependent, dependency) in the result,
/// `position(dependency) < position(dependent)`. An empty graph sorts to an
/// empty order. If a cycle prevents full processing, the whole sort fails
/// rather than returning a partial order.
pub fn topological_sort(graph: &Graph) -> Result<Vec<NodeId>, ScheduleError> {
    let mut in_degree: HashMap<NodeId, usize> = HashMap::new();
    let mut dependents: HashMap<NodeId, Vec<NodeId>> = HashMap::new();

    // Reverse index: dependency -> nodes waiting on it. Built once so each
    // dequeue touches only the dequeued node's dependents.
    for id in graph.node_ids() {
        let deps = graph.dependencies(id);
        in_degree.insert(id.clone(), deps.len());
        for dep in deps {
            dependents.entry(dep).or_default().push(id.clone());
        }
    }

    let mut ready: BinaryHeap<Reverse<NodeId>> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| Reverse(id.clone()))
        .collect();

    let mut order: Vec<NodeId> = Vec::with_capacity(graph.len());

    while let Some(Reverse(id)) = ready.pop() {
        if let Some(waiting) = dependents.get(&id) {
            for dependent in waiting {
                // Every dependent was seeded into in_degree above.
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(dependent.clone()));
                    }
                }
            }
        }
        order.push(id);
    }

    if order.len() < graph.len() {
        return Err(ScheduleError::Cycle {
            unprocessed: graph.len() - order.len(),
        });
    }

    Ok(order)
}

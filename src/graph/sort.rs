// Kahn-style topological flattening
//
// Repeatedly emits the set of nodes with no remaining unemitted dependency.
// Ties inside a round keep insertion order so output is reproducible
// between runs. A cycle raises `CyclicDependencyError` naming the
// participants; the sort never loops forever.

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use std::collections::BTreeSet;

/// Flatten a dependency graph into an emission order, dependencies first
pub fn topo_sort(graph: &DependencyGraph) -> Result<Vec<String>> {
    let nodes = graph.insertion_order();
    let mut emitted: BTreeSet<&str> = BTreeSet::new();
    let mut order: Vec<String> = Vec::with_capacity(nodes.len());

    while order.len() < nodes.len() {
        // Readiness is judged against the previous rounds only, then the
        // whole ready set is emitted at once
        let ready: Vec<&String> = nodes
            .iter()
            .filter(|n| !emitted.contains(n.as_str()))
            .filter(|n| {
                graph
                    .neighbors(n)
                    .iter()
                    .all(|dep| emitted.contains(dep.as_str()))
            })
            .collect();

        if ready.is_empty() {
            let participants: Vec<String> = nodes
                .iter()
                .filter(|n| !emitted.contains(n.as_str()))
                .cloned()
                .collect();
            return Err(Error::CyclicDependency { participants });
        }

        for node in ready {
            emitted.insert(node.as_str());
            order.push(node.clone());
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from(nodes: &[&str], edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for node in nodes {
            graph.add_node(node);
        }
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    #[test]
    fn test_empty_graph() {
        let graph = DependencyGraph::new();
        assert!(topo_sort(&graph).unwrap().is_empty());
    }

    #[test]
    fn test_chain_dependencies_first() {
        let graph = graph_from(&["C", "B", "A"], &[("C", "B"), ("B", "A")]);
        assert_eq!(topo_sort(&graph).unwrap(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let graph = graph_from(&["Zeta", "Alpha", "Mid"], &[]);
        assert_eq!(topo_sort(&graph).unwrap(), vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_edges_respected() {
        let graph = graph_from(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("A", "C"), ("C", "D")],
        );
        let order = topo_sort(&graph).unwrap();

        let pos = |n: &str| order.iter().position(|x| x == n).unwrap();
        assert!(pos("B") < pos("A"));
        assert!(pos("C") < pos("A"));
        assert!(pos("D") < pos("C"));
    }

    #[test]
    fn test_cycle_raises_with_participants() {
        let graph = graph_from(&["A", "B", "Free"], &[("A", "B"), ("B", "A")]);
        let err = topo_sort(&graph).unwrap_err();

        match err {
            Error::CyclicDependency { participants } => {
                assert_eq!(participants, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("expected CyclicDependency, got {other}"),
        }
    }

    #[test]
    fn test_cycle_does_not_hang_with_partial_progress() {
        // Free nodes emit first, then the cycle is detected
        let graph = graph_from(
            &["Free1", "A", "B", "Free2"],
            &[("A", "B"), ("B", "A"), ("Free2", "Free1")],
        );
        assert!(topo_sort(&graph).is_err());
    }

    #[test]
    fn test_deterministic_across_runs() {
        let make = || {
            graph_from(
                &["M", "K", "A", "Z", "B"],
                &[("Z", "A"), ("B", "A"), ("M", "K")],
            )
        };
        assert_eq!(topo_sort(&make()).unwrap(), topo_sort(&make()).unwrap());
    }
}

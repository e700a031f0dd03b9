// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Level computation for workflow graphs.
//!
//! The planner partitions a workflow's nodes into execution levels using a
//! layered variant of Kahn's algorithm:
//!
//! 1. Count the in-degree of every node from the edge list
//! 2. Level 0 is every node with in-degree zero
//! 3. To produce level N+1, decrement the in-degree of each out-neighbor of
//!    level N's nodes and collect those reaching zero
//! 4. Stop when no new nodes are enqueued
//!
//! If the union of all levels is smaller than the node set, the leftover
//! nodes sit on a cycle and planning fails.
//!
//! Levels are the engine's happens-before structure: every predecessor of a
//! node lies strictly earlier, so all nodes within one level are mutually
//! independent and can run concurrently.
//!
//! Edges are counted individually. Parallel edges (same endpoints, same
//! ports) contribute multiple in-degree counts and are decremented
//! individually, which leaves the partition identical to the single-edge
//! case. A self-loop keeps its node's in-degree above zero forever and is
//! reported as a cycle.

use crate::errors::ValidationError;
use crate::model::Workflow;
use std::collections::HashMap;

/// The planner's output: a topological partition of the workflow's nodes.
///
/// Within each level, node ids appear in workflow declaration order, which
/// makes planning deterministic and gives the scheduler a stable order for
/// applying results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    levels: Vec<Vec<String>>,
}

impl ExecutionPlan {
    /// The levels, outermost ordering by dependency depth.
    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    /// Flat concatenation of the levels.
    pub fn ordered_node_ids(&self) -> Vec<String> {
        self.levels.iter().flatten().cloned().collect()
    }

    /// Total number of planned nodes.
    pub fn node_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

impl From<Vec<Vec<String>>> for ExecutionPlan {
    fn from(levels: Vec<Vec<String>>) -> Self {
        Self { levels }
    }
}

/// Partition the workflow's nodes into execution levels.
///
/// An empty workflow yields an empty plan without error. A workflow whose
/// graph is not a DAG yields [`ValidationError::CyclicDependency`] naming
/// the nodes that could never be scheduled.
pub fn compute_levels(workflow: &Workflow) -> Result<ExecutionPlan, ValidationError> {
    // Declaration index gives levels a stable internal order.
    let declaration_index: HashMap<&str, usize> = workflow
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect();

    let mut in_degree: HashMap<&str, usize> = workflow
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), 0))
        .collect();

    let mut out_neighbors: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &workflow.edges {
        out_neighbors
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
        if let Some(count) = in_degree.get_mut(edge.target.as_str()) {
            *count += 1;
        }
    }

    let mut levels: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<&str> = workflow
        .nodes
        .iter()
        .filter(|node| in_degree[node.id.as_str()] == 0)
        .map(|node| node.id.as_str())
        .collect();

    let mut placed = 0;
    while !current.is_empty() {
        placed += current.len();

        let mut next: Vec<&str> = Vec::new();
        for node_id in &current {
            if let Some(targets) = out_neighbors.get(node_id) {
                for target in targets {
                    let count = in_degree.get_mut(target).ok_or_else(|| {
                        // Unreachable after reference validation; kept so an
                        // unvalidated call cannot panic.
                        ValidationError::UnknownEdgeTarget {
                            target: (*target).to_string(),
                        }
                    })?;
                    *count -= 1;
                    if *count == 0 {
                        next.push(target);
                    }
                }
            }
        }
        next.sort_by_key(|node_id| declaration_index[node_id]);

        levels.push(current.iter().map(|id| (*id).to_string()).collect());
        current = next;
    }

    if placed != workflow.nodes.len() {
        let remaining: Vec<String> = workflow
            .nodes
            .iter()
            .filter(|node| in_degree[node.id.as_str()] > 0)
            .map(|node| node.id.clone())
            .collect();
        return Err(ValidationError::CyclicDependency { remaining });
    }

    Ok(ExecutionPlan::from(levels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Edge, Node, OutputPort, PortType, Trigger, InputPort};

    fn node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: "stub".to_string(),
            inputs: vec![InputPort::new("a", PortType::Any)],
            outputs: vec![OutputPort::new("value", PortType::Any)],
        }
    }

    fn edge(source: &str, target: &str) -> Edge {
        Edge {
            source: source.to_string(),
            source_output: "value".to_string(),
            target: target.to_string(),
            target_input: "a".to_string(),
        }
    }

    fn workflow(nodes: Vec<Node>, edges: Vec<Edge>) -> Workflow {
        Workflow {
            id: "wf".to_string(),
            name: "wf".to_string(),
            handle: "wf".to_string(),
            trigger: Trigger::Manual,
            nodes,
            edges,
        }
    }

    #[test]
    fn test_empty_workflow_plans_to_no_levels() {
        let plan = compute_levels(&workflow(vec![], vec![])).unwrap();
        assert!(plan.is_empty());
        assert!(plan.ordered_node_ids().is_empty());
    }

    #[test]
    fn test_linear_chain_levels() {
        let wf = workflow(
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("b", "c")],
        );
        let plan = compute_levels(&wf).unwrap();
        assert_eq!(
            plan.levels(),
            &[
                vec!["a".to_string()],
                vec!["b".to_string()],
                vec!["c".to_string()]
            ]
        );
    }

    #[test]
    fn test_diamond_levels() {
        // a -> [b, c] -> d
        let wf = workflow(
            vec![node("a"), node("b"), node("c"), node("d")],
            vec![
                edge("a", "b"),
                edge("a", "c"),
                edge("b", "d"),
                edge("c", "d"),
            ],
        );
        let plan = compute_levels(&wf).unwrap();

        assert_eq!(plan.levels().len(), 3);
        assert_eq!(plan.levels()[0], vec!["a".to_string()]);
        assert_eq!(plan.levels()[1], vec!["b".to_string(), "c".to_string()]);
        assert_eq!(plan.levels()[2], vec!["d".to_string()]);
    }

    #[test]
    fn test_disconnected_nodes_land_in_level_zero() {
        let wf = workflow(vec![node("x"), node("y")], vec![]);
        let plan = compute_levels(&wf).unwrap();
        assert_eq!(plan.levels(), &[vec!["x".to_string(), "y".to_string()]]);
    }

    #[test]
    fn test_every_edge_crosses_levels_forward() {
        let wf = workflow(
            vec![node("a"), node("b"), node("c"), node("d"), node("e")],
            vec![
                edge("a", "c"),
                edge("b", "c"),
                edge("c", "d"),
                edge("a", "e"),
                edge("d", "e"),
            ],
        );
        let plan = compute_levels(&wf).unwrap();

        let level_of: HashMap<String, usize> = plan
            .levels()
            .iter()
            .enumerate()
            .flat_map(|(depth, ids)| ids.iter().map(move |id| (id.clone(), depth)))
            .collect();

        for edge in &wf.edges {
            assert!(level_of[&edge.source] < level_of[&edge.target]);
        }
    }

    #[test]
    fn test_cycle_detected() {
        let wf = workflow(
            vec![node("a"), node("b"), node("c")],
            vec![edge("a", "b"), edge("b", "c"), edge("c", "b")],
        );
        let error = compute_levels(&wf).unwrap_err();
        match error {
            ValidationError::CyclicDependency { remaining } => {
                assert!(remaining.contains(&"b".to_string()));
                assert!(remaining.contains(&"c".to_string()));
                assert!(!remaining.contains(&"a".to_string()));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let wf = workflow(vec![node("a")], vec![edge("a", "a")]);
        assert!(matches!(
            compute_levels(&wf),
            Err(ValidationError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_parallel_edges_do_not_disturb_planning() {
        let wf = workflow(
            vec![node("a"), node("b")],
            vec![edge("a", "b"), edge("a", "b")],
        );
        let plan = compute_levels(&wf).unwrap();
        assert_eq!(
            plan.levels(),
            &[vec!["a".to_string()], vec!["b".to_string()]]
        );
    }

    #[test]
    fn test_planning_is_deterministic() {
        let wf = workflow(
            vec![node("n3"), node("n1"), node("n2")],
            vec![edge("n3", "n2"), edge("n1", "n2")],
        );
        let first = compute_levels(&wf).unwrap();
        let second = compute_levels(&wf).unwrap();
        assert_eq!(first, second);
        // Level order follows declaration order, not alphabetical order
        assert_eq!(first.levels()[0], vec!["n3".to_string(), "n1".to_string()]);
    }
}

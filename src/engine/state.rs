// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Mutable per-execution progress state and the derived workflow status.
//!
//! [`ExecutionState`] has exactly one writer: the level scheduler, which
//! applies one [`NodeExecutionResult`] per node at most. Everything else
//! reads snapshots. The invariants documented on the struct hold at every
//! observation point and are checked by [`ExecutionState::check_invariants`]
//! in tests and debug builds.
//!
//! The workflow's status is never stored; [`workflow_status`] recomputes it
//! from the immutable context plus the current state.

use crate::engine::context::ExecutionContext;
use crate::engine::record::{ExecutionStatus, NodeExecutionResult};
use crate::model::{Value, Workflow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Mutable progress of one execution.
///
/// Invariants:
/// 1. `executed`, `skipped`, and `keys(errors)` are pairwise disjoint
/// 2. `node_outputs` has a key exactly when the node id is in `executed`
/// 3. every node id mentioned anywhere is declared in the workflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionState {
    /// Published outputs of completed nodes. A completed node may publish
    /// only some of its declared outputs; absence means "branch not taken".
    pub node_outputs: HashMap<String, BTreeMap<String, Value>>,
    /// Successfully completed nodes.
    pub executed: HashSet<String>,
    /// Nodes not executed due to an inactive branch or upstream failure.
    pub skipped: HashSet<String>,
    /// Nodes that executed and failed, or could not be invoked.
    pub errors: HashMap<String, String>,
    /// Per-node resource cost actually incurred.
    pub usage: HashMap<String, u64>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the node already has a recorded outcome.
    pub fn is_decided(&self, node_id: &str) -> bool {
        self.executed.contains(node_id)
            || self.skipped.contains(node_id)
            || self.errors.contains_key(node_id)
    }

    /// A published output value, if the node completed and took that branch.
    pub fn output(&self, node_id: &str, output_name: &str) -> Option<&Value> {
        self.node_outputs.get(node_id)?.get(output_name)
    }

    /// Apply one node's result. Called by the scheduler only, once per node.
    pub fn apply(&mut self, node_id: &str, result: &NodeExecutionResult) {
        match result {
            NodeExecutionResult::Completed { outputs, usage } => {
                self.executed.insert(node_id.to_string());
                self.node_outputs
                    .insert(node_id.to_string(), outputs.clone());
                self.usage.insert(node_id.to_string(), *usage);
            }
            NodeExecutionResult::Error { error, usage } => {
                self.errors.insert(node_id.to_string(), error.clone());
                if let Some(usage) = usage {
                    self.usage.insert(node_id.to_string(), *usage);
                }
            }
            NodeExecutionResult::Skipped { .. } => {
                self.skipped.insert(node_id.to_string());
            }
        }
    }

    /// Sum of actual usage across all nodes.
    pub fn total_usage(&self) -> u64 {
        self.usage.values().sum()
    }

    /// Verify the state invariants against a workflow definition.
    ///
    /// Returns a description of the first violation found. Used by tests and
    /// by debug assertions at level boundaries.
    pub fn check_invariants(&self, workflow: &Workflow) -> Result<(), String> {
        for node_id in &self.executed {
            if self.skipped.contains(node_id) || self.errors.contains_key(node_id) {
                return Err(format!("node '{}' has more than one outcome", node_id));
            }
        }
        for node_id in &self.skipped {
            if self.errors.contains_key(node_id) {
                return Err(format!("node '{}' is both skipped and errored", node_id));
            }
        }

        for node_id in self.node_outputs.keys() {
            if !self.executed.contains(node_id) {
                return Err(format!(
                    "node '{}' has outputs but is not executed",
                    node_id
                ));
            }
        }
        for node_id in &self.executed {
            if !self.node_outputs.contains_key(node_id) {
                return Err(format!(
                    "executed node '{}' has no outputs entry",
                    node_id
                ));
            }
        }

        // A decided node implies every upstream node is decided too
        for edge in &workflow.edges {
            if self.is_decided(&edge.target) && !self.is_decided(&edge.source) {
                return Err(format!(
                    "node '{}' is decided but its upstream '{}' is not",
                    edge.target, edge.source
                ));
            }
        }

        let declared: HashSet<&str> = workflow.nodes.iter().map(|n| n.id.as_str()).collect();
        let mentioned = self
            .executed
            .iter()
            .chain(self.skipped.iter())
            .chain(self.errors.keys())
            .chain(self.usage.keys())
            .chain(self.node_outputs.keys());
        for node_id in mentioned {
            if !declared.contains(node_id.as_str()) {
                return Err(format!("node '{}' is not declared in the workflow", node_id));
            }
        }

        Ok(())
    }
}

/// Derive the workflow's status from immutable context plus progress state.
pub fn workflow_status(context: &ExecutionContext, state: &ExecutionState) -> ExecutionStatus {
    let all_visited = context
        .ordered_node_ids()
        .iter()
        .all(|node_id| state.is_decided(node_id));

    if !all_visited {
        ExecutionStatus::Executing
    } else if !state.errors.is_empty() {
        ExecutionStatus::Error
    } else {
        ExecutionStatus::Completed
    }
}

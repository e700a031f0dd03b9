// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::model::Workflow;
use crate::planner::ExecutionPlan;
use std::sync::Arc;

/// Immutable per-execution data.
///
/// Built once by the driver after planning succeeds and shared read-only
/// with every node invocation for the rest of the run. Holding the plan here
/// (rather than on the mutable state) is what makes the scheduler's thunks
/// pure functions of `context` plus a state snapshot.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub workflow: Arc<Workflow>,
    pub workflow_id: String,
    pub organization_id: String,
    pub execution_id: String,
    pub deployment_id: Option<String>,
    levels: Vec<Vec<String>>,
    ordered_node_ids: Vec<String>,
}

impl ExecutionContext {
    pub fn new(
        workflow: Arc<Workflow>,
        plan: &ExecutionPlan,
        organization_id: String,
        execution_id: String,
        deployment_id: Option<String>,
    ) -> Self {
        let workflow_id = workflow.id.clone();
        Self {
            workflow,
            workflow_id,
            organization_id,
            execution_id,
            deployment_id,
            levels: plan.levels().to_vec(),
            ordered_node_ids: plan.ordered_node_ids(),
        }
    }

    /// The planner's topological partition.
    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    /// Flat concatenation of the levels, used for "all nodes visited" checks.
    pub fn ordered_node_ids(&self) -> &[String] {
        &self.ordered_node_ids
    }
}

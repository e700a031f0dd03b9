// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution results and the externally visible execution record.
//!
//! [`NodeExecutionResult`] is the uniform outcome of one node invocation.
//! It crosses the durable-step boundary, so it serializes to plain JSON and
//! deserializes back without loss; a replayed execution reads these results
//! out of the step journal instead of re-running nodes.
//!
//! [`ExecutionRecord`] is the summary a caller sees: overall status, one
//! entry per node, timestamps, and the driver-level error if one occurred.
//! The record is updated after each level and persisted exactly once.

use crate::model::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why a node was skipped instead of executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Every upstream edge came from a completed node that chose not to
    /// publish the connected output. The branch was simply not taken.
    ConditionalBranch,
    /// At least one upstream edge came from a node that errored or was
    /// itself skipped. The failure propagates as a skip.
    UpstreamFailure,
}

/// Overall status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Submitted,
    Executing,
    Completed,
    Error,
    Exhausted,
}

impl ExecutionStatus {
    /// The status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Submitted => "submitted",
            ExecutionStatus::Executing => "executing",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Error => "error",
            ExecutionStatus::Exhausted => "exhausted",
        }
    }
}

/// The uniform result of invoking one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeExecutionResult {
    /// The node ran and published outputs.
    #[serde(rename_all = "camelCase")]
    Completed {
        outputs: BTreeMap<String, Value>,
        usage: u64,
    },
    /// The node ran and failed, or could not be invoked at all.
    #[serde(rename_all = "camelCase")]
    Error {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<u64>,
    },
    /// The node was not executed.
    #[serde(rename_all = "camelCase")]
    Skipped {
        /// Always `null`; present so the serialized form carries the full
        /// result contract.
        #[serde(default)]
        outputs: Option<BTreeMap<String, Value>>,
        skip_reason: SkipReason,
        blocked_by: Vec<String>,
        #[serde(default)]
        usage: u64,
    },
}

impl NodeExecutionResult {
    pub fn completed(outputs: BTreeMap<String, Value>, usage: u64) -> Self {
        NodeExecutionResult::Completed { outputs, usage }
    }

    pub fn error(error: impl Into<String>) -> Self {
        NodeExecutionResult::Error {
            error: error.into(),
            usage: None,
        }
    }

    pub fn error_with_usage(error: impl Into<String>, usage: Option<u64>) -> Self {
        NodeExecutionResult::Error {
            error: error.into(),
            usage,
        }
    }

    pub fn skipped(skip_reason: SkipReason, blocked_by: Vec<String>) -> Self {
        NodeExecutionResult::Skipped {
            outputs: None,
            skip_reason,
            blocked_by,
            usage: 0,
        }
    }

    /// Resource cost actually incurred by this result.
    pub fn usage(&self) -> u64 {
        match self {
            NodeExecutionResult::Completed { usage, .. } => *usage,
            NodeExecutionResult::Error { usage, .. } => usage.unwrap_or(0),
            NodeExecutionResult::Skipped { .. } => 0,
        }
    }
}

/// One node's entry in the execution record.
///
/// `executing` and `idle` only appear in snapshots emitted while the
/// execution is still in flight, or in a final snapshot when the workflow
/// was cut short before reaching those nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NodeExecutionSummary {
    #[serde(rename_all = "camelCase")]
    Completed {
        node_id: String,
        outputs: BTreeMap<String, Value>,
        usage: u64,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        node_id: String,
        error: String,
        usage: u64,
    },
    #[serde(rename_all = "camelCase")]
    Skipped {
        node_id: String,
        outputs: Option<BTreeMap<String, Value>>,
        usage: u64,
        skip_reason: SkipReason,
        blocked_by: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Executing { node_id: String, usage: u64 },
    #[serde(rename_all = "camelCase")]
    Idle { node_id: String, usage: u64 },
}

impl NodeExecutionSummary {
    pub fn node_id(&self) -> &str {
        match self {
            NodeExecutionSummary::Completed { node_id, .. } => node_id,
            NodeExecutionSummary::Error { node_id, .. } => node_id,
            NodeExecutionSummary::Skipped { node_id, .. } => node_id,
            NodeExecutionSummary::Executing { node_id, .. } => node_id,
            NodeExecutionSummary::Idle { node_id, .. } => node_id,
        }
    }

    pub fn usage(&self) -> u64 {
        match self {
            NodeExecutionSummary::Completed { usage, .. } => *usage,
            NodeExecutionSummary::Error { usage, .. } => *usage,
            NodeExecutionSummary::Skipped { usage, .. } => *usage,
            NodeExecutionSummary::Executing { usage, .. } => *usage,
            NodeExecutionSummary::Idle { usage, .. } => *usage,
        }
    }

    fn from_result(node_id: &str, result: &NodeExecutionResult) -> Self {
        match result {
            NodeExecutionResult::Completed { outputs, usage } => NodeExecutionSummary::Completed {
                node_id: node_id.to_string(),
                outputs: outputs.clone(),
                usage: *usage,
            },
            NodeExecutionResult::Error { error, usage } => NodeExecutionSummary::Error {
                node_id: node_id.to_string(),
                error: error.clone(),
                usage: usage.unwrap_or(0),
            },
            NodeExecutionResult::Skipped {
                skip_reason,
                blocked_by,
                ..
            } => NodeExecutionSummary::Skipped {
                node_id: node_id.to_string(),
                outputs: None,
                usage: 0,
                skip_reason: *skip_reason,
                blocked_by: blocked_by.clone(),
            },
        }
    }
}

/// The externally visible summary of one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: String,
    pub workflow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    pub user_id: String,
    pub organization_id: String,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub node_executions: Vec<NodeExecutionSummary>,
}

impl ExecutionRecord {
    /// A fresh record in the `submitted` state with no node entries.
    pub fn new(
        id: String,
        workflow_id: String,
        deployment_id: Option<String>,
        user_id: String,
        organization_id: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            workflow_id,
            deployment_id,
            user_id,
            organization_id,
            status: ExecutionStatus::Submitted,
            started_at,
            ended_at: None,
            error: None,
            node_executions: Vec::new(),
        }
    }

    /// Seed one `idle` entry per planned node, in plan order.
    pub fn seed_idle(&mut self, ordered_node_ids: &[String]) {
        self.node_executions = ordered_node_ids
            .iter()
            .map(|node_id| NodeExecutionSummary::Idle {
                node_id: node_id.clone(),
                usage: 0,
            })
            .collect();
    }

    /// Mark a node as in flight.
    pub fn mark_executing(&mut self, node_id: &str) {
        if let Some(entry) = self.entry_mut(node_id) {
            *entry = NodeExecutionSummary::Executing {
                node_id: node_id.to_string(),
                usage: 0,
            };
        }
    }

    /// Replace a node's entry with its final result.
    pub fn apply_result(&mut self, node_id: &str, result: &NodeExecutionResult) {
        let summary = NodeExecutionSummary::from_result(node_id, result);
        match self.entry_mut(node_id) {
            Some(entry) => *entry = summary,
            None => self.node_executions.push(summary),
        }
    }

    pub fn set_status(&mut self, status: ExecutionStatus) {
        self.status = status;
    }

    /// Record a driver-level error message; the first message wins.
    pub fn set_error(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(message.into());
        }
    }

    /// Sum of actual usage across all node entries.
    pub fn total_usage(&self) -> u64 {
        self.node_executions.iter().map(|entry| entry.usage()).sum()
    }

    /// Find a node's entry.
    pub fn entry(&self, node_id: &str) -> Option<&NodeExecutionSummary> {
        self.node_executions
            .iter()
            .find(|entry| entry.node_id() == node_id)
    }

    fn entry_mut(&mut self, node_id: &str) -> Option<&mut NodeExecutionSummary> {
        self.node_executions
            .iter_mut()
            .find(|entry| entry.node_id() == node_id)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Skip analysis: decide whether a ready node executes or is skipped.
//!
//! Each incoming edge is classified by the state of its source node:
//!
//! - `Errored`: the source is in `errors`
//! - `Skipped`: the source is in `skipped`
//! - `Inactive`: the source completed but did not publish the connected
//!   output (a conditional branch that was not taken)
//! - `Available`: the source completed and published the output
//!
//! The decision rule is deliberately asymmetric. A node with at least one
//! available edge runs even when sibling edges are inactive, so join-style
//! nodes can merge a conditional fork with partial inputs. A node with no
//! available edges is skipped, and the reason depends on *why* nothing was
//! available: if every non-available edge is merely inactive the skip is a
//! `conditional_branch`; the moment any upstream actually failed or was
//! itself skipped, the skip is an `upstream_failure` and propagates blocker
//! information downstream.

use crate::engine::record::SkipReason;
use crate::engine::state::ExecutionState;
use crate::model::Workflow;

/// Classification of one incoming edge by its source node's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSignal {
    Errored,
    Skipped,
    Inactive,
    Available,
}

/// The skip analyzer's verdict for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The node should be invoked.
    Ready,
    /// The node already has a recorded outcome.
    Decided,
    /// The node must not run; record a skipped result.
    Skip {
        reason: SkipReason,
        blocked_by: Vec<String>,
    },
}

/// Classify a single incoming edge.
fn classify_edge(state: &ExecutionState, source: &str, source_output: &str) -> UpstreamSignal {
    if state.errors.contains_key(source) {
        UpstreamSignal::Errored
    } else if state.skipped.contains(source) {
        UpstreamSignal::Skipped
    } else if state.executed.contains(source) && state.output(source, source_output).is_none() {
        UpstreamSignal::Inactive
    } else {
        UpstreamSignal::Available
    }
}

/// Decide whether `node_id` should execute against the given state.
pub fn assess_node(workflow: &Workflow, state: &ExecutionState, node_id: &str) -> Readiness {
    if state.is_decided(node_id) {
        return Readiness::Decided;
    }

    let mut any_available = false;
    let mut any_failure = false;
    let mut inactive_sources: Vec<String> = Vec::new();
    let mut failed_sources: Vec<String> = Vec::new();
    let mut has_edges = false;

    for edge in workflow.incoming_edges(node_id) {
        has_edges = true;
        match classify_edge(state, &edge.source, &edge.source_output) {
            UpstreamSignal::Available => any_available = true,
            UpstreamSignal::Inactive => {
                if !inactive_sources.contains(&edge.source) {
                    inactive_sources.push(edge.source.clone());
                }
            }
            UpstreamSignal::Errored | UpstreamSignal::Skipped => {
                any_failure = true;
                if !failed_sources.contains(&edge.source) {
                    failed_sources.push(edge.source.clone());
                }
            }
        }
    }

    if !has_edges || any_available {
        return Readiness::Ready;
    }

    if any_failure {
        Readiness::Skip {
            reason: SkipReason::UpstreamFailure,
            blocked_by: failed_sources,
        }
    } else {
        Readiness::Skip {
            reason: SkipReason::ConditionalBranch,
            blocked_by: inactive_sources,
        }
    }
}

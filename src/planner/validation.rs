// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of workflow definitions.
//!
//! Validation runs before planning and accumulates every problem it can find
//! rather than failing on the first, so an author sees all mistakes at once.
//! The pipeline runs three checks in order:
//!
//! 1. **Uniqueness**: node ids are unique within the workflow
//! 2. **References**: every edge endpoint names an existing node and a port
//!    that node declares
//! 3. **Acyclicity**: the graph admits a topological partition
//!
//! The ordering matters: cycle detection needs a structurally valid graph,
//! so it only runs when the first two checks pass.

use crate::errors::ValidationError;
use crate::model::Workflow;
use crate::planner::levels::compute_levels;
use std::collections::HashSet;

/// Validate a workflow for structural integrity and executability.
///
/// Returns `Ok(())` when the workflow can be planned, or the accumulated
/// list of validation errors otherwise.
pub fn validate_workflow(workflow: &Workflow) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_node_ids(workflow) {
        errors.extend(duplicate_errors);
    }

    if let Err(reference_errors) = validate_edge_references(workflow) {
        errors.extend(reference_errors);
    }

    // Cycle detection requires resolvable references, so skip it when the
    // graph is already known to be broken.
    if errors.is_empty() {
        if let Err(cycle_error) = compute_levels(workflow) {
            errors.push(cycle_error);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate that all node ids are unique within the workflow.
fn validate_unique_node_ids(workflow: &Workflow) -> Result<(), Vec<ValidationError>> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for node in &workflow.nodes {
        if !seen.insert(node.id.as_str()) {
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.id.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate that every edge endpoint references an existing node and a port
/// that node actually declares.
fn validate_edge_references(workflow: &Workflow) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for edge in &workflow.edges {
        match workflow.node(&edge.source) {
            None => errors.push(ValidationError::UnknownEdgeSource {
                source: edge.source.clone(),
            }),
            Some(source) => {
                if source.output(&edge.source_output).is_none() {
                    errors.push(ValidationError::UnknownOutputPort {
                        node_id: edge.source.clone(),
                        port: edge.source_output.clone(),
                    });
                }
            }
        }

        match workflow.node(&edge.target) {
            None => errors.push(ValidationError::UnknownEdgeTarget {
                target: edge.target.clone(),
            }),
            Some(target) => {
                if target.input(&edge.target_input).is_none() {
                    errors.push(ValidationError::UnknownInputPort {
                        node_id: edge.target.clone(),
                        port: edge.target_input.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

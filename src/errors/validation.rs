// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

/// Errors that can occur during workflow structural validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two nodes in the workflow share the same id
    DuplicateNodeId {
        /// The duplicate node id
        node_id: String,
    },
    /// An edge references a source node that doesn't exist
    UnknownEdgeSource {
        /// The missing source node id
        source: String,
    },
    /// An edge references a target node that doesn't exist
    UnknownEdgeTarget {
        /// The missing target node id
        target: String,
    },
    /// An edge references an output port its source node doesn't declare
    UnknownOutputPort {
        /// The source node id
        node_id: String,
        /// The undeclared output port name
        port: String,
    },
    /// An edge references an input port its target node doesn't declare
    UnknownInputPort {
        /// The target node id
        node_id: String,
        /// The undeclared input port name
        port: String,
    },
    /// The workflow graph is not a DAG
    CyclicDependency {
        /// Node ids that could never be scheduled because of the cycle
        remaining: Vec<String>,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node id: '{}'", node_id)
            }
            ValidationError::UnknownEdgeSource { source } => {
                write!(f, "Edge references unknown source node '{}'", source)
            }
            ValidationError::UnknownEdgeTarget { target } => {
                write!(f, "Edge references unknown target node '{}'", target)
            }
            ValidationError::UnknownOutputPort { node_id, port } => {
                write!(
                    f,
                    "Node '{}' declares no output port named '{}'",
                    node_id, port
                )
            }
            ValidationError::UnknownInputPort { node_id, port } => {
                write!(
                    f,
                    "Node '{}' declares no input port named '{}'",
                    node_id, port
                )
            }
            ValidationError::CyclicDependency { remaining } => {
                write!(
                    f,
                    "Workflow contains a cycle involving: {}",
                    remaining.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

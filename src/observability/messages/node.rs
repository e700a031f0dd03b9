// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for per-node outcome events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A node completed and published outputs.
///
/// # Log Level
/// `debug!` - High-volume progress event
pub struct NodeCompleted<'a> {
    pub execution_id: &'a str,
    pub node_id: &'a str,
    pub usage: u64,
}

impl Display for NodeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed: usage={}",
            self.node_id, self.usage
        )
    }
}

impl StructuredLog for NodeCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            execution_id = self.execution_id,
            node_id = self.node_id,
            usage = self.usage,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_completed",
            span_name = name,
            execution_id = self.execution_id,
            node_id = self.node_id,
            usage = self.usage,
        )
    }
}

/// A node failed or could not be invoked.
///
/// # Log Level
/// `warn!` - Confined failure; the execution continues
pub struct NodeFailed<'a> {
    pub execution_id: &'a str,
    pub node_id: &'a str,
    pub error: &'a str,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' failed: {}", self.node_id, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            execution_id = self.execution_id,
            node_id = self.node_id,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "node_failed",
            span_name = name,
            execution_id = self.execution_id,
            node_id = self.node_id,
            error = self.error,
        )
    }
}

/// A node was skipped by branch analysis.
///
/// # Log Level
/// `debug!` - High-volume progress event
pub struct NodeSkipped<'a> {
    pub execution_id: &'a str,
    pub node_id: &'a str,
    pub reason: &'a str,
}

impl Display for NodeSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' skipped: {}", self.node_id, self.reason)
    }
}

impl StructuredLog for NodeSkipped<'_> {
    fn log(&self) {
        tracing::debug!(
            execution_id = self.execution_id,
            node_id = self.node_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_skipped",
            span_name = name,
            execution_id = self.execution_id,
            node_id = self.node_id,
            reason = self.reason,
        )
    }
}

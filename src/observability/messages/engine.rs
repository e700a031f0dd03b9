// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for execution lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Execution submission and planning
//! * Level completion during scheduling
//! * Execution finalization
//! * Best-effort monitoring delivery

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Execution submitted and planned.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ExecutionSubmitted<'a> {
    pub execution_id: &'a str,
    pub workflow_id: &'a str,
    pub node_count: usize,
    pub level_count: usize,
}

impl Display for ExecutionSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution '{}' of workflow '{}' planned: {} nodes across {} levels",
            self.execution_id, self.workflow_id, self.node_count, self.level_count
        )
    }
}

impl StructuredLog for ExecutionSubmitted<'_> {
    fn log(&self) {
        tracing::info!(
            execution_id = self.execution_id,
            workflow_id = self.workflow_id,
            node_count = self.node_count,
            level_count = self.level_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution",
            span_name = name,
            execution_id = self.execution_id,
            workflow_id = self.workflow_id,
            node_count = self.node_count,
            level_count = self.level_count,
        )
    }
}

/// One level of the plan completed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct LevelCompleted<'a> {
    pub execution_id: &'a str,
    pub level_index: usize,
    pub node_count: usize,
}

impl Display for LevelCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution '{}' completed level {}: {} nodes",
            self.execution_id, self.level_index, self.node_count
        )
    }
}

impl StructuredLog for LevelCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            execution_id = self.execution_id,
            level_index = self.level_index,
            node_count = self.node_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "level",
            span_name = name,
            execution_id = self.execution_id,
            level_index = self.level_index,
            node_count = self.node_count,
        )
    }
}

/// Execution reached a terminal state.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ExecutionFinished<'a> {
    pub execution_id: &'a str,
    pub status: &'a str,
    pub total_usage: u64,
}

impl Display for ExecutionFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution '{}' finished with status '{}': total usage {}",
            self.execution_id, self.status, self.total_usage
        )
    }
}

impl StructuredLog for ExecutionFinished<'_> {
    fn log(&self) {
        tracing::info!(
            execution_id = self.execution_id,
            status = self.status,
            total_usage = self.total_usage,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "execution_finished",
            span_name = name,
            execution_id = self.execution_id,
            status = self.status,
            total_usage = self.total_usage,
        )
    }
}

/// A monitoring update could not be delivered.
///
/// # Log Level
/// `warn!` - Degraded but non-fatal; the channel is best-effort
pub struct MonitorUpdateDropped<'a> {
    pub execution_id: &'a str,
    pub reason: &'a str,
}

impl Display for MonitorUpdateDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped monitoring update for execution '{}': {}",
            self.execution_id, self.reason
        )
    }
}

impl StructuredLog for MonitorUpdateDropped<'_> {
    fn log(&self) {
        tracing::warn!(
            execution_id = self.execution_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "monitor_update_dropped",
            span_name = name,
            execution_id = self.execution_id,
            reason = self.reason,
        )
    }
}

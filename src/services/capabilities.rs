// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capability handles surfaced to nodes through their context.
//!
//! These are the narrow interfaces a node can reach beyond its inputs:
//! databases, datasets, queues, and tool-calls into other nodes. The engine
//! treats them as opaque; which handles an execution carries is decided by
//! the caller wiring the engine up.

use crate::model::Value;
use crate::services::ServiceError;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// A relational database handle.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    /// Run a statement and return its result rows as a value.
    async fn query(&self, statement: &str, params: Vec<Value>) -> Result<Value, ServiceError>;
}

/// A dataset handle.
#[async_trait]
pub trait DatasetService: Send + Sync {
    /// Fetch the dataset's content as a value.
    async fn fetch(&self, dataset_id: &str) -> Result<Value, ServiceError>;
}

/// A message queue handle.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Enqueue one message.
    async fn enqueue(&self, queue_id: &str, message: Value) -> Result<(), ServiceError>;
}

/// Tool-call dispatch into other nodes.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invoke a named tool with keyword arguments.
    async fn call_tool(
        &self,
        name: &str,
        args: BTreeMap<String, Value>,
    ) -> Result<Value, ServiceError>;
}

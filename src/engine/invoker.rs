// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Node invocation: run exactly one node and yield a uniform result.
//!
//! The invoker resolves the node's type in the catalog, collects and
//! transforms its inputs, builds the per-invocation context, awaits the
//! node's `execute`, and transforms its outputs. Every failure mode along
//! the way (unknown node, unimplemented type, subscription gate, store
//! failure, node error, node panic) is confined to the returned
//! [`NodeExecutionResult`]; nothing node-local ever propagates out as an
//! `Err`.
//!
//! Parameter transformation crosses the object-store boundary in both
//! directions. Inputs on `binary` ports have object references dereferenced
//! into inline blobs; completed outputs on `binary` ports have inline blobs
//! materialized back into stored references. Array order is preserved in
//! both directions.

use crate::catalog::{Capabilities, NodeCatalog, NodeContext, NodeOutcome};
use crate::engine::collector::collect_inputs;
use crate::engine::context::ExecutionContext;
use crate::engine::record::NodeExecutionResult;
use crate::model::{InlineBlob, Node, PortType, TriggerPayload, Value};
use crate::services::ServiceError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Runs single nodes on behalf of the scheduler.
pub struct NodeInvoker {
    catalog: Arc<dyn NodeCatalog>,
    capabilities: Capabilities,
    /// Whether the caller's plan is entitled to subscription-gated types.
    entitled: bool,
    env: BTreeMap<String, String>,
}

impl NodeInvoker {
    pub fn new(
        catalog: Arc<dyn NodeCatalog>,
        capabilities: Capabilities,
        entitled: bool,
        env: BTreeMap<String, String>,
    ) -> Self {
        Self {
            catalog,
            capabilities,
            entitled,
            env,
        }
    }

    /// Invoke `node_id` against a snapshot of published outputs.
    pub async fn invoke(
        &self,
        context: &ExecutionContext,
        node_outputs: &HashMap<String, BTreeMap<String, Value>>,
        node_id: &str,
        trigger: &TriggerPayload,
        cancellation: CancellationToken,
    ) -> NodeExecutionResult {
        let node = match context.workflow.node(node_id) {
            Some(node) => node,
            None => {
                return NodeExecutionResult::error(format!(
                    "Node '{}' not found in workflow",
                    node_id
                ))
            }
        };

        let descriptor = match self.catalog.lookup_type(&node.node_type) {
            Some(descriptor) => descriptor,
            None => {
                return NodeExecutionResult::error(format!(
                    "Node type '{}' is not implemented",
                    node.node_type
                ))
            }
        };

        if descriptor.subscription && !self.entitled {
            return NodeExecutionResult::error(format!(
                "Node type '{}' requires an active subscription",
                node.node_type
            ));
        }

        let executable = match self.catalog.instantiate(node) {
            Some(executable) => executable,
            None => {
                return NodeExecutionResult::error(format!(
                    "Node type '{}' is not implemented",
                    node.node_type
                ))
            }
        };

        let inputs = collect_inputs(&context.workflow, node_outputs, node_id);
        let inputs = match self.transform_inputs(node, inputs).await {
            Ok(inputs) => inputs,
            Err(error) => return NodeExecutionResult::error(error.to_string()),
        };

        let node_context = NodeContext {
            node_id: node_id.to_string(),
            workflow_id: context.workflow_id.clone(),
            execution_id: context.execution_id.clone(),
            organization_id: context.organization_id.clone(),
            deployment_id: context.deployment_id.clone(),
            inputs,
            trigger: trigger.clone(),
            capabilities: self.capabilities.clone(),
            cancellation,
            env: self.env.clone(),
        };

        // Run inside its own task so a panicking node surfaces as a join
        // error instead of unwinding through the scheduler.
        let handle = tokio::spawn(async move { executable.execute(node_context).await });
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                return NodeExecutionResult::error(format!("Node execution panicked: {join_error}"))
            }
        };

        match outcome {
            NodeOutcome::Completed { outputs, usage } => {
                let outputs = match self.transform_outputs(context, node, outputs).await {
                    Ok(outputs) => outputs,
                    Err(error) => return NodeExecutionResult::error(error.to_string()),
                };
                NodeExecutionResult::completed(outputs, usage.unwrap_or(descriptor.usage))
            }
            NodeOutcome::Error { error, usage } => {
                NodeExecutionResult::error_with_usage(error, usage)
            }
        }
    }

    /// Dereference object references on binary input ports.
    async fn transform_inputs(
        &self,
        node: &Node,
        inputs: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, ServiceError> {
        let mut transformed = BTreeMap::new();

        for (name, value) in inputs {
            let is_binary = node
                .input(&name)
                .map(|port| port.port_type == PortType::Binary)
                .unwrap_or(false);

            let value = if is_binary {
                match value {
                    Value::Array(items) => {
                        let mut resolved = Vec::with_capacity(items.len());
                        for item in items {
                            resolved.push(self.dereference(item).await?);
                        }
                        Value::Array(resolved)
                    }
                    other => self.dereference(other).await?,
                }
            } else {
                value
            };

            transformed.insert(name, value);
        }

        Ok(transformed)
    }

    async fn dereference(&self, value: Value) -> Result<Value, ServiceError> {
        match value {
            Value::Ref(reference) => {
                let stored = self
                    .capabilities
                    .object_store()
                    .read_object(&reference)
                    .await?;
                Ok(InlineBlob {
                    data: stored.data,
                    mime_type: stored.mime_type,
                    filename: reference.filename,
                }
                .into_value())
            }
            other => Ok(other),
        }
    }

    /// Materialize inline blobs on binary output ports into references.
    async fn transform_outputs(
        &self,
        context: &ExecutionContext,
        node: &Node,
        outputs: BTreeMap<String, Value>,
    ) -> Result<BTreeMap<String, Value>, ServiceError> {
        let mut transformed = BTreeMap::new();

        for (name, value) in outputs {
            let is_binary = node
                .output(&name)
                .map(|port| port.port_type == PortType::Binary)
                .unwrap_or(false);

            let value = if is_binary {
                match value {
                    Value::Array(items) => {
                        let mut materialized = Vec::with_capacity(items.len());
                        for item in items {
                            materialized.push(self.materialize(context, item).await?);
                        }
                        Value::Array(materialized)
                    }
                    other => self.materialize(context, other).await?,
                }
            } else {
                value
            };

            transformed.insert(name, value);
        }

        Ok(transformed)
    }

    async fn materialize(
        &self,
        context: &ExecutionContext,
        value: Value,
    ) -> Result<Value, ServiceError> {
        match InlineBlob::from_value(&value) {
            Some(blob) => {
                let reference = self
                    .capabilities
                    .object_store()
                    .write_object(
                        blob.data,
                        &blob.mime_type,
                        &context.organization_id,
                        Some(&context.execution_id),
                        blob.filename.as_deref(),
                    )
                    .await?;
                Ok(Value::Ref(reference))
            }
            None => Ok(value),
        }
    }
}

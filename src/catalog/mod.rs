// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The node catalog: where node types come from.
//!
//! The engine treats every node's domain logic as opaque. A catalog maps
//! type ids to [`NodeTypeDescriptor`]s (declared ports, default usage,
//! subscription gating) and instantiates [`Executable`]s for concrete
//! workflow nodes. The invoker is the only engine component that talks to
//! a catalog.

pub mod builtin;

use crate::model::{InputPort, Node, OutputPort, TriggerPayload, Value};
use crate::services::{
    CredentialProvider, DatabaseService, DatasetService, Integration, ObjectStore, QueueService,
    ServiceError, ToolInvoker,
};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub use builtin::BuiltinCatalog;

/// Everything a node may reach beyond its inputs.
///
/// Built once per execution by the driver and shared across invocations.
/// Handles that the caller did not wire up resolve to
/// [`ServiceError::CapabilityUnavailable`].
#[derive(Clone)]
pub struct Capabilities {
    credentials: Arc<dyn CredentialProvider>,
    object_store: Arc<dyn ObjectStore>,
    databases: HashMap<String, Arc<dyn DatabaseService>>,
    datasets: HashMap<String, Arc<dyn DatasetService>>,
    queues: HashMap<String, Arc<dyn QueueService>>,
    tools: Option<Arc<dyn ToolInvoker>>,
}

impl Capabilities {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            credentials,
            object_store,
            databases: HashMap::new(),
            datasets: HashMap::new(),
            queues: HashMap::new(),
            tools: None,
        }
    }

    pub fn with_database(mut self, handle: impl Into<String>, db: Arc<dyn DatabaseService>) -> Self {
        self.databases.insert(handle.into(), db);
        self
    }

    pub fn with_dataset(mut self, id: impl Into<String>, dataset: Arc<dyn DatasetService>) -> Self {
        self.datasets.insert(id.into(), dataset);
        self
    }

    pub fn with_queue(mut self, id: impl Into<String>, queue: Arc<dyn QueueService>) -> Self {
        self.queues.insert(id.into(), queue);
        self
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolInvoker>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub async fn get_secret(&self, name: &str) -> Option<String> {
        self.credentials.secret(name).await
    }

    pub async fn get_integration(&self, name: &str) -> Option<Integration> {
        self.credentials.integration(name).await
    }

    pub fn get_database(&self, handle: &str) -> Result<Arc<dyn DatabaseService>, ServiceError> {
        self.databases
            .get(handle)
            .cloned()
            .ok_or_else(|| ServiceError::CapabilityUnavailable(format!("database '{handle}'")))
    }

    pub fn get_dataset(&self, id: &str) -> Result<Arc<dyn DatasetService>, ServiceError> {
        self.datasets
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::CapabilityUnavailable(format!("dataset '{id}'")))
    }

    pub fn get_queue(&self, id: &str) -> Result<Arc<dyn QueueService>, ServiceError> {
        self.queues
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::CapabilityUnavailable(format!("queue '{id}'")))
    }

    pub async fn call_tool(
        &self,
        name: &str,
        args: BTreeMap<String, Value>,
    ) -> Result<Value, ServiceError> {
        match &self.tools {
            Some(tools) => tools.call_tool(name, args).await,
            None => Err(ServiceError::CapabilityUnavailable("tool calls".to_string())),
        }
    }

    pub fn object_store(&self) -> &Arc<dyn ObjectStore> {
        &self.object_store
    }
}

/// Per-invocation context handed to a node's `execute`.
pub struct NodeContext {
    pub node_id: String,
    pub workflow_id: String,
    pub execution_id: String,
    pub organization_id: String,
    pub deployment_id: Option<String>,
    /// Transformed inputs, keyed by port name.
    pub inputs: BTreeMap<String, Value>,
    /// The trigger data that started this execution.
    pub trigger: TriggerPayload,
    pub capabilities: Capabilities,
    /// Observed by long-running nodes at their own suspension points.
    pub cancellation: CancellationToken,
    /// Environment bag for node-specific settings.
    pub env: BTreeMap<String, String>,
}

impl NodeContext {
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name)
    }

    pub fn number_input(&self, name: &str) -> Option<f64> {
        self.input(name).and_then(Value::as_number)
    }

    pub fn bool_input(&self, name: &str) -> Option<bool> {
        self.input(name).and_then(Value::as_bool)
    }

    pub fn string_input(&self, name: &str) -> Option<&str> {
        self.input(name).and_then(Value::as_str)
    }
}

/// What a node's `execute` produces.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    Completed {
        outputs: BTreeMap<String, Value>,
        usage: Option<u64>,
    },
    Error {
        error: String,
        usage: Option<u64>,
    },
}

impl NodeOutcome {
    pub fn completed(outputs: BTreeMap<String, Value>) -> Self {
        NodeOutcome::Completed {
            outputs,
            usage: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        NodeOutcome::Error {
            error: message.into(),
            usage: None,
        }
    }
}

/// An executable instance of a node.
#[async_trait]
pub trait Executable: Send + Sync {
    async fn execute(&self, ctx: NodeContext) -> NodeOutcome;
}

/// Everything the engine knows about a node type without running it.
#[derive(Debug, Clone)]
pub struct NodeTypeDescriptor {
    pub type_id: String,
    pub label: String,
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
    /// Default resource cost, used for the credit pre-flight estimate and
    /// as the fallback when a node reports no usage of its own.
    pub usage: u64,
    /// Subscription-only types require an entitled plan.
    pub subscription: bool,
}

impl NodeTypeDescriptor {
    pub fn new(type_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            label: label.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            usage: 1,
            subscription: false,
        }
    }

    pub fn with_input(mut self, port: InputPort) -> Self {
        self.inputs.push(port);
        self
    }

    pub fn with_output(mut self, port: OutputPort) -> Self {
        self.outputs.push(port);
        self
    }

    pub fn with_usage(mut self, usage: u64) -> Self {
        self.usage = usage;
        self
    }

    pub fn subscription_only(mut self) -> Self {
        self.subscription = true;
        self
    }
}

/// A registry of node types.
pub trait NodeCatalog: Send + Sync {
    /// Look up a type's descriptor.
    fn lookup_type(&self, type_id: &str) -> Option<&NodeTypeDescriptor>;

    /// Build an executable instance for a workflow node, or `None` when the
    /// catalog cannot produce one.
    fn instantiate(&self, node: &Node) -> Option<Arc<dyn Executable>>;
}

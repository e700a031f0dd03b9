// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Workflow definition structures.
//!
//! A workflow is a user-authored directed graph: typed nodes with declared
//! input and output ports, connected by edges from output ports to input
//! ports. The definition is immutable for the duration of a run; the engine
//! reads it and never writes it.
//!
//! # Example
//! ```yaml
//! id: wf-math
//! name: Linear math
//! handle: linear-math
//! trigger: manual
//! nodes:
//!   - id: five
//!     type: num
//!     inputs:
//!       - name: value
//!         type: number
//!         value: 5
//!     outputs:
//!       - name: value
//!         type: number
//! edges:
//!   - source: five
//!     sourceOutput: value
//!     target: sum
//!     targetInput: a
//! ```

use crate::model::value::Value;
use serde::{Deserialize, Serialize};

/// How an execution of this workflow is initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Manual,
    Http,
    Email,
    Queue,
    Scheduled,
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger::Manual
    }
}

/// Declared type of a port, used by parameter transformation.
///
/// Only `binary` ports participate in object-store transformation; every
/// other type passes values through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    Any,
    String,
    Number,
    Boolean,
    Object,
    Array,
    Binary,
}

impl Default for PortType {
    fn default() -> Self {
        PortType::Any
    }
}

/// An input port declaration on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputPort {
    pub name: String,
    #[serde(rename = "type", default)]
    pub port_type: PortType,
    /// Whether the node expects a value on this port to run meaningfully.
    /// The engine never enforces this; the node's implementation decides.
    #[serde(default)]
    pub required: bool,
    /// Static default, overridden by gathered upstream values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// A repeated port accepts a sequence; multiple fan-in edges are
    /// preserved as an ordered list instead of collapsing to one value.
    #[serde(default)]
    pub repeated: bool,
    /// Hidden ports exist for editor bookkeeping and take no special role
    /// in execution.
    #[serde(default)]
    pub hidden: bool,
}

impl InputPort {
    /// A bare port with the given name and type, no default, not repeated.
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type,
            required: false,
            value: None,
            repeated: false,
            hidden: false,
        }
    }

    /// Attach a static default value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Mark the port as repeated.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// An output port declaration on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputPort {
    pub name: String,
    #[serde(rename = "type", default)]
    pub port_type: PortType,
    /// A repeated output publishes a list whose items are spliced
    /// individually when gathered into a downstream repeated port.
    #[serde(default)]
    pub repeated: bool,
}

impl OutputPort {
    pub fn new(name: impl Into<String>, port_type: PortType) -> Self {
        Self {
            name: name.into(),
            port_type,
            repeated: false,
        }
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// A typed unit of work in the workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique within the workflow.
    pub id: String,
    /// Node type id resolved through the node catalog.
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub inputs: Vec<InputPort>,
    #[serde(default)]
    pub outputs: Vec<OutputPort>,
}

impl Node {
    /// Find a declared input port by name.
    pub fn input(&self, name: &str) -> Option<&InputPort> {
        self.inputs.iter().find(|port| port.name == name)
    }

    /// Find a declared output port by name.
    pub fn output(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|port| port.name == name)
    }
}

/// A directed connection from one node's output port to another node's
/// input port.
///
/// Neither endpoint pair is required to be unique: one output may feed many
/// inputs, and one input may receive many edges (fan-in). Edge declaration
/// order is load-bearing for fan-in resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub source_output: String,
    pub target: String,
    pub target_input: String,
}

/// A complete workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub handle: String,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Workflow {
    /// Find a node by id.
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    /// All edges arriving at the given node, in declaration order.
    pub fn incoming_edges<'a, 'b>(&'a self, node_id: &'b str) -> impl Iterator<Item = &'a Edge> + 'b
    where
        'a: 'b,
    {
        self.edges.iter().filter(move |edge| edge.target == node_id)
    }

    /// All edges leaving the given node, in declaration order.
    pub fn outgoing_edges<'a, 'b>(&'a self, node_id: &'b str) -> impl Iterator<Item = &'a Edge> + 'b
    where
        'a: 'b,
    {
        self.edges.iter().filter(move |edge| edge.source == node_id)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The built-in node catalog.
//!
//! A small set of arithmetic and branching node types, enough to author
//! meaningful workflows without an external catalog. Real deployments are
//! expected to bring their own [`NodeCatalog`] implementation; the engine
//! never assumes this one.

mod logic;
mod math;

use crate::catalog::{Executable, NodeCatalog, NodeTypeDescriptor};
use crate::model::{InputPort, Node, OutputPort, PortType};
use std::collections::HashMap;
use std::sync::Arc;

pub use logic::{Fork, Join};
pub use math::{BinaryMath, MathOp, NumberSource};

/// Catalog of the built-in node types.
pub struct BuiltinCatalog {
    descriptors: HashMap<String, NodeTypeDescriptor>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        let mut descriptors = HashMap::new();

        descriptors.insert(
            "num".to_string(),
            NodeTypeDescriptor::new("num", "Number")
                .with_input(InputPort::new("value", PortType::Number))
                .with_output(OutputPort::new("value", PortType::Number)),
        );

        for op in [MathOp::Add, MathOp::Sub, MathOp::Mul, MathOp::Div] {
            let type_id = op.type_id();
            descriptors.insert(
                type_id.to_string(),
                NodeTypeDescriptor::new(type_id, type_id.to_uppercase())
                    .with_input(InputPort::new("a", PortType::Number))
                    .with_input(InputPort::new("b", PortType::Number))
                    .with_output(OutputPort::new("result", PortType::Number)),
            );
        }

        descriptors.insert(
            "fork".to_string(),
            NodeTypeDescriptor::new("fork", "Conditional fork")
                .with_input(InputPort::new("condition", PortType::Boolean))
                .with_input(InputPort::new("value", PortType::Any))
                .with_output(OutputPort::new("true", PortType::Any))
                .with_output(OutputPort::new("false", PortType::Any)),
        );

        descriptors.insert(
            "join".to_string(),
            NodeTypeDescriptor::new("join", "Join")
                .with_input(InputPort::new("a", PortType::Any))
                .with_input(InputPort::new("b", PortType::Any))
                .with_output(OutputPort::new("value", PortType::Any)),
        );

        Self { descriptors }
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeCatalog for BuiltinCatalog {
    fn lookup_type(&self, type_id: &str) -> Option<&NodeTypeDescriptor> {
        self.descriptors.get(type_id)
    }

    fn instantiate(&self, node: &Node) -> Option<Arc<dyn Executable>> {
        match node.node_type.as_str() {
            "num" => Some(Arc::new(NumberSource)),
            "add" => Some(Arc::new(BinaryMath::new(MathOp::Add))),
            "sub" => Some(Arc::new(BinaryMath::new(MathOp::Sub))),
            "mul" => Some(Arc::new(BinaryMath::new(MathOp::Mul))),
            "div" => Some(Arc::new(BinaryMath::new(MathOp::Div))),
            "fork" => Some(Arc::new(Fork)),
            "join" => Some(Arc::new(Join)),
            _ => None,
        }
    }
}

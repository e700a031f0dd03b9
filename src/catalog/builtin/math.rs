// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Arithmetic nodes.
//!
//! `num` publishes its configured value; the binary operators read `a` and
//! `b` and publish `result`. Missing or non-numeric inputs are node errors,
//! as is division by zero. None of these nodes consult capabilities, which
//! makes them the workhorses of engine tests and demos.

use crate::catalog::{Executable, NodeContext, NodeOutcome};
use crate::model::Value;
use async_trait::async_trait;
use std::collections::BTreeMap;

fn publish(name: &str, value: f64) -> NodeOutcome {
    let mut outputs = BTreeMap::new();
    outputs.insert(name.to_string(), Value::Number(value));
    NodeOutcome::completed(outputs)
}

/// `num`: publish the `value` input unchanged.
pub struct NumberSource;

#[async_trait]
impl Executable for NumberSource {
    async fn execute(&self, ctx: NodeContext) -> NodeOutcome {
        match ctx.number_input("value") {
            Some(value) => publish("value", value),
            None => NodeOutcome::error("num: input 'value' is missing or not a number"),
        }
    }
}

/// Which arithmetic operation a [`BinaryMath`] node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl MathOp {
    pub fn type_id(self) -> &'static str {
        match self {
            MathOp::Add => "add",
            MathOp::Sub => "sub",
            MathOp::Mul => "mul",
            MathOp::Div => "div",
        }
    }
}

/// The four binary operators, sharing one implementation.
pub struct BinaryMath {
    op: MathOp,
}

impl BinaryMath {
    pub fn new(op: MathOp) -> Self {
        Self { op }
    }
}

#[async_trait]
impl Executable for BinaryMath {
    async fn execute(&self, ctx: NodeContext) -> NodeOutcome {
        let type_id = self.op.type_id();

        let a = match ctx.number_input("a") {
            Some(a) => a,
            None => {
                return NodeOutcome::error(format!(
                    "{type_id}: input 'a' is missing or not a number"
                ))
            }
        };
        let b = match ctx.number_input("b") {
            Some(b) => b,
            None => {
                return NodeOutcome::error(format!(
                    "{type_id}: input 'b' is missing or not a number"
                ))
            }
        };

        let result = match self.op {
            MathOp::Add => a + b,
            MathOp::Sub => a - b,
            MathOp::Mul => a * b,
            MathOp::Div => {
                if b == 0.0 {
                    return NodeOutcome::error("div: division by zero");
                }
                a / b
            }
        };

        publish("result", result)
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Branching nodes.
//!
//! `fork` publishes its `value` on exactly one of its `true`/`false`
//! outputs; the untaken output is simply absent, which downstream skip
//! analysis reads as "branch not taken". `join` publishes the first of its
//! inputs that is present, letting a diamond re-converge after a fork.

use crate::catalog::{Executable, NodeContext, NodeOutcome};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// `fork`: route `value` to the output named by `condition`.
pub struct Fork;

#[async_trait]
impl Executable for Fork {
    async fn execute(&self, ctx: NodeContext) -> NodeOutcome {
        let condition = match ctx.bool_input("condition") {
            Some(condition) => condition,
            None => {
                return NodeOutcome::error("fork: input 'condition' is missing or not a boolean")
            }
        };
        let value = match ctx.input("value") {
            Some(value) => value.clone(),
            None => return NodeOutcome::error("fork: input 'value' is missing"),
        };

        let taken = if condition { "true" } else { "false" };
        let mut outputs = BTreeMap::new();
        outputs.insert(taken.to_string(), value);
        NodeOutcome::completed(outputs)
    }
}

/// `join`: publish the first present input as `value`.
pub struct Join;

#[async_trait]
impl Executable for Join {
    async fn execute(&self, ctx: NodeContext) -> NodeOutcome {
        let value = ctx.input("a").or_else(|| ctx.input("b"));
        match value {
            Some(value) => {
                let mut outputs = BTreeMap::new();
                outputs.insert("value".to_string(), value.clone());
                NodeOutcome::completed(outputs)
            }
            None => NodeOutcome::error("join: neither input is present"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Capabilities;
    use crate::model::{TriggerPayload, Value};
    use crate::services::{MemoryObjectStore, StaticCredentialProvider};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn context(inputs: &[(&str, Value)]) -> NodeContext {
        NodeContext {
            node_id: "node".to_string(),
            workflow_id: "wf".to_string(),
            execution_id: "exec".to_string(),
            organization_id: "org".to_string(),
            deployment_id: None,
            inputs: inputs
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            trigger: TriggerPayload::Manual,
            capabilities: Capabilities::new(
                Arc::new(StaticCredentialProvider::new()),
                Arc::new(MemoryObjectStore::new()),
            ),
            cancellation: CancellationToken::new(),
            env: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_fork_publishes_only_taken_branch() {
        let outcome = Fork
            .execute(context(&[
                ("condition", Value::Bool(true)),
                ("value", Value::Number(42.0)),
            ]))
            .await;

        match outcome {
            NodeOutcome::Completed { outputs, .. } => {
                assert_eq!(outputs.get("true"), Some(&Value::Number(42.0)));
                assert!(!outputs.contains_key("false"));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fork_false_branch() {
        let outcome = Fork
            .execute(context(&[
                ("condition", Value::Bool(false)),
                ("value", Value::String("left".to_string())),
            ]))
            .await;

        match outcome {
            NodeOutcome::Completed { outputs, .. } => {
                assert!(outputs.contains_key("false"));
                assert!(!outputs.contains_key("true"));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_join_prefers_a_then_b() {
        let outcome = Join
            .execute(context(&[("b", Value::Number(2.0))]))
            .await;
        match outcome {
            NodeOutcome::Completed { outputs, .. } => {
                assert_eq!(outputs.get("value"), Some(&Value::Number(2.0)));
            }
            other => panic!("expected completion, got {other:?}"),
        }

        let outcome = Join
            .execute(context(&[
                ("a", Value::Number(1.0)),
                ("b", Value::Number(2.0)),
            ]))
            .await;
        match outcome {
            NodeOutcome::Completed { outputs, .. } => {
                assert_eq!(outputs.get("value"), Some(&Value::Number(1.0)));
            }
            other => panic!("expected completion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_join_with_no_inputs_errors() {
        let outcome = Join.execute(context(&[])).await;
        assert!(matches!(outcome, NodeOutcome::Error { .. }));
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Level-by-level scheduling with durable-step wrapping.
//!
//! The scheduler walks the planner's levels in order. Within a level every
//! node runs concurrently (bounded by a semaphore); across levels execution
//! is strictly sequential. Each node runs under a durable step named
//! `run node {id}`, whose thunk re-evaluates skip analysis against the
//! state snapshot taken at the level boundary and either records a skip or
//! invokes the node. Because the thunk is a pure function of the immutable
//! context plus that snapshot, a re-run on a journal miss is safe, and a
//! replayed execution short-circuits to the journal's memoized results.
//!
//! Results are applied to the state sequentially in the level's declared
//! order after all of the level's tasks have finished. Nodes in level N+1
//! therefore observe all results of levels 0..N and none of their own
//! level's. After each level the workflow status is recomputed and a
//! monitoring snapshot is emitted, best-effort.
//!
//! On cancellation: nodes that have not started do not start, in-flight
//! nodes observe the token through their context, and no further level
//! begins.

use crate::engine::context::ExecutionContext;
use crate::engine::durable::DurableSteps;
use crate::engine::invoker::NodeInvoker;
use crate::engine::record::{ExecutionRecord, NodeExecutionResult};
use crate::engine::skip::{assess_node, Readiness};
use crate::engine::state::{workflow_status, ExecutionState};
use crate::errors::ExecutionError;
use crate::model::TriggerPayload;
use crate::observability::messages::engine::{LevelCompleted, MonitorUpdateDropped};
use crate::observability::messages::node::{NodeCompleted, NodeFailed, NodeSkipped};
use crate::observability::messages::StructuredLog;
use crate::services::MonitoringService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Default intra-level concurrency: the number of CPU cores, falling back
/// to 4 if detection fails.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Drives one execution's levels to completion.
pub struct LevelScheduler {
    /// Maximum number of concurrent node executions within a level
    max_concurrency: usize,
}

impl LevelScheduler {
    /// Create a scheduler with the specified concurrency limit.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Create a scheduler with the default concurrency.
    pub fn with_default_concurrency() -> Self {
        Self::new(default_concurrency())
    }

    /// Run every level of the plan, applying results to `state` and
    /// `record` and emitting one monitoring snapshot per level.
    #[allow(clippy::too_many_arguments)]
    pub async fn run(
        &self,
        context: &Arc<ExecutionContext>,
        state: &mut ExecutionState,
        record: &mut ExecutionRecord,
        invoker: &Arc<NodeInvoker>,
        durable: &DurableSteps,
        monitor: &Arc<dyn MonitoringService>,
        trigger: &TriggerPayload,
        session_id: Option<&str>,
        cancellation: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        for (level_index, level) in context.levels().iter().enumerate() {
            if cancellation.is_cancelled() {
                return Err(ExecutionError::Cancelled);
            }

            for node_id in level {
                record.mark_executing(node_id);
            }

            // Every thunk in this level reads the same snapshot; results
            // only become visible at the level boundary below.
            let snapshot = Arc::new(state.clone());
            let semaphore = Arc::new(tokio::sync::Semaphore::new(self.max_concurrency));
            let mut tasks = Vec::with_capacity(level.len());

            for node_id in level {
                let node_id = node_id.clone();
                let context = context.clone();
                let snapshot = snapshot.clone();
                let invoker = invoker.clone();
                let durable = durable.clone();
                let trigger = trigger.clone();
                let cancellation = cancellation.clone();
                let semaphore = semaphore.clone();

                let task = tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|error| {
                        ExecutionError::Internal {
                            message: format!(
                                "Failed to acquire semaphore permit for node '{}': {}",
                                node_id, error
                            ),
                        }
                    })?;

                    // Not yet started when the signal arrived: stay unstarted
                    if cancellation.is_cancelled() {
                        return Ok(None);
                    }

                    let step_name = format!("run node {}", node_id);
                    let context_ref = &context;
                    let snapshot_ref = &snapshot;
                    let invoker_ref = &invoker;
                    let trigger_ref = &trigger;
                    let node_ref = node_id.as_str();
                    let token = cancellation.clone();
                    let result = durable
                        .run(&step_name, || async move {
                            match assess_node(&context_ref.workflow, snapshot_ref, node_ref) {
                                Readiness::Decided => Err(ExecutionError::Internal {
                                    message: format!(
                                        "node '{}' was already decided before its level ran",
                                        node_ref
                                    ),
                                }),
                                Readiness::Skip { reason, blocked_by } => {
                                    Ok(NodeExecutionResult::skipped(reason, blocked_by))
                                }
                                Readiness::Ready => Ok(invoker_ref
                                    .invoke(
                                        context_ref,
                                        &snapshot_ref.node_outputs,
                                        node_ref,
                                        trigger_ref,
                                        token,
                                    )
                                    .await),
                            }
                        })
                        .await?;

                    Ok(Some((node_id, result)))
                });

                tasks.push(task);
            }

            // Await in declared order; this is also the application order
            let mut outcomes = Vec::with_capacity(tasks.len());
            for task in tasks {
                match task.await {
                    Ok(Ok(Some(outcome))) => outcomes.push(outcome),
                    Ok(Ok(None)) => continue,
                    Ok(Err(error)) => return Err(error),
                    Err(join_error) => {
                        return Err(ExecutionError::Internal {
                            message: format!("Task join error: {}", join_error),
                        })
                    }
                }
            }

            for (node_id, result) in &outcomes {
                state.apply(node_id, result);
                record.apply_result(node_id, result);

                match result {
                    NodeExecutionResult::Completed { usage, .. } => NodeCompleted {
                        execution_id: &context.execution_id,
                        node_id,
                        usage: *usage,
                    }
                    .log(),
                    NodeExecutionResult::Error { error, .. } => NodeFailed {
                        execution_id: &context.execution_id,
                        node_id,
                        error,
                    }
                    .log(),
                    NodeExecutionResult::Skipped { skip_reason, .. } => NodeSkipped {
                        execution_id: &context.execution_id,
                        node_id,
                        reason: &format!("{skip_reason:?}"),
                    }
                    .log(),
                }
            }

            debug_assert_eq!(state.check_invariants(&context.workflow), Ok(()));

            record.set_status(workflow_status(context, state));
            if let Err(error) = monitor.send_update(session_id, record).await {
                MonitorUpdateDropped {
                    execution_id: &context.execution_id,
                    reason: &error.to_string(),
                }
                .log();
            }

            LevelCompleted {
                execution_id: &context.execution_id,
                level_index,
                node_count: level.len(),
            }
            .log();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BuiltinCatalog, Capabilities};
    use crate::engine::durable::MemoryStepJournal;
    use crate::engine::record::SkipReason;
    use crate::model::{
        Edge, InputPort, Node, OutputPort, PortType, Trigger, Value, Workflow,
    };
    use crate::planner::compute_levels;
    use crate::services::{MemoryObjectStore, NullMonitor, StaticCredentialProvider};
    use std::collections::BTreeMap;

    fn num_node(id: &str, value: f64) -> Node {
        Node {
            id: id.to_string(),
            node_type: "num".to_string(),
            inputs: vec![InputPort::new("value", PortType::Number).with_value(Value::Number(value))],
            outputs: vec![OutputPort::new("value", PortType::Number)],
        }
    }

    fn math_node(id: &str, node_type: &str, b: Option<f64>) -> Node {
        let mut b_port = InputPort::new("b", PortType::Number);
        if let Some(b) = b {
            b_port = b_port.with_value(Value::Number(b));
        }
        Node {
            id: id.to_string(),
            node_type: node_type.to_string(),
            inputs: vec![InputPort::new("a", PortType::Number), b_port],
            outputs: vec![OutputPort::new("result", PortType::Number)],
        }
    }

    fn edge(source: &str, output: &str, target: &str, input: &str) -> Edge {
        Edge {
            source: source.to_string(),
            source_output: output.to_string(),
            target: target.to_string(),
            target_input: input.to_string(),
        }
    }

    struct Harness {
        context: Arc<ExecutionContext>,
        state: ExecutionState,
        record: ExecutionRecord,
        invoker: Arc<NodeInvoker>,
        journal: Arc<MemoryStepJournal>,
        monitor: Arc<dyn MonitoringService>,
    }

    fn harness(workflow: Workflow) -> Harness {
        let plan = compute_levels(&workflow).unwrap();
        let context = Arc::new(ExecutionContext::new(
            Arc::new(workflow),
            &plan,
            "org-1".to_string(),
            "exec-1".to_string(),
            None,
        ));
        let mut record = ExecutionRecord::new(
            "exec-1".to_string(),
            context.workflow_id.clone(),
            None,
            "user-1".to_string(),
            "org-1".to_string(),
            chrono::Utc::now(),
        );
        record.seed_idle(context.ordered_node_ids());

        let capabilities = Capabilities::new(
            Arc::new(StaticCredentialProvider::new()),
            Arc::new(MemoryObjectStore::new()),
        );
        let invoker = Arc::new(NodeInvoker::new(
            Arc::new(BuiltinCatalog::new()),
            capabilities,
            true,
            BTreeMap::new(),
        ));

        Harness {
            context,
            state: ExecutionState::new(),
            record,
            invoker,
            journal: Arc::new(MemoryStepJournal::new()),
            monitor: Arc::new(NullMonitor::new()),
        }
    }

    async fn run(harness: &mut Harness) -> Result<(), ExecutionError> {
        run_cancellable(harness, &CancellationToken::new()).await
    }

    async fn run_cancellable(
        harness: &mut Harness,
        cancellation: &CancellationToken,
    ) -> Result<(), ExecutionError> {
        let scheduler = LevelScheduler::new(4);
        let durable = DurableSteps::new(harness.journal.clone(), "exec-1".to_string());
        scheduler
            .run(
                &harness.context,
                &mut harness.state,
                &mut harness.record,
                &harness.invoker,
                &durable,
                &harness.monitor,
                &TriggerPayload::Manual,
                None,
                cancellation,
            )
            .await
    }

    #[tokio::test]
    async fn test_linear_chain_runs_in_level_order() {
        let workflow = Workflow {
            id: "wf".to_string(),
            name: "wf".to_string(),
            handle: "wf".to_string(),
            trigger: Trigger::Manual,
            nodes: vec![
                num_node("five", 5.0),
                math_node("sum", "add", Some(3.0)),
            ],
            edges: vec![edge("five", "value", "sum", "a")],
        };

        let mut harness = harness(workflow);
        run(&mut harness).await.unwrap();

        assert_eq!(
            harness.state.output("sum", "result"),
            Some(&Value::Number(8.0))
        );
        assert!(harness.state.errors.is_empty());
    }

    #[tokio::test]
    async fn test_failure_cascades_as_skip_across_levels() {
        let workflow = Workflow {
            id: "wf".to_string(),
            name: "wf".to_string(),
            handle: "wf".to_string(),
            trigger: Trigger::Manual,
            nodes: vec![
                num_node("ten", 10.0),
                num_node("zero", 0.0),
                math_node("quot", "div", None),
                math_node("after", "add", Some(5.0)),
            ],
            edges: vec![
                edge("ten", "value", "quot", "a"),
                edge("zero", "value", "quot", "b"),
                edge("quot", "result", "after", "a"),
            ],
        };

        let mut harness = harness(workflow);
        run(&mut harness).await.unwrap();

        assert!(harness.state.errors.contains_key("quot"));
        assert!(harness.state.skipped.contains("after"));
        match harness.record.entry("after") {
            Some(crate::engine::record::NodeExecutionSummary::Skipped {
                skip_reason,
                blocked_by,
                ..
            }) => {
                assert_eq!(*skip_reason, SkipReason::UpstreamFailure);
                assert_eq!(blocked_by, &vec!["quot".to_string()]);
            }
            other => panic!("expected skipped entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_replay_reuses_journaled_results() {
        let workflow = Workflow {
            id: "wf".to_string(),
            name: "wf".to_string(),
            handle: "wf".to_string(),
            trigger: Trigger::Manual,
            nodes: vec![num_node("five", 5.0)],
            edges: vec![],
        };

        let mut first = harness(workflow.clone());
        run(&mut first).await.unwrap();
        assert_eq!(first.journal.len().await, 1);

        // Second run shares the journal and execution id: the node's step
        // is replayed from the journal, not re-invoked
        let mut second = harness(workflow);
        second.journal = first.journal.clone();
        run(&mut second).await.unwrap();

        assert_eq!(second.journal.len().await, 1);
        assert_eq!(
            second.state.output("five", "value"),
            Some(&Value::Number(5.0))
        );
    }

    #[tokio::test]
    async fn test_pre_cancelled_run_starts_nothing() {
        let workflow = Workflow {
            id: "wf".to_string(),
            name: "wf".to_string(),
            handle: "wf".to_string(),
            trigger: Trigger::Manual,
            nodes: vec![num_node("five", 5.0)],
            edges: vec![],
        };

        let mut harness = harness(workflow);
        let cancellation = CancellationToken::new();
        cancellation.cancel();

        let result = run_cancellable(&mut harness, &cancellation).await;
        assert_eq!(result, Err(ExecutionError::Cancelled));
        assert!(!harness.state.is_decided("five"));
        assert_eq!(harness.journal.len().await, 0);
    }
}

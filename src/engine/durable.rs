// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The durable-step primitive.
//!
//! A durable step memoizes the result of a named unit of work keyed by
//! `(execution id, step name)`. On first invocation the thunk runs and its
//! JSON-serialized result is persisted to the step journal; on replay the
//! persisted result is returned and the thunk never runs. This is what lets
//! a restarted execution short-circuit already-completed nodes.
//!
//! Thunk results must be JSON-serializable, and thunks must tolerate being
//! re-run when the platform has no cached result. The engine satisfies this
//! by making each thunk a pure function of the immutable context plus a
//! state snapshot taken at its level boundary.
//!
//! Errors raised by a thunk propagate to the caller and are never cached.
//! The substrate behind [`StepJournal`] may retry a failed step for
//! transient errors; it must consult
//! [`ExecutionError::is_retryable`](crate::errors::ExecutionError::is_retryable)
//! and leave non-retryable failures alone. Mutual exclusion of concurrent
//! invocations of the same step name within one execution is the
//! substrate's responsibility.

use crate::errors::ExecutionError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Persistence behind the durable-step primitive.
#[async_trait]
pub trait StepJournal: Send + Sync {
    /// Load a previously persisted step result.
    async fn load(&self, execution_id: &str, step: &str) -> Option<serde_json::Value>;

    /// Persist a step result.
    async fn store(&self, execution_id: &str, step: &str, result: serde_json::Value);
}

/// An in-memory step journal.
///
/// Stands in for the platform's persistent substrate in tests and demos.
/// Sharing one instance across two runs with the same execution id is how
/// replay is exercised.
#[derive(Default)]
pub struct MemoryStepJournal {
    entries: Mutex<HashMap<(String, String), serde_json::Value>>,
}

impl MemoryStepJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted step results, across all executions.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl StepJournal for MemoryStepJournal {
    async fn load(&self, execution_id: &str, step: &str) -> Option<serde_json::Value> {
        self.entries
            .lock()
            .await
            .get(&(execution_id.to_string(), step.to_string()))
            .cloned()
    }

    async fn store(&self, execution_id: &str, step: &str, result: serde_json::Value) {
        self.entries
            .lock()
            .await
            .insert((execution_id.to_string(), step.to_string()), result);
    }
}

/// The step runner bound to one execution.
#[derive(Clone)]
pub struct DurableSteps {
    journal: Arc<dyn StepJournal>,
    execution_id: String,
}

impl DurableSteps {
    pub fn new(journal: Arc<dyn StepJournal>, execution_id: String) -> Self {
        Self {
            journal,
            execution_id,
        }
    }

    /// Run `thunk` under the named step, or return its memoized result.
    pub async fn run<T, F, Fut>(&self, name: &str, thunk: F) -> Result<T, ExecutionError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ExecutionError>>,
    {
        if let Some(cached) = self.journal.load(&self.execution_id, name).await {
            return serde_json::from_value(cached).map_err(|error| ExecutionError::StepResult {
                step: name.to_string(),
                reason: error.to_string(),
            });
        }

        let result = thunk().await?;

        let json = serde_json::to_value(&result).map_err(|error| ExecutionError::StepResult {
            step: name.to_string(),
            reason: error.to_string(),
        })?;
        self.journal.store(&self.execution_id, name, json).await;

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_first_invocation_runs_and_persists() {
        let journal = Arc::new(MemoryStepJournal::new());
        let steps = DurableSteps::new(journal.clone(), "exec-1".to_string());

        let value: u64 = steps.run("compute", || async { Ok(41 + 1) }).await.unwrap();
        assert_eq!(value, 42);
        assert_eq!(journal.len().await, 1);
    }

    #[tokio::test]
    async fn test_replay_short_circuits_the_thunk() {
        let journal = Arc::new(MemoryStepJournal::new());
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let steps = DurableSteps::new(journal.clone(), "exec-1".to_string());
            let runs = runs.clone();
            let value: u64 = steps
                .run("compute", || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_executions_do_not_share_results() {
        let journal = Arc::new(MemoryStepJournal::new());

        let first = DurableSteps::new(journal.clone(), "exec-1".to_string());
        let second = DurableSteps::new(journal.clone(), "exec-2".to_string());

        let a: u64 = first.run("compute", || async { Ok(1) }).await.unwrap();
        let b: u64 = second.run("compute", || async { Ok(2) }).await.unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(journal.len().await, 2);
    }

    #[tokio::test]
    async fn test_errors_propagate_and_are_not_cached() {
        let journal = Arc::new(MemoryStepJournal::new());
        let steps = DurableSteps::new(journal.clone(), "exec-1".to_string());

        let result: Result<u64, _> = steps
            .run("failing", || async {
                Err(ExecutionError::Internal {
                    message: "transient".to_string(),
                })
            })
            .await;
        assert!(result.is_err());
        assert_eq!(journal.len().await, 0);

        // A later attempt runs the thunk again
        let value: u64 = steps.run("failing", || async { Ok(9) }).await.unwrap();
        assert_eq!(value, 9);
    }

    #[tokio::test]
    async fn test_shape_mismatch_reported_as_step_result_error() {
        let journal = Arc::new(MemoryStepJournal::new());
        journal
            .store("exec-1", "compute", serde_json::json!("not a number"))
            .await;

        let steps = DurableSteps::new(journal, "exec-1".to_string());
        let result: Result<u64, _> = steps.run("compute", || async { Ok(1) }).await;

        match result {
            Err(ExecutionError::StepResult { step, .. }) => assert_eq!(step, "compute"),
            other => panic!("expected StepResult error, got {other:?}"),
        }
    }
}

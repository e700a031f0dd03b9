// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Persistence of final execution records.

use crate::engine::ExecutionRecord;
use crate::services::ServiceError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// The relational store behind execution records.
///
/// The driver persists each record exactly once, under a durable step; a
/// failed save propagates to the caller.
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Persist a record, returning the stored form.
    async fn save(&self, record: ExecutionRecord) -> Result<ExecutionRecord, ServiceError>;
}

/// An in-memory execution store.
#[derive(Default)]
pub struct MemoryExecutionStore {
    records: Mutex<HashMap<String, ExecutionRecord>>,
    save_count: AtomicUsize,
}

impl MemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a stored record by execution id.
    pub async fn get(&self, execution_id: &str) -> Option<ExecutionRecord> {
        self.records.lock().await.get(execution_id).cloned()
    }

    /// How many times `save` has been called. Exactly-once persistence
    /// tests read this.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn save(&self, record: ExecutionRecord) -> Result<ExecutionRecord, ServiceError> {
        self.save_count.fetch_add(1, Ordering::SeqCst);
        self.records
            .lock()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(record)
    }
}

/// An execution store that always fails, for driver error-path tests.
#[derive(Default)]
pub struct FailingExecutionStore;

#[async_trait]
impl ExecutionStore for FailingExecutionStore {
    async fn save(&self, _record: ExecutionRecord) -> Result<ExecutionRecord, ServiceError> {
        Err(ServiceError::Store("save rejected".to_string()))
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Real-time monitoring updates.
//!
//! The driver emits updates in a fixed order: one initial update, one after
//! each level, one final update. The channel is best-effort: a failed send
//! is logged and swallowed, never affecting the execution outcome.

use crate::engine::ExecutionRecord;
use crate::services::ServiceError;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Delivery of execution snapshots to a real-time session.
#[async_trait]
pub trait MonitoringService: Send + Sync {
    /// Send one snapshot, optionally scoped to a session.
    async fn send_update(
        &self,
        session_id: Option<&str>,
        record: &ExecutionRecord,
    ) -> Result<(), ServiceError>;
}

/// Discards every update.
#[derive(Default)]
pub struct NullMonitor;

impl NullMonitor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MonitoringService for NullMonitor {
    async fn send_update(
        &self,
        _session_id: Option<&str>,
        _record: &ExecutionRecord,
    ) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// Fans updates out over a tokio broadcast channel.
///
/// Subscribers that lag are dropped by the channel, which matches the
/// best-effort contract; a send with no subscribers at all is not an error.
pub struct BroadcastMonitor {
    sender: broadcast::Sender<ExecutionRecord>,
}

impl BroadcastMonitor {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to the update stream.
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionRecord> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl MonitoringService for BroadcastMonitor {
    async fn send_update(
        &self,
        _session_id: Option<&str>,
        record: &ExecutionRecord,
    ) -> Result<(), ServiceError> {
        // A send error only means nobody is listening right now
        let _ = self.sender.send(record.clone());
        Ok(())
    }
}

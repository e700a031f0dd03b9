// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! External collaborators of the execution core.
//!
//! The engine depends on these capabilities through trait objects passed in
//! by the caller; nothing here is a process singleton. Each trait has an
//! in-memory adapter used by tests and the demo runner. All implementations
//! are expected to be internally thread-safe.

mod capabilities;
mod credentials;
mod credits;
mod monitoring;
mod object_store;
mod store;

pub use capabilities::{DatabaseService, DatasetService, QueueService, ToolInvoker};
pub use credentials::{CredentialProvider, Integration, StaticCredentialProvider};
pub use credits::{CreditService, LedgerCreditService};
pub use monitoring::{BroadcastMonitor, MonitoringService, NullMonitor};
pub use object_store::{MemoryObjectStore, ObjectStore, StoredObject};
pub use store::{ExecutionStore, FailingExecutionStore, MemoryExecutionStore};

use thiserror::Error;

/// Errors raised by service implementations.
///
/// Observed inside a node invocation these become node-local errors;
/// observed in the driver's own steps they end the execution with status
/// `error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The referenced object does not exist in the object store.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The object store rejected a read or write.
    #[error("Object store error: {0}")]
    ObjectStore(String),

    /// The execution store failed to persist a record.
    #[error("Execution store error: {0}")]
    Store(String),

    /// The monitoring channel failed to deliver an update.
    #[error("Monitoring error: {0}")]
    Monitoring(String),

    /// The credential provider failed to initialize or resolve.
    #[error("Credential error: {0}")]
    Credential(String),

    /// A capability handle was requested that this execution does not have.
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),
}

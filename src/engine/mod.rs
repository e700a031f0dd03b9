// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod collector;
pub mod context;
pub mod driver;
pub mod durable;
pub mod invoker;
pub mod record;
pub mod scheduler;
pub mod skip;
pub mod state;

pub use context::ExecutionContext;
pub use driver::{
    BillingPlan, EngineEnvironment, EngineOptions, ExecutionDriver, ExecutionRequest,
};
pub use durable::{DurableSteps, MemoryStepJournal, StepJournal};
pub use invoker::NodeInvoker;
pub use record::{
    ExecutionRecord, ExecutionStatus, NodeExecutionResult, NodeExecutionSummary, SkipReason,
};
pub use scheduler::LevelScheduler;
pub use state::{workflow_status, ExecutionState};

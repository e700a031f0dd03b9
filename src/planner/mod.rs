// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod levels;
mod validation;

pub use levels::{compute_levels, ExecutionPlan};
pub use validation::validate_workflow;

use crate::errors::ExecutionError;
use crate::model::Workflow;

/// Validate a workflow and partition it into execution levels.
///
/// This is the planner's single entry point: structural validation first,
/// then level computation. Both failure modes are non-retryable.
pub fn plan(workflow: &Workflow) -> Result<ExecutionPlan, ExecutionError> {
    validate_workflow(workflow)
        .map_err(|errors| ExecutionError::InvalidWorkflow { errors })?;

    compute_levels(workflow).map_err(|error| ExecutionError::InvalidWorkflow {
        errors: vec![error],
    })
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::ValidationError;
use std::fmt;

/// Errors surfaced by the execution driver and its collaborators.
///
/// Node-local failures are never represented here; they are confined to the
/// node's entry in the execution state and record. This enum covers the
/// structural and platform-level failures that end or interrupt an execution.
///
/// The durable-step substrate may retry a failed step for transient errors.
/// [`ExecutionError::is_retryable`] is the marker it consults: structural
/// failures (invalid workflow, exhausted credits) must never be retried.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionError {
    /// The workflow failed structural validation. Non-retryable.
    InvalidWorkflow {
        /// All validation errors found
        errors: Vec<ValidationError>,
    },
    /// The organization's credit balance cannot cover the estimated usage.
    /// Non-retryable.
    CreditsExhausted {
        /// Estimated usage for the whole workflow
        estimated: u64,
        /// Credits available to the organization
        available: u64,
    },
    /// A durable step produced a value that could not be serialized or
    /// replayed back into its expected shape.
    StepResult {
        /// The durable step name
        step: String,
        /// Serialization failure detail
        reason: String,
    },
    /// Preloading organization resources failed in the driver's own step.
    ResourcePreload {
        /// Failure detail from the credential provider
        reason: String,
    },
    /// Persisting the final execution record failed.
    Persistence {
        /// Failure detail from the execution store
        reason: String,
    },
    /// The execution was cancelled before reaching a terminal state.
    Cancelled,
    /// Internal consistency error in the scheduler or driver.
    Internal {
        /// Description of the broken invariant
        message: String,
    },
}

impl ExecutionError {
    /// Whether the durable-step substrate may retry the failed step.
    ///
    /// Structural failures are deterministic: retrying re-validates the same
    /// workflow or re-checks the same balance and fails the same way.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExecutionError::InvalidWorkflow { .. } => false,
            ExecutionError::CreditsExhausted { .. } => false,
            ExecutionError::StepResult { .. } => false,
            ExecutionError::Cancelled => false,
            ExecutionError::Internal { .. } => false,
            ExecutionError::ResourcePreload { .. } => true,
            ExecutionError::Persistence { .. } => true,
        }
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::InvalidWorkflow { errors } => {
                write!(f, "Workflow validation failed: ")?;
                for (i, error) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", error)?;
                }
                Ok(())
            }
            ExecutionError::CreditsExhausted {
                estimated,
                available,
            } => {
                write!(
                    f,
                    "Insufficient credits: estimated usage {} exceeds available {}",
                    estimated, available
                )
            }
            ExecutionError::StepResult { step, reason } => {
                write!(f, "Durable step '{}' result error: {}", step, reason)
            }
            ExecutionError::ResourcePreload { reason } => {
                write!(f, "Failed to preload organization resources: {}", reason)
            }
            ExecutionError::Persistence { reason } => {
                write!(f, "Failed to persist execution record: {}", reason)
            }
            ExecutionError::Cancelled => {
                write!(f, "Execution cancelled")
            }
            ExecutionError::Internal { message } => {
                write!(f, "Internal consistency error: {}", message)
            }
        }
    }
}

impl std::error::Error for ExecutionError {}

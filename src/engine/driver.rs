// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The execution driver: one-shot lifecycle of a single execution.
//!
//! The driver owns the fixed sequence of a run:
//!
//! 1. record `submitted`, emit the initial monitoring update
//! 2. validate and plan under the durable step `initialise workflow`
//! 3. credit pre-flight from estimated per-type usage
//! 4. preload organization resources under a durable step
//! 5. run the level scheduler
//! 6. finalize under the durable step `persist final execution record`:
//!    compute the final status, record actual usage, persist exactly once
//! 7. emit the final monitoring update
//!
//! Structural failures (invalid workflow, cycle, exhausted credits) end the
//! run before any node starts; the record still gets finalized and
//! persisted. Any unexpected error out of the scheduler is written onto the
//! record and finalization proceeds with the partial state. Only a failed
//! persist propagates to the caller as `Err`.

use crate::catalog::{Capabilities, NodeCatalog};
use crate::engine::context::ExecutionContext;
use crate::engine::durable::{DurableSteps, StepJournal};
use crate::engine::invoker::NodeInvoker;
use crate::engine::record::{ExecutionRecord, ExecutionStatus};
use crate::engine::scheduler::{default_concurrency, LevelScheduler};
use crate::engine::state::{workflow_status, ExecutionState};
use crate::errors::ExecutionError;
use crate::model::{TriggerPayload, Workflow};
use crate::observability::messages::engine::{
    ExecutionFinished, ExecutionSubmitted, MonitorUpdateDropped,
};
use crate::observability::messages::StructuredLog;
use crate::planner::{plan, ExecutionPlan};
use crate::services::{
    CreditService, CredentialProvider, ExecutionStore, MonitoringService, ObjectStore,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Engine tuning knobs.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Maximum concurrent node executions within a level. Defaults to the
    /// number of CPU cores.
    pub max_concurrency: Option<usize>,
}

/// The collaborators one driver instance works against.
///
/// All of them are passed in; the engine holds no global state.
#[derive(Clone)]
pub struct EngineEnvironment {
    pub catalog: Arc<dyn NodeCatalog>,
    pub object_store: Arc<dyn ObjectStore>,
    pub credits: Arc<dyn CreditService>,
    pub store: Arc<dyn ExecutionStore>,
    pub monitor: Arc<dyn MonitoringService>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub journal: Arc<dyn StepJournal>,
}

/// The caller's billing posture for one execution.
#[derive(Debug, Clone)]
pub struct BillingPlan {
    pub available_credits: u64,
    pub subscription: Option<String>,
    pub overage_limit: Option<u64>,
}

impl BillingPlan {
    /// A plan that never fails the pre-flight, for tests and demos.
    pub fn unmetered() -> Self {
        Self {
            available_credits: u64::MAX,
            subscription: None,
            overage_limit: None,
        }
    }

    /// Whether subscription-gated node types may run.
    pub fn entitled(&self) -> bool {
        self.subscription.as_deref() == Some("active")
    }
}

/// Everything needed to run one execution.
pub struct ExecutionRequest {
    pub workflow: Workflow,
    /// Supply the id of a previous run to replay it against the same step
    /// journal; a fresh id is generated when absent.
    pub execution_id: Option<String>,
    pub user_id: String,
    pub organization_id: String,
    pub deployment_id: Option<String>,
    pub trigger: TriggerPayload,
    pub session_id: Option<String>,
    pub billing: BillingPlan,
    /// Environment bag surfaced to nodes through their context.
    pub env: BTreeMap<String, String>,
}

impl ExecutionRequest {
    /// A manual-trigger request with unmetered billing.
    pub fn new(workflow: Workflow, user_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            workflow,
            execution_id: None,
            user_id: user_id.into(),
            organization_id: organization_id.into(),
            deployment_id: None,
            trigger: TriggerPayload::Manual,
            session_id: None,
            billing: BillingPlan::unmetered(),
            env: BTreeMap::new(),
        }
    }
}

/// Drives single executions end to end.
pub struct ExecutionDriver {
    environment: EngineEnvironment,
    options: EngineOptions,
}

impl ExecutionDriver {
    pub fn new(environment: EngineEnvironment) -> Self {
        Self {
            environment,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(environment: EngineEnvironment, options: EngineOptions) -> Self {
        Self {
            environment,
            options,
        }
    }

    /// Run one execution to a terminal state.
    pub async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionRecord, ExecutionError> {
        self.execute_with_cancellation(request, CancellationToken::new())
            .await
    }

    /// Run one execution, observing an external cancellation signal.
    pub async fn execute_with_cancellation(
        &self,
        request: ExecutionRequest,
        cancellation: CancellationToken,
    ) -> Result<ExecutionRecord, ExecutionError> {
        let ExecutionRequest {
            workflow,
            execution_id,
            user_id,
            organization_id,
            deployment_id,
            trigger,
            session_id,
            billing,
            env,
        } = request;
        let session_id = session_id.as_deref();

        let execution_id = execution_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut record = ExecutionRecord::new(
            execution_id.clone(),
            workflow.id.clone(),
            deployment_id.clone(),
            user_id,
            organization_id.clone(),
            Utc::now(),
        );
        self.emit(session_id, &record).await;

        let durable = DurableSteps::new(self.environment.journal.clone(), execution_id.clone());

        let workflow_ref = &workflow;
        let planned = durable
            .run("initialise workflow", || async move {
                plan(workflow_ref).map(|plan| plan.levels().to_vec())
            })
            .await;
        let execution_plan = match planned {
            Ok(levels) => ExecutionPlan::from(levels),
            Err(error) => {
                // Validation failure or cycle: fatal, no node ever runs
                record.set_error(error.to_string());
                record.set_status(ExecutionStatus::Error);
                return self
                    .finalize(record, None, &organization_id, &durable, session_id)
                    .await;
            }
        };

        let context = Arc::new(ExecutionContext::new(
            Arc::new(workflow),
            &execution_plan,
            organization_id.clone(),
            execution_id.clone(),
            deployment_id,
        ));
        let mut state = ExecutionState::new();
        record.seed_idle(context.ordered_node_ids());

        ExecutionSubmitted {
            execution_id: &execution_id,
            workflow_id: &context.workflow_id,
            node_count: context.ordered_node_ids().len(),
            level_count: context.levels().len(),
        }
        .log();

        let estimate = self.estimate_usage(&context.workflow);
        let admitted = self
            .environment
            .credits
            .has_enough_credits(
                &organization_id,
                billing.available_credits,
                estimate,
                billing.subscription.as_deref(),
                billing.overage_limit,
            )
            .await;
        if !admitted {
            let error = ExecutionError::CreditsExhausted {
                estimated: estimate,
                available: billing.available_credits,
            };
            record.set_error(error.to_string());
            record.set_status(ExecutionStatus::Exhausted);
            self.emit(session_id, &record).await;
            return self
                .finalize(
                    record,
                    Some((&context, &state)),
                    &organization_id,
                    &durable,
                    session_id,
                )
                .await;
        }

        let credentials = &self.environment.credentials;
        let organization_ref = organization_id.as_str();
        let preloaded = durable
            .run("preload organization resources", || async move {
                credentials
                    .initialize(organization_ref)
                    .await
                    .map_err(|error| ExecutionError::ResourcePreload {
                        reason: error.to_string(),
                    })
            })
            .await;
        if let Err(error) = preloaded {
            record.set_error(error.to_string());
            return self
                .finalize(
                    record,
                    Some((&context, &state)),
                    &organization_id,
                    &durable,
                    session_id,
                )
                .await;
        }

        let capabilities = Capabilities::new(
            self.environment.credentials.clone(),
            self.environment.object_store.clone(),
        );
        let invoker = Arc::new(NodeInvoker::new(
            self.environment.catalog.clone(),
            capabilities,
            billing.entitled(),
            env,
        ));
        let scheduler = LevelScheduler::new(
            self.options.max_concurrency.unwrap_or_else(default_concurrency),
        );

        if let Err(error) = scheduler
            .run(
                &context,
                &mut state,
                &mut record,
                &invoker,
                &durable,
                &self.environment.monitor,
                &trigger,
                session_id,
                &cancellation,
            )
            .await
        {
            // Confine to the record; finalization proceeds with whatever
            // results were collected
            record.set_error(error.to_string());
        }

        self.finalize(
            record,
            Some((&context, &state)),
            &organization_id,
            &durable,
            session_id,
        )
        .await
    }

    /// Sum of declared per-type usage, the credit pre-flight estimate.
    /// Unknown types count as 1; they will fail node-locally later.
    fn estimate_usage(&self, workflow: &Workflow) -> u64 {
        workflow
            .nodes
            .iter()
            .map(|node| {
                self.environment
                    .catalog
                    .lookup_type(&node.node_type)
                    .map(|descriptor| descriptor.usage)
                    .unwrap_or(1)
            })
            .sum()
    }

    /// Compute the final status, record usage, and persist, all under one
    /// durable step so a replay neither re-charges nor re-saves.
    async fn finalize(
        &self,
        record: ExecutionRecord,
        progress: Option<(&Arc<ExecutionContext>, &ExecutionState)>,
        organization_id: &str,
        durable: &DurableSteps,
        session_id: Option<&str>,
    ) -> Result<ExecutionRecord, ExecutionError> {
        let environment = &self.environment;

        let saved = durable
            .run("persist final execution record", || async move {
                let mut record = record;

                if record.status != ExecutionStatus::Exhausted {
                    let computed = progress
                        .map(|(context, state)| workflow_status(context, state))
                        .unwrap_or(ExecutionStatus::Error);
                    let status = if computed == ExecutionStatus::Executing {
                        // Cut short before every node was visited
                        record.set_error("Execution was interrupted before completion");
                        ExecutionStatus::Error
                    } else if record.error.is_some() {
                        ExecutionStatus::Error
                    } else {
                        computed
                    };
                    record.set_status(status);

                    environment
                        .credits
                        .record_usage(organization_id, record.total_usage())
                        .await;
                }

                record.ended_at = Some(Utc::now());
                environment
                    .store
                    .save(record)
                    .await
                    .map_err(|error| ExecutionError::Persistence {
                        reason: error.to_string(),
                    })
            })
            .await?;

        self.emit(session_id, &saved).await;
        ExecutionFinished {
            execution_id: &saved.id,
            status: saved.status.as_str(),
            total_usage: saved.total_usage(),
        }
        .log();

        Ok(saved)
    }

    /// Best-effort monitoring send; delivery failures are logged and
    /// swallowed.
    async fn emit(&self, session_id: Option<&str>, record: &ExecutionRecord) {
        if let Err(error) = self
            .environment
            .monitor
            .send_update(session_id, record)
            .await
        {
            MonitorUpdateDropped {
                execution_id: &record.id,
                reason: &error.to_string(),
            }
            .log();
        }
    }
}

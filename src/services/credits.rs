// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Credit accounting around an execution.
//!
//! The driver calls [`CreditService::has_enough_credits`] once before any
//! node runs (with an estimate summed from declared per-type usage) and
//! [`CreditService::record_usage`] once at finalize (with the actual summed
//! usage). Check-and-charge, no reservation: the estimate gates admission,
//! the actual usage is what gets recorded.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Pre-flight admission and post-flight usage recording.
#[async_trait]
pub trait CreditService: Send + Sync {
    /// Whether the organization can afford the estimated usage.
    async fn has_enough_credits(
        &self,
        organization_id: &str,
        available: u64,
        estimate: u64,
        subscription: Option<&str>,
        overage_limit: Option<u64>,
    ) -> bool;

    /// Record actual usage after an execution finishes.
    async fn record_usage(&self, organization_id: &str, total: u64);
}

/// An in-memory credit ledger.
///
/// Admission policy: the estimate must fit in the available balance; an
/// active subscription additionally unlocks the overage allowance.
#[derive(Default)]
pub struct LedgerCreditService {
    recorded: Mutex<HashMap<String, u64>>,
}

impl LedgerCreditService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total usage recorded for an organization so far.
    pub async fn recorded_usage(&self, organization_id: &str) -> u64 {
        self.recorded
            .lock()
            .await
            .get(organization_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl CreditService for LedgerCreditService {
    async fn has_enough_credits(
        &self,
        _organization_id: &str,
        available: u64,
        estimate: u64,
        subscription: Option<&str>,
        overage_limit: Option<u64>,
    ) -> bool {
        let overage = match subscription {
            Some("active") => overage_limit.unwrap_or(0),
            _ => 0,
        };
        estimate <= available.saturating_add(overage)
    }

    async fn record_usage(&self, organization_id: &str, total: u64) {
        let mut recorded = self.recorded.lock().await;
        *recorded.entry(organization_id.to_string()).or_insert(0) += total;
    }
}

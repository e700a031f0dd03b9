// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Trigger payloads handed to nodes at execution time.

use crate::model::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The trigger-specific data available to every node in one execution.
///
/// A workflow declares *how* it is triggered ([`crate::model::Trigger`]);
/// this is the *what*: the concrete request, message, or schedule tick that
/// started the run. Nodes read it through their context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerPayload {
    /// Started by hand; carries nothing.
    Manual,
    #[serde(rename_all = "camelCase")]
    Http {
        method: String,
        path: String,
        #[serde(default)]
        headers: BTreeMap<String, String>,
        #[serde(default)]
        query: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<Value>,
    },
    #[serde(rename_all = "camelCase")]
    Email {
        from: String,
        subject: String,
        body: String,
    },
    #[serde(rename_all = "camelCase")]
    Queue { queue_id: String, message: Value },
    #[serde(rename_all = "camelCase")]
    Scheduled {
        cron: String,
        fired_at: DateTime<Utc>,
    },
}

impl Default for TriggerPayload {
    fn default() -> Self {
        TriggerPayload::Manual
    }
}

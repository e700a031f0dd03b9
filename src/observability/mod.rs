// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Centralized message types for the engine's diagnostic and operational
//! logging. Message types follow a struct-based pattern with a `Display`
//! implementation plus the [`messages::StructuredLog`] trait, keeping magic
//! strings out of the engine code and log output consistent.
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - execution lifecycle events
//! * `messages::node` - per-node outcome events
//!
//! Monitoring updates (the real-time execution snapshots) are a separate
//! concern and do not pass through here.

pub mod messages;

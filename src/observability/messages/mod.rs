// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging and tracing.
//!
//! Each message type implements:
//!
//! * `Display` - human-readable output
//! * [`StructuredLog`] - machine-readable fields + span creation

pub mod engine;
pub mod node;

use tracing::Span;

/// Trait for messages that support structured logging and tracing.
pub trait StructuredLog {
    /// Emit a log event with structured fields.
    ///
    /// Logs both the human-readable message (via `Display`) and the
    /// machine-readable fields. The log level is fixed by the message
    /// type's semantic meaning.
    fn log(&self);

    /// Create a span with this message's fields as attributes.
    fn span(&self, name: &str) -> Span;
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human readable output and
//! [`StructuredLog`] to emit the same event with its fields attached.
//!
//! * `scheduling` - processor lifecycle and command dispatch
//! * `traversal` - action traversal
//! * `reflection` - worker schema discovery
//! * `network` - RPC server lifecycle

use tracing::Span;

pub mod network;
pub mod reflection;
pub mod scheduling;
pub mod traversal;

/// A log message that knows its level and its structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event at the message's level.
    fn log(&self);

    /// Build a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}

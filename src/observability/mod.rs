// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for the diagnostic and
//! operational logging of the engine. Message types follow a struct-based
//! pattern with a `Display` implementation, so call sites never carry magic
//! strings and every lifecycle event is emitted with the same fields.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::scheduling` - processor spawn, registration and command dispatch
//! * `messages::traversal` - action traversal events
//! * `messages::reflection` - schema discovery on worker processes
//! * `messages::network` - RPC server lifecycle
//!
//! # Usage
//!
//! ```rust
//! use zorro_core::observability::messages::scheduling::ProcessorRegistered;
//! use zorro_core::observability::messages::StructuredLog;
//!
//! let msg = ProcessorRegistered {
//!     processor: "log",
//!     id: "5f0c1c1e",
//!     host: "127.0.0.1:50051",
//! };
//!
//! msg.log();
//! ```

pub mod messages;

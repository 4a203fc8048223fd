// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Matching commands to worker processes.
//!
//! Commands name the processor they need through a [`ProcessorQuery`]. The
//! [`Scheduler`] drains the command queue, looks for a registered processor
//! satisfying each query and starts one from a template when none does. A
//! started worker stays pending until it calls `RegisterProcessor` on the
//! engine's RPC server; its schema is discovered over server reflection
//! before it joins the pool.
//!
//! [`ProcessorQuery`]: crate::proto::ProcessorQuery

pub mod pending;
pub mod pool;
pub mod processor;
pub mod query;
mod scheduler;
mod service;

#[cfg(test)]
mod integration_tests;

pub use pending::{OutputCapture, PendingProcessor, PendingRegistry};
pub use pool::{ProcessorPool, RegisteredProcessor};
pub use processor::{check_launch_template, render_launch_command};
pub use scheduler::Scheduler;
pub use service::SchedulingService;

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::proto::Processor;

/// The caller's environment, as seen by the scheduler when it has to start
/// a worker process.
///
/// Processor discovery, command file resolution and environment assembly all
/// live outside the engine; the scheduler only consumes their results.
pub trait Context: Send + Sync {
    /// Processor templates that can be started, in priority order.
    fn available_processors(&self) -> Vec<Processor>;

    /// Directories holding the command definitions served by a processor.
    fn available_command_paths(&self, processor: &Processor) -> Vec<String>;

    /// Environment variables for a spawned worker. When `include_current` is
    /// set the current process environment is the starting point.
    fn environ(&self, include_current: bool) -> HashMap<String, String>;
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for processor lifecycle and command dispatch events.
//!
//! This module contains message types for logging events related to:
//! * Worker process spawning and exit
//! * Processor registration
//! * Command dispatch to a registered processor

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A worker process is being started for a processor template.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProcessorSpawnStarted<'a> {
    pub processor: &'a str,
    pub id: &'a str,
    pub command_line: &'a str,
}

impl Display for ProcessorSpawnStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting processor '{}' ({}): {}",
            self.processor, self.id, self.command_line
        )
    }
}

impl StructuredLog for ProcessorSpawnStarted<'_> {
    fn log(&self) {
        tracing::info!(
            processor = self.processor,
            id = self.id,
            command_line = self.command_line,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "processor_spawn",
            span_name = name,
            processor = self.processor,
            id = self.id,
        )
    }
}

/// A processor registered itself and its schema was discovered.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use zorro_core::observability::messages::scheduling::ProcessorRegistered;
///
/// let msg = ProcessorRegistered {
///     processor: "log",
///     id: "5f0c1c1e",
///     host: "127.0.0.1:50051",
/// };
///
/// assert_eq!(msg.to_string(), "Processor 'log' (5f0c1c1e) registered at 127.0.0.1:50051");
/// ```
pub struct ProcessorRegistered<'a> {
    pub processor: &'a str,
    pub id: &'a str,
    pub host: &'a str,
}

impl Display for ProcessorRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' ({}) registered at {}",
            self.processor, self.id, self.host
        )
    }
}

impl StructuredLog for ProcessorRegistered<'_> {
    fn log(&self) {
        tracing::info!(
            processor = self.processor,
            id = self.id,
            host = self.host,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "processor_registered",
            span_name = name,
            processor = self.processor,
            id = self.id,
            host = self.host,
        )
    }
}

/// A processor failed to register.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessorRegistrationFailed<'a> {
    pub id: &'a str,
    pub host: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ProcessorRegistrationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor {} could not be registered at {}: {}",
            self.id, self.host, self.error
        )
    }
}

impl StructuredLog for ProcessorRegistrationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            id = self.id,
            host = self.host,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "processor_registration_failed",
            span_name = name,
            id = self.id,
            host = self.host,
        )
    }
}

/// A worker process exited.
///
/// # Log Level
/// `info!` when the exit was clean, `warn!` otherwise
pub struct ProcessorExited<'a> {
    pub processor: &'a str,
    pub id: &'a str,
    pub status: &'a str,
    pub success: bool,
}

impl Display for ProcessorExited<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor '{}' ({}) exited: {}",
            self.processor, self.id, self.status
        )
    }
}

impl StructuredLog for ProcessorExited<'_> {
    fn log(&self) {
        if self.success {
            tracing::info!(
                processor = self.processor,
                id = self.id,
                status = self.status,
                "{}", self
            );
        } else {
            tracing::warn!(
                processor = self.processor,
                id = self.id,
                status = self.status,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "processor_exited",
            span_name = name,
            processor = self.processor,
            id = self.id,
        )
    }
}

/// A line written by a worker process on stdout or stderr.
///
/// # Log Level
/// `debug!` - Worker output is only useful while diagnosing a worker
pub struct ProcessorOutput<'a> {
    pub id: &'a str,
    pub stream: &'a str,
    pub line: &'a str,
}

impl Display for ProcessorOutput<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{} {}] {}", self.id, self.stream, self.line)
    }
}

impl StructuredLog for ProcessorOutput<'_> {
    fn log(&self) {
        tracing::debug!(id = self.id, stream = self.stream, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("processor_output", span_name = name, id = self.id)
    }
}

/// A command was handed to a processor.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CommandDispatched<'a> {
    pub command: &'a str,
    pub execution_type: &'a str,
    pub processor: &'a str,
    pub host: &'a str,
}

impl Display for CommandDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching {} of command '{}' to processor '{}' at {}",
            self.execution_type, self.command, self.processor, self.host
        )
    }
}

impl StructuredLog for CommandDispatched<'_> {
    fn log(&self) {
        tracing::info!(
            command = self.command,
            execution_type = self.execution_type,
            processor = self.processor,
            host = self.host,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "command",
            span_name = name,
            command = self.command,
            execution_type = self.execution_type,
            host = self.host,
        )
    }
}

/// A command finished successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct CommandCompleted<'a> {
    pub command: &'a str,
    pub responses: usize,
    pub duration: Duration,
}

impl Display for CommandCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Command '{}' completed: responses={}, duration={:?}",
            self.command, self.responses, self.duration
        )
    }
}

impl StructuredLog for CommandCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            command = self.command,
            responses = self.responses,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("command_completed", span_name = name, command = self.command)
    }
}

/// A command failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CommandFailed<'a> {
    pub command: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CommandFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Command '{}' failed: {}", self.command, self.error)
    }
}

impl StructuredLog for CommandFailed<'_> {
    fn log(&self) {
        tracing::error!(command = self.command, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "command_failed",
            span_name = name,
            command = self.command,
            error = %self.error,
        )
    }
}

/// The command queue was closed and the scheduling loop stopped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct SchedulerStopped {
    pub processed: usize,
}

impl Display for SchedulerStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Command queue closed, scheduler stopped after {} queries",
            self.processed
        )
    }
}

impl StructuredLog for SchedulerStopped {
    fn log(&self) {
        tracing::info!(processed = self.processed, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("scheduler", span_name = name, processed = self.processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_message_includes_status() {
        let msg = ProcessorExited {
            processor: "log",
            id: "abc",
            status: "exit status: 1",
            success: false,
        };
        assert_eq!(msg.to_string(), "Processor 'log' (abc) exited: exit status: 1");
    }

    #[test]
    fn test_dispatch_message() {
        let msg = CommandDispatched {
            command: "log",
            execution_type: "Execute",
            processor: "log",
            host: "127.0.0.1:4000",
        };
        assert_eq!(
            msg.to_string(),
            "Dispatching Execute of command 'log' to processor 'log' at 127.0.0.1:4000"
        );
    }
}

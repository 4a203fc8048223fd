// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::errors::SchedulingError;
use crate::tools::Command;
use crate::traits::Context;

/// Which of a tool service's methods a command is run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionType {
    Execute,
    Undo,
    Test,
}

impl ExecutionType {
    /// RPC method name on the tool's service.
    pub fn method_name(&self) -> &'static str {
        match self {
            ExecutionType::Execute => "Execute",
            ExecutionType::Undo => "Undo",
            ExecutionType::Test => "Test",
        }
    }
}

impl fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method_name())
    }
}

/// A command waiting to be scheduled, with the channel its caller is blocked
/// on.
pub struct CommandQuery {
    pub command: Arc<Command>,
    pub execution_type: ExecutionType,
    pub context: Arc<dyn Context>,
    pub result: oneshot::Sender<Result<(), SchedulingError>>,
}

impl CommandQuery {
    /// Release the caller. A caller that stopped waiting is ignored.
    pub fn respond(self, result: Result<(), SchedulingError>) {
        let _ = self.result.send(result);
    }
}

pub type CommandReceiver = mpsc::Receiver<CommandQuery>;

/// Sending side of the queue drained by the scheduler.
#[derive(Clone)]
pub struct CommandQueue {
    sender: mpsc::Sender<CommandQuery>,
}

impl CommandQueue {
    /// Create the queue and the receiver the scheduler consumes. The
    /// capacity is at least one.
    pub fn new(capacity: usize) -> (Self, CommandReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (CommandQueue { sender }, receiver)
    }

    /// Enqueue a command and wait for the scheduler's answer.
    pub async fn submit(
        &self,
        command: Arc<Command>,
        execution_type: ExecutionType,
        context: Arc<dyn Context>,
    ) -> Result<(), SchedulingError> {
        let name = command.name();
        let (result, answer) = oneshot::channel();

        self.sender
            .send(CommandQuery {
                command,
                execution_type,
                context,
                result,
            })
            .await
            .map_err(|_| SchedulingError::QueueClosed)?;

        answer
            .await
            .map_err(|_| SchedulingError::Dropped { command: name })?
    }
}

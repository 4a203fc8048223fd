// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt};
use prost::Message;

use crate::errors::{SchedulingError, SocketError, TraversalError};
use crate::proto;
use crate::proto::ProcessorQuery;
use crate::tools::{CommandQueue, ExecutionType, Tool, ToolBase, TraversalTask};
use crate::traits::{Context, MessageFields};

/// Response field a worker can fill to patch the command it is running.
pub const COMMAND_PATCH_FIELD: &str = "zorro_command";

/// Smallest tool: executed remotely by a processor matching its query.
#[derive(Debug)]
pub struct Command {
    base: Mutex<ToolBase>,
    processor_query: ProcessorQuery,
}

impl Command {
    pub fn new(base: ToolBase, processor_query: ProcessorQuery) -> Self {
        Command {
            base: Mutex::new(base),
            processor_query,
        }
    }

    pub fn base(&self) -> MutexGuard<'_, ToolBase> {
        self.base.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ToolBase {
        self.base().clone()
    }

    pub fn name(&self) -> String {
        self.base().display_name().to_string()
    }

    pub fn processor_query(&self) -> &ProcessorQuery {
        &self.processor_query
    }

    /// Commands have no children: the task runs once on the command itself.
    pub fn traverse(self: Arc<Self>, task: TraversalTask) -> BoxFuture<'static, Result<(), TraversalError>> {
        async move {
            let name = self.name();
            task(Tool::Command(self))
                .await
                .map_err(|source| TraversalError::Task {
                    tool: "command",
                    name,
                    source,
                })
        }
        .boxed()
    }

    pub async fn execute(
        self: &Arc<Self>,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
    ) -> Result<(), SchedulingError> {
        self.run(ExecutionType::Execute, context, queue).await
    }

    pub async fn undo(
        self: &Arc<Self>,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
    ) -> Result<(), SchedulingError> {
        self.run(ExecutionType::Undo, context, queue).await
    }

    pub async fn test(
        self: &Arc<Self>,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
    ) -> Result<(), SchedulingError> {
        self.run(ExecutionType::Test, context, queue).await
    }

    /// Hand the command to the scheduler and wait until a processor ran it.
    pub async fn run(
        self: &Arc<Self>,
        execution_type: ExecutionType,
        context: Arc<dyn Context>,
        queue: &CommandQueue,
    ) -> Result<(), SchedulingError> {
        queue.submit(self.clone(), execution_type, context).await
    }

    /// Store one response of the processor.
    ///
    /// A `zorro_command` field is decoded as a command patch, applied to this
    /// command and cleared before the response is decomposed into the output
    /// socket.
    pub fn set_output(&self, message: &mut dyn MessageFields) -> Result<(), SocketError> {
        let patch_field = message
            .describe_fields()
            .into_iter()
            .find(|field| field.name == COMMAND_PATCH_FIELD);

        if let Some(field) = patch_field {
            if !field.is_message {
                return Err(SocketError::InvalidCommandPatch { kind: field.kind });
            }

            if let Some(patch) = message.nested(COMMAND_PATCH_FIELD) {
                let patch = proto::Command::decode(patch.encode().as_slice())?;
                if let Some(patch_base) = patch.base {
                    self.base().update(&ToolBase::from(patch_base));
                }
            }
            message.clear_field(COMMAND_PATCH_FIELD);
        }

        self.base()
            .output
            .update_with_message_excluding(message, &[COMMAND_PATCH_FIELD])
    }

    /// Merge the base of `patch` into this command.
    pub fn update(&self, patch: &Command) -> bool {
        if std::ptr::eq(self, patch) {
            return false;
        }
        let patch_base = patch.snapshot();
        self.base().update(&patch_base)
    }
}

impl From<proto::Command> for Command {
    fn from(command: proto::Command) -> Self {
        Command::new(
            command.base.map(ToolBase::from).unwrap_or_default(),
            command.processor_query.unwrap_or_default(),
        )
    }
}

impl From<&Command> for proto::Command {
    fn from(command: &Command) -> Self {
        proto::Command {
            base: Some(command.snapshot().into()),
            processor_query: Some(command.processor_query.clone()),
        }
    }
}

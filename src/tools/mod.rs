// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Composable units of work.
//!
//! A [`Command`] is executed by a worker process; an [`Action`] groups
//! commands and other actions with dependencies between siblings. Both are
//! shared as [`Tool`] handles between concurrent tasks. Their mutable state
//! lives behind a lock.

use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::errors::{TaskError, TraversalError};

pub mod action;
pub mod base;
pub mod command;
pub mod queue;
pub mod socket;

pub use action::{Action, ActionChild};
pub use base::{ToolBase, ToolStatus};
pub use command::{Command, COMMAND_PATCH_FIELD};
pub use queue::{CommandQuery, CommandQueue, CommandReceiver, ExecutionType};
pub use socket::{Socket, SocketValue};

/// Work run on every node of a tool tree.
pub type TraversalTask = Arc<dyn Fn(Tool) -> BoxFuture<'static, Result<(), TaskError>> + Send + Sync>;

/// Wrap an async closure into a [`TraversalTask`].
pub fn traversal_task<F, Fut>(task: F) -> TraversalTask
where
    F: Fn(Tool) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    Arc::new(move |tool| task(tool).boxed())
}

#[derive(Debug, Clone)]
pub enum Tool {
    Action(Arc<Action>),
    Command(Arc<Command>),
}

impl Tool {
    pub fn base(&self) -> ToolBase {
        match self {
            Tool::Action(action) => action.snapshot(),
            Tool::Command(command) => command.snapshot(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Tool::Action(action) => action.name(),
            Tool::Command(command) => command.name(),
        }
    }

    /// Run `task` over this tool and, for actions, over every descendant.
    pub fn traverse(
        &self,
        task: TraversalTask,
        max_concurrency: Option<usize>,
    ) -> BoxFuture<'static, Result<(), TraversalError>> {
        match self {
            Tool::Action(action) => action.clone().traverse_bounded(task, max_concurrency),
            Tool::Command(command) => command.clone().traverse(task),
        }
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{EngineConfig, StaticContext};
use crate::errors::{NetworkError, TraversalError};
use crate::network::{GrpcServer, GrpcServerStatus};
use crate::scheduling::Scheduler;
use crate::tools::{Action, CommandQueue, ExecutionType};
use crate::traits::Context;

/// Engine runtime builder - wires the scheduler, its RPC server and the
/// command queue from configuration.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use zorro_core::config::{load_and_validate_config, RuntimeBuilder};
/// use zorro_core::tools::{Action, ExecutionType};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_and_validate_config("zorro.yaml")?;
/// let runtime = RuntimeBuilder::from_config(&config).await?;
///
/// let action = Arc::new(Action::load("build.json")?);
/// runtime.execute_action(&action, ExecutionType::Execute).await?;
///
/// runtime.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Start the scheduling server and the queue consumer.
    pub async fn from_config(cfg: &EngineConfig) -> Result<Runtime, NetworkError> {
        let scheduler = Arc::new(Scheduler::new());
        let server = GrpcServer::start(cfg.network.address(), scheduler.clone()).await?;

        let context = StaticContext::from_config(cfg).with_server(server.status());
        let (queue, receiver) = CommandQueue::new(cfg.queue.capacity);
        let consumer = tokio::spawn(scheduler.clone().listen(receiver));

        Ok(Runtime {
            scheduler,
            queue,
            context: Arc::new(context),
            server,
            consumer,
            max_concurrency: cfg.executor.max_concurrency,
        })
    }
}

/// A running engine.
pub struct Runtime {
    scheduler: Arc<Scheduler>,
    queue: CommandQueue,
    context: Arc<StaticContext>,
    server: GrpcServer,
    consumer: JoinHandle<usize>,
    max_concurrency: Option<usize>,
}

impl Runtime {
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn context(&self) -> Arc<dyn Context> {
        self.context.clone()
    }

    pub fn server_status(&self) -> GrpcServerStatus {
        self.server.status()
    }

    /// Run every command of `action` with `execution_type`.
    pub async fn execute_action(
        &self,
        action: &Arc<Action>,
        execution_type: ExecutionType,
    ) -> Result<(), TraversalError> {
        action
            .run(execution_type, self.context(), &self.queue, self.max_concurrency)
            .await
    }

    /// Close the queue, wait for the scheduler to drain it and stop the
    /// server. Returns the number of queries the scheduler received.
    pub async fn shutdown(self) -> Result<usize, NetworkError> {
        drop(self.queue);
        let processed = match self.consumer.await {
            Ok(processed) => processed,
            Err(e) => {
                tracing::error!(error = %e, "scheduler task did not stop cleanly");
                0
            }
        };

        self.server.shutdown().await?;
        Ok(processed)
    }
}

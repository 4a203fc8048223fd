// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::SchedulingError;
use crate::observability::messages::scheduling::{
    CommandFailed, ProcessorRegistered, ProcessorRegistrationFailed, SchedulerStopped,
};
use crate::observability::messages::StructuredLog;
use crate::proto::{Processor, ProcessorQuery};
use crate::reflection::ReflectionClient;
use crate::scheduling::pending::PendingRegistry;
use crate::scheduling::pool::{ProcessorPool, RegisteredProcessor};
use crate::scheduling::processor::{patch_processor, spawn_processor};
use crate::scheduling::query;
use crate::tools::CommandReceiver;
use crate::traits::Context;

/// Owns the registered and pending processors and drains the command queue.
///
/// The pool and the pending registry are locked independently and never
/// across a spawn, a dial or a discovery.
#[derive(Debug, Default)]
pub struct Scheduler {
    pool: Arc<ProcessorPool>,
    pending: PendingRegistry,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pool(&self) -> &ProcessorPool {
        &self.pool
    }

    pub fn pending(&self) -> &PendingRegistry {
        &self.pending
    }

    /// Return a registered processor satisfying `query`, starting one from
    /// the first template named after the query when none is running.
    pub async fn get_or_start_processor(
        &self,
        context: &dyn Context,
        query: &ProcessorQuery,
    ) -> Result<Arc<RegisteredProcessor>, SchedulingError> {
        if let Some(registered) = self.pool.find(query) {
            return Ok(registered);
        }

        let no_match = || SchedulingError::NoMatchingProcessor {
            query: query::describe(query),
        };

        // A started processor gets a fresh id and can never satisfy an id query
        if query.id.is_some() {
            return Err(no_match());
        }
        let name = query.name.as_deref().ok_or_else(no_match)?;

        let template = context
            .available_processors()
            .into_iter()
            .find(|template| template.name == name)
            .ok_or_else(no_match)?;

        spawn_processor(&self.pending, self.pool.clone(), context, &template, query).await
    }

    /// Register the worker of `processor` listening at `host`.
    ///
    /// The worker's schema is discovered before it joins the pool. The spawn
    /// waiting for this processor, if any, is woken with the outcome. An id
    /// that is already registered returns the existing registration.
    pub async fn register_processor(
        &self,
        mut processor: Processor,
        host: String,
    ) -> Result<Arc<RegisteredProcessor>, SchedulingError> {
        if processor.id.is_empty() {
            processor.id = Uuid::new_v4().to_string();
        }
        if let Some(registered) = self.pool.get(&processor.id) {
            return Ok(registered);
        }

        let client = match ReflectionClient::connect(&host).await {
            Ok(client) => client,
            Err(source) => {
                let error = SchedulingError::Registration {
                    host: host.clone(),
                    source: Arc::new(source),
                };
                ProcessorRegistrationFailed {
                    id: &processor.id,
                    host: &host,
                    error: &error,
                }
                .log();
                if let Some(pending) = self.pending.unqueue(&processor.id) {
                    pending.notify(Err(error.clone()));
                }
                return Err(error);
            }
        };

        let pending = self.pending.unqueue(&processor.id);
        let processor = match &pending {
            Some(pending) => {
                let mut spawned = pending.processor.clone();
                patch_processor(&mut spawned, &processor);
                spawned
            }
            None => processor,
        };

        let registered = self
            .pool
            .insert_if_absent(Arc::new(RegisteredProcessor::new(processor, client)));

        ProcessorRegistered {
            processor: &registered.processor().name,
            id: registered.id(),
            host: registered.host(),
        }
        .log();

        if let Some(pending) = pending {
            pending.notify(Ok(registered.clone()));
        }
        Ok(registered)
    }

    /// Drain the command queue until every sender is dropped.
    ///
    /// Processors are resolved one query at a time; the commands themselves
    /// run concurrently. Returns the number of queries received.
    pub async fn listen(self: Arc<Self>, mut receiver: CommandReceiver) -> usize {
        let mut processed = 0;

        while let Some(query) = receiver.recv().await {
            processed += 1;
            let processor_query = query.command.processor_query().clone();

            let resolved = self
                .get_or_start_processor(query.context.as_ref(), &processor_query)
                .await;

            match resolved {
                Ok(processor) => {
                    tokio::spawn(async move {
                        let command = query.command.clone();
                        let result = processor.process_command(command, query.execution_type).await;
                        query.respond(result);
                    });
                }
                Err(error) => {
                    CommandFailed {
                        command: &query.command.name(),
                        error: &error,
                    }
                    .log();
                    query.respond(Err(error));
                }
            }
        }

        SchedulerStopped { processed }.log();
        processed
    }
}

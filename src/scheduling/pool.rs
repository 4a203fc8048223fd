// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Processors that registered and can run commands.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::Instrument;

use crate::errors::SchedulingError;
use crate::observability::messages::scheduling::{CommandDispatched, CommandFailed};
use crate::observability::messages::StructuredLog;
use crate::proto::{Processor, ProcessorQuery};
use crate::reflection::ReflectionClient;
use crate::scheduling::query;
use crate::tools::{Command, ExecutionType};

/// A worker that registered, with the client used to reach it.
#[derive(Debug)]
pub struct RegisteredProcessor {
    processor: Processor,
    host: String,
    client: ReflectionClient,
    running_commands: Mutex<HashMap<String, Arc<Command>>>,
}

impl RegisteredProcessor {
    pub fn new(processor: Processor, client: ReflectionClient) -> Self {
        RegisteredProcessor {
            processor,
            host: client.host().to_string(),
            client,
            running_commands: Mutex::new(HashMap::new()),
        }
    }

    pub fn processor(&self) -> &Processor {
        &self.processor
    }

    pub fn id(&self) -> &str {
        &self.processor.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn client(&self) -> &ReflectionClient {
        &self.client
    }

    fn running(&self) -> MutexGuard<'_, HashMap<String, Arc<Command>>> {
        self.running_commands.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Ids of the commands currently running on this processor.
    pub fn running_commands(&self) -> Vec<String> {
        self.running().keys().cloned().collect()
    }

    /// Run `command` on this processor and wait for its last response.
    pub async fn process_command(
        &self,
        command: Arc<Command>,
        execution_type: ExecutionType,
    ) -> Result<(), SchedulingError> {
        let (id, name) = {
            let base = command.base();
            (base.id.clone(), base.display_name().to_string())
        };

        let dispatched = CommandDispatched {
            command: &name,
            execution_type: execution_type.method_name(),
            processor: &self.processor.name,
            host: &self.host,
        };
        dispatched.log();
        let span = dispatched.span("process_command");

        self.running().insert(id.clone(), command.clone());
        let result = self
            .client
            .process_command(&command, execution_type)
            .instrument(span)
            .await;
        self.running().remove(&id);

        result.map(|_| ()).map_err(|source| {
            let error = SchedulingError::Command {
                command: name.clone(),
                host: self.host.clone(),
                source: Arc::new(source),
            };
            CommandFailed {
                command: &name,
                error: &error,
            }
            .log();
            error
        })
    }
}

/// Registered processors keyed by id.
#[derive(Debug, Default)]
pub struct ProcessorPool {
    processors: Mutex<BTreeMap<String, Arc<RegisteredProcessor>>>,
}

impl ProcessorPool {
    fn processors(&self) -> MutexGuard<'_, BTreeMap<String, Arc<RegisteredProcessor>>> {
        self.processors.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, id: &str) -> Option<Arc<RegisteredProcessor>> {
        self.processors().get(id).cloned()
    }

    /// First registered processor satisfying `query`. A query with an id
    /// only looks that id up.
    pub fn find(&self, query: &ProcessorQuery) -> Option<Arc<RegisteredProcessor>> {
        let processors = self.processors();
        if let Some(id) = &query.id {
            return processors
                .get(id)
                .filter(|registered| query::matches(query, &registered.processor))
                .cloned();
        }

        processors
            .values()
            .find(|registered| query::matches(query, &registered.processor))
            .cloned()
    }

    /// Insert `registered` unless its id is already taken, and return the
    /// processor held by the pool.
    pub fn insert_if_absent(&self, registered: Arc<RegisteredProcessor>) -> Arc<RegisteredProcessor> {
        self.processors()
            .entry(registered.id().to_string())
            .or_insert(registered)
            .clone()
    }

    pub fn remove(&self, id: &str) -> Option<Arc<RegisteredProcessor>> {
        self.processors().remove(id)
    }

    pub fn list(&self) -> Vec<Processor> {
        self.processors()
            .values()
            .map(|registered| registered.processor.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.processors().len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors().is_empty()
    }
}

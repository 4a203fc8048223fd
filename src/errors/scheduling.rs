// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for processor matching, spawning, registration and dispatch.

use std::sync::Arc;

use thiserror::Error;

use crate::errors::ReflectionError;

/// Errors raised by the scheduler.
///
/// `Clone` so a single registration failure can both wake the pending spawn
/// and be returned to the registering worker.
#[derive(Debug, Clone, Error)]
pub enum SchedulingError {
    #[error("could not find running or run processor to satisfy the query {query}")]
    NoMatchingProcessor { query: String },

    #[error("could not run processor {processor}: templating error {reason}")]
    Template { processor: String, reason: String },

    #[error("could not run processor {processor}: launch template rendered an empty command")]
    EmptyLaunchCommand { processor: String },

    #[error("an error occurred while starting process for processor {processor}: {reason}")]
    Spawn { processor: String, reason: String },

    #[error("processor {processor} ({id}) process exited before registering ({status}): {stderr}")]
    ExitedBeforeRegistering {
        processor: String,
        id: String,
        status: String,
        stderr: String,
    },

    #[error("processor {id} started but did not register")]
    NotRegistered { id: String },

    #[error("could not create reflection client with processor at host {host}: {source}")]
    Registration {
        host: String,
        #[source]
        source: Arc<ReflectionError>,
    },

    #[error("could not process command {command} with processor at host {host}: {source}")]
    Command {
        command: String,
        host: String,
        #[source]
        source: Arc<ReflectionError>,
    },

    #[error("the command queue is closed")]
    QueueClosed,

    #[error("the scheduler dropped the query of command {command} without answering")]
    Dropped { command: String },
}

impl From<SchedulingError> for tonic::Status {
    fn from(error: SchedulingError) -> Self {
        match &error {
            SchedulingError::NoMatchingProcessor { .. } => tonic::Status::not_found(error.to_string()),
            SchedulingError::Registration { .. } => tonic::Status::unavailable(error.to_string()),
            _ => tonic::Status::internal(error.to_string()),
        }
    }
}

// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for sockets and tool traversal.

use std::path::PathBuf;

use thiserror::Error;

/// Error returned by a traversal task.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while converting between sockets and structured messages
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("could not store raw value of field '{field}' of message {message}: {source}")]
    FieldEncoding {
        message: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decompose message {message}: {reason}")]
    Decomposition { message: String, reason: String },

    #[error("invalid raw value for field '{field}' of message {message}: {source}")]
    InvalidRawValue {
        message: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("an error occurred while applying json patch {patch} on message {message}: {reason}")]
    PatchRejected {
        message: String,
        patch: String,
        reason: String,
    },

    #[error("invalid datatype for command field: expected message, received {kind}")]
    InvalidCommandPatch { kind: String },

    #[error("could not parse command field to patch command: {0}")]
    CommandPatchDecoding(#[from] prost::DecodeError),
}

/// Errors raised while loading an action definition file
#[derive(Debug, Error)]
pub enum ActionLoadError {
    #[error("could not open action file ({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse action file ({path}): {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Errors raised while traversing a tool tree
#[derive(Debug, Error)]
pub enum TraversalError {
    #[error("error occurred while traversing {tool} {name}: {source}")]
    Task {
        tool: &'static str,
        name: String,
        #[source]
        source: TaskError,
    },

    #[error(
        "one or multiple children errored during the execution of the action {name}: \n{}",
        .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n")
    )]
    Children {
        name: String,
        errors: Vec<TraversalError>,
    },

    #[error("a child of action {name} did not complete: {reason}")]
    Join { name: String, reason: String },

    #[error("child {child} never ran: its upstream {upstream:?} never completed")]
    NeverReady { child: String, upstream: Vec<String> },
}

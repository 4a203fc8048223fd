// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors for dynamic RPC discovery and invocation.

use thiserror::Error;

use crate::errors::SocketError;

/// Errors raised by the reflection client. Every variant carries the host of
/// the processor it was talking to.
#[derive(Debug, Error)]
pub enum ReflectionError {
    #[error("could not create connection with processor at host {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("reflection request {request} to host {host} failed: {source}")]
    Rpc {
        host: String,
        request: String,
        #[source]
        source: tonic::Status,
    },

    #[error("invalid response received from host {host} to reflection request {request}")]
    UnexpectedResponse { host: String, request: String },

    #[error("reflection service at host {host} refused request {request}: {message} (code {code})")]
    Refused {
        host: String,
        request: String,
        code: i32,
        message: String,
    },

    #[error("invalid proto file format received from host {host} for {symbol}: {source}")]
    InvalidDescriptor {
        host: String,
        symbol: String,
        #[source]
        source: prost::DecodeError,
    },

    #[error("could not interpret file descriptors of host {host}: {source}")]
    Registry {
        host: String,
        #[source]
        source: prost_reflect::DescriptorError,
    },

    #[error("no service with name {service} was found at host {host}")]
    ServiceNotFound { host: String, service: String },

    #[error("no method with name {method} was found in the service {service} at host {host}")]
    MethodNotFound {
        host: String,
        service: String,
        method: String,
    },

    #[error("invalid method path {path} for host {host}")]
    InvalidMethodPath { host: String, path: String },

    #[error("could not build message for method {method} of host {host}: {source}")]
    Socket {
        host: String,
        method: String,
        #[source]
        source: SocketError,
    },

    #[error("processor at host {host} is not ready to receive {method}: {source}")]
    NotReady {
        host: String,
        method: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("stream error on method {method} with processor at host {host}: {source}")]
    Stream {
        host: String,
        method: String,
        #[source]
        source: tonic::Status,
    },
}

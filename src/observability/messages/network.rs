// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the RPC server lifecycle.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use tracing::Span;

/// The RPC server is accepting connections.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ServerStarted {
    pub address: SocketAddr,
}

impl Display for ServerStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Scheduling server listening on {}", self.address)
    }
}

impl StructuredLog for ServerStarted {
    fn log(&self) {
        tracing::info!(address = %self.address, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("server", span_name = name, address = %self.address)
    }
}

/// The RPC server stopped.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ServerStopped {
    pub address: SocketAddr,
}

impl Display for ServerStopped {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Scheduling server on {} stopped", self.address)
    }
}

impl StructuredLog for ServerStopped {
    fn log(&self) {
        tracing::info!(address = %self.address, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("server_stopped", span_name = name, address = %self.address)
    }
}

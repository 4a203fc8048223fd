// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::net::SocketAddr;

use thiserror::Error;

/// Errors of the engine's RPC server.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not bind the scheduling server to {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read the address of the scheduling server listener: {0}")]
    LocalAddress(#[source] std::io::Error),

    #[error("scheduling server on {address} failed: {source}")]
    Serve {
        address: SocketAddr,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("scheduling server task on {address} panicked or was aborted: {reason}")]
    Join { address: SocketAddr, reason: String },
}

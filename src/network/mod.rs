// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The engine's RPC server.
//!
//! Workers started by the scheduler find the server through the
//! `ZORRO_GRPC_CORE_HOST` and `ZORRO_GRPC_CORE_PORT` variables of their
//! environment and call `RegisterProcessor` once their own listener is up.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;

use crate::errors::NetworkError;
use crate::observability::messages::network::{ServerStarted, ServerStopped};
use crate::observability::messages::StructuredLog;
use crate::scheduling::{Scheduler, SchedulingService};

/// Where the RPC server listens and whether it is still up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcServerStatus {
    pub host: String,
    pub port: u16,
    pub running: bool,
}

/// Serve the scheduling service on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    scheduler: Arc<Scheduler>,
    shutdown: CancellationToken,
) -> Result<(), NetworkError> {
    let address = listener.local_addr().map_err(NetworkError::LocalAddress)?;

    ServerStarted { address }.log();
    let result = tonic::transport::Server::builder()
        .add_service(SchedulingService::new(scheduler).into_server())
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown.cancelled_owned())
        .await
        .map_err(|source| NetworkError::Serve { address, source });
    ServerStopped { address }.log();

    result
}

/// Handle on a server running in the background.
pub struct GrpcServer {
    address: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), NetworkError>>,
}

impl GrpcServer {
    /// Bind `address` and serve in a background task. Port 0 picks a free
    /// port; [`GrpcServer::address`] reports the bound one.
    pub async fn start(address: SocketAddr, scheduler: Arc<Scheduler>) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|source| NetworkError::Bind { address, source })?;
        let address = listener.local_addr().map_err(NetworkError::LocalAddress)?;

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, scheduler, shutdown.clone()));

        Ok(GrpcServer {
            address,
            shutdown,
            handle,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn status(&self) -> GrpcServerStatus {
        GrpcServerStatus {
            host: self.address.ip().to_string(),
            port: self.address.port(),
            running: !self.shutdown.is_cancelled() && !self.handle.is_finished(),
        }
    }

    /// Stop accepting connections and wait for the server task.
    pub async fn shutdown(self) -> Result<(), NetworkError> {
        self.shutdown.cancel();
        self.handle.await.map_err(|e| NetworkError::Join {
            address: self.address,
            reason: e.to_string(),
        })?
    }
}

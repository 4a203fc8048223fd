// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::net::{IpAddr, Ipv4Addr};

/// Default listen host of the scheduling RPC server
pub const DEFAULT_GRPC_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// Default listen port of the scheduling RPC server
pub const DEFAULT_GRPC_PORT: u16 = 9865;
/// Default command queue capacity, one query in flight at a time
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Variable telling started workers where the scheduling server listens
pub const GRPC_CORE_HOST_VAR: &str = "ZORRO_GRPC_CORE_HOST";
/// Variable telling started workers which port the scheduling server uses
pub const GRPC_CORE_PORT_VAR: &str = "ZORRO_GRPC_CORE_PORT";

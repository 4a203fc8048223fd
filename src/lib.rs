// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // config, context + runtime wiring
pub mod errors;     // error handling
pub mod network;    // scheduling RPC server
pub mod observability;
pub mod proto;      // generated protobufs live here
pub mod reflection; // schema discovery + dynamic calls to workers
pub mod scheduling; // processor pool, spawning + command dispatch
pub mod tools;      // sockets, commands, actions
pub mod traits;     // unified abstractions

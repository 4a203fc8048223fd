// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime schema discovery and dynamic RPC invocation.

pub mod client;
pub mod codec;
pub mod message;
pub mod registry;

pub use client::ReflectionClient;
pub use codec::DynamicCodec;
pub use message::format_field_kind;

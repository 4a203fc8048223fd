// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod network;
mod reflection;
mod scheduling;
mod tool;

pub use config::{ConfigError, ValidationError};
pub use network::NetworkError;
pub use reflection::ReflectionError;
pub use scheduling::SchedulingError;
pub use tool::{ActionLoadError, SocketError, TaskError, TraversalError};

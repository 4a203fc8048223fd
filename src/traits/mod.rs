// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod context;
pub mod message;

pub use context::Context;
pub use message::{FieldSchema, MessageFields};

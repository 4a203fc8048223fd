// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

// Module declarations for generated protobuf code. The nesting mirrors the
// protobuf packages so cross-package references (`super::scheduling::...`)
// resolve.
pub mod zorro {
    pub mod tools {
        include!("zorro.tools.rs");
    }

    pub mod processor {
        include!("zorro.processor.rs");
    }

    pub mod scheduling {
        include!("zorro.scheduling.rs");
    }
}


/// Encoded `FileDescriptorSet` of every schema compiled by the build script.
pub const FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/zorro_descriptor.bin"));

// Re-export the types for easier access
pub use zorro::processor::{Processor, ProcessorStatus};
pub use zorro::scheduling::{ProcessorQuery, ProcessorRegistration};
pub use zorro::tools::{Action, ActionChild, Command, Socket, ToolBase, ToolStatus};

/// Descriptor pool of every schema compiled into the engine.
pub fn descriptor_pool() -> Result<prost_reflect::DescriptorPool, prost_reflect::DescriptorError> {
    prost_reflect::DescriptorPool::decode(FILE_DESCRIPTOR_SET)
}

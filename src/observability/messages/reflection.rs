// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for schema discovery on worker processes.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// The services of a worker were discovered through server reflection.
///
/// # Log Level
/// `debug!` - Detailed discovery information
pub struct ServicesDiscovered<'a> {
    pub host: &'a str,
    pub services: &'a [String],
    pub files: usize,
}

impl Display for ServicesDiscovered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Discovered services [{}] at {} ({} schema files)",
            self.services.join(", "),
            self.host,
            self.files
        )
    }
}

impl StructuredLog for ServicesDiscovered<'_> {
    fn log(&self) {
        tracing::debug!(
            host = self.host,
            services = ?self.services,
            files = self.files,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("reflection", span_name = name, host = self.host)
    }
}

/// A schema file imported by a service was missing and fetched by name.
///
/// # Log Level
/// `debug!` - Detailed discovery information
pub struct DependencyFetched<'a> {
    pub host: &'a str,
    pub file: &'a str,
}

impl Display for DependencyFetched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Fetched schema dependency {} from {}", self.file, self.host)
    }
}

impl StructuredLog for DependencyFetched<'_> {
    fn log(&self) {
        tracing::debug!(host = self.host, file = self.file, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("reflection_dependency", span_name = name, file = self.file)
    }
}

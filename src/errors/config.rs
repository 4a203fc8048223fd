// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during engine configuration validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two processor templates share the same name
    DuplicateProcessorName {
        /// The duplicate processor name
        name: String,
    },
    /// A processor template has no launch command
    EmptyLaunchTemplate {
        /// The processor whose template is empty
        name: String,
    },
    /// A launch template does not compile
    InvalidLaunchTemplate {
        /// The processor owning the template
        name: String,
        /// Why the template engine rejected it
        reason: String,
    },
    /// The executor was configured to run nothing concurrently
    ZeroConcurrency,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateProcessorName { name } => {
                write!(f, "Duplicate processor name: '{}'", name)
            }
            ValidationError::EmptyLaunchTemplate { name } => {
                write!(f, "Processor '{}' has an empty launch template", name)
            }
            ValidationError::InvalidLaunchTemplate { name, reason } => {
                write!(
                    f,
                    "Processor '{}' has an invalid launch template: {}",
                    name, reason
                )
            }
            ValidationError::ZeroConcurrency => {
                write!(f, "executor.max_concurrency must be at least 1")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading the engine configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file ({path}): {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file ({path}): {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("unsupported config format for {path}: expected .yaml, .yml or .toml")]
    UnsupportedFormat { path: PathBuf },

    #[error("Configuration validation failed:\n{}", join_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

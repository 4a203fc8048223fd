// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for the engine.
//!
//! Validation runs after loading and accumulates every error so a user can
//! fix a configuration in one pass:
//!
//! 1. **Unique names**: a query names the template it starts, so two
//!    templates with one name would be ambiguous
//! 2. **Launch templates**: non-empty and accepted by the template engine
//! 3. **Executor options**: a concurrency cap of zero would run nothing
//!
//! # Example
//!
//! ```rust
//! use zorro_core::config::{validate_config, EngineConfig, ProcessorTemplate};
//! use zorro_core::errors::ValidationError;
//!
//! let config = EngineConfig {
//!     processors: vec![
//!         ProcessorTemplate::new("python", "python -m zorro_worker"),
//!         ProcessorTemplate::new("python", "python3 -m zorro_worker"),
//!     ],
//!     ..EngineConfig::default()
//! };
//!
//! let errors = validate_config(&config).unwrap_err();
//! assert_eq!(
//!     errors,
//!     vec![ValidationError::DuplicateProcessorName { name: "python".to_string() }]
//! );
//! ```

use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::errors::ValidationError;
use crate::scheduling::check_launch_template;

/// Validates a configuration and returns every error found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_unique_processor_names(config));
    errors.extend(validate_launch_templates(config));

    if config.executor.max_concurrency == Some(0) {
        errors.push(ValidationError::ZeroConcurrency);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_processor_names(config: &EngineConfig) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    config
        .processors
        .iter()
        .filter(|template| !seen.insert(template.name.as_str()))
        .map(|template| ValidationError::DuplicateProcessorName {
            name: template.name.clone(),
        })
        .collect()
}

fn validate_launch_templates(config: &EngineConfig) -> Vec<ValidationError> {
    config
        .processors
        .iter()
        .filter_map(|template| {
            if template.start_processor_template.trim().is_empty() {
                return Some(ValidationError::EmptyLaunchTemplate {
                    name: template.name.clone(),
                });
            }
            check_launch_template(&template.start_processor_template)
                .err()
                .map(|reason| ValidationError::InvalidLaunchTemplate {
                    name: template.name.clone(),
                    reason,
                })
        })
        .collect()
}

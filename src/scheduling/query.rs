// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::proto::{Processor, ProcessorQuery};

/// Whether `processor` satisfies every constraint of `query`.
///
/// The name matches the processor name or any of its subsets, the id must
/// be equal and every metadata entry of the query must be present with the
/// same value.
pub fn matches(query: &ProcessorQuery, processor: &Processor) -> bool {
    if let Some(name) = &query.name {
        let provides = processor.name == *name || processor.subsets.iter().any(|subset| subset == name);
        if !provides {
            return false;
        }
    }

    if let Some(id) = &query.id {
        if processor.id != *id {
            return false;
        }
    }

    query
        .metadata
        .iter()
        .all(|(key, value)| processor.metadata.get(key) == Some(value))
}

/// Human readable form used in error messages.
pub fn describe(query: &ProcessorQuery) -> String {
    let mut metadata: Vec<String> = query
        .metadata
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    metadata.sort();

    format!(
        "{{name: {}, id: {}, metadata: [{}]}}",
        query.name.as_deref().unwrap_or("*"),
        query.id.as_deref().unwrap_or("*"),
        metadata.join(", ")
    )
}

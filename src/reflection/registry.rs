// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, BTreeSet, HashSet};

use prost_reflect::{DescriptorError, DescriptorPool};
use prost_types::{FileDescriptorProto, FileDescriptorSet};

/// Schema files gathered from a worker, keyed by file name.
pub type SchemaFiles = BTreeMap<String, FileDescriptorProto>;

/// Imports of the gathered files that were not gathered yet.
pub fn missing_dependencies(files: &SchemaFiles) -> BTreeSet<String> {
    files
        .values()
        .flat_map(|file| file.dependency.iter())
        .filter(|dependency| !files.contains_key(*dependency))
        .cloned()
        .collect()
}

fn visit<'a>(
    name: &'a str,
    files: &'a SchemaFiles,
    visited: &mut HashSet<&'a str>,
    ordered: &mut Vec<FileDescriptorProto>,
) {
    if !visited.insert(name) {
        return;
    }
    let Some(file) = files.get(name) else {
        return;
    };
    for dependency in &file.dependency {
        visit(dependency, files, visited, ordered);
    }
    ordered.push(file.clone());
}

/// Build a descriptor pool, adding every file after its imports.
pub fn build_pool(files: &SchemaFiles) -> Result<DescriptorPool, DescriptorError> {
    let mut visited = HashSet::new();
    let mut ordered = Vec::with_capacity(files.len());
    for name in files.keys() {
        visit(name, files, &mut visited, &mut ordered);
    }

    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: ordered })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::FILE_DESCRIPTOR_SET;
    use prost::Message;

    fn compiled_files() -> SchemaFiles {
        FileDescriptorSet::decode(FILE_DESCRIPTOR_SET)
            .unwrap()
            .file
            .into_iter()
            .map(|file| (file.name().to_string(), file))
            .collect()
    }

    #[test]
    fn test_build_pool_orders_imports() {
        let pool = build_pool(&compiled_files()).unwrap();

        assert!(pool.get_service_by_name("zorro_testing.Log").is_some());
        assert!(pool.get_message_by_name("zorro.tools.Command").is_some());
    }

    #[test]
    fn test_missing_dependencies() {
        let mut files = compiled_files();
        files.retain(|name, _| name == "zorro_testing/log.proto");

        let missing = missing_dependencies(&files);
        assert_eq!(missing, BTreeSet::from(["zorro/tools.proto".to_string()]));
    }

    #[test]
    fn test_incomplete_files_fail() {
        let mut files = compiled_files();
        files.remove("zorro/processor.proto");

        assert!(build_pool(&files).is_err());
    }
}

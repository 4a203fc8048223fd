// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_GRPC_HOST, DEFAULT_GRPC_PORT, DEFAULT_QUEUE_CAPACITY};
use crate::errors::ConfigError;
use crate::proto::{Processor, ProcessorStatus};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

/// Main configuration structure for the tool execution engine.
///
/// Loaded from a YAML or TOML file, chosen by extension.
///
/// # Fields
/// * `network` - Where the scheduling RPC server listens (optional)
/// * `executor` - Traversal options (optional)
/// * `queue` - Command queue options (optional)
/// * `processors` - Templates of the worker processes the scheduler can start
/// * `environment` - Rules applied to the environment of started workers
///
/// # Example
/// ```yaml
/// network:
///   host: 127.0.0.1
///   port: 9865
/// executor:
///   max_concurrency: 4
/// processors:
///   - name: python
///     start_processor_template: "python -m zorro_worker --id {{id}}"
///     command_paths: ["/opt/tools/python"]
/// environment:
///   PYTHONPATH:
///     prepend: /opt/tools/lib
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub executor: ExecutorOptions,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub processors: Vec<ProcessorTemplate>,
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub environment: BTreeMap<String, EnvironmentRule>,
}

/// Listen address of the scheduling RPC server.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> IpAddr {
    DEFAULT_GRPC_HOST
}

fn default_port() -> u16 {
    DEFAULT_GRPC_PORT
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_GRPC_HOST,
            port: DEFAULT_GRPC_PORT,
        }
    }
}

impl NetworkConfig {
    pub fn address(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Traversal options.
///
/// # Fields
/// * `max_concurrency` - Cap on children of one action running at the same
///   time. Unset means no cap.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
}

/// Command queue options.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,
}

fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// A worker process the scheduler can start.
///
/// `start_processor_template` is a Handlebars template rendered with the
/// processor's `name`, `label`, `version`, `id`, `metadata` and
/// `command_paths`, then split on whitespace.
///
/// # Example
/// ```yaml
/// name: blender
/// version: "4.1"
/// subsets: [python]
/// metadata:
///   gpu: "true"
/// start_processor_template: "blender --background --python worker.py -- --id {{id}}"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessorTemplate {
    pub name: String,
    pub label: Option<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub subsets: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    pub start_processor_template: String,
    #[serde(default)]
    pub command_paths: Vec<String>,
}

impl ProcessorTemplate {
    pub fn new(name: impl Into<String>, start_processor_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start_processor_template: start_processor_template.into(),
            ..Self::default()
        }
    }

    /// The processor started from this template, before it gets an id.
    pub fn to_processor(&self) -> Processor {
        Processor {
            id: String::new(),
            name: self.name.clone(),
            label: self.label.clone().unwrap_or_else(|| self.name.clone()),
            version: self.version.clone(),
            subsets: self.subsets.clone(),
            metadata: self.metadata.clone(),
            status: ProcessorStatus::Starting as i32,
            start_processor_template: self.start_processor_template.clone(),
        }
    }
}

/// How a variable of the worker environment is built.
///
/// `prepend` and `append` join with the platform path separator when the
/// variable already has a value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentRule {
    Set(String),
    Prepend(String),
    Append(String),
}

/// Load a config from a YAML or TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_error = |reason: String| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    };

    match path.extension().and_then(|extension| extension.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| parse_error(e.to_string()))
        }
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Load and validate a config from a YAML or TOML file
///
/// Every validation error is reported at once.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
processors:
  - name: python
    start_processor_template: "python -m zorro_worker --id {{id}}"
  - name: blender
    label: Blender
    subsets: [python]
    start_processor_template: "blender --id {{id}}"
environment:
  PYTHONPATH:
    prepend: /opt/zorro
"#;

        let cfg: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.processors.len(), 2);
        assert_eq!(cfg.processors[1].subsets, vec!["python"]);
        assert_eq!(
            cfg.environment["PYTHONPATH"],
            EnvironmentRule::Prepend("/opt/zorro".to_string())
        );
        assert_eq!(cfg.network.address().to_string(), "127.0.0.1:9865");
        assert_eq!(cfg.queue.capacity, 1);
        assert_eq!(cfg.executor.max_concurrency, None);
    }

    #[test]
    fn test_environment_rules_from_yaml_maps() {
        let file = write_config(
            ".yml",
            r#"
environment:
  PATH:
    append: /opt/zorro/bin
  PYTHONPATH:
    prepend: /opt/zorro/lib
  ZORRO_MODE:
    set: batch
"#,
        );

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(
            cfg.environment,
            BTreeMap::from([
                ("PATH".to_string(), EnvironmentRule::Append("/opt/zorro/bin".to_string())),
                ("PYTHONPATH".to_string(), EnvironmentRule::Prepend("/opt/zorro/lib".to_string())),
                ("ZORRO_MODE".to_string(), EnvironmentRule::Set("batch".to_string())),
            ])
        );
    }

    #[test]
    fn test_template_to_processor() {
        let template = ProcessorTemplate {
            version: "3.11".to_string(),
            ..ProcessorTemplate::new("python", "python -m worker")
        };

        let processor = template.to_processor();
        assert_eq!(processor.name, "python");
        assert_eq!(processor.label, "python");
        assert_eq!(processor.version, "3.11");
        assert_eq!(processor.status, ProcessorStatus::Starting as i32);
        assert_eq!(processor.start_processor_template, "python -m worker");
    }

    #[test]
    fn test_load_toml_config() {
        let file = write_config(
            ".toml",
            r#"
[network]
port = 0

[executor]
max_concurrency = 2

[[processors]]
name = "python"
start_processor_template = "python -m zorro_worker"

[environment.ZORRO_MODE]
set = "batch"
"#,
        );

        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.network.port, 0);
        assert_eq!(cfg.executor.max_concurrency, Some(2));
        assert_eq!(cfg.processors[0].name, "python");
        assert_eq!(cfg.environment["ZORRO_MODE"], EnvironmentRule::Set("batch".to_string()));
    }

    #[test]
    fn test_load_and_validate_reports_every_error() {
        let file = write_config(
            ".yaml",
            r#"
processors:
  - name: python
    start_processor_template: "python {{#if id}}"
  - name: python
    start_processor_template: "  "
"#,
        );

        let error = load_and_validate_config(file.path()).unwrap_err();
        let ConfigError::Validation(errors) = &error else {
            panic!("expected validation errors, got {}", error);
        };
        assert_eq!(errors.len(), 3);
        assert!(error.to_string().starts_with("Configuration validation failed:\n"));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_config(".json", "{}");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/zorro.yaml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml() {
        let file = write_config(".yaml", "processors: {name: [");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Parse { .. })));
    }
}

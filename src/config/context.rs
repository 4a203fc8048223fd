// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::{BTreeMap, HashMap};
use std::env;

use crate::config::consts::{GRPC_CORE_HOST_VAR, GRPC_CORE_PORT_VAR};
use crate::config::{EngineConfig, EnvironmentRule, ProcessorTemplate};
use crate::network::GrpcServerStatus;
use crate::proto::Processor;
use crate::traits::Context;

#[cfg(windows)]
const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: &str = ":";

/// [`Context`] built from the engine configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticContext {
    processors: Vec<ProcessorTemplate>,
    environment: BTreeMap<String, EnvironmentRule>,
    server: Option<GrpcServerStatus>,
}

impl StaticContext {
    pub fn from_config(config: &EngineConfig) -> Self {
        StaticContext {
            processors: config.processors.clone(),
            environment: config.environment.clone(),
            server: None,
        }
    }

    pub fn with_processor(mut self, template: ProcessorTemplate) -> Self {
        self.processors.push(template);
        self
    }

    pub fn with_environment(mut self, name: impl Into<String>, rule: EnvironmentRule) -> Self {
        self.environment.insert(name.into(), rule);
        self
    }

    /// Publish the scheduling server address to started workers.
    pub fn with_server(mut self, status: GrpcServerStatus) -> Self {
        self.server = Some(status);
        self
    }
}

impl Context for StaticContext {
    fn available_processors(&self) -> Vec<Processor> {
        self.processors
            .iter()
            .map(ProcessorTemplate::to_processor)
            .collect()
    }

    fn available_command_paths(&self, processor: &Processor) -> Vec<String> {
        self.processors
            .iter()
            .find(|template| template.name == processor.name)
            .map(|template| template.command_paths.clone())
            .unwrap_or_default()
    }

    fn environ(&self, include_current: bool) -> HashMap<String, String> {
        let mut environ: HashMap<String, String> = if include_current {
            env::vars().collect()
        } else {
            HashMap::new()
        };

        for (name, rule) in &self.environment {
            let current = environ.remove(name).filter(|value| !value.is_empty());
            let value = match (rule, current) {
                (EnvironmentRule::Set(value), _) => value.clone(),
                (EnvironmentRule::Prepend(value), Some(current)) => {
                    format!("{}{}{}", value, PATH_LIST_SEPARATOR, current)
                }
                (EnvironmentRule::Append(value), Some(current)) => {
                    format!("{}{}{}", current, PATH_LIST_SEPARATOR, value)
                }
                (EnvironmentRule::Prepend(value), None) | (EnvironmentRule::Append(value), None) => {
                    value.clone()
                }
            };
            environ.insert(name.clone(), value);
        }

        if let Some(server) = self.server.as_ref().filter(|server| server.running) {
            environ.insert(GRPC_CORE_HOST_VAR.to_string(), server.host.clone());
            environ.insert(GRPC_CORE_PORT_VAR.to_string(), server.port.to_string());
        }

        environ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(running: bool) -> GrpcServerStatus {
        GrpcServerStatus {
            host: "127.0.0.1".to_string(),
            port: 9865,
            running,
        }
    }

    #[test]
    fn test_environment_rules() {
        let context = StaticContext::default()
            .with_environment("ZORRO_MODE", EnvironmentRule::Set("batch".to_string()))
            .with_environment("ZORRO_TOOLS", EnvironmentRule::Prepend("/opt/tools".to_string()));

        let environ = context.environ(false);
        assert_eq!(environ["ZORRO_MODE"], "batch");
        assert_eq!(environ["ZORRO_TOOLS"], "/opt/tools");
        assert_eq!(environ.len(), 2);
    }

    #[test]
    fn test_path_rules_join_current_value() {
        let path = env::var("PATH").unwrap_or_default();
        let context = StaticContext::default()
            .with_environment("PATH", EnvironmentRule::Append("/opt/zorro/bin".to_string()));

        let environ = context.environ(true);
        if path.is_empty() {
            assert_eq!(environ["PATH"], "/opt/zorro/bin");
        } else {
            assert_eq!(
                environ["PATH"],
                format!("{}{}/opt/zorro/bin", path, PATH_LIST_SEPARATOR)
            );
        }
    }

    #[test]
    fn test_server_address_is_published_while_running() {
        let running = StaticContext::default().with_server(server(true)).environ(false);
        assert_eq!(running[GRPC_CORE_HOST_VAR], "127.0.0.1");
        assert_eq!(running[GRPC_CORE_PORT_VAR], "9865");

        let stopped = StaticContext::default().with_server(server(false)).environ(false);
        assert!(!stopped.contains_key(GRPC_CORE_HOST_VAR));
    }

    #[test]
    fn test_processors_and_command_paths() {
        let context = StaticContext::default().with_processor(ProcessorTemplate {
            command_paths: vec!["/opt/tools/python".to_string()],
            ..ProcessorTemplate::new("python", "python -m zorro_worker")
        });

        let processors = context.available_processors();
        assert_eq!(processors.len(), 1);
        assert_eq!(processors[0].name, "python");
        assert_eq!(
            context.available_command_paths(&processors[0]),
            vec!["/opt/tools/python".to_string()]
        );

        let unknown = Processor {
            name: "maya".to_string(),
            ..Default::default()
        };
        assert!(context.available_command_paths(&unknown).is_empty());
    }
}

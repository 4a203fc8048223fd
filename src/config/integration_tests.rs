// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::config::consts::{GRPC_CORE_HOST_VAR, GRPC_CORE_PORT_VAR};
    use crate::config::{load_and_validate_config, EngineConfig, EnvironmentRule, RuntimeBuilder};
    use crate::tools::{Action, ExecutionType, Tool, ToolBase};

    /// Test that the sample YAML configuration loads and validates
    #[test]
    fn test_yaml_config_loading() {
        let config = load_and_validate_config("configs/zorro.yaml").unwrap();

        assert_eq!(config.network.address().to_string(), "127.0.0.1:9865");
        assert_eq!(config.executor.max_concurrency, Some(4));
        assert_eq!(config.queue.capacity, 1);
        assert_eq!(config.processors.len(), 2);
        assert_eq!(config.processors[0].name, "python");
        assert_eq!(config.processors[1].subsets, vec!["python"]);
        assert_eq!(
            config.environment["PYTHONPATH"],
            EnvironmentRule::Prepend("/opt/zorro/lib/python".to_string())
        );
    }

    /// Test that the sample TOML configuration loads and validates
    #[test]
    fn test_toml_config_loading() {
        let config = load_and_validate_config("configs/zorro.toml").unwrap();

        assert_eq!(config.network.port, 0);
        assert_eq!(config.executor.max_concurrency, Some(2));
        assert_eq!(config.processors[0].command_paths, vec!["/opt/zorro/tools/python"]);
        assert_eq!(
            config.environment["PATH"],
            EnvironmentRule::Append("/opt/zorro/bin".to_string())
        );
    }

    /// Test that the sample action definition loads with its dependencies
    #[test]
    fn test_sample_action_loading() {
        let action = Action::load("configs/actions/greet.json").unwrap();
        let base = action.snapshot();

        assert_eq!(base.name.as_deref(), Some("greet"));
        assert_eq!(base.label.as_deref(), Some("Greet"));

        let children = action.children();
        assert_eq!(children["done"].upstream, vec!["hello".to_string()]);
        let Tool::Command(hello) = &children["hello"].tool else {
            panic!("expected a command");
        };
        assert_eq!(hello.processor_query().name.as_deref(), Some("python"));
        assert_eq!(
            hello.snapshot().input.to_json(),
            json!({"message": "hello from zorro", "level": "info"})
        );
    }

    /// Test wiring a runtime from configuration
    #[tokio::test]
    async fn test_runtime_from_config() {
        let mut config = load_and_validate_config("configs/zorro.toml").unwrap();
        config.network.port = 0;
        let runtime = RuntimeBuilder::from_config(&config).await.unwrap();

        let status = runtime.server_status();
        assert!(status.running);
        assert_ne!(status.port, 0);

        let environ = runtime.context().environ(false);
        assert_eq!(environ[GRPC_CORE_HOST_VAR], "127.0.0.1");
        assert_eq!(environ[GRPC_CORE_PORT_VAR], status.port.to_string());

        // Actions without commands never reach the scheduler
        let empty = Arc::new(Action::new(ToolBase::named("empty")));
        runtime
            .execute_action(&empty, ExecutionType::Execute)
            .await
            .unwrap();

        assert_eq!(runtime.shutdown().await.unwrap(), 0);
    }

    /// Test that a command without a matching template fails its action
    #[tokio::test]
    async fn test_runtime_reports_unmatched_commands() {
        let mut config = EngineConfig::default();
        config.network.port = 0;
        let runtime = RuntimeBuilder::from_config(&config).await.unwrap();

        let action = Arc::new(Action::load("configs/actions/greet.json").unwrap());
        let error = runtime
            .execute_action(&action, ExecutionType::Execute)
            .await
            .unwrap_err();

        let message = error.to_string();
        assert!(message.contains("greet"), "{}", message);
        assert!(message.contains("could not find running or run processor"), "{}", message);

        assert_eq!(runtime.shutdown().await.unwrap(), 2);
    }
}
